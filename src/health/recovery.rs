// SPDX-License-Identifier: MIT
//! Automatic recovery for critical check results.
//!
//! Exactly one corrective action is attempted per degraded component per
//! cycle — no retry loops here; retries happen naturally on the next cycle.
//! Components without a safe automatic remediation (platform connectivity,
//! resource usage, schedule conflicts, job execution) are report-only:
//! blindly restarting a publish pipeline could cause duplicate publishes.
//!
//! Best-effort throughout: an action failure is logged and swallowed, never
//! propagated to the monitoring loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::contracts::{SchedulerEngine, SessionFactory};
use crate::health::checks;
use crate::health::status::HealthCheck;

/// Outcome of one recovery pass.
#[derive(Debug, Default, Clone)]
pub struct RecoveryReport {
    /// Components whose corrective action succeeded.
    pub recovered: Vec<String>,
    /// Components whose corrective action was attempted and failed.
    pub failed: Vec<String>,
    /// Components with no automatic remediation (report-only).
    pub skipped: Vec<String>,
}

/// Maps a degraded component to its corrective action.
pub struct RecoveryHandler {
    engine: Arc<dyn SchedulerEngine>,
    sessions: Arc<dyn SessionFactory>,
}

impl RecoveryHandler {
    pub fn new(engine: Arc<dyn SchedulerEngine>, sessions: Arc<dyn SessionFactory>) -> Self {
        Self { engine, sessions }
    }

    /// Attempt one corrective action per check. `checks` is expected to hold
    /// at most one entry per component (the monitoring loop deduplicates by
    /// construction — one result per probe per cycle).
    pub async fn handle_critical_issues(&self, checks: &[HealthCheck]) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        for check in checks {
            let outcome = match check.component.as_str() {
                checks::SCHEDULER => Some(self.restart_scheduler().await),
                checks::DATABASE => Some(self.reconnect_database().await),
                checks::JOB_STORE => Some(self.resync_job_store().await),
                _ => None,
            };

            match outcome {
                Some(Ok(())) => {
                    info!(component = %check.component, "recovery action succeeded");
                    report.recovered.push(check.component.clone());
                }
                Some(Err(e)) => {
                    warn!(component = %check.component, error = %e, "recovery action failed");
                    report.failed.push(check.component.clone());
                }
                None => {
                    debug!(component = %check.component, "no automatic remediation, reporting only");
                    report.skipped.push(check.component.clone());
                }
            }
        }

        report
    }

    async fn restart_scheduler(&self) -> anyhow::Result<()> {
        if self.engine.is_running().await {
            // Flagged critical for another reason; a restart would not help.
            debug!("scheduler engine already running, skipping restart");
            return Ok(());
        }
        info!("attempting scheduler engine restart");
        self.engine.start().await
    }

    async fn reconnect_database(&self) -> anyhow::Result<()> {
        info!("recreating database connection pool");
        self.sessions.reconnect().await
    }

    async fn resync_job_store(&self) -> anyhow::Result<()> {
        info!("resynchronizing job store");
        let reconciled = self.engine.resync_jobs().await?;
        info!(reconciled, "job store resync complete");
        Ok(())
    }
}
