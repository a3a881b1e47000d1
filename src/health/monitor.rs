// SPDX-License-Identifier: MIT
//! Health monitor orchestrator.
//!
//! Owns the monitoring lifecycle: one long-lived Tokio task wakes on a fixed
//! interval, fans the seven probes out concurrently (each with its own
//! timeout), appends the cycle's results to history atomically, dispatches
//! recovery for degraded components, and publishes a fresh summary snapshot.
//!
//! `health_summary()` never touches the loop — it clones the last published
//! snapshot behind an `RwLock`, so concurrent readers never block on a cycle
//! in flight.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::contracts::{
    ConflictDetector, JobStatusStore, PlatformAdapter, SchedulerEngine, SessionFactory,
    SystemMetrics,
};
use crate::health::checks::{
    self, DatabaseProbe, HealthProbe, JobExecutionProbe, JobStoreConsistencyProbe,
    PlatformConnectivityProbe, ResourceUsageProbe, ScheduleConflictsProbe, SchedulerStatusProbe,
};
use crate::health::history::{category_for, FailureCounts, HealthHistory};
use crate::health::recovery::RecoveryHandler;
use crate::health::status::{HealthCheck, HealthStatus};

/// Lifecycle errors surfaced by [`HealthMonitor::stop_monitoring`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The loop did not finish its in-flight cycle within the join timeout.
    /// The task keeps the shutdown signal and exits after the cycle; it is
    /// detached, not leaked.
    #[error("monitoring loop did not stop within {waited_secs}s")]
    StopTimeout { waited_secs: u64 },
    /// The background task ended with a panic or cancellation.
    #[error("monitoring task terminated abnormally: {0}")]
    TaskFailed(String),
}

/// Everything the monitor needs from the surrounding scheduler service.
pub struct Collaborators {
    pub engine: Arc<dyn SchedulerEngine>,
    pub store: Arc<dyn JobStatusStore>,
    /// Adapter per platform name referenced by jobs.
    pub platforms: HashMap<String, Arc<dyn PlatformAdapter>>,
    pub detector: Arc<dyn ConflictDetector>,
    pub sessions: Arc<dyn SessionFactory>,
    pub metrics: Arc<dyn SystemMetrics>,
}

/// Snapshot returned by [`HealthMonitor::health_summary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Worst classified component status; `Unknown` before the first cycle.
    pub overall: HealthStatus,
    /// Most recent check per component.
    pub components: BTreeMap<String, HealthCheck>,
    /// Current per-category failure counters.
    pub failure_counts: BTreeMap<String, u64>,
    /// Completion time of the last cycle, if any.
    pub last_check_at: Option<DateTime<Utc>>,
    /// Total cycles completed since construction.
    pub cycles_completed: u64,
    /// Wall-clock duration of the last cycle in milliseconds.
    pub last_cycle_ms: u64,
}

impl HealthSummary {
    fn empty() -> Self {
        Self {
            overall: HealthStatus::Unknown,
            components: BTreeMap::new(),
            failure_counts: FailureCounts::new().snapshot(),
            last_check_at: None,
            cycles_completed: 0,
            last_cycle_ms: 0,
        }
    }

    /// Returns `true` if the overall status is `Healthy`.
    pub fn is_healthy(&self) -> bool {
        self.overall == HealthStatus::Healthy
    }
}

/// History and failure counters, guarded by one mutex. Written only by the
/// cycle runner; the lock is never held across collaborator I/O.
struct MonitorState {
    history: HealthHistory,
    failure_counts: FailureCounts,
    cycles_completed: u64,
}

struct MonitorCore {
    config: MonitorConfig,
    probes: Vec<Arc<dyn HealthProbe>>,
    recovery: RecoveryHandler,
    state: Mutex<MonitorState>,
    snapshot: RwLock<HealthSummary>,
}

/// Periodic health auditor for the scheduler service.
pub struct HealthMonitor {
    core: Arc<MonitorCore>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitor {
    pub fn new(config: MonitorConfig, collab: Collaborators) -> Self {
        let probes: Vec<Arc<dyn HealthProbe>> = vec![
            Arc::new(SchedulerStatusProbe::new(Arc::clone(&collab.engine))),
            Arc::new(JobExecutionProbe::new(Arc::clone(&collab.store), &config)),
            Arc::new(PlatformConnectivityProbe::new(
                Arc::clone(&collab.store),
                collab.platforms,
                &config,
            )),
            Arc::new(ResourceUsageProbe::new(Arc::clone(&collab.metrics), &config)),
            Arc::new(ScheduleConflictsProbe::new(
                Arc::clone(&collab.store),
                Arc::clone(&collab.detector),
            )),
            Arc::new(DatabaseProbe::new(Arc::clone(&collab.sessions))),
            Arc::new(JobStoreConsistencyProbe::new(
                Arc::clone(&collab.engine),
                Arc::clone(&collab.store),
            )),
        ];
        let recovery = RecoveryHandler::new(collab.engine, collab.sessions);
        let (shutdown, _) = watch::channel(false);

        Self {
            core: Arc::new(MonitorCore {
                state: Mutex::new(MonitorState {
                    history: HealthHistory::with_capacity(config.history_capacity),
                    failure_counts: FailureCounts::new(),
                    cycles_completed: 0,
                }),
                snapshot: RwLock::new(HealthSummary::empty()),
                config,
                probes,
                recovery,
            }),
            shutdown,
            task: Mutex::new(None),
        }
    }

    /// Begin the periodic monitoring loop. Idempotent: calling while already
    /// running is a no-op.
    pub async fn start_monitoring(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                debug!("health monitoring already running");
                return;
            }
        }
        self.shutdown.send_replace(false);
        let core = Arc::clone(&self.core);
        let shutdown_rx = self.shutdown.subscribe();
        *task = Some(tokio::spawn(run_monitor_loop(core, shutdown_rx)));
        info!(
            interval_secs = self.core.config.cycle_interval_secs,
            "health monitoring started"
        );
    }

    /// Signal the loop to stop and wait (bounded) for the in-flight cycle to
    /// finish. Idempotent: stopping a stopped monitor is a no-op.
    ///
    /// The running cycle is never aborted mid-flight — a half-finished
    /// recovery action (e.g. a database reconnect) is worse than a late stop.
    pub async fn stop_monitoring(&self) -> Result<(), MonitorError> {
        let handle = { self.task.lock().await.take() };
        let Some(handle) = handle else {
            return Ok(());
        };

        self.shutdown.send_replace(true);
        let waited_secs = self.core.config.stop_join_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(waited_secs), handle).await {
            Ok(Ok(())) => {
                info!("health monitoring stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(MonitorError::TaskFailed(e.to_string())),
            Err(_) => {
                warn!(waited_secs, "timed out waiting for monitoring loop to stop");
                Err(MonitorError::StopTimeout { waited_secs })
            }
        }
    }

    /// Latest published snapshot. Never blocks on the monitoring loop; before
    /// the first completed cycle the overall status is `Unknown` with no
    /// per-component detail.
    pub async fn health_summary(&self) -> HealthSummary {
        self.core.snapshot.read().await.clone()
    }

    /// Run exactly one monitoring cycle now, outside the periodic loop.
    /// Useful for on-demand audits; safe to call while the loop is running.
    pub async fn run_once(&self) {
        run_cycle(&self.core).await;
    }

    /// The `n` most recent history entries, oldest first.
    pub async fn recent_history(&self, n: usize) -> Vec<HealthCheck> {
        self.core.state.lock().await.history.recent(n)
    }

    /// Number of retained history entries.
    pub async fn history_len(&self) -> usize {
        self.core.state.lock().await.history.len()
    }
}

/// Overall verdict: worst classified status. `Unknown` components are
/// reported individually but excluded here; a cycle with no classified
/// result at all stays `Unknown`.
fn aggregate(results: &[HealthCheck]) -> HealthStatus {
    let mut overall = None;
    for check in results {
        if check.status == HealthStatus::Unknown {
            continue;
        }
        overall = Some(match overall {
            None => check.status,
            Some(acc) => HealthStatus::worst(acc, check.status),
        });
    }
    overall.unwrap_or(HealthStatus::Unknown)
}

async fn run_monitor_loop(core: Arc<MonitorCore>, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(core.config.cycle_interval_secs);
    loop {
        if *shutdown.borrow() {
            break;
        }

        // The cycle itself is not cancellable: a stop request during checks
        // or recovery takes effect at the next sleep.
        run_cycle(&core).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!("health monitoring loop exited");
}

async fn run_cycle(core: &Arc<MonitorCore>) {
    let started = Instant::now();
    let check_timeout = Duration::from_secs(core.config.check_timeout_secs);

    // Fan out: one task per probe so a slow or hung collaborator cannot
    // stall the rest of the cycle.
    let handles: Vec<(&'static str, JoinHandle<HealthCheck>)> = core
        .probes
        .iter()
        .map(|probe| {
            let probe = Arc::clone(probe);
            let component = probe.component();
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(check_timeout, probe.run()).await {
                    Ok(check) => check,
                    Err(_) => HealthCheck::critical(component, "check timed out"),
                }
            });
            (component, handle)
        })
        .collect();

    let mut results: Vec<HealthCheck> = Vec::with_capacity(handles.len());
    for (component, handle) in handles {
        match handle.await {
            Ok(check) => results.push(check),
            Err(e) => {
                results.push(
                    HealthCheck::critical(component, format!("health check panicked: {e}")),
                );
            }
        }
    }

    // Components needing recovery: anything critical, plus a job-store
    // mismatch (warning) since resync is a safe corrective action.
    let actionable: Vec<HealthCheck> = results
        .iter()
        .filter(|c| {
            c.status == HealthStatus::Critical
                || (c.component == checks::JOB_STORE && c.status == HealthStatus::Warning)
        })
        .cloned()
        .collect();

    // Publish the whole cycle atomically; the lock is dropped before any
    // recovery I/O runs.
    let cycles_completed = {
        let mut state = core.state.lock().await;
        state.failure_counts.record_cycle(&results);
        state.history.append_cycle(results.iter().cloned());
        state.cycles_completed += 1;
        state.cycles_completed
    };

    if !actionable.is_empty() {
        let report = core.recovery.handle_critical_issues(&actionable).await;
        if !report.recovered.is_empty() {
            let mut state = core.state.lock().await;
            for component in &report.recovered {
                if let Some(category) = category_for(component) {
                    state.failure_counts.reset(category);
                }
            }
        }
    }

    let overall = aggregate(&results);
    let failure_counts = core.state.lock().await.failure_counts.snapshot();
    let summary = HealthSummary {
        overall,
        components: results
            .into_iter()
            .map(|c| (c.component.clone(), c))
            .collect(),
        failure_counts,
        last_check_at: Some(Utc::now()),
        cycles_completed,
        last_cycle_ms: started.elapsed().as_millis() as u64,
    };

    let previous = {
        let mut snapshot = core.snapshot.write().await;
        let previous = snapshot.overall;
        *snapshot = summary;
        previous
    };

    if overall != previous {
        match overall {
            HealthStatus::Critical => warn!(%overall, "service health degraded to critical"),
            HealthStatus::Warning => warn!(%overall, "service health degraded"),
            _ => info!(%overall, "service health changed"),
        }
    }
    debug!(
        %overall,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "health cycle complete"
    );
}
