// SPDX-License-Identifier: MIT
//! The seven health probes.
//!
//! Each probe reads from one collaborator contract and maps its observation
//! onto a [`HealthCheck`]. A probe never lets a collaborator error escape:
//! any failed call becomes a `Critical` result for that component, so one
//! broken collaborator can never abort a monitoring cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::config::MonitorConfig;
use crate::contracts::{
    ConflictDetector, JobState, JobStatusStore, PlatformAdapter, SchedulerEngine, SessionFactory,
    SystemMetrics,
};
use crate::health::status::HealthCheck;

/// Component names, one per probe.
pub const SCHEDULER: &str = "scheduler";
pub const JOB_EXECUTION: &str = "job_execution";
pub const PLATFORM_CONNECTIVITY: &str = "platform_connectivity";
pub const RESOURCE_USAGE: &str = "resource_usage";
pub const SCHEDULE_CONFLICTS: &str = "schedule_conflicts";
pub const DATABASE: &str = "database";
pub const JOB_STORE: &str = "job_store";

/// Platform status string that counts as reachable.
const PLATFORM_OK: &str = "ok";

/// A single health probe. Implementations are cheap to construct and hold
/// only `Arc`s to their collaborators; the monitor runs them concurrently
/// each cycle.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Component name this probe reports under.
    fn component(&self) -> &'static str;

    /// Run the probe. Must not return an error or panic under collaborator
    /// failure — map those to a `Critical` [`HealthCheck`] instead.
    async fn run(&self) -> HealthCheck;
}

// ─── Scheduler status ─────────────────────────────────────────────────────────

/// Verifies the job-execution engine's run loop is alive.
pub struct SchedulerStatusProbe {
    engine: Arc<dyn SchedulerEngine>,
}

impl SchedulerStatusProbe {
    pub fn new(engine: Arc<dyn SchedulerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl HealthProbe for SchedulerStatusProbe {
    fn component(&self) -> &'static str {
        SCHEDULER
    }

    async fn run(&self) -> HealthCheck {
        if !self.engine.is_running().await {
            return HealthCheck::critical(SCHEDULER, "scheduler engine is not running")
                .with_detail("running", json!(false));
        }
        match self.engine.job_count().await {
            Ok(count) => HealthCheck::healthy(SCHEDULER, "scheduler engine running")
                .with_detail("running", json!(true))
                .with_detail("job_count", json!(count)),
            Err(e) => HealthCheck::critical(SCHEDULER, "scheduler job count unavailable")
                .with_detail("error", json!(e.to_string())),
        }
    }
}

// ─── Job execution failure rate ───────────────────────────────────────────────

/// Computes the job failure rate over a trailing window.
///
/// An empty window is healthy by definition (rate 0 — no division by zero).
/// Thresholds compare inclusively (`>=`).
pub struct JobExecutionProbe {
    store: Arc<dyn JobStatusStore>,
    window_hours: i64,
    warn_rate: f64,
    critical_rate: f64,
}

impl JobExecutionProbe {
    pub fn new(store: Arc<dyn JobStatusStore>, config: &MonitorConfig) -> Self {
        Self {
            store,
            window_hours: config.job_window_hours,
            warn_rate: config.failure_rate_warn,
            critical_rate: config.failure_rate_critical,
        }
    }
}

#[async_trait]
impl HealthProbe for JobExecutionProbe {
    fn component(&self) -> &'static str {
        JOB_EXECUTION
    }

    async fn run(&self) -> HealthCheck {
        let cutoff = Utc::now() - Duration::hours(self.window_hours);
        let jobs = match self.store.jobs_since(cutoff).await {
            Ok(jobs) => jobs,
            Err(e) => {
                return HealthCheck::critical(JOB_EXECUTION, "job status query failed")
                    .with_detail("error", json!(e.to_string()))
            }
        };

        let total = jobs.len();
        let failed = jobs.iter().filter(|j| j.state == JobState::Failed).count();
        let failure_rate = if total == 0 {
            0.0
        } else {
            failed as f64 / total as f64
        };

        let message = format!(
            "{failed} of {total} jobs failed over the last {}h ({:.1}%)",
            self.window_hours,
            failure_rate * 100.0
        );
        let check = if failure_rate >= self.critical_rate {
            HealthCheck::critical(JOB_EXECUTION, message)
        } else if failure_rate >= self.warn_rate {
            HealthCheck::warning(JOB_EXECUTION, message)
        } else {
            HealthCheck::healthy(JOB_EXECUTION, message)
        };
        check
            .with_detail("total_jobs", json!(total))
            .with_detail("failed_jobs", json!(failed))
            .with_detail("failure_rate", json!(failure_rate))
    }
}

// ─── Platform connectivity ────────────────────────────────────────────────────

/// Probes every platform referenced by recent jobs through its adapter.
///
/// Any unreachable platform makes the whole check `Critical`; per-platform
/// status is retained in the details.
pub struct PlatformConnectivityProbe {
    store: Arc<dyn JobStatusStore>,
    adapters: HashMap<String, Arc<dyn PlatformAdapter>>,
    window_hours: i64,
}

impl PlatformConnectivityProbe {
    pub fn new(
        store: Arc<dyn JobStatusStore>,
        adapters: HashMap<String, Arc<dyn PlatformAdapter>>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            store,
            adapters,
            window_hours: config.job_window_hours,
        }
    }
}

#[async_trait]
impl HealthProbe for PlatformConnectivityProbe {
    fn component(&self) -> &'static str {
        PLATFORM_CONNECTIVITY
    }

    async fn run(&self) -> HealthCheck {
        let cutoff = Utc::now() - Duration::hours(self.window_hours);
        let jobs = match self.store.jobs_since(cutoff).await {
            Ok(jobs) => jobs,
            Err(e) => {
                return HealthCheck::critical(PLATFORM_CONNECTIVITY, "job status query failed")
                    .with_detail("error", json!(e.to_string()))
            }
        };

        let mut platforms: Vec<String> = jobs
            .iter()
            .flat_map(|j| j.platforms.iter().cloned())
            .collect();
        platforms.sort();
        platforms.dedup();

        if platforms.is_empty() {
            return HealthCheck::healthy(PLATFORM_CONNECTIVITY, "no platforms referenced")
                .with_detail("platforms", json!({}));
        }

        let mut statuses = serde_json::Map::new();
        let mut unreachable = 0usize;
        for platform in &platforms {
            let reported = match self.adapters.get(platform) {
                Some(adapter) => match adapter.status().await {
                    Ok(status) => status,
                    Err(e) => format!("error: {e}"),
                },
                None => "error: no adapter registered".to_string(),
            };
            if !reported.eq_ignore_ascii_case(PLATFORM_OK) {
                unreachable += 1;
            }
            statuses.insert(platform.clone(), json!(reported));
        }

        let total = platforms.len();
        if unreachable > 0 {
            HealthCheck::critical(
                PLATFORM_CONNECTIVITY,
                format!("{unreachable} of {total} platforms unreachable"),
            )
            .with_detail("platforms", serde_json::Value::Object(statuses))
        } else {
            HealthCheck::healthy(
                PLATFORM_CONNECTIVITY,
                format!("all {total} platforms reachable"),
            )
            .with_detail("platforms", serde_json::Value::Object(statuses))
        }
    }
}

// ─── Resource usage ───────────────────────────────────────────────────────────

/// Checks host CPU, memory, and disk usage against percentage thresholds.
/// Thresholds compare exclusively (`>`): exactly 90% is still only a warning.
pub struct ResourceUsageProbe {
    metrics: Arc<dyn SystemMetrics>,
    warn_percent: f64,
    critical_percent: f64,
}

impl ResourceUsageProbe {
    pub fn new(metrics: Arc<dyn SystemMetrics>, config: &MonitorConfig) -> Self {
        Self {
            metrics,
            warn_percent: config.resource_warn_percent,
            critical_percent: config.resource_critical_percent,
        }
    }
}

#[async_trait]
impl HealthProbe for ResourceUsageProbe {
    fn component(&self) -> &'static str {
        RESOURCE_USAGE
    }

    async fn run(&self) -> HealthCheck {
        let readings = async {
            anyhow::Ok((
                self.metrics.cpu_percent().await?,
                self.metrics.memory_percent().await?,
                self.metrics.disk_percent().await?,
            ))
        }
        .await;

        let (cpu, memory, disk) = match readings {
            Ok(r) => r,
            Err(e) => {
                return HealthCheck::critical(RESOURCE_USAGE, "resource metrics unavailable")
                    .with_detail("error", json!(e.to_string()))
            }
        };

        let peak = cpu.max(memory).max(disk);
        let message = format!("cpu {cpu:.1}%, memory {memory:.1}%, disk {disk:.1}%");
        let check = if peak > self.critical_percent {
            HealthCheck::critical(RESOURCE_USAGE, message)
        } else if peak > self.warn_percent {
            HealthCheck::warning(RESOURCE_USAGE, message)
        } else {
            HealthCheck::healthy(RESOURCE_USAGE, message)
        };
        check
            .with_detail("cpu_percent", json!(cpu))
            .with_detail("memory_percent", json!(memory))
            .with_detail("disk_percent", json!(disk))
    }
}

// ─── Schedule conflicts ───────────────────────────────────────────────────────

/// Runs the conflict detector over all pending schedules.
///
/// Conflicts are a planning problem, not a service outage: this check never
/// escalates past `Warning` regardless of how many overlaps are found.
pub struct ScheduleConflictsProbe {
    store: Arc<dyn JobStatusStore>,
    detector: Arc<dyn ConflictDetector>,
}

impl ScheduleConflictsProbe {
    pub fn new(store: Arc<dyn JobStatusStore>, detector: Arc<dyn ConflictDetector>) -> Self {
        Self { store, detector }
    }
}

#[async_trait]
impl HealthProbe for ScheduleConflictsProbe {
    fn component(&self) -> &'static str {
        SCHEDULE_CONFLICTS
    }

    async fn run(&self) -> HealthCheck {
        let pending = match self.store.pending_schedules().await {
            Ok(pending) => pending,
            Err(e) => {
                return HealthCheck::critical(SCHEDULE_CONFLICTS, "pending schedule query failed")
                    .with_detail("error", json!(e.to_string()))
            }
        };

        let conflicts = match self.detector.detect_conflicts(&pending).await {
            Ok(conflicts) => conflicts,
            Err(e) => {
                return HealthCheck::critical(SCHEDULE_CONFLICTS, "conflict detection failed")
                    .with_detail("error", json!(e.to_string()))
            }
        };

        if conflicts.is_empty() {
            HealthCheck::healthy(
                SCHEDULE_CONFLICTS,
                format!("no conflicts among {} pending schedules", pending.len()),
            )
            .with_detail("pending_schedules", json!(pending.len()))
            .with_detail("conflict_count", json!(0))
        } else {
            HealthCheck::warning(
                SCHEDULE_CONFLICTS,
                format!("{} schedule conflicts detected", conflicts.len()),
            )
            .with_detail("pending_schedules", json!(pending.len()))
            .with_detail("conflict_count", json!(conflicts.len()))
            .with_detail("conflicts", json!(conflicts))
        }
    }
}

// ─── Database connectivity ────────────────────────────────────────────────────

/// Round-trips a trivial query on a fresh session.
pub struct DatabaseProbe {
    sessions: Arc<dyn SessionFactory>,
}

impl DatabaseProbe {
    pub fn new(sessions: Arc<dyn SessionFactory>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl HealthProbe for DatabaseProbe {
    fn component(&self) -> &'static str {
        DATABASE
    }

    async fn run(&self) -> HealthCheck {
        let start = Instant::now();
        let result = async {
            let mut session = self.sessions.session().await?;
            session.execute("SELECT 1").await
        }
        .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                HealthCheck::healthy(DATABASE, format!("database reachable ({latency_ms}ms)"))
                    .with_detail("latency_ms", json!(latency_ms))
            }
            Err(e) => HealthCheck::critical(DATABASE, "database round-trip failed")
                .with_detail("error", json!(e.to_string())),
        }
    }
}

// ─── Job-store consistency ────────────────────────────────────────────────────

/// Compares the engine's in-memory job count against the status table.
/// A mismatch is a `Warning`; the recovery handler resynchronizes it.
pub struct JobStoreConsistencyProbe {
    engine: Arc<dyn SchedulerEngine>,
    store: Arc<dyn JobStatusStore>,
}

impl JobStoreConsistencyProbe {
    pub fn new(engine: Arc<dyn SchedulerEngine>, store: Arc<dyn JobStatusStore>) -> Self {
        Self { engine, store }
    }
}

#[async_trait]
impl HealthProbe for JobStoreConsistencyProbe {
    fn component(&self) -> &'static str {
        JOB_STORE
    }

    async fn run(&self) -> HealthCheck {
        let counts = async {
            anyhow::Ok((self.engine.job_count().await?, self.store.job_count().await?))
        }
        .await;

        let (job_count, store_size) = match counts {
            Ok(c) => c,
            Err(e) => {
                return HealthCheck::critical(JOB_STORE, "job count query failed")
                    .with_detail("error", json!(e.to_string()))
            }
        };

        if job_count == store_size {
            HealthCheck::healthy(JOB_STORE, format!("job store consistent ({job_count} jobs)"))
                .with_detail("job_count", json!(job_count))
                .with_detail("store_size", json!(store_size))
        } else {
            HealthCheck::warning(
                JOB_STORE,
                format!("job store mismatch: engine has {job_count}, store has {store_size}"),
            )
            .with_detail("job_count", json!(job_count))
            .with_detail("store_size", json!(store_size))
        }
    }
}
