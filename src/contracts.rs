// SPDX-License-Identifier: MIT
//! Collaborator contracts consumed by the health monitor.
//!
//! The monitor never talks to the scheduler service's internals directly; it
//! depends only on these traits so every collaborator can be substituted with
//! a test double. The surrounding service implements them over its real job
//! engine, platform adapters, conflict detector, and database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Job store value types ────────────────────────────────────────────────────

/// Execution state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One persisted job record as seen by the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    /// Platform identifiers this job publishes to.
    pub platforms: Vec<String>,
}

/// A pending publish slot, fed to the conflict detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub job_id: String,
    pub platform: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// A pair of overlapping schedules reported by the conflict detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub first_job: String,
    pub second_job: String,
    pub platform: String,
}

// ─── Collaborator traits ──────────────────────────────────────────────────────

/// The scheduler's job-execution engine.
#[async_trait]
pub trait SchedulerEngine: Send + Sync {
    /// Whether the engine's run loop is currently active.
    async fn is_running(&self) -> bool;

    /// Number of jobs the engine currently knows about.
    async fn job_count(&self) -> anyhow::Result<usize>;

    /// Start (or restart) the engine. Used by the recovery handler.
    async fn start(&self) -> anyhow::Result<()>;

    /// Re-synchronize the engine's in-memory jobs with the persisted job
    /// store. Returns the number of jobs reconciled.
    async fn resync_jobs(&self) -> anyhow::Result<usize>;
}

/// The monitor's view of the persisted job status table.
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Jobs created at or after `cutoff`, newest window first or not — order
    /// is not significant to the checks.
    async fn jobs_since(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<JobRecord>>;

    /// All schedules that have not yet executed.
    async fn pending_schedules(&self) -> anyhow::Result<Vec<Schedule>>;

    /// Total number of job rows in the status table.
    async fn job_count(&self) -> anyhow::Result<usize>;
}

/// Status probe for one outbound publishing platform.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Returns the platform's reported status string. Anything other than
    /// `"ok"` (case-insensitive) is treated as unreachable.
    async fn status(&self) -> anyhow::Result<String>;
}

/// Detects overlapping publish slots among pending schedules.
#[async_trait]
pub trait ConflictDetector: Send + Sync {
    async fn detect_conflicts(&self, pending: &[Schedule]) -> anyhow::Result<Vec<Conflict>>;
}

/// A short-lived database session capable of running a statement.
#[async_trait]
pub trait DbSession: Send + Sync {
    async fn execute(&mut self, sql: &str) -> anyhow::Result<()>;
}

/// Hands out database sessions and can rebuild the underlying pool.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a fresh session for a round-trip probe.
    async fn session(&self) -> anyhow::Result<Box<dyn DbSession>>;

    /// Dispose the current connection pool and recreate it from the stored
    /// configuration. Used by the recovery handler.
    async fn reconnect(&self) -> anyhow::Result<()>;
}

/// OS-level resource usage, each as a percentage in `0.0..=100.0`.
#[async_trait]
pub trait SystemMetrics: Send + Sync {
    async fn cpu_percent(&self) -> anyhow::Result<f64>;
    async fn memory_percent(&self) -> anyhow::Result<f64>;
    async fn disk_percent(&self) -> anyhow::Result<f64>;
}
