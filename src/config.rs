//! Monitor configuration.
//!
//! Every tunable the monitor uses is a named constant here so thresholds can
//! be adjusted without touching check logic. Defaults mirror the production
//! values the checks were tuned against.
//!
//! Note the deliberate operator asymmetry: failure-rate thresholds are
//! inclusive (`>=`) while resource thresholds are exclusive (`>`).

use serde::{Deserialize, Serialize};

/// Seconds between monitoring cycles.
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 300;
/// Per-check timeout; a slow external probe must not stall the whole cycle.
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 30;
/// Trailing window for the job-execution failure-rate check.
pub const DEFAULT_JOB_WINDOW_HOURS: i64 = 24;
/// Job failure rate at or above which the check reports `Warning`.
pub const DEFAULT_FAILURE_RATE_WARN: f64 = 0.10;
/// Job failure rate at or above which the check reports `Critical`.
pub const DEFAULT_FAILURE_RATE_CRITICAL: f64 = 0.20;
/// Resource usage percentage above which the check reports `Warning`.
pub const DEFAULT_RESOURCE_WARN_PERCENT: f64 = 70.0;
/// Resource usage percentage above which the check reports `Critical`.
pub const DEFAULT_RESOURCE_CRITICAL_PERCENT: f64 = 90.0;
/// Maximum retained health-check records before FIFO eviction.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;
/// How long `stop_monitoring` waits for the loop to finish its cycle.
pub const DEFAULT_STOP_JOIN_TIMEOUT_SECS: u64 = 30;

/// Health monitor configuration (`[monitor]` section when embedded in the
/// host service's config file).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between monitoring cycles. Default: 300.
    pub cycle_interval_secs: u64,
    /// Per-check timeout in seconds. A check that exceeds it is reported as
    /// `Critical` ("check timed out"). Default: 30.
    pub check_timeout_secs: u64,
    /// Trailing window (hours) for the job-execution check. Default: 24.
    pub job_window_hours: i64,
    /// Failure rate (0.0–1.0) at or above which job execution is `Warning`.
    pub failure_rate_warn: f64,
    /// Failure rate (0.0–1.0) at or above which job execution is `Critical`.
    pub failure_rate_critical: f64,
    /// CPU/memory/disk percentage above which resources are `Warning`.
    pub resource_warn_percent: f64,
    /// CPU/memory/disk percentage above which resources are `Critical`.
    pub resource_critical_percent: f64,
    /// History ring capacity. Default: 1000.
    pub history_capacity: usize,
    /// Seconds `stop_monitoring` waits for the in-flight cycle. Default: 30.
    pub stop_join_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: DEFAULT_CYCLE_INTERVAL_SECS,
            check_timeout_secs: DEFAULT_CHECK_TIMEOUT_SECS,
            job_window_hours: DEFAULT_JOB_WINDOW_HOURS,
            failure_rate_warn: DEFAULT_FAILURE_RATE_WARN,
            failure_rate_critical: DEFAULT_FAILURE_RATE_CRITICAL,
            resource_warn_percent: DEFAULT_RESOURCE_WARN_PERCENT,
            resource_critical_percent: DEFAULT_RESOURCE_CRITICAL_PERCENT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            stop_join_timeout_secs: DEFAULT_STOP_JOIN_TIMEOUT_SECS,
        }
    }
}
