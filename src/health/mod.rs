// SPDX-License-Identifier: MIT
//! Schedule service health monitoring.
//!
//! [`HealthMonitor`] runs a periodic audit cycle over seven independent
//! checks and attempts automatic recovery when critical conditions appear.
//!
//! # Included checks
//! - scheduler — job engine run-loop alive
//! - job_execution — failure rate over a trailing 24h window
//! - platform_connectivity — every referenced platform adapter reachable
//! - resource_usage — host CPU / memory / disk percentages
//! - schedule_conflicts — overlapping pending publish slots (warning only)
//! - database — `SELECT 1` round-trip on a fresh session
//! - job_store — engine job count vs persisted status table
//!
//! # Usage
//! ```rust,no_run
//! use schedwatch::{Collaborators, HealthMonitor, MonitorConfig};
//!
//! # async fn wire(collab: Collaborators) {
//! let monitor = HealthMonitor::new(MonitorConfig::default(), collab);
//! monitor.start_monitoring().await;
//!
//! let summary = monitor.health_summary().await;
//! println!("overall: {}", summary.overall);
//! # }
//! ```

pub mod checks;
pub mod history;
pub mod monitor;
pub mod recovery;
pub mod status;

// Convenience re-exports.
pub use checks::HealthProbe;
pub use history::{FailureCounts, HealthHistory};
pub use monitor::{Collaborators, HealthMonitor, HealthSummary, MonitorError};
pub use recovery::{RecoveryHandler, RecoveryReport};
pub use status::{HealthCheck, HealthStatus};
