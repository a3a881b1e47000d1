// SPDX-License-Identifier: MIT
//! schedwatch — schedule health monitoring for a content-scheduling service.
//!
//! A [`HealthMonitor`] owns one long-lived background task that periodically
//! audits the surrounding scheduler service: the job engine, job execution
//! success rate, outbound platform connectivity, host resource usage,
//! schedule conflicts, the backing database, and job-store consistency.
//! Results are kept in a bounded history, aggregated into a single verdict,
//! and critical findings trigger best-effort automatic recovery.
//!
//! The monitor depends only on the collaborator traits in [`contracts`];
//! the surrounding service (or a test) supplies the implementations.
//! [`metrics::SysinfoMetrics`] and [`db::SqliteSessionFactory`] are provided
//! as default adapters for the OS-metrics and database contracts.

pub mod config;
pub mod contracts;
pub mod db;
pub mod health;
pub mod metrics;

// Convenience re-exports for the common entry points.
pub use config::MonitorConfig;
pub use health::monitor::{Collaborators, HealthMonitor, HealthSummary, MonitorError};
pub use health::status::{HealthCheck, HealthStatus};
