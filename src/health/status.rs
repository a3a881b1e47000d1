// SPDX-License-Identifier: MIT
//! Health status levels and the per-check result record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity level reported by a health check.
///
/// The derived ordering is severity order; `Unknown` sorts last as
/// "worst-unclassified" and is excluded from overall aggregation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The subsystem is operating normally.
    Healthy,
    /// The subsystem is functional but degraded.
    Warning,
    /// The subsystem is unavailable or critically broken.
    Critical,
    /// No result has been produced yet, or the result could not be classified.
    Unknown,
}

impl HealthStatus {
    /// Returns the worse (higher-severity) of two classified statuses.
    /// `Unknown` is treated as non-fatal here: it never dominates a
    /// classified status.
    pub fn worst(a: HealthStatus, b: HealthStatus) -> HealthStatus {
        match (a, b) {
            (HealthStatus::Critical, _) | (_, HealthStatus::Critical) => HealthStatus::Critical,
            (HealthStatus::Warning, _) | (_, HealthStatus::Warning) => HealthStatus::Warning,
            (HealthStatus::Healthy, _) | (_, HealthStatus::Healthy) => HealthStatus::Healthy,
            _ => HealthStatus::Unknown,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of running a single health check. Immutable once created; the
/// monitoring loop appends these to history and never touches them again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Machine-readable component name (e.g. `"scheduler"`, `"database"`).
    pub component: String,
    /// Status of this check.
    pub status: HealthStatus,
    /// Human-readable message describing the result.
    pub message: String,
    /// Structured diagnostic data, in insertion order.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, Value>,
    /// UTC instant when the check ran.
    pub timestamp: DateTime<Utc>,
}

impl HealthCheck {
    fn new(component: impl Into<String>, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status,
            message: message.into(),
            details: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn healthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Healthy, message)
    }

    pub fn warning(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Warning, message)
    }

    pub fn critical(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Critical, message)
    }

    pub fn unknown(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Unknown, message)
    }

    /// Attach a diagnostic detail. Keys keep their insertion order.
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}
