// SPDX-License-Identifier: MIT
//! Bounded check history and per-category failure counters.
//!
//! Both live behind the monitor's single state mutex: written only by the
//! monitoring loop, read by summary consumers via cloned snapshots.

use std::collections::{BTreeMap, VecDeque};

use crate::health::checks;
use crate::health::status::{HealthCheck, HealthStatus};

/// Failure-count category keys. Fixed set; other components are recovered
/// automatically rather than trended.
pub const CAT_JOB_EXECUTION: &str = "job_execution";
pub const CAT_PLATFORM_PUBLISH: &str = "platform_publish";
pub const CAT_SCHEDULE_CONFLICTS: &str = "schedule_conflicts";
pub const CAT_RESOURCE_USAGE: &str = "resource_usage";

const CATEGORIES: [&str; 4] = [
    CAT_JOB_EXECUTION,
    CAT_PLATFORM_PUBLISH,
    CAT_SCHEDULE_CONFLICTS,
    CAT_RESOURCE_USAGE,
];

/// Maps a check component to its failure-count category, if it has one.
pub fn category_for(component: &str) -> Option<&'static str> {
    match component {
        checks::JOB_EXECUTION => Some(CAT_JOB_EXECUTION),
        checks::PLATFORM_CONNECTIVITY => Some(CAT_PLATFORM_PUBLISH),
        checks::SCHEDULE_CONFLICTS => Some(CAT_SCHEDULE_CONFLICTS),
        checks::RESOURCE_USAGE => Some(CAT_RESOURCE_USAGE),
        _ => None,
    }
}

/// Append-only, size-bounded history of check results.
///
/// Backed by a `VecDeque` preallocated at full capacity so steady-state
/// appends never reallocate; the oldest entry is evicted (FIFO) once the
/// bound is reached.
pub struct HealthHistory {
    entries: VecDeque<HealthCheck>,
    capacity: usize,
}

impl HealthHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append one cycle's results. Callers hold the state mutex, so the whole
    /// cycle lands atomically with respect to readers.
    pub fn append_cycle(&mut self, checks: impl IntoIterator<Item = HealthCheck>) {
        for check in checks {
            if self.entries.len() == self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back(check);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &HealthCheck> {
        self.entries.iter()
    }

    /// The `n` most recent entries, oldest of those first.
    pub fn recent(&self, n: usize) -> Vec<HealthCheck> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

/// Running tally of degraded observations per category. A trend signal only,
/// never an escalation trigger on its own.
#[derive(Debug, Clone)]
pub struct FailureCounts {
    counts: BTreeMap<&'static str, u64>,
}

impl FailureCounts {
    pub fn new() -> Self {
        Self {
            counts: CATEGORIES.iter().map(|c| (*c, 0)).collect(),
        }
    }

    /// Record one cycle's results: any tracked category whose check came back
    /// worse than healthy gets its counter bumped. `Unknown` does not count.
    pub fn record_cycle(&mut self, checks: &[HealthCheck]) {
        for check in checks {
            let degraded = matches!(
                check.status,
                HealthStatus::Warning | HealthStatus::Critical
            );
            if !degraded {
                continue;
            }
            if let Some(category) = category_for(&check.component) {
                if let Some(count) = self.counts.get_mut(category) {
                    *count += 1;
                }
            }
        }
    }

    /// Reset one category to zero. No-op for unknown keys.
    pub fn reset(&mut self, category: &str) {
        if let Some(count) = self.counts.get_mut(category) {
            *count = 0;
        }
    }

    pub fn get(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Owned snapshot for the summary.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }
}

impl Default for FailureCounts {
    fn default() -> Self {
        Self::new()
    }
}
