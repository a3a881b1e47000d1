// SPDX-License-Identifier: MIT
//! Default [`SystemMetrics`] implementation backed by `sysinfo`.

use async_trait::async_trait;
use sysinfo::{Disks, System};
use tokio::sync::Mutex;

use crate::contracts::SystemMetrics;

/// Host resource readings via `sysinfo`. Keeps one `System` alive so CPU
/// usage is measured between successive refreshes rather than cold.
pub struct SysinfoMetrics {
    sys: Mutex<System>,
}

impl SysinfoMetrics {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Prime CPU measurement; the first delta needs a baseline refresh.
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            sys: Mutex::new(sys),
        }
    }
}

impl Default for SysinfoMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemMetrics for SysinfoMetrics {
    async fn cpu_percent(&self) -> anyhow::Result<f64> {
        let mut sys = self.sys.lock().await;
        sys.refresh_cpu_usage();
        Ok(sys.global_cpu_usage() as f64)
    }

    async fn memory_percent(&self) -> anyhow::Result<f64> {
        let mut sys = self.sys.lock().await;
        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            return Ok(0.0);
        }
        Ok((sys.used_memory() as f64 / total as f64) * 100.0)
    }

    async fn disk_percent(&self) -> anyhow::Result<f64> {
        // Disk enumeration hits the filesystem; keep it off the async threads.
        let peak = tokio::task::spawn_blocking(|| {
            let disks = Disks::new_with_refreshed_list();
            disks
                .iter()
                .map(|disk| {
                    let total = disk.total_space();
                    if total == 0 {
                        return 0.0;
                    }
                    let used = total.saturating_sub(disk.available_space());
                    (used as f64 / total as f64) * 100.0
                })
                .fold(0.0, f64::max)
        })
        .await?;
        Ok(peak)
    }
}
