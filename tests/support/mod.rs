//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use schedwatch::contracts::{
    Conflict, ConflictDetector, DbSession, JobRecord, JobState, JobStatusStore, PlatformAdapter,
    SchedulerEngine, Schedule, SessionFactory, SystemMetrics,
};
use schedwatch::Collaborators;

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct MockEngine {
    pub running: AtomicBool,
    pub jobs: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub resync_calls: AtomicUsize,
    pub fail_start: AtomicBool,
    /// When set, `resync_jobs` adopts this store's job count.
    pub sync_with: Mutex<Option<Arc<MockStore>>>,
}

impl MockEngine {
    pub fn running_with_jobs(jobs: usize) -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(true),
            jobs: AtomicUsize::new(jobs),
            start_calls: AtomicUsize::new(0),
            resync_calls: AtomicUsize::new(0),
            fail_start: AtomicBool::new(false),
            sync_with: Mutex::new(None),
        })
    }
}

#[async_trait]
impl SchedulerEngine for MockEngine {
    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn job_count(&self) -> anyhow::Result<usize> {
        Ok(self.jobs.load(Ordering::SeqCst))
    }

    async fn start(&self) -> anyhow::Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            anyhow::bail!("engine refused to start");
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resync_jobs(&self) -> anyhow::Result<usize> {
        self.resync_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(store) = self.sync_with.lock().unwrap().clone() {
            let count = store.jobs.lock().unwrap().len();
            self.jobs.store(count, Ordering::SeqCst);
        }
        Ok(self.jobs.load(Ordering::SeqCst))
    }
}

// ─── Job store ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub jobs: Mutex<Vec<JobRecord>>,
    pub pending: Mutex<Vec<Schedule>>,
    pub fail: AtomicBool,
}

impl MockStore {
    pub fn with_jobs(jobs: Vec<JobRecord>) -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(jobs),
            ..Default::default()
        })
    }
}

#[async_trait]
impl JobStatusStore for MockStore {
    async fn jobs_since(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<JobRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("job store offline");
        }
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.created_at >= cutoff)
            .cloned()
            .collect())
    }

    async fn pending_schedules(&self) -> anyhow::Result<Vec<Schedule>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("job store offline");
        }
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn job_count(&self) -> anyhow::Result<usize> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("job store offline");
        }
        Ok(self.jobs.lock().unwrap().len())
    }
}

// ─── Platform adapter ────────────────────────────────────────────────────────

pub struct MockAdapter {
    pub status: Mutex<String>,
    /// Simulate a hung platform API: sleep this long before answering.
    pub delay: Mutex<Option<std::time::Duration>>,
}

impl MockAdapter {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new("ok".to_string()),
            delay: Mutex::new(None),
        })
    }

    pub fn with_status(status: &str) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status.to_string()),
            delay: Mutex::new(None),
        })
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    async fn status(&self) -> anyhow::Result<String> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.status.lock().unwrap().clone())
    }
}

// ─── Conflict detector ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDetector {
    pub conflicts: Mutex<Vec<Conflict>>,
}

#[async_trait]
impl ConflictDetector for MockDetector {
    async fn detect_conflicts(&self, _pending: &[Schedule]) -> anyhow::Result<Vec<Conflict>> {
        Ok(self.conflicts.lock().unwrap().clone())
    }
}

// ─── Database sessions ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSessions {
    pub fail: AtomicBool,
    pub reconnects: AtomicUsize,
    /// When set, a reconnect clears the failure flag (pool rebuild fixes it).
    pub heal_on_reconnect: AtomicBool,
}

struct MockSession {
    fail: bool,
}

#[async_trait]
impl DbSession for MockSession {
    async fn execute(&mut self, _sql: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("database connection lost");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for MockSessions {
    async fn session(&self) -> anyhow::Result<Box<dyn DbSession>> {
        Ok(Box::new(MockSession {
            fail: self.fail.load(Ordering::SeqCst),
        }))
    }

    async fn reconnect(&self) -> anyhow::Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.heal_on_reconnect.load(Ordering::SeqCst) {
            self.fail.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

pub struct MockMetrics {
    pub cpu: Mutex<f64>,
    pub memory: Mutex<f64>,
    pub disk: Mutex<f64>,
}

impl MockMetrics {
    pub fn quiet() -> Arc<Self> {
        Arc::new(Self {
            cpu: Mutex::new(20.0),
            memory: Mutex::new(30.0),
            disk: Mutex::new(40.0),
        })
    }
}

#[async_trait]
impl SystemMetrics for MockMetrics {
    async fn cpu_percent(&self) -> anyhow::Result<f64> {
        Ok(*self.cpu.lock().unwrap())
    }
    async fn memory_percent(&self) -> anyhow::Result<f64> {
        Ok(*self.memory.lock().unwrap())
    }
    async fn disk_percent(&self) -> anyhow::Result<f64> {
        Ok(*self.disk.lock().unwrap())
    }
}

// ─── Fixture ─────────────────────────────────────────────────────────────────

pub fn job(id: &str, state: JobState, platform: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        state,
        created_at: Utc::now() - Duration::minutes(5),
        platforms: vec![platform.to_string()],
    }
}

pub fn jobs_with_failures(total: usize, failed: usize) -> Vec<JobRecord> {
    (0..total)
        .map(|i| {
            job(
                &format!("job-{i}"),
                if i < failed {
                    JobState::Failed
                } else {
                    JobState::Succeeded
                },
                "youtube",
            )
        })
        .collect()
}

/// A full, healthy set of collaborators plus handles to every mock so tests
/// can flip individual failure modes.
pub struct Mocks {
    pub engine: Arc<MockEngine>,
    pub store: Arc<MockStore>,
    pub adapter: Arc<MockAdapter>,
    pub detector: Arc<MockDetector>,
    pub sessions: Arc<MockSessions>,
    pub metrics: Arc<MockMetrics>,
}

impl Mocks {
    pub fn healthy() -> Self {
        let store = MockStore::with_jobs(jobs_with_failures(10, 0));
        Self {
            engine: MockEngine::running_with_jobs(10),
            store,
            adapter: MockAdapter::ok(),
            detector: Arc::new(MockDetector::default()),
            sessions: Arc::new(MockSessions::default()),
            metrics: MockMetrics::quiet(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        let mut platforms: HashMap<String, Arc<dyn PlatformAdapter>> = HashMap::new();
        platforms.insert("youtube".to_string(), self.adapter.clone());
        Collaborators {
            engine: self.engine.clone(),
            store: self.store.clone(),
            platforms,
            detector: self.detector.clone(),
            sessions: self.sessions.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
