//! Integration tests for the monitoring cycle and lifecycle.
//! All collaborators are mocks — no scheduler service or database needed.

mod support;

use std::sync::atomic::Ordering;
use std::time::Duration;

use schedwatch::health::checks;
use schedwatch::{HealthMonitor, HealthStatus, MonitorConfig};
use support::Mocks;

const ALL_COMPONENTS: [&str; 7] = [
    checks::SCHEDULER,
    checks::JOB_EXECUTION,
    checks::PLATFORM_CONNECTIVITY,
    checks::RESOURCE_USAGE,
    checks::SCHEDULE_CONFLICTS,
    checks::DATABASE,
    checks::JOB_STORE,
];

#[tokio::test]
async fn test_summary_is_unknown_before_first_cycle() {
    let mocks = Mocks::healthy();
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    let summary = monitor.health_summary().await;
    assert_eq!(summary.overall, HealthStatus::Unknown);
    assert!(summary.components.is_empty());
    assert!(summary.last_check_at.is_none());
    assert_eq!(summary.cycles_completed, 0);
}

#[tokio::test]
async fn test_healthy_cycle_reports_all_seven_components() {
    let mocks = Mocks::healthy();
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.run_once().await;

    let summary = monitor.health_summary().await;
    assert_eq!(summary.overall, HealthStatus::Healthy);
    assert!(summary.is_healthy());
    assert_eq!(summary.components.len(), 7);
    for component in ALL_COMPONENTS {
        let check = summary
            .components
            .get(component)
            .unwrap_or_else(|| panic!("missing component {component}"));
        assert_eq!(check.status, HealthStatus::Healthy, "{component}");
    }
    assert!(summary.last_check_at.is_some());
    assert_eq!(summary.cycles_completed, 1);
    assert_eq!(monitor.history_len().await, 7);
}

#[tokio::test]
async fn test_one_critical_component_makes_overall_critical() {
    let mocks = Mocks::healthy();
    mocks.engine.running.store(false, Ordering::SeqCst);
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.run_once().await;

    let summary = monitor.health_summary().await;
    assert_eq!(summary.overall, HealthStatus::Critical);
    assert_eq!(
        summary.components[checks::SCHEDULER].status,
        HealthStatus::Critical
    );
    // The other six still reported.
    assert_eq!(summary.components.len(), 7);
}

#[tokio::test]
async fn test_failing_collaborator_never_aborts_the_cycle() {
    let mocks = Mocks::healthy();
    mocks.store.fail.store(true, Ordering::SeqCst);
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.run_once().await;

    let summary = monitor.health_summary().await;
    // Store-backed checks went critical, but every component still reported.
    assert_eq!(summary.components.len(), 7);
    assert_eq!(
        summary.components[checks::JOB_EXECUTION].status,
        HealthStatus::Critical
    );
    assert!(summary.components[checks::JOB_EXECUTION]
        .details
        .contains_key("error"));
    // Checks with healthy collaborators are unaffected.
    assert_eq!(
        summary.components[checks::DATABASE].status,
        HealthStatus::Healthy
    );
    assert_eq!(
        summary.components[checks::RESOURCE_USAGE].status,
        HealthStatus::Healthy
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_platform_probe_times_out_as_critical() {
    let mocks = Mocks::healthy();
    *mocks.adapter.delay.lock().unwrap() = Some(Duration::from_secs(3600));
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.run_once().await;

    let summary = monitor.health_summary().await;
    let platform = &summary.components[checks::PLATFORM_CONNECTIVITY];
    assert_eq!(platform.status, HealthStatus::Critical);
    assert_eq!(platform.message, "check timed out");
    // The stuck probe did not stall the others.
    assert_eq!(summary.components.len(), 7);
    assert_eq!(
        summary.components[checks::SCHEDULER].status,
        HealthStatus::Healthy
    );
}

#[tokio::test]
async fn test_history_stays_bounded() {
    let mocks = Mocks::healthy();
    let config = MonitorConfig {
        history_capacity: 10,
        ..Default::default()
    };
    let monitor = HealthMonitor::new(config, mocks.collaborators());

    for _ in 0..3 {
        monitor.run_once().await;
    }

    // 21 results produced, capacity 10.
    assert_eq!(monitor.history_len().await, 10);
    let recent = monitor.recent_history(100).await;
    assert_eq!(recent.len(), 10);
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let mocks = Mocks::healthy();
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.start_monitoring().await;
    monitor.start_monitoring().await; // no-op

    // First cycle runs immediately on start.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let summary = monitor.health_summary().await;
    assert!(summary.cycles_completed >= 1);
    // Two starts did not double the loop: one cycle per interval tick.
    assert_eq!(summary.cycles_completed, 1);

    monitor.stop_monitoring().await.unwrap();
    monitor.stop_monitoring().await.unwrap(); // no-op
}

#[tokio::test]
async fn test_stop_waits_for_cycle_no_partial_history() {
    let mocks = Mocks::healthy();
    // Slow platform probe keeps the first cycle in flight while we stop.
    *mocks.adapter.delay.lock().unwrap() = Some(Duration::from_millis(300));
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.start_monitoring().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.stop_monitoring().await.unwrap();

    // The in-flight cycle finished before stop returned: the whole cycle is
    // in history, never a fragment.
    let summary = monitor.health_summary().await;
    assert_eq!(summary.cycles_completed, 1);
    assert_eq!(monitor.history_len().await % 7, 0);
    assert_eq!(monitor.history_len().await, 7);
}

#[tokio::test]
async fn test_monitor_restarts_after_stop() {
    let mocks = Mocks::healthy();
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());

    monitor.start_monitoring().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.stop_monitoring().await.unwrap();

    monitor.start_monitoring().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.stop_monitoring().await.unwrap();

    // History survives the restart (not reset on start).
    let summary = monitor.health_summary().await;
    assert_eq!(summary.cycles_completed, 2);
    assert_eq!(monitor.history_len().await, 14);
}

#[tokio::test]
async fn test_summary_serializes_for_presentation_layers() {
    let mocks = Mocks::healthy();
    let monitor = HealthMonitor::new(MonitorConfig::default(), mocks.collaborators());
    monitor.run_once().await;

    let summary = monitor.health_summary().await;
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["overall"], "healthy");
    assert!(json["components"][checks::DATABASE]["details"]["latency_ms"].is_number());
    assert_eq!(json["failure_counts"]["job_execution"], 0);
}
