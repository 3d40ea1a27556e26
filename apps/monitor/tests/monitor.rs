use fcs::domain::config::MonitorConfig;
use fcs::domain::protocol::MspCode;
use fcs_monitor::{Monitor, TabKind};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn setup_run_polls_calibrates_and_tears_down() {
    let monitor = Monitor::new(MonitorConfig::default()).unwrap();

    let summary = monitor.run(TabKind::Setup, Duration::from_secs(3)).await.unwrap();
    assert!(summary.attitude_frames > 0);
    assert!(summary.status_frames > 0);
    assert!(summary.calibrated);
    assert!(summary.events >= 3, "ready, polling started and calibration started");
    assert_eq!(monitor.device().count(MspCode::AccCalibration), 1);

    // Ticks already waiting for the link may still complete.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let polled = monitor.device().count(MspCode::Attitude);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(monitor.device().count(MspCode::Attitude), polled);
}

#[tokio::test(start_paused = true)]
async fn indi_run_polls_status_only() {
    let monitor = Monitor::new(MonitorConfig::default()).unwrap();

    let summary = monitor.run(TabKind::Indi, Duration::from_secs(1)).await.unwrap();
    assert!(summary.status_frames > 0);
    assert_eq!(summary.attitude_frames, 0);
    assert!(!summary.calibrated);
    assert_eq!(monitor.device().count(MspCode::Attitude), 0);
    assert!(monitor.device().count(MspCode::Status) >= 4);
}

#[test]
fn invalid_simulator_version_is_rejected() {
    let mut config = MonitorConfig::default();
    config.simulator.api_version = "one.two".to_owned();

    let err = Monitor::new(config).unwrap_err();
    assert!(err.to_string().contains("Invalid simulator API version"));
}
