use fcs_domain::protocol::{MspCode, Request, TextKind};
use fcs_domain::snapshot::{ConfigItem, ConfigSnapshot};
use fcs_domain::version::{Capabilities, ProtocolVersion};
use fcs_kernel::gate::VersionGate;
use fcs_kernel::lifecycle::SessionEpoch;
use fcs_kernel::pipeline::{PipelineError, RequestPipeline, Step};
use fcs_link::{DeviceProfile, Fault, Link, LinkError, SimulatedDevice};
use std::time::Duration;
use tokio::time::sleep;

fn connect(version: ProtocolVersion, latency_ms: u64) -> (SimulatedDevice, Link) {
    let device = SimulatedDevice::new(DeviceProfile::default().with_version(version))
        .with_latency(Duration::from_millis(latency_ms));
    let link = Link::new(device.clone(), Duration::from_millis(200));
    (device, link)
}

fn names_pipeline() -> RequestPipeline {
    RequestPipeline::new(vec![
        Step::read("acc_trim", Request::AccTrim),
        Step::read("mixer_config", Request::MixerConfig),
        Step::gated("name", Capabilities::TEXT_NAMES, None, Some(Request::Name)),
        Step::gated(
            "craft_name",
            Capabilities::TEXT_NAMES,
            Some(Request::Text(TextKind::CraftName)),
            None,
        ),
        Step::read("sensor_config", Request::SensorConfig),
    ])
}

#[tokio::test(start_paused = true)]
async fn steps_run_in_order_one_at_a_time() {
    let version = ProtocolVersion::new(1, 44, 0);
    let (device, link) = connect(version.clone(), 5);
    let caps = VersionGate::capabilities(&version);
    let epoch = SessionEpoch::new();
    let mut snapshot = ConfigSnapshot::new();

    let report = names_pipeline().run(&link, caps, &mut snapshot, &epoch.guard()).await.unwrap();

    assert_eq!(report.issued, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        device.calls(),
        [MspCode::AccTrim, MspCode::MixerConfig, MspCode::Name, MspCode::SensorConfig]
    );
    assert_eq!(device.max_in_flight(), 1);
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.craft_name(), Some("SIM"));
}

#[tokio::test(start_paused = true)]
async fn newer_firmware_substitutes_the_text_request() {
    let version = ProtocolVersion::new(1, 45, 0);
    let (device, link) = connect(version.clone(), 0);
    let caps = VersionGate::capabilities(&version);
    let mut snapshot = ConfigSnapshot::new();

    let pipeline = names_pipeline();
    let report = pipeline.run(&link, caps, &mut snapshot, &SessionEpoch::new().guard()).await.unwrap();

    assert!(report.issued + report.skipped == pipeline.len());
    assert_eq!(device.count(MspCode::Name), 0);
    assert_eq!(device.count(MspCode::GetText), 1);
    assert!(snapshot.contains(ConfigItem::CraftName));
}

#[tokio::test(start_paused = true)]
async fn first_failure_aborts_and_names_the_step() {
    let version = ProtocolVersion::new(1, 46, 0);
    let (device, link) = connect(version.clone(), 1);
    device.fail(MspCode::MixerConfig, Fault::Reject);
    let mut snapshot = ConfigSnapshot::new();

    let err = names_pipeline()
        .run(&link, VersionGate::capabilities(&version), &mut snapshot, &SessionEpoch::new().guard())
        .await
        .unwrap_err();

    assert_eq!(err.step(), "mixer_config");
    assert!(matches!(err, PipelineError::Transport { source: LinkError::Rejected { .. }, .. }));
    assert_eq!(device.calls(), [MspCode::AccTrim, MspCode::MixerConfig]);
    assert!(!snapshot.is_complete());
    assert!(snapshot.contains(ConfigItem::AccTrim));
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_the_step_without_retry() {
    let version = ProtocolVersion::new(1, 46, 0);
    let (device, link) = connect(version.clone(), 1);
    device.fail(MspCode::SensorConfig, Fault::Silent);
    let mut snapshot = ConfigSnapshot::new();

    let err = names_pipeline()
        .run(&link, VersionGate::capabilities(&version), &mut snapshot, &SessionEpoch::new().guard())
        .await
        .unwrap_err();

    assert_eq!(err.step(), "sensor_config");
    assert!(matches!(err, PipelineError::Transport { source: LinkError::Timeout { .. }, .. }));
    assert_eq!(device.count(MspCode::SensorConfig), 1);
}

#[tokio::test(start_paused = true)]
async fn reply_arriving_after_teardown_is_not_applied() {
    let version = ProtocolVersion::new(1, 46, 0);
    let (device, link) = connect(version.clone(), 50);
    let epoch = SessionEpoch::new();
    let guard = epoch.guard();
    let mut snapshot = ConfigSnapshot::new();
    let pipeline = names_pipeline();

    let (result, ()) = tokio::join!(
        pipeline.run(&link, VersionGate::capabilities(&version), &mut snapshot, &guard),
        async {
            sleep(Duration::from_millis(20)).await;
            epoch.advance();
        }
    );

    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled { step: "acc_trim", .. }));
    assert!(snapshot.is_empty());
    assert!(!snapshot.is_complete());
    assert_eq!(device.calls(), [MspCode::AccTrim]);
}

#[tokio::test(start_paused = true)]
async fn expired_guard_issues_nothing() {
    let version = ProtocolVersion::new(1, 46, 0);
    let (device, link) = connect(version.clone(), 0);
    let epoch = SessionEpoch::new();
    let guard = epoch.guard();
    epoch.advance();

    let mut snapshot = ConfigSnapshot::new();
    let err = names_pipeline()
        .run(&link, VersionGate::capabilities(&version), &mut snapshot, &guard)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { .. }));
    assert!(device.calls().is_empty());
}
