use fcs_domain::config::MonitorConfig;
use fcs_domain::protocol::{MspCode, Request, TextKind};
use fcs_domain::telemetry::StatusFrame;
use fcs_domain::version::{API_VERSION_1_45, Capabilities, ProtocolVersion};
use fcs_event_bus::EventBus;
use fcs_indi::{IndiTab, STATUS_POLL};
use fcs_kernel::gate::VersionGate;
use fcs_kernel::lifecycle::{Tab, TabLifecycle};
use fcs_kernel::pipeline::RequestPipeline;
use fcs_link::{DeviceProfile, Link, SimulatedDevice};
use std::time::Duration;
use tokio::time::sleep;

fn lifecycle(profile: DeviceProfile) -> (SimulatedDevice, EventBus, TabLifecycle<IndiTab>) {
    let device = SimulatedDevice::new(profile);
    let link = Link::new(device.clone(), Duration::from_millis(200));
    let bus = EventBus::new();
    let lifecycle =
        TabLifecycle::new(IndiTab::new(), link, device.info(), bus.clone(), MonitorConfig::default());
    (device, bus, lifecycle)
}

fn plan(caps: Capabilities) -> Vec<&'static str> {
    let pipeline: RequestPipeline = IndiTab::new().steps(caps).into_iter().collect();
    pipeline.plan(caps).into_iter().map(|(name, _)| name).collect()
}

#[test]
fn legacy_firmware_reads_the_craft_name_with_msp_name() {
    let caps = VersionGate::capabilities(&ProtocolVersion::new(1, 44, 0));
    let pipeline: RequestPipeline = IndiTab::new().steps(caps).into_iter().collect();
    let plan = pipeline.plan(caps);

    assert_eq!(pipeline.len(), 14);
    assert_eq!(plan.len(), 12);
    assert_eq!(plan[9], ("name", Request::Name));
    assert_eq!(plan[10].0, "rx_config");
    assert!(plan.iter().all(|(_, request)| !matches!(request, Request::Text(_))));
}

#[test]
fn text_names_replace_msp_name_from_1_45() {
    let caps = VersionGate::capabilities(&API_VERSION_1_45);
    let pipeline: RequestPipeline = IndiTab::new().steps(caps).into_iter().collect();
    let plan = pipeline.plan(caps);

    assert_eq!(plan.len(), 13);
    assert!(plan.iter().all(|(name, _)| *name != "name"));
    assert_eq!(plan[9], ("craft_name", Request::Text(TextKind::CraftName)));
    assert_eq!(plan[11], ("pilot_name", Request::Text(TextKind::PilotName)));
    assert_eq!(plan.last().map(|(name, _)| *name), Some("advanced_config"));
}

#[test]
fn shared_steps_keep_their_order_across_versions() {
    let old = plan(Capabilities::empty());
    let new = plan(Capabilities::all());
    let common: Vec<_> = old.iter().filter(|name| new.contains(*name)).collect();
    let expected: Vec<_> = new.iter().filter(|name| old.contains(*name)).collect();
    assert_eq!(common, expected);
    assert_eq!(old[0], "serial_config");
}

#[tokio::test(start_paused = true)]
async fn identity_comes_from_text_names() {
    let (device, _bus, mut lifecycle) = lifecycle(DeviceProfile {
        craft_name: "WING".to_owned(),
        pilot_name: "ace".to_owned(),
        ..DeviceProfile::default()
    });

    let report = lifecycle.initialize().await.unwrap();
    assert_eq!((report.issued, report.skipped), (13, 1));
    assert_eq!(device.count(MspCode::Name), 0);
    assert_eq!(device.count(MspCode::GetText), 2);

    let identity = lifecycle.tab().identity().unwrap();
    assert_eq!(identity.craft_name.as_deref(), Some("WING"));
    assert_eq!(identity.pilot_name.as_deref(), Some("ace"));
    assert_eq!(identity.feature_mask, 0x3000_0408);
    assert_eq!(identity.serial_ports, 1);
}

#[tokio::test(start_paused = true)]
async fn legacy_identity_has_no_pilot_name() {
    let profile = DeviceProfile::default().with_version(ProtocolVersion::new(1, 44, 0));
    let (device, _bus, mut lifecycle) = lifecycle(profile);

    lifecycle.initialize().await.unwrap();
    assert_eq!(device.count(MspCode::Name), 1);
    assert_eq!(device.count(MspCode::GetText), 0);

    let identity = lifecycle.tab().identity().unwrap();
    assert_eq!(identity.craft_name.as_deref(), Some("SIM"));
    assert_eq!(identity.pilot_name, None);
}

#[tokio::test(start_paused = true)]
async fn status_poll_publishes_arming_state() {
    let (device, bus, mut lifecycle) = lifecycle(DeviceProfile {
        arming_disable_flags: 1 << 1,
        ..DeviceProfile::default()
    });
    lifecycle.initialize().await.unwrap();
    assert_eq!(lifecycle.scheduler().names(), [STATUS_POLL.to_owned()]);

    sleep(Duration::from_millis(10)).await;
    let frame = bus.latest::<StatusFrame>().unwrap();
    assert_eq!(frame.active_flags, ["FAILSAFE"]);
    assert!(frame.battery.is_none());
    assert!(frame.gps.is_none());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(device.count(MspCode::Status), 3);

    lifecycle.cleanup();
    assert!(lifecycle.tab().identity().is_none());
    sleep(Duration::from_millis(500)).await;
    assert_eq!(device.count(MspCode::Status), 3);
}
