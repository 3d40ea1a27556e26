use fcs_domain::protocol::{MspCode, Reply, Request, TextKind};
use fcs_domain::version::ProtocolVersion;
use fcs_link::{DeviceProfile, Fault, Link, LinkError, SimulatedDevice};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(200);

fn connect(profile: DeviceProfile) -> (SimulatedDevice, Link) {
    let device = SimulatedDevice::new(profile).with_latency(Duration::from_millis(5));
    let link = Link::new(device.clone(), TIMEOUT);
    (device, link)
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_are_serialized() {
    let (device, link) = connect(DeviceProfile::default());

    let mut handles = Vec::new();
    for request in [Request::Attitude, Request::StatusEx, Request::Analog, Request::Sonar] {
        let link = link.clone();
        handles.push(tokio::spawn(async move { link.call(request).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(device.max_in_flight(), 1);
    assert_eq!(device.calls().len(), 4);
    assert_eq!(link.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn silent_device_times_out_and_recovers() {
    let (device, link) = connect(DeviceProfile::default());
    device.fail_times(MspCode::Attitude, Fault::Silent, 1);

    let err = link.call(Request::Attitude).await.unwrap_err();
    assert!(matches!(err, LinkError::Timeout { code: MspCode::Attitude, .. }));
    assert_eq!(err.code(), Some(MspCode::Attitude));

    let reply = link.call(Request::Attitude).await.unwrap();
    assert!(matches!(reply, Reply::Attitude(_)));
    assert_eq!(link.failures(), 1);
}

#[tokio::test(start_paused = true)]
async fn text_slots_need_newer_firmware() {
    let (_, old) = connect(DeviceProfile::default().with_version(ProtocolVersion::new(1, 44, 0)));
    let err = old.call(Request::Text(TextKind::CraftName)).await.unwrap_err();
    assert!(matches!(err, LinkError::Rejected { code: MspCode::GetText, .. }));
    assert!(matches!(old.call(Request::Name).await.unwrap(), Reply::Name(_)));

    let (_, new) = connect(DeviceProfile::default().with_version(ProtocolVersion::new(1, 45, 0)));
    let reply = new.call(Request::Text(TextKind::CraftName)).await.unwrap();
    assert_eq!(reply, Reply::Text(TextKind::CraftName, "SIM".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn closed_device_reports_not_ready() {
    let (device, link) = connect(DeviceProfile::default());
    device.close();

    assert!(!link.is_ready());
    assert!(matches!(link.call(Request::Status).await, Err(LinkError::Closed { .. })));
    assert!(device.calls().is_empty());

    device.open();
    assert!(link.is_ready());
}

#[tokio::test(start_paused = true)]
async fn cpu_temperature_follows_firmware_version() {
    let (_, old) = connect(DeviceProfile::default().with_version(ProtocolVersion::new(1, 45, 0)));
    let Reply::StatusEx(status) = old.call(Request::StatusEx).await.unwrap() else {
        panic!("expected status");
    };
    assert_eq!(status.cpu_temp, None);

    let (_, new) = connect(DeviceProfile::default());
    let Reply::StatusEx(status) = new.call(Request::StatusEx).await.unwrap() else {
        panic!("expected status");
    };
    assert_eq!(status.cpu_temp, Some(41));
}
