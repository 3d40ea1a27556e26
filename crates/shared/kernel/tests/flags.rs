use fcs_domain::protocol::Request;
use fcs_domain::snapshot::ConfigSnapshot;
use fcs_domain::version::ProtocolVersion;
use fcs_kernel::flags::{BASE_FLAGS, Placement, REVISIONS, SENTINEL, build_flag_names, known_flags};
use fcs_kernel::gate::VersionGate;
use fcs_kernel::lifecycle::SessionEpoch;
use fcs_kernel::pipeline::{RequestPipeline, Step};
use fcs_link::{DeviceProfile, Link, SimulatedDevice};
use proptest::prelude::*;
use std::time::Duration;

/// Reads the flag count from a simulated device and builds its table.
async fn table_from_device(version: ProtocolVersion, count: u8) -> Vec<String> {
    let device = SimulatedDevice::new(
        DeviceProfile::default().with_version(version.clone()).with_arming_disable_count(count),
    );
    let link = Link::new(device, Duration::from_millis(100));
    let caps = VersionGate::capabilities(&version);

    let mut snapshot = ConfigSnapshot::new();
    RequestPipeline::new(vec![Step::read("status_ex", Request::StatusEx)])
        .run(&link, caps, &mut snapshot, &SessionEpoch::new().guard())
        .await
        .unwrap();

    let reported = snapshot.status().unwrap().arming_disable_count;
    build_flag_names(&version, reported.into()).iter().map(str::to_owned).collect()
}

#[tokio::test]
async fn old_firmware_has_no_crash_detected_flag() {
    let names = table_from_device(ProtocolVersion::new(1, 41, 0), 20).await;
    assert_eq!(names.len(), 20);
    assert!(!names.iter().any(|n| n == "CRASH_DETECTED"));
    assert_eq!(names[19], SENTINEL);
    assert_eq!(names[6], "THROTTLE");
}

#[tokio::test]
async fn newer_firmware_splices_crash_detected() {
    let names = table_from_device(ProtocolVersion::new(1, 42, 0), 20).await;
    assert_eq!(names.len(), 20);
    assert_eq!(names[6], "CRASH_DETECTED");
    assert_eq!(names[7], "THROTTLE");
    assert_eq!(names[19], SENTINEL);
}

#[test]
fn revisions_anchor_on_known_names_and_never_repeat_them() {
    let mut known: Vec<&str> = BASE_FLAGS.to_vec();
    for revision in REVISIONS {
        for &(name, placement) in revision.names {
            if let Placement::Before(anchor) = placement {
                assert!(known.contains(&anchor), "{name} anchors on unknown {anchor}");
            }
            assert!(!known.contains(&name), "{name} listed twice");
            assert_ne!(name, SENTINEL);
            known.push(name);
        }
    }
}

fn version() -> impl Strategy<Value = ProtocolVersion> {
    (40u64..48, 0u64..3).prop_map(|(minor, patch)| ProtocolVersion::new(1, minor, patch))
}

proptest! {
    #[test]
    fn table_length_matches_count_and_sentinel_is_last(v in version(), count in 1usize..80) {
        let set = build_flag_names(&v, count);
        prop_assert_eq!(set.len(), count);
        prop_assert_eq!(set.name(count - 1), Some(SENTINEL));
        prop_assert_eq!(set.iter().filter(|n| *n == SENTINEL).count(), 1);
    }

    #[test]
    fn newer_tables_extend_older_ones(a in version(), b in version(), count in 30usize..64) {
        let (old, new) = if a <= b { (a, b) } else { (b, a) };
        let old_set = build_flag_names(&old, count);
        let new_set = build_flag_names(&new, count);
        let known = known_flags(VersionGate::capabilities(&old));

        let positions: Vec<usize> = known
            .iter()
            .map(|name| new_set.position(name))
            .collect::<Option<_>>()
            .ok_or_else(|| TestCaseError::fail("a known flag disappeared"))?;
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]), "relative order changed");
        prop_assert_eq!(old_set.name(count - 1), new_set.name(count - 1));
    }

    #[test]
    fn decode_is_deterministic(v in version(), count in 1usize..64, mask in any::<u64>()) {
        let set = build_flag_names(&v, count);
        prop_assert_eq!(set.decode(mask), set.decode(mask));
        prop_assert!(set.decode(0).is_empty());

        let sentinel_only = set.decode(1u64 << (count - 1));
        prop_assert_eq!(sentinel_only.names(), vec![SENTINEL.to_owned()]);
    }

    #[test]
    fn decoded_flags_are_exactly_the_set_bits(v in version(), count in 1usize..64, mask in any::<u64>()) {
        let set = build_flag_names(&v, count);
        let active = set.decode(mask);
        let expected = (0..count).filter(|bit| (mask >> bit) & 1 == 1).count();
        prop_assert_eq!(active.len(), expected);
        prop_assert!(active.iter().all(|flag| set.name(flag.bit) == Some(&*flag.name)));
    }
}
