//! Arming-disable flag names and bitmask decoding.
//!
//! The name table mirrors the firmware's `armingDisableFlags_e` enum and is kept
//! as data: a base list valid for the oldest supported firmware plus revisions
//! that splice or append names when a capability is enabled. Bit positions come
//! from the resulting order, except the last bit reported by the device, which is
//! always [`SENTINEL`].

use crate::gate::VersionGate;
use fcs_domain::version::{Capabilities, ProtocolVersion};
use serde::Serialize;
use std::borrow::Cow;

/// Set whenever any other flag blocks arming; always the highest reported bit.
pub const SENTINEL: &str = "ARM_SWITCH";

/// Where a revision places a new name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Immediately before an existing name.
    Before(&'static str),
    /// After every name known so far.
    Append,
}

/// Names introduced together by one firmware generation.
#[derive(Debug, Clone, Copy)]
pub struct Revision {
    pub requires: Capabilities,
    pub names: &'static [(&'static str, Placement)],
}

/// Firmware names in bit order for the oldest supported API version.
pub const BASE_FLAGS: &[&str] = &[
    "NO_GYRO",
    "FAILSAFE",
    "RX_FAILSAFE",
    "BAD_RX_RECOVERY",
    "BOXFAILSAFE",
    "RUNAWAY_TAKEOFF",
    "THROTTLE",
    "ANGLE",
    "BOOT_GRACE_TIME",
    "NOPREARM",
    "LOAD",
    "CALIBRATING",
    "CLI",
    "CMS_MENU",
    "BST",
    "MSP",
    "PARALYZE",
    "GPS",
    "RESC",
    "RPMFILTER",
];

/// Firmware additions, applied in order when their capability is enabled.
pub const REVISIONS: &[Revision] = &[
    Revision {
        requires: Capabilities::ARMING_FLAGS_1_42,
        names: &[
            ("CRASH_DETECTED", Placement::Before("THROTTLE")),
            ("REBOOT_REQUIRED", Placement::Append),
            ("DSHOT_BITBANG", Placement::Append),
        ],
    },
    Revision {
        requires: Capabilities::ARMING_FLAGS_1_43,
        names: &[
            ("ACC_CALIBRATION", Placement::Append),
            ("MOTOR_PROTOCOL", Placement::Append),
            ("WAITING_FOR_THROW", Placement::Append),
            ("THROW_NOT_READY", Placement::Append),
            ("CATAPULT_NOT_READY", Placement::Append),
            ("NN_MODE", Placement::Append),
        ],
    },
];

/// Known names for a capability set, sentinel excluded.
#[must_use]
pub fn known_flags(caps: Capabilities) -> Vec<&'static str> {
    let mut names = BASE_FLAGS.to_vec();
    for revision in REVISIONS.iter().filter(|r| caps.contains(r.requires)) {
        for &(name, placement) in revision.names {
            match placement {
                Placement::Before(anchor) => {
                    let at = names.iter().position(|n| *n == anchor).unwrap_or(names.len());
                    names.insert(at, name);
                },
                Placement::Append => names.push(name),
            }
        }
    }
    names
}

/// Ordered flag names for a session; position is the bit index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisableFlagSet {
    names: Vec<Cow<'static, str>>,
}

/// Builds the flag table for `version` with exactly `count` entries.
#[must_use]
pub fn build_flag_names(version: &ProtocolVersion, count: usize) -> DisableFlagSet {
    DisableFlagSet::for_capabilities(VersionGate::capabilities(version), count)
}

impl DisableFlagSet {
    /// Positions past the known table get their 1-based position as label.
    #[must_use]
    pub fn for_capabilities(caps: Capabilities, count: usize) -> Self {
        let known = known_flags(caps);
        let names = (0..count)
            .map(|i| {
                if i + 1 == count {
                    Cow::Borrowed(SENTINEL)
                } else if let Some(name) = known.get(i) {
                    Cow::Borrowed(*name)
                } else {
                    Cow::Owned((i + 1).to_string())
                }
            })
            .collect();
        Self { names }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn name(&self, bit: usize) -> Option<&str> {
        self.names.get(bit).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(AsRef::as_ref)
    }

    /// Flags whose bit is set. Bits beyond the table, or beyond 63, are ignored.
    #[must_use]
    pub fn decode(&self, bitmask: u64) -> ActiveFlags {
        let flags = self
            .names
            .iter()
            .enumerate()
            .take(u64::BITS as usize)
            .filter(|(bit, _)| (bitmask >> bit) & 1 == 1)
            .map(|(bit, name)| ActiveFlag { bit, name: name.clone() })
            .collect();
        ActiveFlags { flags }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFlag {
    pub bit: usize,
    pub name: Cow<'static, str>,
}

/// Result of [`DisableFlagSet::decode`], in bit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveFlags {
    flags: Vec<ActiveFlag>,
}

impl ActiveFlags {
    /// No flag set: arming is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveFlag> {
        self.flags.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.flags.iter().map(|f| f.name.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ProtocolVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_crash_detected_is_spliced_before_throttle() {
        let set = build_flag_names(&v("1.42.0"), 25);
        assert_eq!(set.position("CRASH_DETECTED"), Some(6));
        assert_eq!(set.position("THROTTLE"), Some(7));
        assert_eq!(set.name(21), Some("REBOOT_REQUIRED"));
        assert_eq!(set.name(22), Some("DSHOT_BITBANG"));
        assert_eq!(set.name(23), Some("24"));
        assert_eq!(set.name(24), Some(SENTINEL));
    }

    #[test]
    fn test_newest_table_has_every_known_name() {
        let caps = Capabilities::ARMING_FLAGS_1_42 | Capabilities::ARMING_FLAGS_1_43;
        let known = known_flags(caps);
        assert_eq!(known.len(), 29);
        assert_eq!(known.last(), Some(&"NN_MODE"));

        let set = DisableFlagSet::for_capabilities(caps, 30);
        assert_eq!(set.name(28), Some("NN_MODE"));
        assert_eq!(set.name(29), Some(SENTINEL));
    }

    #[test]
    fn test_short_count_truncates_and_keeps_sentinel_last() {
        let set = build_flag_names(&v("1.43.0"), 4);
        let names: Vec<_> = set.iter().collect();
        assert_eq!(names, ["NO_GYRO", "FAILSAFE", "RX_FAILSAFE", SENTINEL]);
    }

    #[test]
    fn test_zero_and_single_counts() {
        assert!(build_flag_names(&v("1.46.0"), 0).is_empty());
        let single = build_flag_names(&v("1.46.0"), 1);
        assert_eq!(single.iter().collect::<Vec<_>>(), [SENTINEL]);
    }

    #[test]
    fn test_decode_reports_bits_in_order() {
        let set = build_flag_names(&v("1.41.0"), 20);
        let active = set.decode(0b101 | (1 << 19));
        assert_eq!(active.names(), ["NO_GYRO", "RX_FAILSAFE", SENTINEL]);
        assert_eq!(active.iter().map(|f| f.bit).collect::<Vec<_>>(), [0, 2, 19]);
    }

    #[test]
    fn test_decode_ignores_bits_beyond_the_table() {
        let set = build_flag_names(&v("1.41.0"), 20);
        assert!(set.decode(1 << 40).is_empty());
    }

    #[test]
    fn test_wide_tables_ignore_bits_past_63() {
        let set = build_flag_names(&v("1.46.0"), 70);
        assert_eq!(set.len(), 70);
        assert_eq!(set.name(64), Some("65"));
        assert!(set.decode(u64::MAX).len() == 64);
        assert!(!set.decode(u64::MAX).contains(SENTINEL));
    }
}
