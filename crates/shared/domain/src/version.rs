//! Negotiated protocol version and the capability set derived from it.

use bitflags::bitflags;
use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// First version reporting `CRASH_DETECTED`, `REBOOT_REQUIRED` and `DSHOT_BITBANG`.
pub const API_VERSION_1_42: ProtocolVersion = ProtocolVersion::new(1, 42, 0);
/// First version reporting the accelerometer-calibration and throw/catapult disable flags.
pub const API_VERSION_1_43: ProtocolVersion = ProtocolVersion::new(1, 43, 0);
/// Craft and pilot names move from `MSP_NAME` to `MSP2_GET_TEXT`.
pub const API_VERSION_1_45: ProtocolVersion = ProtocolVersion::new(1, 45, 0);
/// Rangefinder hardware and CPU temperature become available.
pub const API_VERSION_1_46: ProtocolVersion = ProtocolVersion::new(1, 46, 0);

/// Protocol version received once per session.
///
/// Ordered with semantic-version rules, so `1.9.0 < 1.10.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(Version);

impl ProtocolVersion {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    #[must_use]
    pub const fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.0.patch
    }

    #[must_use]
    pub fn at_least(&self, threshold: &Self) -> bool {
        self >= threshold
    }
}

impl FromStr for ProtocolVersion {
    type Err = semver::Error;

    /// Accepts full `major.minor.patch` and the `major.minor` form reported by devices.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.split('.').count() == 2 {
            Version::parse(&format!("{trimmed}.0")).map(Self)
        } else {
            Version::parse(trimmed).map(Self)
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Version> for ProtocolVersion {
    fn from(version: Version) -> Self {
        Self(version)
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

bitflags! {
    /// Named protocol features enabled for a session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Capabilities: u32 {
        /// `CRASH_DETECTED`, `REBOOT_REQUIRED`, `DSHOT_BITBANG` disable flags.
        const ARMING_FLAGS_1_42 = 1 << 0;
        /// Accelerometer calibration, motor protocol and throw/catapult disable flags.
        const ARMING_FLAGS_1_43 = 1 << 1;
        /// Legacy backup/restore panel is shown (firmware older than 1.43).
        const LEGACY_BACKUP_RESTORE = 1 << 2;
        /// Craft and pilot names are read with `MSP2_GET_TEXT`.
        const TEXT_NAMES = 1 << 3;
        /// Rangefinder hardware is display-eligible.
        const RANGEFINDER_INFO = 1 << 4;
        /// `MSP_STATUS_EX` carries the CPU temperature.
        const CPU_TEMPERATURE = 1 << 5;
    }
}

impl Serialize for Capabilities {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}
