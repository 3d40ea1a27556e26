//! Version gate: the only place where protocol-version thresholds are compared.

use fcs_domain::version::{
    API_VERSION_1_42, API_VERSION_1_43, API_VERSION_1_45, API_VERSION_1_46, Capabilities,
    ProtocolVersion,
};

/// Threshold at which each capability switches on, or off for inverted ones.
const THRESHOLDS: &[(Capabilities, ProtocolVersion, bool)] = &[
    (Capabilities::ARMING_FLAGS_1_42, API_VERSION_1_42, true),
    (Capabilities::ARMING_FLAGS_1_43, API_VERSION_1_43, true),
    (Capabilities::LEGACY_BACKUP_RESTORE, API_VERSION_1_43, false),
    (Capabilities::TEXT_NAMES, API_VERSION_1_45, true),
    (Capabilities::RANGEFINDER_INFO, API_VERSION_1_46, true),
    (Capabilities::CPU_TEMPERATURE, API_VERSION_1_46, true),
];

#[derive(Debug, Clone, Copy)]
pub struct VersionGate;

impl VersionGate {
    /// Capabilities enabled for a session. Computed once; consumed as data.
    #[must_use]
    pub fn capabilities(version: &ProtocolVersion) -> Capabilities {
        THRESHOLDS.iter().fold(Capabilities::empty(), |caps, (flag, threshold, from_threshold)| {
            if version.at_least(threshold) == *from_threshold { caps | *flag } else { caps }
        })
    }
}
