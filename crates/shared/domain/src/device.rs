use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};

const CLOUD_BUILD_ROOT: &str = "https://build.betaflight.com/api/builds";
const BUILD_KEY_LEN: usize = 32;

/// Session facts negotiated when the link opens. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub api_version: ProtocolVersion,
    pub firmware: FirmwareInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareInfo {
    pub identifier: String,
    pub version: String,
    pub build_info: String,
    /// Cloud build key; only 32-character keys identify a cloud build.
    pub build_key: String,
    pub build_options: Vec<String>,
}

/// Links to a cloud build's configuration and log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildLinks {
    pub config: String,
    pub log: String,
}

impl FirmwareInfo {
    #[must_use]
    pub fn build_links(&self) -> Option<BuildLinks> {
        if self.build_key.len() != BUILD_KEY_LEN {
            return None;
        }
        let root = format!("{CLOUD_BUILD_ROOT}/{}", self.build_key);
        Some(BuildLinks { config: format!("{root}/json"), log: format!("{root}/log") })
    }
}
