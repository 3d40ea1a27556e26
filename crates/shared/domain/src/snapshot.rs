use crate::protocol::{
    AccTrim, AdvancedConfig, ArmingConfig, BeeperConfig, BoardAlignment, MixerConfig, RcDeadband,
    Reply, RxConfig, SensorAlignment, SensorConfig, SerialPort, StatusInfo, TextKind,
};
use serde::Serialize;
use std::collections::BTreeMap;
use strum_macros::{Display, IntoStaticStr};

/// Configuration items tracked by the snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, IntoStaticStr, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfigItem {
    Status,
    AccTrim,
    MixerConfig,
    SensorConfig,
    FeatureConfig,
    BeeperConfig,
    BoardAlignment,
    ArmingConfig,
    RcDeadband,
    SensorAlignment,
    SerialConfig,
    RxConfig,
    AdvancedConfig,
    CraftName,
    PilotName,
}

impl ConfigItem {
    /// Item a reply lands in. Live telemetry and acknowledgements are not configuration.
    #[must_use]
    pub const fn of(reply: &Reply) -> Option<Self> {
        Some(match reply {
            Reply::Status(_) | Reply::StatusEx(_) => Self::Status,
            Reply::AccTrim(_) => Self::AccTrim,
            Reply::MixerConfig(_) => Self::MixerConfig,
            Reply::SensorConfig(_) => Self::SensorConfig,
            Reply::FeatureConfig(_) => Self::FeatureConfig,
            Reply::BeeperConfig(_) => Self::BeeperConfig,
            Reply::BoardAlignment(_) => Self::BoardAlignment,
            Reply::ArmingConfig(_) => Self::ArmingConfig,
            Reply::RcDeadband(_) => Self::RcDeadband,
            Reply::SensorAlignment(_) => Self::SensorAlignment,
            Reply::SerialConfig(_) => Self::SerialConfig,
            Reply::RxConfig(_) => Self::RxConfig,
            Reply::AdvancedConfig(_) => Self::AdvancedConfig,
            Reply::Name(_) | Reply::Text(TextKind::CraftName, _) => Self::CraftName,
            Reply::Text(TextKind::PilotName, _) => Self::PilotName,
            Reply::Attitude(_)
            | Reply::Sonar(_)
            | Reply::Analog(_)
            | Reply::RawGps(_)
            | Reply::Ack => return None,
        })
    }
}

/// Configuration read during tab initialization.
///
/// Built incrementally, one reply at a time. It counts as complete only once
/// [`ConfigSnapshot::seal`] has been called after every step succeeded; until
/// then consumers must not read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    items: BTreeMap<ConfigItem, Reply>,
    complete: bool,
}

impl ConfigSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a reply, replacing any previous value for the same item.
    ///
    /// Returns the item written, or `None` for replies that carry no configuration.
    pub fn apply(&mut self, reply: Reply) -> Option<ConfigItem> {
        let item = ConfigItem::of(&reply)?;
        self.items.insert(item, reply);
        Some(item)
    }

    pub const fn seal(&mut self) {
        self.complete = true;
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn contains(&self, item: ConfigItem) -> bool {
        self.items.contains_key(&item)
    }

    #[must_use]
    pub fn get(&self, item: ConfigItem) -> Option<&Reply> {
        self.items.get(&item)
    }

    pub fn items(&self) -> impl Iterator<Item = ConfigItem> + '_ {
        self.items.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn status(&self) -> Option<&StatusInfo> {
        match self.get(ConfigItem::Status)? {
            Reply::Status(status) | Reply::StatusEx(status) => Some(status),
            _ => None,
        }
    }

    #[must_use]
    pub fn acc_trim(&self) -> Option<&AccTrim> {
        match self.get(ConfigItem::AccTrim)? {
            Reply::AccTrim(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn mixer_config(&self) -> Option<&MixerConfig> {
        match self.get(ConfigItem::MixerConfig)? {
            Reply::MixerConfig(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn sensor_config(&self) -> Option<&SensorConfig> {
        match self.get(ConfigItem::SensorConfig)? {
            Reply::SensorConfig(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn feature_mask(&self) -> Option<u32> {
        match self.get(ConfigItem::FeatureConfig)? {
            Reply::FeatureConfig(mask) => Some(*mask),
            _ => None,
        }
    }

    #[must_use]
    pub fn beeper_config(&self) -> Option<&BeeperConfig> {
        match self.get(ConfigItem::BeeperConfig)? {
            Reply::BeeperConfig(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn board_alignment(&self) -> Option<&BoardAlignment> {
        match self.get(ConfigItem::BoardAlignment)? {
            Reply::BoardAlignment(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn arming_config(&self) -> Option<&ArmingConfig> {
        match self.get(ConfigItem::ArmingConfig)? {
            Reply::ArmingConfig(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn rc_deadband(&self) -> Option<&RcDeadband> {
        match self.get(ConfigItem::RcDeadband)? {
            Reply::RcDeadband(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn sensor_alignment(&self) -> Option<&SensorAlignment> {
        match self.get(ConfigItem::SensorAlignment)? {
            Reply::SensorAlignment(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn serial_ports(&self) -> Option<&[SerialPort]> {
        match self.get(ConfigItem::SerialConfig)? {
            Reply::SerialConfig(ports) => Some(ports),
            _ => None,
        }
    }

    #[must_use]
    pub fn rx_config(&self) -> Option<&RxConfig> {
        match self.get(ConfigItem::RxConfig)? {
            Reply::RxConfig(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn advanced_config(&self) -> Option<&AdvancedConfig> {
        match self.get(ConfigItem::AdvancedConfig)? {
            Reply::AdvancedConfig(v) => Some(v),
            _ => None,
        }
    }

    /// Craft name, from `MSP_NAME` on older firmware or the text slot on newer.
    #[must_use]
    pub fn craft_name(&self) -> Option<&str> {
        match self.get(ConfigItem::CraftName)? {
            Reply::Name(name) | Reply::Text(_, name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn pilot_name(&self) -> Option<&str> {
        match self.get(ConfigItem::PilotName)? {
            Reply::Text(_, name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Kinematics;

    #[test]
    fn test_status_and_status_ex_share_an_item() {
        let mut snapshot = ConfigSnapshot::new();
        let status = StatusInfo { arming_disable_count: 20, ..StatusInfo::default() };
        assert_eq!(snapshot.apply(Reply::Status(status.clone())), Some(ConfigItem::Status));
        let newer = StatusInfo { cpu_load: 12, ..status };
        snapshot.apply(Reply::StatusEx(newer));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.status().map(|s| s.cpu_load), Some(12));
    }

    #[test]
    fn test_telemetry_is_not_configuration() {
        let mut snapshot = ConfigSnapshot::new();
        assert_eq!(snapshot.apply(Reply::Attitude(Kinematics::default())), None);
        assert_eq!(snapshot.apply(Reply::Ack), None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_names_resolve_from_either_message() {
        let mut legacy = ConfigSnapshot::new();
        legacy.apply(Reply::Name("whoop".into()));
        assert_eq!(legacy.craft_name(), Some("whoop"));

        let mut modern = ConfigSnapshot::new();
        modern.apply(Reply::Text(TextKind::CraftName, "cine".into()));
        modern.apply(Reply::Text(TextKind::PilotName, "ada".into()));
        assert_eq!(modern.craft_name(), Some("cine"));
        assert_eq!(modern.pilot_name(), Some("ada"));
    }

    #[test]
    fn test_seal_marks_complete() {
        let mut snapshot = ConfigSnapshot::new();
        assert!(!snapshot.is_complete());
        snapshot.apply(Reply::FeatureConfig(0b101));
        snapshot.seal();
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.feature_mask(), Some(5));
    }
}
