//! The subset of flight-controller protocol messages read by the tabs.
//!
//! Messages are exchanged as decoded, in-memory values. Framing, checksums and
//! the serial transport belong to the link implementation.

use crate::sensors::ActiveSensors;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// Numeric message identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, IntoStaticStr,
)]
#[repr(u16)]
pub enum MspCode {
    #[strum(serialize = "MSP_NAME")]
    Name = 10,
    #[strum(serialize = "MSP_FEATURE_CONFIG")]
    FeatureConfig = 36,
    #[strum(serialize = "MSP_BOARD_ALIGNMENT_CONFIG")]
    BoardAlignmentConfig = 38,
    #[strum(serialize = "MSP_MIXER_CONFIG")]
    MixerConfig = 42,
    #[strum(serialize = "MSP_RX_CONFIG")]
    RxConfig = 44,
    #[strum(serialize = "MSP_CF_SERIAL_CONFIG")]
    CfSerialConfig = 54,
    #[strum(serialize = "MSP_SONAR")]
    Sonar = 58,
    #[strum(serialize = "MSP_ARMING_CONFIG")]
    ArmingConfig = 61,
    #[strum(serialize = "MSP_SET_REBOOT")]
    SetReboot = 68,
    #[strum(serialize = "MSP_ADVANCED_CONFIG")]
    AdvancedConfig = 90,
    #[strum(serialize = "MSP_SENSOR_CONFIG")]
    SensorConfig = 96,
    #[strum(serialize = "MSP_STATUS")]
    Status = 101,
    #[strum(serialize = "MSP_RAW_GPS")]
    RawGps = 106,
    #[strum(serialize = "MSP_ATTITUDE")]
    Attitude = 108,
    #[strum(serialize = "MSP_ANALOG")]
    Analog = 110,
    #[strum(serialize = "MSP_RC_DEADBAND")]
    RcDeadband = 125,
    #[strum(serialize = "MSP_SENSOR_ALIGNMENT")]
    SensorAlignment = 126,
    #[strum(serialize = "MSP_STATUS_EX")]
    StatusEx = 150,
    #[strum(serialize = "MSP_BEEPER_CONFIG")]
    BeeperConfig = 184,
    #[strum(serialize = "MSP_ACC_CALIBRATION")]
    AccCalibration = 205,
    #[strum(serialize = "MSP_MAG_CALIBRATION")]
    MagCalibration = 206,
    #[strum(serialize = "MSP_RESET_CONF")]
    ResetConf = 208,
    #[strum(serialize = "MSP_ACC_TRIM")]
    AccTrim = 240,
    #[strum(serialize = "MSP2_GET_TEXT")]
    GetText = 0x3006,
}

impl MspCode {
    #[must_use]
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Looks a code up by its numeric id.
    #[must_use]
    pub fn from_id(id: u16) -> Option<Self> {
        Self::iter().find(|code| code.id() == id)
    }
}

/// Text slots addressed by `MSP2_GET_TEXT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TextKind {
    PilotName = 1,
    CraftName = 2,
}

/// Reboot targets of `MSP_SET_REBOOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum RebootKind {
    Firmware = 0,
    Bootloader = 1,
    /// Bootloader with the flash target selected.
    BootloaderFlash = 4,
}

/// A request issued over the link.
///
/// Variants carry only the arguments the protocol needs; everything else is
/// implied by the message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    Status,
    StatusEx,
    Attitude,
    Sonar,
    Analog,
    RawGps,
    AccTrim,
    MixerConfig,
    SensorConfig,
    FeatureConfig,
    BeeperConfig,
    BoardAlignmentConfig,
    ArmingConfig,
    RcDeadband,
    SensorAlignment,
    SerialConfig,
    RxConfig,
    AdvancedConfig,
    Name,
    Text(TextKind),
    AccCalibration,
    MagCalibration,
    ResetConf,
    Reboot(RebootKind),
}

impl Request {
    #[must_use]
    pub const fn code(self) -> MspCode {
        match self {
            Self::Status => MspCode::Status,
            Self::StatusEx => MspCode::StatusEx,
            Self::Attitude => MspCode::Attitude,
            Self::Sonar => MspCode::Sonar,
            Self::Analog => MspCode::Analog,
            Self::RawGps => MspCode::RawGps,
            Self::AccTrim => MspCode::AccTrim,
            Self::MixerConfig => MspCode::MixerConfig,
            Self::SensorConfig => MspCode::SensorConfig,
            Self::FeatureConfig => MspCode::FeatureConfig,
            Self::BeeperConfig => MspCode::BeeperConfig,
            Self::BoardAlignmentConfig => MspCode::BoardAlignmentConfig,
            Self::ArmingConfig => MspCode::ArmingConfig,
            Self::RcDeadband => MspCode::RcDeadband,
            Self::SensorAlignment => MspCode::SensorAlignment,
            Self::SerialConfig => MspCode::CfSerialConfig,
            Self::RxConfig => MspCode::RxConfig,
            Self::AdvancedConfig => MspCode::AdvancedConfig,
            Self::Name => MspCode::Name,
            Self::Text(_) => MspCode::GetText,
            Self::AccCalibration => MspCode::AccCalibration,
            Self::MagCalibration => MspCode::MagCalibration,
            Self::ResetConf => MspCode::ResetConf,
            Self::Reboot(_) => MspCode::SetReboot,
        }
    }
}

/// Board status as reported by `MSP_STATUS` and `MSP_STATUS_EX`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub cycle_time: u16,
    pub i2c_errors: u16,
    pub active_sensors: ActiveSensors,
    pub mode_flags: u32,
    pub profile: u8,
    pub cpu_load: u16,
    /// Number of arming-disable bits the firmware reports, sentinel included.
    pub arming_disable_count: u8,
    pub arming_disable_flags: u64,
    /// Degrees Celsius, only sent by newer firmware.
    pub cpu_temp: Option<u16>,
}

/// Device kinematics in degrees, device convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Kinematics {
    #[must_use]
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalogData {
    /// Volts.
    pub voltage: f64,
    pub mah_drawn: u32,
    /// Raw 0..=1023.
    pub rssi: u16,
    /// Amperes.
    pub amperage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsData {
    pub fix: bool,
    pub num_sat: u8,
    /// Degrees * 1e7.
    pub lat: i32,
    /// Degrees * 1e7.
    pub lon: i32,
    pub altitude: i16,
    pub speed: u16,
    pub ground_course: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccTrim {
    pub pitch: i16,
    pub roll: i16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerConfig {
    pub mixer: u8,
    pub reverse_motor_direction: bool,
}

/// Hardware ids per sensor class; index into the sensor name tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub acc_hardware: u8,
    pub baro_hardware: u8,
    pub mag_hardware: u8,
    /// Only reported by firmware with rangefinder support.
    pub sonar_hardware: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeeperConfig {
    pub disabled_mask: u32,
    pub dshot_beacon_tone: u8,
    pub dshot_beacon_disabled_mask: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardAlignment {
    pub roll: i16,
    pub pitch: i16,
    pub yaw: i16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmingConfig {
    pub auto_disarm_delay: u8,
    pub small_angle: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcDeadband {
    pub deadband: u8,
    pub yaw_deadband: u8,
    pub alt_hold_deadband: u8,
    pub throttle_3d_deadband: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorAlignment {
    pub gyro_align: u8,
    pub acc_align: u8,
    pub mag_align: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialPort {
    pub identifier: u8,
    pub functions: u16,
    pub msp_baud_index: u8,
    pub gps_baud_index: u8,
    pub telemetry_baud_index: u8,
    pub blackbox_baud_index: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxConfig {
    pub serialrx_provider: u8,
    pub stick_max: u16,
    pub stick_center: u16,
    pub stick_min: u16,
    pub rx_min_usec: u16,
    pub rx_max_usec: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedConfig {
    pub gyro_sync_denom: u8,
    pub pid_process_denom: u8,
    pub use_unsynced_pwm: bool,
    pub motor_pwm_protocol: u8,
    pub motor_pwm_rate: u16,
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Status(StatusInfo),
    StatusEx(StatusInfo),
    Attitude(Kinematics),
    /// Altitude in centimetres.
    Sonar(i32),
    Analog(AnalogData),
    RawGps(GpsData),
    AccTrim(AccTrim),
    MixerConfig(MixerConfig),
    SensorConfig(SensorConfig),
    /// Enabled-features bitmask.
    FeatureConfig(u32),
    BeeperConfig(BeeperConfig),
    BoardAlignment(BoardAlignment),
    ArmingConfig(ArmingConfig),
    RcDeadband(RcDeadband),
    SensorAlignment(SensorAlignment),
    SerialConfig(Vec<SerialPort>),
    RxConfig(RxConfig),
    AdvancedConfig(AdvancedConfig),
    Name(String),
    Text(TextKind, String),
    /// Commands without payload.
    Ack,
}

impl Reply {
    /// Message code the reply answers, `None` for bare acknowledgements.
    #[must_use]
    pub const fn code(&self) -> Option<MspCode> {
        Some(match self {
            Self::Status(_) => MspCode::Status,
            Self::StatusEx(_) => MspCode::StatusEx,
            Self::Attitude(_) => MspCode::Attitude,
            Self::Sonar(_) => MspCode::Sonar,
            Self::Analog(_) => MspCode::Analog,
            Self::RawGps(_) => MspCode::RawGps,
            Self::AccTrim(_) => MspCode::AccTrim,
            Self::MixerConfig(_) => MspCode::MixerConfig,
            Self::SensorConfig(_) => MspCode::SensorConfig,
            Self::FeatureConfig(_) => MspCode::FeatureConfig,
            Self::BeeperConfig(_) => MspCode::BeeperConfig,
            Self::BoardAlignment(_) => MspCode::BoardAlignmentConfig,
            Self::ArmingConfig(_) => MspCode::ArmingConfig,
            Self::RcDeadband(_) => MspCode::RcDeadband,
            Self::SensorAlignment(_) => MspCode::SensorAlignment,
            Self::SerialConfig(_) => MspCode::CfSerialConfig,
            Self::RxConfig(_) => MspCode::RxConfig,
            Self::AdvancedConfig(_) => MspCode::AdvancedConfig,
            Self::Name(_) => MspCode::Name,
            Self::Text(..) => MspCode::GetText,
            Self::Ack => return None,
        })
    }
}
