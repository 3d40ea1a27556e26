//! Values handed to the presentation layer on every poll tick.

use crate::protocol::{Kinematics, RebootKind};
use crate::sensors::SensorClass;
use serde::Serialize;

/// Angles in radians in the convention of the 3D display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DisplayAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Produced by the fast poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttitudeFrame {
    /// Degrees, device convention.
    pub kinematics: Kinematics,
    pub display: DisplayAngles,
    /// Rangefinder altitude in centimetres, when the sensor is present.
    pub sonar_cm: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatteryReading {
    pub voltage: f64,
    pub mah_drawn: u32,
    pub amperage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GpsReading {
    pub fix: bool,
    pub satellites: u8,
    /// Decimal degrees.
    pub latitude: f64,
    pub longitude: f64,
    pub map_link: String,
}

/// Produced by the slow poll (and the status poll of the indi tab).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusFrame {
    pub arming_allowed: bool,
    /// Names of the active arming-disable flags, in bit order.
    pub active_flags: Vec<String>,
    pub battery: Option<BatteryReading>,
    /// Percent of full scale, rounded.
    pub rssi_percent: Option<u8>,
    /// Degrees Celsius.
    pub cpu_temp: Option<u16>,
    pub gps: Option<GpsReading>,
    pub cpu_load: u16,
}

/// Lifecycle and user-action notices published by tabs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TabEvent {
    /// Configuration snapshot complete.
    Ready { tab: &'static str, issued: usize, skipped: usize },
    InitializationFailed { tab: &'static str, step: &'static str },
    PollingStarted { tab: &'static str },
    YawReset { offset: f64 },
    CalibrationStarted { sensor: SensorClass },
    CalibrationFinished { sensor: SensorClass },
    SettingsReset,
    Rebooting { target: RebootKind },
    TornDown { tab: &'static str },
}
