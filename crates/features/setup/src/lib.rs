//! Setup tab: live attitude, arming status, battery and GPS, the sensor
//! summary, firmware facts, and the calibration, reset and reboot actions.
//!
//! Configuration is read in four steps (`acc_trim`, `status_ex`, `mixer_config`,
//! `sensor_config`); afterwards two poll tasks run until the tab is cleaned up:
//!
//! * [`FAST_POLL`] every 33 ms: attitude, plus the rangefinder when present.
//! * [`SLOW_POLL`] every 250 ms: arming flags, battery, RSSI, CPU temperature, GPS.

mod actions;
mod error;
mod polls;

pub use crate::actions::{reboot_to_bootloader, reset_settings};
pub use crate::error::{SetupError, SetupErrorExt};

use fcs_domain::device::BuildLinks;
use fcs_domain::protocol::{Kinematics, Request};
use fcs_domain::sensors::ActiveSensors;
use fcs_domain::telemetry::TabEvent;
use fcs_domain::version::Capabilities;
use fcs_kernel::lifecycle::{AttitudeModel, Tab, TabContext, TabError};
use fcs_kernel::orientation::Orientation;
use fcs_kernel::pipeline::Step;
use fcs_kernel::sensors::{self, SensorLabel};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const TAB_NAME: &str = "setup";
pub const FAST_POLL: &str = "setup_data_pull_fast";
pub const SLOW_POLL: &str = "setup_data_pull_slow";
/// One-shot that ends an accelerometer calibration.
pub const ACCEL_RESET: &str = "button_reset";
/// One-shot that ends a magnetometer calibration.
pub const MAG_RESET: &str = "mag_button_reset";

/// Creates a fresh 3D model for each session.
pub type ModelFactory = Box<dyn Fn() -> Arc<dyn AttitudeModel> + Send + Sync>;

/// Firmware facts shown next to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareSummary {
    pub api_version: String,
    pub build_info: String,
    pub build_links: Option<BuildLinks>,
    pub build_options: Vec<String>,
    /// Firmware old enough for the legacy backup/restore panel.
    pub legacy_backup_restore: bool,
}

/// State shared between the tab, its poll callbacks and the user actions.
#[derive(Debug, Default)]
struct Shared {
    orientation: Orientation,
    kinematics: Kinematics,
    accel_calibrating: bool,
    mag_calibrating: bool,
}

pub struct SetupTab {
    shared: Arc<Mutex<Shared>>,
    carried_yaw_offset: f64,
    model_factory: Option<ModelFactory>,
    model: Option<Arc<dyn AttitudeModel>>,
    sensors: Vec<SensorLabel>,
    firmware: Option<FirmwareSummary>,
}

impl fmt::Debug for SetupTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupTab")
            .field("shared", &self.shared)
            .field("carried_yaw_offset", &self.carried_yaw_offset)
            .field("has_model", &self.model.is_some())
            .field("sensors", &self.sensors)
            .field("firmware", &self.firmware)
            .finish_non_exhaustive()
    }
}

impl Default for SetupTab {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupTab {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            carried_yaw_offset: 0.0,
            model_factory: None,
            model: None,
            sensors: Vec::new(),
            firmware: None,
        }
    }

    /// Renders attitude on models built by `factory`, one per session.
    #[must_use]
    pub fn with_model(mut self, factory: ModelFactory) -> Self {
        self.model_factory = Some(factory);
        self
    }

    /// Starts every session with this yaw offset instead of zero.
    #[must_use]
    pub const fn with_yaw_offset(mut self, yaw_offset: f64) -> Self {
        self.carried_yaw_offset = yaw_offset;
        self
    }

    /// Sensor lines of the running session, in display order.
    #[must_use]
    pub fn sensors(&self) -> &[SensorLabel] {
        &self.sensors
    }

    /// `"Accel: BMI270, Baro: BMP280"`.
    #[must_use]
    pub fn sensor_summary(&self) -> String {
        sensors::summary(&self.sensors)
    }

    #[must_use]
    pub const fn firmware(&self) -> Option<&FirmwareSummary> {
        self.firmware.as_ref()
    }

    #[must_use]
    pub fn yaw_offset(&self) -> f64 {
        self.shared.lock().orientation.yaw_offset()
    }

    #[must_use]
    pub fn is_calibrating(&self) -> bool {
        let shared = self.shared.lock();
        shared.accel_calibrating || shared.mag_calibrating
    }

    /// Makes the current heading the displayed zero.
    ///
    /// Returns the new offset in degrees.
    pub fn reset_yaw(&self, ctx: &TabContext) -> f64 {
        let offset = {
            let mut shared = self.shared.lock();
            let yaw = shared.kinematics.yaw;
            shared.orientation.set_yaw_offset(yaw);
            shared.orientation.yaw_offset()
        };
        debug!(offset, "Yaw reset");
        ctx.emit(TabEvent::YawReset { offset });
        offset
    }
}

impl Tab for SetupTab {
    fn name(&self) -> &'static str {
        TAB_NAME
    }

    fn steps(&self, _caps: Capabilities) -> Vec<Step> {
        vec![
            Step::read("acc_trim", Request::AccTrim),
            Step::read("status_ex", Request::StatusEx),
            Step::read("mixer_config", Request::MixerConfig),
            Step::read("sensor_config", Request::SensorConfig),
        ]
    }

    fn activate(&mut self, ctx: &TabContext) -> Result<(), TabError> {
        let snapshot = ctx.snapshot();
        let active = snapshot.status().map_or_else(ActiveSensors::empty, |s| s.active_sensors);

        self.sensors = snapshot
            .sensor_config()
            .map(|config| sensors::describe(active, config, ctx.caps()))
            .unwrap_or_default();

        let device = ctx.device();
        self.firmware = Some(FirmwareSummary {
            api_version: device.api_version.to_string(),
            build_info: device.firmware.build_info.clone(),
            build_links: device.firmware.build_links(),
            build_options: device.firmware.build_options.clone(),
            legacy_backup_restore: ctx.caps().contains(Capabilities::LEGACY_BACKUP_RESTORE),
        });

        {
            let mut shared = self.shared.lock();
            *shared = Shared {
                orientation: Orientation::with_offset(self.carried_yaw_offset),
                ..Shared::default()
            };
        }

        self.model = self.model_factory.as_ref().map(|factory| factory());
        debug!(sensors = %self.sensor_summary(), has_model = self.model.is_some(), "Setup tab activated");

        polls::register(ctx, &self.shared, self.model.clone(), active)
    }

    fn deactivate(&mut self) {
        if let Some(model) = self.model.take() {
            model.dispose();
        }
        let mut shared = self.shared.lock();
        shared.accel_calibrating = false;
        shared.mag_calibrating = false;
    }
}
