//! Sensor hardware names.
//!
//! Tables follow the firmware's hardware enums. Ids 0 and 1 are `DEFAULT` and
//! `NONE` and are never displayed; callers guard with [`is_displayable`].

use fcs_domain::protocol::SensorConfig;
use fcs_domain::sensors::{ActiveSensors, SensorClass};
use fcs_domain::version::Capabilities;
use serde::Serialize;
use std::borrow::Cow;

const ACCELEROMETERS: &[&str] = &[
    "DEFAULT", "NONE", "ADXL345", "MPU6050", "MMA8452", "BMA280", "LSM303DLHC", "MPU6000",
    "MPU6500", "MPU9250", "ICM20601", "ICM20602", "ICM20608G", "ICM20649", "ICM20689",
    "ICM42605", "ICM42688P", "BMI160", "BMI270", "LSM6DSO", "VIRTUAL",
];

const BAROMETERS: &[&str] = &[
    "DEFAULT", "NONE", "BMP085", "MS5611", "BMP280", "LPS", "QMP6988", "BMP388", "DPS310",
    "2SMPB_02B", "VIRTUAL",
];

const MAGNETOMETERS: &[&str] =
    &["DEFAULT", "NONE", "HMC5883", "AK8975", "AK8963", "QMC5883", "LIS3MDL", "MPU925X_AK8963"];

// The rangefinder enum has no DEFAULT entry; the `> 1` guard still applies.
const RANGEFINDERS: &[&str] = &["NONE", "HCSR04", "TFMINI", "TF02"];

/// First id eligible for display.
const FIRST_DISPLAYED_ID: u8 = 2;

#[fcs_derive::fcs_error]
pub enum LookupError {
    #[error("No {class} with hardware id {id}{}", format_context(.context))]
    OutOfRange { class: SensorClass, id: u8, context: Option<Cow<'static, str>> },
}

#[must_use]
pub const fn table(class: SensorClass) -> &'static [&'static str] {
    match class {
        SensorClass::Accelerometer => ACCELEROMETERS,
        SensorClass::Barometer => BAROMETERS,
        SensorClass::Magnetometer => MAGNETOMETERS,
        SensorClass::Rangefinder => RANGEFINDERS,
    }
}

/// Hardware name for an id.
///
/// # Errors
/// [`LookupError::OutOfRange`] for ids past the end of the class table.
pub fn resolve(class: SensorClass, id: u8) -> Result<&'static str, LookupError> {
    table(class)
        .get(usize::from(id))
        .copied()
        .ok_or(LookupError::OutOfRange { class, id, context: None })
}

/// Whether a sensor line should be shown: real hardware id, sensor detected,
/// and for the rangefinder, firmware that reports it.
#[must_use]
pub fn is_displayable(class: SensorClass, id: u8, caps: Capabilities, active: ActiveSensors) -> bool {
    if class == SensorClass::Rangefinder && !caps.contains(Capabilities::RANGEFINDER_INFO) {
        return false;
    }
    id >= FIRST_DISPLAYED_ID && active.contains(class.presence())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorLabel {
    pub class: SensorClass,
    pub hardware: &'static str,
}

impl SensorLabel {
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}: {}", self.class.short_label(), self.hardware)
    }
}

/// Sensor summary in display order: accelerometer, barometer, magnetometer, rangefinder.
///
/// Ids that pass the display guard but are unknown to the table are skipped.
#[must_use]
pub fn describe(active: ActiveSensors, config: &SensorConfig, caps: Capabilities) -> Vec<SensorLabel> {
    let ids = [
        (SensorClass::Accelerometer, Some(config.acc_hardware)),
        (SensorClass::Barometer, Some(config.baro_hardware)),
        (SensorClass::Magnetometer, Some(config.mag_hardware)),
        (SensorClass::Rangefinder, config.sonar_hardware),
    ];

    ids.into_iter()
        .filter_map(|(class, id)| id.map(|id| (class, id)))
        .filter(|&(class, id)| is_displayable(class, id, caps, active))
        .filter_map(|(class, id)| resolve(class, id).ok().map(|hardware| SensorLabel { class, hardware }))
        .collect()
}

/// `"Accel: BMI270, Baro: BMP280"` style summary.
#[must_use]
pub fn summary(labels: &[SensorLabel]) -> String {
    labels.iter().map(SensorLabel::render).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: ActiveSensors = ActiveSensors::all();

    #[test]
    fn test_resolve_known_ids() {
        assert_eq!(resolve(SensorClass::Accelerometer, 18).unwrap(), "BMI270");
        assert_eq!(resolve(SensorClass::Barometer, 9).unwrap(), "2SMPB_02B");
        assert_eq!(resolve(SensorClass::Magnetometer, 7).unwrap(), "MPU925X_AK8963");
        assert_eq!(resolve(SensorClass::Rangefinder, 3).unwrap(), "TF02");
    }

    #[test]
    fn test_resolve_out_of_range_is_an_error() {
        let err = resolve(SensorClass::Magnetometer, 8).unwrap_err();
        assert!(matches!(err, LookupError::OutOfRange { class: SensorClass::Magnetometer, id: 8, .. }));
        assert!(resolve(SensorClass::Accelerometer, u8::MAX).is_err());
    }

    #[test]
    fn test_default_and_none_are_never_displayed() {
        for id in [0, 1] {
            assert!(!is_displayable(SensorClass::Accelerometer, id, Capabilities::all(), ALL));
        }
        assert!(is_displayable(SensorClass::Accelerometer, 2, Capabilities::all(), ALL));
    }

    #[test]
    fn test_rangefinder_needs_capability_and_presence() {
        let caps = Capabilities::RANGEFINDER_INFO;
        assert!(is_displayable(SensorClass::Rangefinder, 2, caps, ALL));
        assert!(!is_displayable(SensorClass::Rangefinder, 2, Capabilities::empty(), ALL));
        assert!(!is_displayable(SensorClass::Rangefinder, 2, caps, ActiveSensors::ACC));
    }

    #[test]
    fn test_describe_keeps_display_order_and_skips_absent_sensors() {
        let config = SensorConfig {
            acc_hardware: 18,
            baro_hardware: 4,
            mag_hardware: 1,
            sonar_hardware: Some(2),
        };
        let active = ActiveSensors::ACC | ActiveSensors::BARO | ActiveSensors::SONAR;

        let labels = describe(active, &config, Capabilities::RANGEFINDER_INFO);
        assert_eq!(summary(&labels), "Accel: BMI270, Baro: BMP280, Sonar: TFMINI");

        let older = describe(active, &config, Capabilities::empty());
        assert_eq!(summary(&older), "Accel: BMI270, Baro: BMP280");
    }

    #[test]
    fn test_describe_skips_ids_unknown_to_the_table() {
        let config = SensorConfig { acc_hardware: 200, ..SensorConfig::default() };
        assert!(describe(ALL, &config, Capabilities::all()).is_empty());
    }
}
