use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{Display, EnumIter, IntoStaticStr};

bitflags! {
    /// Sensors the device reports as detected (`activeSensors` in `MSP_STATUS`).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ActiveSensors: u16 {
        const ACC = 1 << 0;
        const BARO = 1 << 1;
        const MAG = 1 << 2;
        const GPS = 1 << 3;
        const SONAR = 1 << 4;
        const GYRO = 1 << 5;
    }
}

impl From<u16> for ActiveSensors {
    fn from(bits: u16) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl Serialize for ActiveSensors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(self.bits())
    }
}

impl<'de> Deserialize<'de> for ActiveSensors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// Sensor classes with a hardware name table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorClass {
    Accelerometer,
    Barometer,
    Magnetometer,
    Rangefinder,
}

impl SensorClass {
    /// Bit in [`ActiveSensors`] that must be set for the class to be shown.
    #[must_use]
    pub const fn presence(self) -> ActiveSensors {
        match self {
            Self::Accelerometer => ActiveSensors::ACC,
            Self::Barometer => ActiveSensors::BARO,
            Self::Magnetometer => ActiveSensors::MAG,
            Self::Rangefinder => ActiveSensors::SONAR,
        }
    }

    /// Short label used in the sensor summary line.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Accelerometer => "Accel",
            Self::Barometer => "Baro",
            Self::Magnetometer => "Mag",
            Self::Rangefinder => "Sonar",
        }
    }
}
