//! Device attitude to 3D display angles.

use fcs_domain::protocol::Kinematics;
use fcs_domain::telemetry::DisplayAngles;

pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Maps device degrees to display radians.
///
/// The display's yaw runs opposite to the compass heading and its roll axis is
/// mirrored, so both are negated; `yaw_offset` is added after negation.
#[must_use]
pub fn to_display_angles(kinematics: &Kinematics, yaw_offset: f64) -> DisplayAngles {
    DisplayAngles {
        x: kinematics.pitch * DEG2RAD,
        y: (-kinematics.yaw - yaw_offset) * DEG2RAD,
        z: -kinematics.roll * DEG2RAD,
    }
}

/// Yaw offset applied to the displayed model for one tab instance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    yaw_offset: f64,
}

impl Orientation {
    #[must_use]
    pub const fn new() -> Self {
        Self { yaw_offset: 0.0 }
    }

    /// Starts from an offset carried over from a previous instance.
    #[must_use]
    pub const fn with_offset(yaw_offset: f64) -> Self {
        Self { yaw_offset }
    }

    #[must_use]
    pub const fn yaw_offset(&self) -> f64 {
        self.yaw_offset
    }

    /// Makes the current heading display as zero yaw.
    pub const fn set_yaw_offset(&mut self, current_yaw: f64) {
        self.yaw_offset = -current_yaw;
    }

    #[must_use]
    pub fn display(&self, kinematics: &Kinematics) -> DisplayAngles {
        to_display_angles(kinematics, self.yaw_offset)
    }
}
