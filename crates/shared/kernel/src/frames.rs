//! Builders for the frames published on every poll tick.

use crate::flags::DisableFlagSet;
use fcs_domain::protocol::{AnalogData, GpsData, StatusInfo};
use fcs_domain::telemetry::{BatteryReading, GpsReading, StatusFrame};
use fcs_domain::version::Capabilities;

/// Full scale of the raw RSSI channel.
const RSSI_FULL_SCALE: f64 = 1023.0;

/// Fixed-point scale of GPS coordinates.
const COORDINATE_SCALE: f64 = 10_000_000.0;

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rssi_percent(raw: u16) -> u8 {
    (f64::from(raw) / RSSI_FULL_SCALE * 100.0).round().clamp(0.0, 100.0) as u8
}

#[must_use]
pub fn gps_reading(gps: &GpsData) -> GpsReading {
    let latitude = f64::from(gps.lat) / COORDINATE_SCALE;
    let longitude = f64::from(gps.lon) / COORDINATE_SCALE;
    GpsReading {
        fix: gps.fix,
        satellites: gps.num_sat,
        latitude,
        longitude,
        map_link: format!("https://maps.google.com/?q={latitude},{longitude}"),
    }
}

/// Status frame from one round of status, analog and GPS replies.
///
/// The CPU temperature is reported only when the session supports it and the
/// device sent a non-zero reading.
#[must_use]
pub fn status_frame(
    flags: &DisableFlagSet,
    caps: Capabilities,
    status: &StatusInfo,
    analog: Option<&AnalogData>,
    gps: Option<&GpsData>,
) -> StatusFrame {
    let active = flags.decode(status.arming_disable_flags);
    StatusFrame {
        arming_allowed: status.arming_disable_flags == 0,
        active_flags: active.names(),
        battery: analog.map(|a| BatteryReading {
            voltage: a.voltage,
            mah_drawn: a.mah_drawn,
            amperage: a.amperage,
        }),
        rssi_percent: analog.map(|a| rssi_percent(a.rssi)),
        cpu_temp: status
            .cpu_temp
            .filter(|t| *t > 0 && caps.contains(Capabilities::CPU_TEMPERATURE)),
        gps: gps.map(gps_reading),
        cpu_load: status.cpu_load,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rssi_is_rounded_percent() {
        assert_eq!(rssi_percent(0), 0);
        assert_eq!(rssi_percent(512), 50);
        assert_eq!(rssi_percent(1023), 100);
        assert_eq!(rssi_percent(u16::MAX), 100);
    }

    #[test]
    fn test_gps_coordinates_are_scaled() {
        let reading = gps_reading(&GpsData {
            fix: true,
            num_sat: 9,
            lat: 504_500_000,
            lon: 305_230_000,
            ..GpsData::default()
        });
        assert!((reading.latitude - 50.45).abs() < 1e-9);
        assert!((reading.longitude - 30.523).abs() < 1e-9);
        assert_eq!(reading.map_link, "https://maps.google.com/?q=50.45,30.523");
    }

    #[test]
    fn test_status_frame_decodes_flags_and_gates_temperature() {
        let flags = DisableFlagSet::for_capabilities(Capabilities::empty(), 20);
        let status = StatusInfo {
            arming_disable_flags: (1 << 1) | (1 << 19),
            cpu_temp: Some(45),
            cpu_load: 7,
            ..StatusInfo::default()
        };

        let frame = status_frame(&flags, Capabilities::empty(), &status, None, None);
        assert!(!frame.arming_allowed);
        assert_eq!(frame.active_flags, ["FAILSAFE", "ARM_SWITCH"]);
        assert_eq!(frame.cpu_temp, None);
        assert_eq!(frame.battery, None);

        let frame = status_frame(&flags, Capabilities::CPU_TEMPERATURE, &status, None, None);
        assert_eq!(frame.cpu_temp, Some(45));
    }
}
