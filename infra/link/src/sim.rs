//! Scripted flight controller for demos and tests.

use crate::error::LinkError;
use crate::transport::{SendFuture, Transport};
use fcs_domain::device::{DeviceInfo, FirmwareInfo};
use fcs_domain::protocol::{
    AccTrim, AdvancedConfig, AnalogData, ArmingConfig, BeeperConfig, BoardAlignment, GpsData,
    Kinematics, MixerConfig, MspCode, RcDeadband, Reply, Request, RxConfig, SensorAlignment,
    SensorConfig, SerialPort, StatusInfo, TextKind,
};
use fcs_domain::sensors::ActiveSensors;
use fcs_domain::version::{API_VERSION_1_45, API_VERSION_1_46, ProtocolVersion};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::trace;

/// Firmware state the simulator answers from.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub api_version: ProtocolVersion,
    pub arming_disable_count: u8,
    pub arming_disable_flags: u64,
    pub active_sensors: ActiveSensors,
    pub sensor_config: SensorConfig,
    pub kinematics: Kinematics,
    pub sonar_cm: i32,
    pub analog: AnalogData,
    pub gps: GpsData,
    pub cpu_temp: u16,
    pub craft_name: String,
    pub pilot_name: String,
    pub firmware: FirmwareInfo,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            api_version: ProtocolVersion::new(1, 46, 0),
            arming_disable_count: 29,
            arming_disable_flags: 0,
            active_sensors: ActiveSensors::ACC | ActiveSensors::GYRO | ActiveSensors::BARO,
            sensor_config: SensorConfig {
                acc_hardware: 18,
                baro_hardware: 4,
                mag_hardware: 1,
                sonar_hardware: Some(0),
            },
            kinematics: Kinematics::default(),
            sonar_cm: 0,
            analog: AnalogData { voltage: 16.4, mah_drawn: 0, rssi: 1023, amperage: 0.4 },
            gps: GpsData::default(),
            cpu_temp: 41,
            craft_name: "SIM".to_owned(),
            pilot_name: String::new(),
            firmware: FirmwareInfo {
                identifier: "BTFL".to_owned(),
                version: "4.5.0".to_owned(),
                build_info: "Jan 1 2026 00:00:00".to_owned(),
                build_key: String::new(),
                build_options: Vec::new(),
            },
        }
    }
}

impl DeviceProfile {
    #[must_use]
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.api_version = version;
        self
    }

    #[must_use]
    pub const fn with_arming_disable_count(mut self, count: u8) -> Self {
        self.arming_disable_count = count;
        self
    }

    #[must_use]
    pub const fn with_sensors(mut self, sensors: ActiveSensors) -> Self {
        self.active_sensors = sensors;
        self
    }
}

/// Injected failure for one message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Never answer; the link deadline fires.
    Silent,
    /// Answer with an error frame.
    Reject,
}

#[derive(Debug, Clone, Copy)]
struct Injected {
    fault: Fault,
    /// Remaining occurrences; `None` fails until healed.
    remaining: Option<u32>,
}

#[derive(Debug)]
struct SimState {
    profile: DeviceProfile,
    log: Vec<MspCode>,
    faults: FxHashMap<MspCode, Injected>,
    latency: Duration,
}

#[derive(Debug)]
struct SimShared {
    state: Mutex<SimState>,
    open: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// In-memory device answering [`Request`]s from a [`DeviceProfile`].
///
/// Cloning yields another handle to the same device, so a test can keep one
/// handle while the [`crate::Link`] owns the other.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    shared: Arc<SimShared>,
}

/// Tracks concurrent `send` calls, including ones abandoned by a timeout.
struct InFlight<'a>(&'a SimShared);

impl<'a> InFlight<'a> {
    fn enter(shared: &'a SimShared) -> Self {
        let now = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(shared)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SimulatedDevice {
    #[must_use]
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            shared: Arc::new(SimShared {
                state: Mutex::new(SimState {
                    profile,
                    log: Vec::new(),
                    faults: FxHashMap::default(),
                    latency: Duration::ZERO,
                }),
                open: AtomicBool::new(true),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Delay before every reply.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        self.shared.state.lock().latency = latency;
    }

    /// Session facts as negotiated on connect.
    #[must_use]
    pub fn info(&self) -> DeviceInfo {
        let state = self.shared.state.lock();
        DeviceInfo {
            api_version: state.profile.api_version.clone(),
            firmware: state.profile.firmware.clone(),
        }
    }

    /// Fails every request with `code` until [`SimulatedDevice::heal`].
    pub fn fail(&self, code: MspCode, fault: Fault) {
        self.shared.state.lock().faults.insert(code, Injected { fault, remaining: None });
    }

    /// Fails the next `times` requests with `code`.
    pub fn fail_times(&self, code: MspCode, fault: Fault, times: u32) {
        if times == 0 {
            self.heal(code);
            return;
        }
        self.shared.state.lock().faults.insert(code, Injected { fault, remaining: Some(times) });
    }

    pub fn heal(&self, code: MspCode) {
        self.shared.state.lock().faults.remove(&code);
    }

    pub fn close(&self) {
        self.shared.open.store(false, Ordering::SeqCst);
    }

    pub fn open(&self) {
        self.shared.open.store(true, Ordering::SeqCst);
    }

    /// Every message received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MspCode> {
        self.shared.state.lock().log.clone()
    }

    #[must_use]
    pub fn count(&self, code: MspCode) -> usize {
        self.shared.state.lock().log.iter().filter(|c| **c == code).count()
    }

    pub fn clear_log(&self) {
        self.shared.state.lock().log.clear();
    }

    /// Highest number of overlapping `send` calls observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    /// Mutates the live profile (attitude, flags, sensors...).
    pub fn update(&self, f: impl FnOnce(&mut DeviceProfile)) {
        f(&mut self.shared.state.lock().profile);
    }

    fn admit(&self, code: MspCode) -> Option<Fault> {
        let mut state = self.shared.state.lock();
        state.log.push(code);
        let injected = state.faults.get_mut(&code)?;
        let fault = injected.fault;
        let exhausted = match &mut injected.remaining {
            Some(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            },
            None => false,
        };
        if exhausted {
            state.faults.remove(&code);
        }
        Some(fault)
    }

    fn respond(&self, request: Request) -> Result<Reply, LinkError> {
        let state = self.shared.state.lock();
        let p = &state.profile;
        let text_names = p.api_version >= API_VERSION_1_45;

        let status = || StatusInfo {
            cycle_time: 125,
            i2c_errors: 0,
            active_sensors: p.active_sensors,
            mode_flags: 0,
            profile: 0,
            cpu_load: 12,
            arming_disable_count: p.arming_disable_count,
            arming_disable_flags: p.arming_disable_flags,
            cpu_temp: (p.api_version >= API_VERSION_1_46).then_some(p.cpu_temp),
        };

        let reply = match request {
            Request::Status => Reply::Status(status()),
            Request::StatusEx => Reply::StatusEx(status()),
            Request::Attitude => Reply::Attitude(p.kinematics),
            Request::Sonar => Reply::Sonar(p.sonar_cm),
            Request::Analog => Reply::Analog(p.analog),
            Request::RawGps => Reply::RawGps(p.gps),
            Request::AccTrim => Reply::AccTrim(AccTrim::default()),
            Request::MixerConfig => Reply::MixerConfig(MixerConfig { mixer: 3, reverse_motor_direction: false }),
            Request::SensorConfig => Reply::SensorConfig(p.sensor_config),
            Request::FeatureConfig => Reply::FeatureConfig(0x3000_0408),
            Request::BeeperConfig => Reply::BeeperConfig(BeeperConfig::default()),
            Request::BoardAlignmentConfig => Reply::BoardAlignment(BoardAlignment::default()),
            Request::ArmingConfig => {
                Reply::ArmingConfig(ArmingConfig { auto_disarm_delay: 5, small_angle: 25 })
            },
            Request::RcDeadband => Reply::RcDeadband(RcDeadband::default()),
            Request::SensorAlignment => Reply::SensorAlignment(SensorAlignment::default()),
            Request::SerialConfig => Reply::SerialConfig(vec![SerialPort {
                identifier: 20,
                functions: 1,
                msp_baud_index: 5,
                ..SerialPort::default()
            }]),
            Request::RxConfig => Reply::RxConfig(RxConfig {
                serialrx_provider: 9,
                stick_max: 1900,
                stick_center: 1500,
                stick_min: 1050,
                rx_min_usec: 885,
                rx_max_usec: 2115,
            }),
            Request::AdvancedConfig => Reply::AdvancedConfig(AdvancedConfig {
                gyro_sync_denom: 1,
                pid_process_denom: 1,
                use_unsynced_pwm: false,
                motor_pwm_protocol: 6,
                motor_pwm_rate: 480,
            }),
            Request::Name => Reply::Name(p.craft_name.clone()),
            Request::Text(kind) if text_names => Reply::Text(
                kind,
                match kind {
                    TextKind::CraftName => p.craft_name.clone(),
                    TextKind::PilotName => p.pilot_name.clone(),
                },
            ),
            Request::Text(_) => {
                return Err(LinkError::Rejected {
                    code: MspCode::GetText,
                    context: Some("unsupported by this firmware".into()),
                });
            },
            Request::AccCalibration
            | Request::MagCalibration
            | Request::ResetConf
            | Request::Reboot(_) => Reply::Ack,
        };

        drop(state);
        Ok(reply)
    }
}

impl Transport for SimulatedDevice {
    fn send(&self, request: Request) -> SendFuture<'_> {
        Box::pin(async move {
            let _in_flight = InFlight::enter(&self.shared);
            let code = request.code();
            trace!(code = %code, "Simulated device received request");

            match self.admit(code) {
                Some(Fault::Silent) => std::future::pending::<()>().await,
                Some(Fault::Reject) => {
                    return Err(LinkError::Rejected { code, context: Some("injected".into()) });
                },
                None => {},
            }

            let latency = self.shared.state.lock().latency;
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            self.respond(request)
        })
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }
}
