//! Demo driver: runs one tab against a scripted flight controller and logs what
//! it publishes until the run time is over.

mod cli;

pub use crate::cli::{Args, TabKind};

use anyhow::{Context, ensure};
use fcs::domain::config::MonitorConfig;
use fcs::domain::protocol::Kinematics;
use fcs::domain::telemetry::{AttitudeFrame, StatusFrame, TabEvent};
use fcs::domain::version::ProtocolVersion;
use fcs::events::{EventBus, EventReceiverExt};
use fcs::kernel::lifecycle::{Tab, TabLifecycle};
use fcs::link::{DeviceProfile, Link, SimulatedDevice};
use fcs::tabs::indi::IndiTab;
use fcs::tabs::setup::SetupTab;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// What a run observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attitude_frames: usize,
    pub status_frames: usize,
    pub events: usize,
    pub calibrated: bool,
}

#[derive(Debug)]
pub struct Monitor {
    config: MonitorConfig,
    device: SimulatedDevice,
    bus: EventBus,
}

impl Monitor {
    /// Builds the scripted device described by the `simulator` settings.
    ///
    /// # Errors
    /// Fails when the configured API version does not parse.
    pub fn new(config: MonitorConfig) -> anyhow::Result<Self> {
        let sim = &config.simulator;
        let version: ProtocolVersion = sim
            .api_version
            .parse()
            .with_context(|| format!("Invalid simulator API version: {}", sim.api_version))?;
        let profile = DeviceProfile::default()
            .with_version(version)
            .with_arming_disable_count(sim.arming_disable_count);
        let device = SimulatedDevice::new(profile).with_latency(Duration::from_millis(sim.latency_ms));
        debug!(version = %sim.api_version, latency_ms = sim.latency_ms, "Simulated device ready");

        Ok(Self { config, device, bus: EventBus::new() })
    }

    #[must_use]
    pub const fn device(&self) -> &SimulatedDevice {
        &self.device
    }

    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn lifecycle<T: Tab>(&self, tab: T) -> TabLifecycle<T> {
        let link = Link::new(self.device.clone(), self.config.link.timeout());
        TabLifecycle::new(tab, link, self.device.info(), self.bus.clone(), self.config.clone())
    }

    /// Runs `tab` for `duration`, then tears it down.
    ///
    /// # Errors
    /// Fails when the tab is not compiled in or does not initialize.
    #[instrument(skip(self))]
    pub async fn run(&self, tab: TabKind, duration: Duration) -> anyhow::Result<RunSummary> {
        ensure!(fcs::tabs::is_enabled(tab.name()), "Tab {} is not part of this build", tab.name());

        let watch = FrameWatch::new(&self.bus)?;
        match tab {
            TabKind::Setup => self.run_setup(watch, duration).await,
            TabKind::Indi => self.run_indi(watch, duration).await,
        }
    }

    async fn run_setup(&self, watch: FrameWatch, duration: Duration) -> anyhow::Result<RunSummary> {
        let mut lifecycle = self.lifecycle(SetupTab::new());
        let report = lifecycle.initialize().await.context("Setup tab failed to initialize")?;
        let tab = lifecycle.tab();
        info!(issued = report.issued, sensors = %tab.sensor_summary(), "Setup tab running");
        if let Some(firmware) = tab.firmware() {
            info!(api = %firmware.api_version, build = %firmware.build_info, "Firmware");
        }

        let ctx = lifecycle.context().cloned().context("Setup tab has no session")?;
        let calibrate = async {
            sleep(duration / 3).await;
            match tab.calibrate_accelerometer(&ctx).await {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "Calibration not started");
                    false
                },
            }
        };

        let (summary, calibrated) = tokio::join!(watch.run(duration), calibrate);
        lifecycle.cleanup();
        Ok(RunSummary { calibrated, ..summary })
    }

    async fn run_indi(&self, watch: FrameWatch, duration: Duration) -> anyhow::Result<RunSummary> {
        let mut lifecycle = self.lifecycle(IndiTab::new());
        let report = lifecycle.initialize().await.context("Indi tab failed to initialize")?;
        if let Some(identity) = lifecycle.tab().identity() {
            info!(
                issued = report.issued,
                skipped = report.skipped,
                craft = identity.craft_name.as_deref().unwrap_or_default(),
                pilot = identity.pilot_name.as_deref().unwrap_or_default(),
                "Indi tab running"
            );
        }

        let summary = watch.run(duration).await;
        lifecycle.cleanup();
        Ok(summary)
    }
}

/// Receivers for everything a tab publishes.
struct FrameWatch {
    attitude: watch::Receiver<Arc<AttitudeFrame>>,
    status: watch::Receiver<Arc<StatusFrame>>,
    events: broadcast::Receiver<Arc<TabEvent>>,
}

impl FrameWatch {
    fn new(bus: &EventBus) -> anyhow::Result<Self> {
        Ok(Self {
            attitude: bus.subscribe_watch(AttitudeFrame::default())?,
            status: bus.subscribe_watch(StatusFrame::default())?,
            events: bus.subscribe()?,
        })
    }

    async fn run(mut self, duration: Duration) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut deadline = pin!(sleep(duration));

        loop {
            tokio::select! {
                () = &mut deadline => break,
                Some(frame) = EventReceiverExt::recv(&mut self.attitude) => {
                    summary.attitude_frames += 1;
                    let Kinematics { roll, pitch, yaw } = frame.kinematics;
                    debug!(roll, pitch, yaw, sonar_cm = frame.sonar_cm, "Attitude");
                },
                Some(frame) = EventReceiverExt::recv(&mut self.status) => {
                    summary.status_frames += 1;
                    info!(
                        arming_allowed = frame.arming_allowed,
                        flags = ?frame.active_flags,
                        rssi = frame.rssi_percent,
                        cpu_temp = frame.cpu_temp,
                        "Status"
                    );
                },
                Some(event) = EventReceiverExt::recv(&mut self.events) => {
                    summary.events += 1;
                    info!(event = ?event, "Tab event");
                },
            }
        }
        summary
    }
}
