//! User actions of the setup tab.
//!
//! The accelerometer calibration locks the flight controller in a busy loop, so
//! the fast poll is paused while it runs and resumed by a one-shot timer once the
//! settle time has passed. The magnetometer calibration needs the craft to be
//! rotated while telemetry keeps flowing, so nothing is paused.

use crate::error::SetupError;
use crate::{ACCEL_RESET, FAST_POLL, MAG_RESET, SetupTab, Shared};
use fcs_domain::protocol::{RebootKind, Request};
use fcs_domain::sensors::{ActiveSensors, SensorClass};
use fcs_domain::telemetry::TabEvent;
use fcs_kernel::lifecycle::{TabContext, TabLifecycle, TabState};
use fcs_kernel::pipeline::PipelineReport;
use fcs_scheduler::PollSpec;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

fn calibrating(shared: &mut Shared, sensor: SensorClass) -> &mut bool {
    match sensor {
        SensorClass::Magnetometer => &mut shared.mag_calibrating,
        _ => &mut shared.accel_calibrating,
    }
}

impl SetupTab {
    /// Starts an accelerometer calibration.
    ///
    /// # Errors
    /// [`SetupError::SensorAbsent`] without an accelerometer,
    /// [`SetupError::CalibrationRunning`] while the previous one settles, or the
    /// failure of the calibration request. The fast poll is resumed on failure.
    #[instrument(skip_all)]
    pub async fn calibrate_accelerometer(&self, ctx: &TabContext) -> Result<(), SetupError> {
        self.calibrate(ctx, SensorClass::Accelerometer).await
    }

    /// Starts a magnetometer calibration.
    ///
    /// # Errors
    /// Same as [`SetupTab::calibrate_accelerometer`].
    #[instrument(skip_all)]
    pub async fn calibrate_magnetometer(&self, ctx: &TabContext) -> Result<(), SetupError> {
        self.calibrate(ctx, SensorClass::Magnetometer).await
    }

    async fn calibrate(&self, ctx: &TabContext, sensor: SensorClass) -> Result<(), SetupError> {
        let (request, timer, settle, pauses_polling) = match sensor {
            SensorClass::Magnetometer => {
                (Request::MagCalibration, MAG_RESET, ctx.config().calibration.mag_settle(), false)
            },
            _ => (Request::AccCalibration, ACCEL_RESET, ctx.config().calibration.accel_settle(), true),
        };

        let active = ctx.snapshot().status().map_or_else(ActiveSensors::empty, |s| s.active_sensors);
        if !active.contains(sensor.presence()) {
            return Err(SetupError::SensorAbsent { sensor, context: None });
        }

        {
            let mut shared = self.shared.lock();
            let running = calibrating(&mut shared, sensor);
            if *running {
                return Err(SetupError::CalibrationRunning { sensor, context: None });
            }
            *running = true;
        }

        if pauses_polling {
            ctx.scheduler().pause(FAST_POLL);
        }

        match ctx.request(request).await {
            Ok(Some(_)) => {},
            Ok(None) => {
                finish(ctx, &self.shared, sensor, pauses_polling);
                return Err(SetupError::NotRunning { state: TabState::TornDown, context: None });
            },
            Err(err) => {
                warn!(%sensor, error = %err, "Calibration request failed");
                finish(ctx, &self.shared, sensor, pauses_polling);
                return Err(err.into());
            },
        }

        info!(%sensor, settle_ms = settle.as_millis(), "Calibration started");
        ctx.emit(TabEvent::CalibrationStarted { sensor });

        if let Err(err) = schedule_finish(ctx, &self.shared, sensor, timer, settle, pauses_polling) {
            finish(ctx, &self.shared, sensor, pauses_polling);
            return Err(err);
        }
        Ok(())
    }
}

fn schedule_finish(
    ctx: &TabContext,
    shared: &Arc<Mutex<Shared>>,
    sensor: SensorClass,
    timer: &'static str,
    settle: Duration,
    resume_polling: bool,
) -> Result<(), SetupError> {
    let (ctx_for_timer, shared) = (ctx.clone(), Arc::clone(shared));
    ctx.scheduler().register(timer, PollSpec::once_after(settle), move || {
        finish(&ctx_for_timer, &shared, sensor, resume_polling);
        std::future::ready(())
    })?;
    Ok(())
}

fn finish(ctx: &TabContext, shared: &Mutex<Shared>, sensor: SensorClass, resume_polling: bool) {
    *calibrating(&mut shared.lock(), sensor) = false;
    if !ctx.is_live() {
        return;
    }
    if resume_polling {
        ctx.scheduler().resume(FAST_POLL);
    }
    info!(%sensor, "Calibration finished");
    ctx.emit(TabEvent::CalibrationFinished { sensor });
}

/// Restores firmware defaults, then loads the tab again from scratch.
///
/// # Errors
/// [`SetupError::NotRunning`] when the tab has no session, the failure of the
/// reset request, or the failure of the new initialization.
#[instrument(skip_all)]
pub async fn reset_settings(lifecycle: &mut TabLifecycle<SetupTab>) -> Result<PipelineReport, SetupError> {
    let Some(ctx) = lifecycle.context().cloned() else {
        return Err(SetupError::NotRunning { state: lifecycle.state(), context: None });
    };

    ctx.link().call(Request::ResetConf).await?;
    info!("Settings restored to defaults");
    ctx.emit(TabEvent::SettingsReset);

    lifecycle.cleanup();
    Ok(lifecycle.initialize().await?)
}

/// Reboots the flight controller into its bootloader.
///
/// # Errors
/// Propagates the failure of the reboot request.
#[instrument(skip(ctx))]
pub async fn reboot_to_bootloader(ctx: &TabContext, flash: bool) -> Result<RebootKind, SetupError> {
    let target = if flash { RebootKind::BootloaderFlash } else { RebootKind::Bootloader };
    ctx.link().call(Request::Reboot(target)).await?;
    info!(%target, "Rebooting");
    ctx.emit(TabEvent::Rebooting { target });
    Ok(target)
}
