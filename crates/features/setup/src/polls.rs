use crate::{FAST_POLL, SLOW_POLL, Shared};
use fcs_domain::protocol::{Reply, Request};
use fcs_domain::sensors::ActiveSensors;
use fcs_domain::telemetry::AttitudeFrame;
use fcs_kernel::frames::status_frame;
use fcs_kernel::lifecycle::{AttitudeModel, TabContext, TabError, TickGate};
use fcs_link::LinkError;
use fcs_scheduler::PollSpec;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

pub(crate) fn register(
    ctx: &TabContext,
    shared: &Arc<Mutex<Shared>>,
    model: Option<Arc<dyn AttitudeModel>>,
    active: ActiveSensors,
) -> Result<(), TabError> {
    let polling = &ctx.config().polling;
    let with_sonar = active.contains(ActiveSensors::SONAR);
    let with_gps = active.contains(ActiveSensors::GPS);

    let (fast_ctx, fast_shared, fast_gate) = (ctx.clone(), Arc::clone(shared), TickGate::new());
    ctx.scheduler().register(FAST_POLL, PollSpec::every(polling.fast()).immediate(), move || {
        pull_fast(fast_ctx.clone(), fast_gate.clone(), Arc::clone(&fast_shared), model.clone(), with_sonar)
    })?;

    let (slow_ctx, slow_gate) = (ctx.clone(), TickGate::new());
    ctx.scheduler().register(SLOW_POLL, PollSpec::every(polling.slow()).immediate(), move || {
        pull_slow(slow_ctx.clone(), slow_gate.clone(), with_gps)
    })?;

    debug!(with_sonar, with_gps, "Setup polls registered");
    Ok(())
}

/// Expected reply or `None`; failures are logged and left to the next tick.
async fn fetch(ctx: &TabContext, task: &'static str, request: Request) -> Option<Reply> {
    match ctx.request(request).await {
        Ok(reply) => reply,
        Err(err) => {
            log_tick_failure(task, &err);
            None
        },
    }
}

fn log_tick_failure(task: &'static str, err: &LinkError) {
    debug!(task, error = %err, "Poll tick failed");
}

async fn pull_fast(
    ctx: TabContext,
    gate: TickGate,
    shared: Arc<Mutex<Shared>>,
    model: Option<Arc<dyn AttitudeModel>>,
    with_sonar: bool,
) {
    let Some(_pass) = gate.try_enter() else {
        trace!(task = FAST_POLL, "Previous tick still running");
        return;
    };
    let Some(Reply::Attitude(kinematics)) = fetch(&ctx, FAST_POLL, Request::Attitude).await else {
        return;
    };

    let display = {
        let mut shared = shared.lock();
        shared.kinematics = kinematics;
        shared.orientation.display(&kinematics)
    };
    if let Some(model) = &model {
        model.rotate_to(display);
    }

    let sonar_cm = if with_sonar {
        match fetch(&ctx, FAST_POLL, Request::Sonar).await {
            Some(Reply::Sonar(cm)) => Some(f64::from(cm)),
            _ => None,
        }
    } else {
        None
    };

    trace!(roll = kinematics.roll, pitch = kinematics.pitch, yaw = kinematics.yaw, "Attitude");
    ctx.publish_frame(AttitudeFrame { kinematics, display, sonar_cm });
}

async fn pull_slow(ctx: TabContext, gate: TickGate, with_gps: bool) {
    let Some(_pass) = gate.try_enter() else {
        trace!(task = SLOW_POLL, "Previous tick still running");
        return;
    };
    let Some(Reply::StatusEx(status)) = fetch(&ctx, SLOW_POLL, Request::StatusEx).await else {
        return;
    };
    let Some(Reply::Analog(analog)) = fetch(&ctx, SLOW_POLL, Request::Analog).await else {
        return;
    };
    let gps = if with_gps {
        match fetch(&ctx, SLOW_POLL, Request::RawGps).await {
            Some(Reply::RawGps(gps)) => Some(gps),
            _ => return,
        }
    } else {
        None
    };

    let flags = ctx.flag_names(status.arming_disable_count);
    let frame = status_frame(&flags, ctx.caps(), &status, Some(&analog), gps.as_ref());
    trace!(arming_allowed = frame.arming_allowed, flags = frame.active_flags.len(), "Status");
    ctx.publish_frame(frame);
}
