//! Indi tab: reads the whole configuration the craft identity screen needs and
//! keeps the arming status fresh while it is open.
//!
//! Names moved from `MSP_NAME` to `MSP2_GET_TEXT` with API 1.45, so the `name`,
//! `craft_name` and `pilot_name` steps are gated on [`Capabilities::TEXT_NAMES`].

use fcs_domain::protocol::{Reply, Request, TextKind};
use fcs_domain::version::Capabilities;
use fcs_kernel::frames::status_frame;
use fcs_kernel::lifecycle::{Tab, TabContext, TabError, TickGate};
use fcs_kernel::pipeline::Step;
use fcs_scheduler::PollSpec;
use serde::Serialize;
use tracing::{debug, trace};

pub const TAB_NAME: &str = "indi";
pub const STATUS_POLL: &str = "status_pull";

/// Craft identity read during initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub craft_name: Option<String>,
    /// Only firmware with text names has a pilot name.
    pub pilot_name: Option<String>,
    pub feature_mask: u32,
    pub serial_ports: usize,
}

#[derive(Debug, Default)]
pub struct IndiTab {
    identity: Option<Identity>,
}

impl IndiTab {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the running session.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

impl Tab for IndiTab {
    fn name(&self) -> &'static str {
        TAB_NAME
    }

    fn steps(&self, _caps: Capabilities) -> Vec<Step> {
        let text = |kind| Some(Request::Text(kind));
        vec![
            Step::read("serial_config", Request::SerialConfig),
            Step::read("feature_config", Request::FeatureConfig),
            Step::read("beeper_config", Request::BeeperConfig),
            Step::read("board_alignment", Request::BoardAlignmentConfig),
            Step::read("acc_trim", Request::AccTrim),
            Step::read("arming_config", Request::ArmingConfig),
            Step::read("rc_deadband", Request::RcDeadband),
            Step::read("sensor_config", Request::SensorConfig),
            Step::read("sensor_alignment", Request::SensorAlignment),
            Step::gated("name", Capabilities::TEXT_NAMES, None, Some(Request::Name)),
            Step::gated("craft_name", Capabilities::TEXT_NAMES, text(TextKind::CraftName), None),
            Step::read("rx_config", Request::RxConfig),
            Step::gated("pilot_name", Capabilities::TEXT_NAMES, text(TextKind::PilotName), None),
            Step::read("advanced_config", Request::AdvancedConfig),
        ]
    }

    fn activate(&mut self, ctx: &TabContext) -> Result<(), TabError> {
        let snapshot = ctx.snapshot();
        let identity = Identity {
            craft_name: snapshot.craft_name().map(str::to_owned),
            pilot_name: snapshot.pilot_name().map(str::to_owned),
            feature_mask: snapshot.feature_mask().unwrap_or_default(),
            serial_ports: snapshot.serial_ports().map_or(0, <[_]>::len),
        };
        debug!(craft = ?identity.craft_name, pilot = ?identity.pilot_name, "Indi tab activated");
        self.identity = Some(identity);

        let (poll, gate) = (ctx.clone(), TickGate::new());
        ctx.scheduler().register(
            STATUS_POLL,
            PollSpec::every(ctx.config().polling.status()).immediate(),
            move || pull_status(poll.clone(), gate.clone()),
        )?;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.identity = None;
    }
}

async fn pull_status(ctx: TabContext, gate: TickGate) {
    let Some(_pass) = gate.try_enter() else {
        trace!(task = STATUS_POLL, "Previous tick still running");
        return;
    };
    let status = match ctx.request(Request::Status).await {
        Ok(Some(Reply::Status(status))) => status,
        Ok(_) => return,
        Err(err) => {
            debug!(task = STATUS_POLL, error = %err, "Poll tick failed");
            return;
        },
    };

    let flags = ctx.flag_names(status.arming_disable_count);
    let frame = status_frame(&flags, ctx.caps(), &status, None, None);
    trace!(arming_allowed = frame.arming_allowed, "Status");
    ctx.publish_frame(frame);
}
