//! Ordered configuration reads performed before a tab starts polling.
//!
//! Steps run strictly one after another: a step's request is issued only after
//! the previous reply has been applied to the snapshot. The first failure aborts
//! the run and names the failed step; the snapshot is left unsealed.

use crate::lifecycle::SessionGuard;
use fcs_domain::protocol::Request;
use fcs_domain::snapshot::ConfigSnapshot;
use fcs_domain::version::Capabilities;
use fcs_link::{Link, LinkError};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, trace, warn};

#[fcs_derive::fcs_error]
pub enum PipelineError {
    #[error("Step '{step}' failed{}: {source}", format_context(.context))]
    Transport { step: &'static str, source: LinkError, context: Option<Cow<'static, str>> },

    /// The session ended while the step was in flight; its reply was dropped.
    #[error("Step '{step}' cancelled{}", format_context(.context))]
    Cancelled { step: &'static str, context: Option<Cow<'static, str>> },
}

impl PipelineError {
    #[must_use]
    pub const fn step(&self) -> &'static str {
        match self {
            Self::Transport { step, .. } | Self::Cancelled { step, .. } => step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Read(Request),
    Gated { requires: Capabilities, when_enabled: Option<Request>, otherwise: Option<Request> },
}

/// One named entry of a configuration pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    name: &'static str,
    action: Action,
}

impl Step {
    /// Always issues `request`.
    #[must_use]
    pub const fn read(name: &'static str, request: Request) -> Self {
        Self { name, action: Action::Read(request) }
    }

    /// Chooses a request by capability. `None` makes the step a no-op.
    #[must_use]
    pub const fn gated(
        name: &'static str,
        requires: Capabilities,
        when_enabled: Option<Request>,
        otherwise: Option<Request>,
    ) -> Self {
        Self { name, action: Action::Gated { requires, when_enabled, otherwise } }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Request this step issues for a session, if any.
    #[must_use]
    pub fn resolve(&self, caps: Capabilities) -> Option<Request> {
        match self.action {
            Action::Read(request) => Some(request),
            Action::Gated { requires, when_enabled, otherwise } => {
                if caps.contains(requires) { when_enabled } else { otherwise }
            },
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Requests sent to the device.
    pub issued: usize,
    /// Steps that resolved to no operation.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPipeline {
    steps: Vec<Step>,
}

impl RequestPipeline {
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Requests the run would issue for `caps`, in order.
    #[must_use]
    pub fn plan(&self, caps: Capabilities) -> Vec<(&'static str, Request)> {
        self.steps.iter().filter_map(|step| step.resolve(caps).map(|r| (step.name, r))).collect()
    }

    /// Runs every step against `link`, applying replies to `snapshot`.
    ///
    /// The snapshot is sealed only when every step succeeded.
    ///
    /// # Errors
    /// [`PipelineError::Transport`] for the first failing step, and
    /// [`PipelineError::Cancelled`] when `guard` expired while a step was in flight.
    pub async fn run(
        &self,
        link: &Link,
        caps: Capabilities,
        snapshot: &mut ConfigSnapshot,
        guard: &SessionGuard,
    ) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::default();

        for step in &self.steps {
            if !guard.is_live() {
                return Err(PipelineError::Cancelled { step: step.name, context: None });
            }

            let Some(request) = step.resolve(caps) else {
                trace!(step = step.name, "Step skipped");
                report.skipped += 1;
                continue;
            };

            let reply = link.call(request).await.map_err(|source| {
                warn!(step = step.name, error = %source, "Configuration step failed");
                PipelineError::Transport { step: step.name, source, context: None }
            })?;
            report.issued += 1;

            if !guard.is_live() {
                debug!(step = step.name, "Session ended, reply discarded");
                return Err(PipelineError::Cancelled { step: step.name, context: None });
            }

            let item = snapshot.apply(reply);
            trace!(step = step.name, ?item, "Step applied");
        }

        snapshot.seal();
        debug!(issued = report.issued, skipped = report.skipped, "Configuration pipeline complete");
        Ok(report)
    }
}

impl FromIterator<Step> for RequestPipeline {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcs_domain::protocol::TextKind;

    const NAME_STEP: Step = Step::gated("name", Capabilities::TEXT_NAMES, None, Some(Request::Name));
    const CRAFT_STEP: Step = Step::gated(
        "craft_name",
        Capabilities::TEXT_NAMES,
        Some(Request::Text(TextKind::CraftName)),
        None,
    );

    #[test]
    fn test_gated_steps_pick_one_branch() {
        assert_eq!(NAME_STEP.resolve(Capabilities::empty()), Some(Request::Name));
        assert_eq!(NAME_STEP.resolve(Capabilities::TEXT_NAMES), None);
        assert_eq!(CRAFT_STEP.resolve(Capabilities::TEXT_NAMES), Some(Request::Text(TextKind::CraftName)));
        assert_eq!(CRAFT_STEP.resolve(Capabilities::empty()), None);
    }

    #[test]
    fn test_plan_skips_no_op_steps() {
        let pipeline: RequestPipeline =
            [Step::read("acc_trim", Request::AccTrim), NAME_STEP, CRAFT_STEP].into_iter().collect();

        let old: Vec<_> = pipeline.plan(Capabilities::empty()).into_iter().map(|(n, _)| n).collect();
        assert_eq!(old, ["acc_trim", "name"]);

        let new: Vec<_> = pipeline.plan(Capabilities::TEXT_NAMES).into_iter().map(|(n, _)| n).collect();
        assert_eq!(new, ["acc_trim", "craft_name"]);
    }

    #[test]
    fn test_error_reports_step() {
        let err = PipelineError::Cancelled { step: "mixer_config", context: None };
        assert_eq!(err.step(), "mixer_config");
        assert_eq!(err.to_string(), "Step 'mixer_config' cancelled");
    }
}
