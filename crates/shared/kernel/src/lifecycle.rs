//! Tab lifecycle: readiness check, configuration load, poll registration, teardown.
//!
//! ```text
//! Idle ──initialize──▶ LoadingConfig ──ok──▶ Ready ──activate──▶ Polling
//!                          │ err                                   │ cleanup
//!                          ▼                                       ▼
//!                       TornDown ◀──────────────────────────── TornDown
//! ```
//!
//! Every session carries an epoch. [`TabLifecycle::cleanup`] advances it, so
//! replies for requests issued by an earlier session are recognised as stale
//! and dropped instead of reviving torn-down state.

use crate::flags::DisableFlagSet;
use crate::gate::VersionGate;
use crate::pipeline::{PipelineError, PipelineReport, RequestPipeline, Step};
use fcs_domain::config::MonitorConfig;
use fcs_domain::device::DeviceInfo;
use fcs_domain::protocol::{Reply, Request};
use fcs_domain::snapshot::ConfigSnapshot;
use fcs_domain::telemetry::{DisplayAngles, TabEvent};
use fcs_domain::version::Capabilities;
use fcs_event_bus::{Event, EventBus, EventBusError};
use fcs_link::{Link, LinkError};
use fcs_scheduler::{PollScheduler, SchedulerError};
use parking_lot::Mutex;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, instrument, trace, warn};

#[fcs_derive::fcs_error]
pub enum TabError {
    #[error("Link is not ready{}", format_context(.context))]
    LinkNotReady { context: Option<Cow<'static, str>> },

    #[error("Configuration load failed{}: {source}", format_context(.context))]
    Pipeline { source: PipelineError, context: Option<Cow<'static, str>> },

    #[error("Poll registration failed{}: {source}", format_context(.context))]
    Scheduler { source: SchedulerError, context: Option<Cow<'static, str>> },

    #[error("Device request failed{}: {source}", format_context(.context))]
    Link { source: LinkError, context: Option<Cow<'static, str>> },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Bus { source: EventBusError, context: Option<Cow<'static, str>> },

    /// The operation needs a running session.
    #[error("Tab is {state:?}{}", format_context(.context))]
    InvalidState { state: TabState, context: Option<Cow<'static, str>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TabState {
    Idle,
    LoadingConfig,
    Ready,
    Polling,
    TornDown,
}

impl TabState {
    /// Configuration is loaded and the session has not been torn down.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Ready | Self::Polling)
    }
}

/// Source of [`SessionGuard`]s for one tab.
#[derive(Debug, Default)]
pub struct SessionEpoch {
    current: Arc<AtomicU64>,
}

impl SessionEpoch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard bound to the current session.
    #[must_use]
    pub fn guard(&self) -> SessionGuard {
        SessionGuard { epoch: Arc::clone(&self.current), issued: self.current.load(Ordering::Acquire) }
    }

    /// Ends the current session; every guard issued so far expires.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Token checked before applying a reply.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    epoch: Arc<AtomicU64>,
    issued: u64,
}

impl SessionGuard {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.issued
    }
}

/// Lets one tick of a poll task run at a time.
///
/// A tick that finds the previous one still waiting on the link is skipped, so
/// a slow device never builds a queue of requests for the same task.
#[derive(Debug, Clone, Default)]
pub struct TickGate {
    busy: Arc<AtomicBool>,
}

impl TickGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while an earlier tick still holds the gate.
    #[must_use]
    pub fn try_enter(&self) -> Option<TickPass> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickPass { busy: Arc::clone(&self.busy) })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one tick; reopens the gate when dropped.
#[derive(Debug)]
pub struct TickPass {
    busy: Arc<AtomicBool>,
}

impl Drop for TickPass {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Rendered 3D model of the craft. Owned by a tab and released on teardown.
pub trait AttitudeModel: Send + Sync + 'static {
    fn rotate_to(&self, angles: DisplayAngles);

    fn dispose(&self);
}

/// A configuration screen: what it loads and what it polls.
pub trait Tab: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Configuration steps, in order. Called once per session.
    fn steps(&self, caps: Capabilities) -> Vec<Step>;

    /// Called once the snapshot is complete. Registers poll tasks on
    /// `ctx.scheduler()`; nothing is polled before this point.
    ///
    /// # Errors
    /// Any failure aborts the session and tears it down.
    fn activate(&mut self, ctx: &TabContext) -> Result<(), TabError>;

    /// Releases resources owned by the tab. Poll tasks are cancelled by the lifecycle.
    fn deactivate(&mut self) {}
}

/// Everything a running tab and its poll callbacks may touch.
///
/// Cheap to clone; poll callbacks capture their own copy.
#[derive(Debug, Clone)]
pub struct TabContext {
    tab: &'static str,
    link: Link,
    scheduler: Arc<PollScheduler>,
    bus: EventBus,
    config: MonitorConfig,
    device: Arc<DeviceInfo>,
    caps: Capabilities,
    snapshot: Arc<ConfigSnapshot>,
    guard: SessionGuard,
    flag_names: Arc<Mutex<Option<Arc<DisableFlagSet>>>>,
}

impl TabContext {
    #[must_use]
    pub const fn tab(&self) -> &'static str {
        self.tab
    }

    #[must_use]
    pub const fn link(&self) -> &Link {
        &self.link
    }

    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    #[must_use]
    pub const fn caps(&self) -> Capabilities {
        self.caps
    }

    /// Sealed configuration of this session.
    #[must_use]
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.guard.is_live()
    }

    /// Issues a request on behalf of this session.
    ///
    /// `Ok(None)` means the session ended before the request got the link, or
    /// while it was in flight, and the reply must be ignored. A request still
    /// waiting for the link when the session ends is never sent.
    ///
    /// # Errors
    /// Propagates the [`LinkError`] of the call.
    pub async fn request(&self, request: Request) -> Result<Option<Reply>, LinkError> {
        if !self.guard.is_live() {
            return Ok(None);
        }
        let Some(reply) = self.link.call_while(request, || self.guard.is_live()).await? else {
            return Ok(None);
        };
        if self.guard.is_live() {
            Ok(Some(reply))
        } else {
            trace!(tab = self.tab, code = %request.code(), "Stale reply discarded");
            Ok(None)
        }
    }

    /// Flag table for the reported count, reused across ticks.
    #[must_use]
    pub fn flag_names(&self, count: u8) -> Arc<DisableFlagSet> {
        let count = usize::from(count);
        let mut cached = self.flag_names.lock();
        match cached.as_ref() {
            Some(set) if set.len() == count => Arc::clone(set),
            _ => {
                let set = Arc::new(DisableFlagSet::for_capabilities(self.caps, count));
                *cached = Some(Arc::clone(&set));
                set
            },
        }
    }

    /// Replaces the latest value of a frame type. Dropped once the session ended.
    pub fn publish_frame<T: Event>(&self, frame: T) -> bool {
        if !self.guard.is_live() {
            return false;
        }
        match self.bus.publish_watch(frame) {
            Ok(()) => true,
            Err(err) => {
                warn!(tab = self.tab, error = %err, "Frame not published");
                false
            },
        }
    }

    pub fn emit(&self, event: TabEvent) {
        emit(&self.bus, event);
    }
}

fn emit(bus: &EventBus, event: TabEvent) {
    if let Err(err) = bus.publish(event) {
        warn!(error = %err, "Tab event not published");
    }
}

/// Drives one [`Tab`] through its sessions.
#[derive(Debug)]
pub struct TabLifecycle<T: Tab> {
    tab: T,
    link: Link,
    bus: EventBus,
    config: MonitorConfig,
    device: Arc<DeviceInfo>,
    caps: Capabilities,
    epoch: SessionEpoch,
    scheduler: Arc<PollScheduler>,
    state: TabState,
    context: Option<TabContext>,
}

impl<T: Tab> TabLifecycle<T> {
    /// Capabilities are derived from the device's protocol version here, once.
    pub fn new(tab: T, link: Link, device: DeviceInfo, bus: EventBus, config: MonitorConfig) -> Self {
        let caps = VersionGate::capabilities(&device.api_version);
        debug!(tab = tab.name(), version = %device.api_version, ?caps, "Tab created");
        Self {
            tab,
            link,
            bus,
            config,
            device: Arc::new(device),
            caps,
            epoch: SessionEpoch::new(),
            scheduler: Arc::new(PollScheduler::new()),
            state: TabState::Idle,
            context: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> TabState {
        self.state
    }

    #[must_use]
    pub const fn caps(&self) -> Capabilities {
        self.caps
    }

    #[must_use]
    pub const fn tab(&self) -> &T {
        &self.tab
    }

    /// Context of the running session.
    #[must_use]
    pub const fn context(&self) -> Option<&TabContext> {
        self.context.as_ref()
    }

    /// Sealed snapshot of the running session.
    #[must_use]
    pub fn snapshot(&self) -> Option<&ConfigSnapshot> {
        self.context.as_ref().map(TabContext::snapshot)
    }

    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Loads configuration and starts polling.
    ///
    /// A running session is torn down first, so its tasks are cancelled before
    /// tasks with the same names are registered again.
    ///
    /// # Errors
    /// [`TabError::LinkNotReady`] before anything is sent, [`TabError::Pipeline`]
    /// naming the failed step, or whatever [`Tab::activate`] reports. On error
    /// the tab ends up torn down with no poll task registered.
    #[instrument(skip(self), fields(tab = self.tab.name()))]
    pub async fn initialize(&mut self) -> Result<PipelineReport, TabError> {
        if self.state.is_active() || self.state == TabState::LoadingConfig {
            self.cleanup();
        }

        if !self.link.is_ready() {
            warn!("Link not ready, initialization skipped");
            return Err(TabError::LinkNotReady { context: Some(self.tab.name().into()) });
        }

        self.state = TabState::LoadingConfig;
        let guard = self.epoch.guard();
        let pipeline: RequestPipeline = self.tab.steps(self.caps).into_iter().collect();
        debug!(steps = pipeline.len(), "Loading configuration");

        let mut snapshot = ConfigSnapshot::new();
        let report = match pipeline.run(&self.link, self.caps, &mut snapshot, &guard).await {
            Ok(report) => report,
            Err(err) => {
                emit(&self.bus, TabEvent::InitializationFailed { tab: self.tab.name(), step: err.step() });
                self.teardown();
                return Err(err.into());
            },
        };

        self.state = TabState::Ready;
        let flag_names = snapshot
            .status()
            .map(|status| Arc::new(DisableFlagSet::for_capabilities(self.caps, status.arming_disable_count.into())));
        let context = TabContext {
            tab: self.tab.name(),
            link: self.link.clone(),
            scheduler: Arc::clone(&self.scheduler),
            bus: self.bus.clone(),
            config: self.config.clone(),
            device: Arc::clone(&self.device),
            caps: self.caps,
            snapshot: Arc::new(snapshot),
            guard,
            flag_names: Arc::new(Mutex::new(flag_names)),
        };
        emit(
            &self.bus,
            TabEvent::Ready { tab: self.tab.name(), issued: report.issued, skipped: report.skipped },
        );

        if let Err(err) = self.tab.activate(&context) {
            warn!(error = %err, "Tab activation failed");
            self.teardown();
            return Err(err);
        }

        self.context = Some(context);
        self.state = TabState::Polling;
        emit(&self.bus, TabEvent::PollingStarted { tab: self.tab.name() });
        info!(issued = report.issued, skipped = report.skipped, "Tab ready");
        Ok(report)
    }

    /// Cancels every poll task, releases tab resources and expires the session.
    ///
    /// Idempotent; a tab that never started is simply marked torn down.
    #[instrument(skip(self), fields(tab = self.tab.name()))]
    pub fn cleanup(&mut self) {
        if self.state == TabState::TornDown {
            return;
        }
        self.teardown();
        emit(&self.bus, TabEvent::TornDown { tab: self.tab.name() });
        info!("Tab torn down");
    }

    fn teardown(&mut self) {
        let epoch = self.epoch.advance();
        let cancelled = self.scheduler.clear();
        self.tab.deactivate();
        self.context = None;
        self.state = TabState::TornDown;
        debug!(epoch, cancelled, "Session ended");
    }
}

impl<T: Tab> Drop for TabLifecycle<T> {
    fn drop(&mut self) {
        if self.state.is_active() {
            self.teardown();
        }
    }
}
