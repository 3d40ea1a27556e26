//! # Poll Scheduler
//!
//! Named periodic (or one-shot) tasks for a single tab.
//!
//! * At most one task per name: registering a name again aborts the previous task first.
//! * Ticks are fire-and-forget. Each tick spawns the callback future and the
//!   cadence keeps running whether or not the previous tick has finished.
//! * [`PollScheduler::pause`] stops ticking without losing the registration;
//!   [`PollScheduler::resume`] restarts the cadence from zero elapsed time.
//! * Cancellation ([`PollScheduler::unregister`], [`PollScheduler::clear`], drop) is
//!   immediate. Callback futures already spawned by earlier ticks are not
//!   cancelled; they must discard their own results.
//!
//! ```rust
//! use fcs_scheduler::{PollScheduler, PollSpec};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), fcs_scheduler::SchedulerError> {
//! let scheduler = PollScheduler::new();
//! scheduler.register("status_pull", PollSpec::every(Duration::from_millis(250)), || async {
//!     // issue a status request
//! })?;
//! assert!(scheduler.is_registered("status_pull"));
//! scheduler.clear();
//! # Ok(())
//! # }
//! ```

mod error;

pub use crate::error::{SchedulerError, SchedulerErrorExt};

use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

/// Cadence and repetition of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSpec {
    cadence: Duration,
    repeating: bool,
    immediate: bool,
}

impl PollSpec {
    /// Repeats every `cadence`; the first tick comes after one full interval.
    #[must_use]
    pub const fn every(cadence: Duration) -> Self {
        Self { cadence, repeating: true, immediate: false }
    }

    /// Fires once after `delay`.
    #[must_use]
    pub const fn once_after(delay: Duration) -> Self {
        Self { cadence: delay, repeating: false, immediate: false }
    }

    /// Fires the first tick at registration instead of after one interval.
    #[must_use]
    pub const fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    #[must_use]
    pub const fn cadence(&self) -> Duration {
        self.cadence
    }

    #[must_use]
    pub const fn is_repeating(&self) -> bool {
        self.repeating
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Running,
    Paused,
}

#[derive(Debug)]
struct TaskEntry {
    control: watch::Sender<Control>,
    handle: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
}

impl TaskEntry {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Registry of named poll tasks. Dropping it cancels every task.
#[derive(Debug, Default)]
pub struct PollScheduler {
    tasks: Mutex<FxHashMap<String, TaskEntry>>,
}

impl PollScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a task under `name`, cancelling any task already registered under it.
    ///
    /// # Errors
    /// [`SchedulerError::InvalidCadence`] for a zero cadence and
    /// [`SchedulerError::NoRuntime`] when called outside a Tokio runtime.
    pub fn register<F, Fut>(
        &self,
        name: impl Into<String>,
        spec: PollSpec,
        callback: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        if spec.cadence.is_zero() {
            return Err(SchedulerError::InvalidCadence { task: name, context: None });
        }
        let runtime = Handle::try_current().context("poll tasks need a running Tokio runtime")?;

        let (control, control_rx) = watch::channel(Control::Running);
        let ticks = Arc::new(AtomicU64::new(0));

        let mut tasks = self.tasks.lock();
        if let Some(previous) = tasks.remove(&name) {
            previous.handle.abort();
            debug!(task = %name, "Replaced registered poll task");
        }

        let handle =
            runtime.spawn(drive(name.clone(), spec, control_rx, Arc::clone(&ticks), callback));
        debug!(
            task = %name,
            cadence_ms = spec.cadence.as_millis(),
            repeating = spec.repeating,
            "Poll task registered"
        );
        tasks.insert(name, TaskEntry { control, handle, ticks });
        Ok(())
    }

    /// Stops ticking; returns `false` if no live task has that name.
    pub fn pause(&self, name: &str) -> bool {
        self.set_control(name, Control::Paused)
    }

    /// Restarts ticking with a fresh interval.
    pub fn resume(&self, name: &str) -> bool {
        self.set_control(name, Control::Running)
    }

    /// Cancels and forgets a task.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.tasks.lock().remove(name);
        removed.is_some_and(|entry| {
            entry.handle.abort();
            debug!(task = %name, "Poll task unregistered");
            true
        })
    }

    /// Cancels every task; returns how many were live.
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.tasks.lock().drain().collect();
        let mut live = 0;
        for (name, entry) in drained {
            if entry.is_live() {
                live += 1;
            }
            entry.handle.abort();
            trace!(task = %name, "Poll task cancelled");
        }
        if live > 0 {
            debug!(cancelled = live, "Poll tasks cleared");
        }
        live
    }

    /// Whether a task with that name is registered and has not finished.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.tasks.lock().get(name).is_some_and(TaskEntry::is_live)
    }

    #[must_use]
    pub fn is_paused(&self, name: &str) -> bool {
        self.tasks
            .lock()
            .get(name)
            .is_some_and(|entry| entry.is_live() && *entry.control.borrow() == Control::Paused)
    }

    /// Names of live tasks, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .tasks
            .lock()
            .iter()
            .filter(|(_, entry)| entry.is_live())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Ticks fired so far by the task currently registered under `name`.
    #[must_use]
    pub fn ticks(&self, name: &str) -> u64 {
        self.tasks.lock().get(name).map_or(0, |entry| entry.ticks.load(Ordering::Relaxed))
    }

    fn set_control(&self, name: &str, state: Control) -> bool {
        let tasks = self.tasks.lock();
        let Some(entry) = tasks.get(name).filter(|entry| entry.is_live()) else {
            return false;
        };
        entry.control.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        trace!(task = %name, ?state, "Poll task control changed");
        true
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        for entry in self.tasks.get_mut().values() {
            entry.handle.abort();
        }
    }
}

async fn drive<F, Fut>(
    name: String,
    spec: PollSpec,
    mut control: watch::Receiver<Control>,
    ticks: Arc<AtomicU64>,
    callback: F,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut first_run = true;

    loop {
        while *control.borrow_and_update() == Control::Paused {
            if control.changed().await.is_err() {
                return;
            }
        }

        let start = if first_run && spec.immediate {
            Instant::now()
        } else {
            Instant::now() + spec.cadence
        };
        first_run = false;

        let mut interval = interval_at(start, spec.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = control.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if *control.borrow_and_update() == Control::Paused {
                        trace!(task = %name, "Poll task paused");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    trace!(task = %name, tick = n, "Poll tick");
                    tokio::spawn(callback());
                    if !spec.repeating {
                        debug!(task = %name, "One-shot task fired");
                        return;
                    }
                }
            }
        }
    }
}
