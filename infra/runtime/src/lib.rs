//! # Runtime
//!
//! Runtime profiles for the [Tokio](https://tokio.rs) async runtime.
//!
//! Everything that talks to a flight controller runs on a single cooperative
//! timeline: protocol calls and poll ticks are non-blocking tasks scheduled on one
//! control thread and only yield at protocol or timer boundaries. The
//! [`RuntimeConfig::cooperative`] profile builds exactly that. The
//! [`RuntimeConfig::worker`] profile exists for tooling that never touches a link.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[fcs_runtime::main(cooperative)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use fcs_derive::main;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (2 `MiB`).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
/// How long an idle blocking thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(30);
const DEFAULT_THREAD_NAME: &str = "fcs-control";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

fn get_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= 1024)
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

/// Scheduler flavor of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// One control thread drives every task.
    CurrentThread,
    /// Work-stealing pool with the configured number of workers.
    MultiThread { workers: usize },
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub flavor: Flavor,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::cooperative()
    }
}

impl RuntimeConfig {
    /// Single control thread. Poll ticks and protocol calls never run in parallel.
    #[must_use = "Use this configuration for device-facing sessions"]
    pub fn cooperative() -> Self {
        Self {
            flavor: Flavor::CurrentThread,
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }

    /// Multi-threaded pool sized from the host.
    #[must_use = "Use this configuration for tooling that is not bound to a device link"]
    pub fn worker() -> Self {
        Self {
            flavor: Flavor::MultiThread { workers: get_worker_threads() },
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "fcs-worker".to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.flavor = Flavor::MultiThread { workers: threads.clamp(1, 1024) };
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name };
        self
    }

    fn normalized(&self) -> Self {
        let flavor = match self.flavor {
            Flavor::CurrentThread => Flavor::CurrentThread,
            Flavor::MultiThread { workers } => Flavor::MultiThread { workers: workers.clamp(1, 1024) },
        };
        let thread_name = if self.thread_name.trim().is_empty() {
            DEFAULT_THREAD_NAME.to_owned()
        } else {
            self.thread_name.clone()
        };

        Self {
            flavor,
            stack_size: self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name,
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Creates a new Tokio runtime from a [`RuntimeConfig`].
///
/// Timers and I/O drivers are always enabled; the poll scheduler depends on the
/// time driver.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
///
/// # Examples
///
/// ```rust
/// use fcs_runtime::{build_runtime_with_config, RuntimeConfig};
///
/// let runtime = build_runtime_with_config(&RuntimeConfig::cooperative())?;
/// runtime.block_on(async {});
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = match config.flavor {
        Flavor::CurrentThread => Builder::new_current_thread(),
        Flavor::MultiThread { workers } => {
            let mut builder = Builder::new_multi_thread();
            builder.worker_threads(workers);
            builder
        },
    };

    builder
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

/// Builds the cooperative runtime used for device sessions.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the runtime cannot be created.
pub fn build_control_runtime() -> Result<Runtime> {
    let config = RuntimeConfig::cooperative();
    info!(thread = %config.thread_name, "Initializing control runtime");
    build_runtime_with_config(&config)
}
