use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Monitor settings, layered from an optional file and `FCS__*` environment variables.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfigInner {
    pub link: LinkConfig,
    pub polling: PollingConfig,
    pub calibration: CalibrationConfig,
    pub logging: LoggingConfig,
    pub simulator: SimulatorConfig,
}

/// Arc-wrapped config for inexpensive cloning into tabs.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(flatten, default)]
    inner: Arc<MonitorConfigInner>,
}

impl Deref for MonitorConfig {
    type Target = MonitorConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for MonitorConfig {
    fn deref_mut(&mut self) -> &mut MonitorConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Per-call timeout.
    pub timeout_ms: u64,
}

/// Poll cadences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Attitude (and rangefinder) poll, ~30 Hz.
    pub fast_ms: u64,
    /// Status, battery and GPS poll, 4 Hz.
    pub slow_ms: u64,
    /// Status poll of tabs without live telemetry.
    pub status_ms: u64,
}

/// How long a calibration keeps its sensor busy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub accel_settle_ms: u64,
    pub mag_settle_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Rolling file output is enabled when set.
    pub directory: Option<PathBuf>,
    pub json: bool,
}

/// Scripted device used by the demo binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub api_version: String,
    pub arming_disable_count: u8,
    pub latency_ms: u64,
}

impl LinkConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn fast(&self) -> Duration {
        Duration::from_millis(self.fast_ms)
    }

    #[must_use]
    pub const fn slow(&self) -> Duration {
        Duration::from_millis(self.slow_ms)
    }

    #[must_use]
    pub const fn status(&self) -> Duration {
        Duration::from_millis(self.status_ms)
    }
}

impl CalibrationConfig {
    #[must_use]
    pub const fn accel_settle(&self) -> Duration {
        Duration::from_millis(self.accel_settle_ms)
    }

    #[must_use]
    pub const fn mag_settle(&self) -> Duration {
        Duration::from_millis(self.mag_settle_ms)
    }
}

// --- Default ---

impl Default for LinkConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { fast_ms: 33, slow_ms: 250, status_ms: 250 }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self { accel_settle_ms: 2000, mag_settle_ms: 30_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), directory: None, json: false }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { api_version: "1.46.0".to_owned(), arming_disable_count: 29, latency_ms: 2 }
    }
}
