use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Runs one configurator tab against the scripted flight controller.
#[derive(Debug, Parser)]
#[command(name = "fc-monitor", version, about)]
pub struct Args {
    /// How long the tab keeps polling before it is torn down.
    #[arg(long, default_value_t = 5)]
    pub seconds: u64,

    #[arg(long, value_enum, default_value_t = TabKind::Setup)]
    pub tab: TabKind,

    /// Settings file; `monitor.toml` next to the binary is used when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TabKind {
    Setup,
    Indi,
}

impl TabKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Setup => fcs::tabs::setup::TAB_NAME,
            Self::Indi => fcs::tabs::indi::TAB_NAME,
        }
    }
}
