use anyhow::Context;
use clap::Parser;
use fcs::domain::config::{LoggingConfig, MonitorConfig};
use fcs::kernel::config::load_config;
use fcs_logger::{LevelFilter, Logger};
use fcs_monitor::{Args, Monitor};
use tracing::info;

#[fcs_runtime::main(cooperative)]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cfg: MonitorConfig =
        load_config(args.config.as_deref()).context("Critical: Configuration is malformed")?;
    let _log = init_logger(&cfg.logging)?;

    let monitor = Monitor::new(cfg)?;
    let summary = monitor.run(args.tab, args.duration()).await?;
    info!(?summary, "Monitor finished");
    Ok(())
}

fn init_logger(logging: &LoggingConfig) -> anyhow::Result<Logger> {
    let level: LevelFilter =
        logging.level.parse().with_context(|| format!("Invalid log level: {}", logging.level))?;
    let builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);

    let logger = match &logging.directory {
        Some(directory) => builder.path(directory.clone()).json(logging.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}
