use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default configuration file, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "monitor";

/// Prefix of environment overrides (`FCS__POLLING__FAST_MS=50`).
pub const ENV_PREFIX: &str = "FCS";

#[fcs_derive::fcs_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads layered settings: a TOML/YAML/JSON file, then `FCS__SECTION__KEY`
/// environment overrides.
///
/// An explicit `path` must exist. Without one, `monitor.*` in the working
/// directory is read when present and defaults fill in the rest.
///
/// # Errors
/// Fails when an explicit file is missing, a source cannot be parsed, or the
/// merged values do not match `T`.
///
/// ```rust
/// use fcs_kernel::config::load_config;
/// use fcs_domain::config::MonitorConfig;
///
/// let cfg: MonitorConfig = load_config(None::<&str>).unwrap_or_default();
/// assert_eq!(cfg.polling.fast_ms, 33);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let explicit = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(explicit))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), required = explicit, "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
