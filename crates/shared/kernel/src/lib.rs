//! Core engine shared by every tab.
//!
//! * [`gate`] turns a protocol version into [`Capabilities`](fcs_domain::version::Capabilities), once per session.
//! * [`pipeline`] reads configuration step by step into a [`ConfigSnapshot`](fcs_domain::snapshot::ConfigSnapshot).
//! * [`flags`], [`sensors`] and [`orientation`] decode what the pollers receive.
//! * [`lifecycle`] ties it together: readiness check, pipeline, poll registration, teardown.
//!
//! ## Config loading
//! ```rust,ignore
//! use fcs_kernel::config::load_config;
//! let cfg: fcs_domain::config::MonitorConfig = load_config(Some("monitor.toml"))?;
//! ```
pub mod config;
pub mod flags;
pub mod frames;
pub mod gate;
pub mod lifecycle;
pub mod orientation;
pub mod pipeline;
pub mod sensors;

pub use fcs_domain as domain;

pub mod prelude {
    pub use crate::flags::{ActiveFlags, DisableFlagSet, build_flag_names};
    pub use crate::gate::VersionGate;
    pub use crate::lifecycle::{
        AttitudeModel, SessionGuard, Tab, TabContext, TabError, TabErrorExt, TabLifecycle, TabState,
    };
    pub use crate::orientation::Orientation;
    pub use crate::pipeline::{PipelineError, PipelineReport, RequestPipeline, Step};
}
