//! # Domain Models
//!
//! Pure types shared by every crate of the workspace: the negotiated protocol
//! version and its capability set, the subset of flight-controller messages the
//! engine reads, the configuration snapshot and the telemetry frames handed to
//! the presentation layer.
//!
//! Keep it lean: no I/O, no async, no scheduling. Decoding rules that depend on the
//! version live in `fcs-kernel`.

pub mod config;
pub mod device;
pub mod protocol;
pub mod sensors;
pub mod snapshot;
pub mod telemetry;
pub mod version;
