//! # Link
//!
//! The one conceptual channel to the device. The wire has no multiplexing of
//! correlated responses, so [`Link`] admits exactly one outstanding request at a
//! time: every caller (configuration pipeline, poll ticks, user actions) queues on
//! the same async mutex and is served in arrival order.
//!
//! Framing and serial I/O live behind the [`Transport`] trait. With the `sim`
//! feature a scripted [`SimulatedDevice`] stands in for real hardware.
//!
//! ```rust,ignore
//! let link = Link::new(SimulatedDevice::new(DeviceProfile::default()), Duration::from_millis(500));
//! let reply = link.call(Request::Attitude).await?;
//! ```

mod error;
mod link;
#[cfg(feature = "sim")]
mod sim;
mod transport;

pub use crate::{
    error::{LinkError, LinkErrorExt},
    link::Link,
    transport::{SendFuture, Transport},
};

#[cfg(feature = "sim")]
pub use crate::sim::{DeviceProfile, Fault, SimulatedDevice};
