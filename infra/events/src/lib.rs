//! # Event Bus
//!
//! Connects the engine to whatever renders it. Events are keyed by their Rust
//! type and travel over one of two channel kinds:
//!
//! * **Broadcast**: every subscriber sees every event (tab lifecycle events,
//!   calibration notices).
//! * **Watch**: subscribers see only the latest value (attitude and status
//!   frames, where a stale frame is worthless once a newer one exists).
//!
//! Events are shared as `Arc<T>`; the presentation side never mutates them.
//!
//! # Example
//!
//! ```rust
//! use fcs_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Heading(f64);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe_watch(Heading(0.0))?;
//!
//!     bus.publish_watch(Heading(90.0))?;
//!     assert_eq!(rx.recv().await.map(|h| h.0), Some(90.0));
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use crate::{
    bus::{ChannelKind, Event, EventBus},
    error::{EventBusError, EventBusErrorExt},
    receiver::EventReceiverExt,
};
