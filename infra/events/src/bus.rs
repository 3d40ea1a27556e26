use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{trace, warn};

/// Buffer for broadcast channels. Tab events are rare; 64 covers a burst of
/// calibration and lifecycle notices with room to spare.
const DEFAULT_CAPACITY: usize = 64;

/// Supported channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Fan-out: every subscriber receives every event.
    Broadcast { capacity: usize },
    /// Latest value only.
    Watch,
}

/// Marker trait for types that can be sent across the [`EventBus`].
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug)]
struct ChannelState {
    kind: ChannelKind,
    sender: Box<dyn Any + Send + Sync>,
}

impl ChannelState {
    fn broadcast<T: Event>(&self) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        self.sender.downcast_ref::<broadcast::Sender<Arc<T>>>().cloned().ok_or_else(mismatch::<T>)
    }

    fn watch<T: Event>(&self) -> Result<watch::Sender<Arc<T>>, EventBusError> {
        self.sender.downcast_ref::<watch::Sender<Arc<T>>>().cloned().ok_or_else(mismatch::<T>)
    }
}

/// Thread-safe bus with one channel per event type.
///
/// Cloning is cheap; all clones share the same channels.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, ChannelState>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to broadcast events of type `T`.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if `T` is bound to a watch channel.
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Subscribes with an explicit buffer size. The first caller decides the capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] for a zero capacity and
    /// [`EventBusError::ChannelKindMismatch`] if `T` is bound to a watch channel.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        if capacity == 0 {
            return Err(EventBusError::InvalidCapacity {
                message: "capacity must be >= 1".into(),
                context: Some(type_name::<T>().into()),
            });
        }
        Ok(self.broadcast_sender::<T>(capacity)?.subscribe())
    }

    /// Publishes a broadcast event, returning the number of receivers reached.
    ///
    /// Publishing without subscribers is not an error.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if `T` is bound to a watch channel.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        let sender = self.broadcast_sender::<T>(DEFAULT_CAPACITY)?;
        let delivered = sender.send(Arc::new(event)).unwrap_or(0);
        trace!(event = type_name::<T>(), delivered, "Event dispatched");
        Ok(delivered)
    }

    /// Subscribes to the latest value of `T`, seeding the channel with `initial`
    /// if it does not exist yet.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if `T` is bound to a broadcast channel.
    pub fn subscribe_watch<T: Event>(
        &self,
        initial: T,
    ) -> Result<watch::Receiver<Arc<T>>, EventBusError> {
        Ok(self.watch_sender(|| Arc::new(initial))?.subscribe())
    }

    /// Replaces the latest value of `T`.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if `T` is bound to a broadcast channel.
    pub fn publish_watch<T: Event>(&self, value: T) -> Result<(), EventBusError> {
        let value = Arc::new(value);
        let seed = Arc::clone(&value);
        let sender = self.watch_sender(move || seed)?;
        sender.send_replace(value);
        Ok(())
    }

    /// Latest value of a watch channel, if one exists.
    #[must_use]
    pub fn latest<T: Event>(&self) -> Option<Arc<T>> {
        let channels = self.channels.read();
        let state = channels.get(&TypeId::of::<T>())?;
        state.watch::<T>().ok().map(|tx| Arc::clone(&tx.borrow()))
    }

    /// Drops every channel; receivers observe closure.
    ///
    /// Returns the number of channels closed.
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn broadcast_sender<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        let id = TypeId::of::<T>();
        if let Some(state) = self.channels.read().get(&id) {
            return match state.kind {
                ChannelKind::Broadcast { capacity: existing } => {
                    if existing != capacity && capacity != DEFAULT_CAPACITY {
                        warn!(
                            event = type_name::<T>(),
                            existing,
                            requested = capacity,
                            "Broadcast channel already initialized with a different capacity"
                        );
                    }
                    state.broadcast::<T>()
                },
                ChannelKind::Watch => Err(kind_mismatch::<T>(ChannelKind::Watch)),
            };
        }

        let mut channels = self.channels.write();
        let state = channels.entry(id).or_insert_with(|| {
            trace!(event = type_name::<T>(), capacity, "Initializing broadcast channel");
            let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
            ChannelState { kind: ChannelKind::Broadcast { capacity }, sender: Box::new(tx) }
        });
        match state.kind {
            ChannelKind::Broadcast { .. } => state.broadcast::<T>(),
            ChannelKind::Watch => Err(kind_mismatch::<T>(ChannelKind::Watch)),
        }
    }

    fn watch_sender<T: Event>(
        &self,
        seed: impl FnOnce() -> Arc<T>,
    ) -> Result<watch::Sender<Arc<T>>, EventBusError> {
        let id = TypeId::of::<T>();
        if let Some(state) = self.channels.read().get(&id) {
            return match state.kind {
                ChannelKind::Watch => state.watch::<T>(),
                kind @ ChannelKind::Broadcast { .. } => Err(kind_mismatch::<T>(kind)),
            };
        }

        let mut channels = self.channels.write();
        let state = channels.entry(id).or_insert_with(|| {
            trace!(event = type_name::<T>(), "Initializing watch channel");
            let (tx, _) = watch::channel::<Arc<T>>(seed());
            ChannelState { kind: ChannelKind::Watch, sender: Box::new(tx) }
        });
        match state.kind {
            ChannelKind::Watch => state.watch::<T>(),
            kind @ ChannelKind::Broadcast { .. } => Err(kind_mismatch::<T>(kind)),
        }
    }
}

fn mismatch<T>() -> EventBusError {
    EventBusError::TypeMismatch {
        message: type_name::<T>().into(),
        context: Some("Unexpected event type".into()),
    }
}

fn kind_mismatch<T>(found: ChannelKind) -> EventBusError {
    EventBusError::ChannelKindMismatch {
        message: format!("{} is bound to {found:?}", type_name::<T>()).into(),
        context: None,
    }
}
