//! Bridge implementation that maps cast events to a broadcast channel.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::emitter::EventEmitter;
use super::CastEvent;

/// Bridges cast events to a `tokio::sync::broadcast` channel.
///
/// For platform-specific emission (e.g. a desktop frontend), the bridge also
/// forwards to an optional external emitter that can be set after construction.
///
/// # Thread Safety
///
/// The bridge is `Send + Sync` and can be shared across async tasks.
/// The external emitter uses `RwLock` to allow setting it after construction.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<CastEvent>,
    /// Optional external emitter for platform-specific event delivery
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    /// Creates a new bridge with the given channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; use [`CastConfig::validate`](crate::CastConfig::validate)
    /// before constructing from configuration.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter for platform-specific event delivery.
    ///
    /// Can be called after construction, which is useful when the platform
    /// handle isn't available until later.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Returns a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<CastEvent> {
        self.tx.subscribe()
    }
}

impl EventEmitter for BroadcastEventBridge {
    fn emit_cast(&self, event: CastEvent) {
        if let Some(ref emitter) = *self.external_emitter.read() {
            emitter.emit_cast(event.clone());
        }
        if let Err(e) = self.tx.send(event) {
            log::trace!("[EventBridge] No broadcast receivers: {}", e);
        }
    }
}
