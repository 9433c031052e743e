//! Event emitter abstraction for decoupling the controller from transport.
//!
//! The controller depends on the [`EventEmitter`] trait rather than a concrete
//! channel, enabling testing and alternative delivery (Tauri frontend, logs).

use super::CastEvent;

/// Trait for emitting cast events without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// struct MyService {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl MyService {
///     fn on_failure(&self, command: &str, err: &BackendError) {
///         self.emitter.emit_cast(CastEvent::CommandFailed { ... });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits a cast lifecycle event.
    fn emit_cast(&self, event: CastEvent);
}

/// No-op emitter for headless use or testing.
///
/// Events are silently discarded.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_cast(&self, _event: CastEvent) {
        // No-op
    }
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_cast(&self, event: CastEvent) {
        tracing::debug!(?event, "cast_event");
    }
}
