//! Cast session controller.
//!
//! The controller owns the single [`Session`] record and orchestrates the
//! dispatch strategies, the notification bus and the DLNA position poller.
//!
//! # Failure semantics
//!
//! | operation                    | on backend failure                             |
//! |------------------------------|------------------------------------------------|
//! | `connect_to_device`          | `Err(CastError::Connection)`, session untouched |
//! | `cast_track`                 | `Err(CastError::Command)`, session untouched    |
//! | play/pause/stop/seek/volume  | logged + `CastEvent::CommandFailed`, no change  |
//! | poll tick                    | ignored, next tick retries                      |
//! | `disconnect`                 | logged, session reset regardless                |
//!
//! # Concurrency
//!
//! The session lock is never held across an `.await`. An operation is
//! therefore not atomic across its backend call: results are applied only if
//! the connection they were issued on (its epoch) is still the current one,
//! except for `connect_to_device`, whose completion always wins.

use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::bus::{NotificationBus, Subscription};
use crate::config::CastConfig;
use crate::dispatch::{strategy_for, CastBackend, DispatchError, ProtocolStrategy};
use crate::error::{CastError, CastResult};
use crate::events::{CastEvent, EventEmitter};
use crate::poller::PollerHandle;
use crate::runtime::TaskSpawner;
use crate::session::Session;
use crate::types::{
    CastDevice, CastPosition, CastProtocol, PositionInfo, TrackId, TrackMetadata, TransportState,
};
use crate::utils::{normalize_volume, now_millis};

/// Mutable state behind the controller lock.
///
/// The strategy and the poller handle live next to the record so that
/// replacing or resetting the session drops them with it.
#[derive(Default)]
struct ActiveSession {
    record: Session,
    strategy: Option<Arc<dyn ProtocolStrategy>>,
    poller: Option<PollerHandle>,
    /// Bumped on every connect and disconnect.
    epoch: u64,
}

impl ActiveSession {
    fn target(&self) -> Option<(u64, Arc<dyn ProtocolStrategy>)> {
        if !self.record.is_connected {
            return None;
        }
        self.strategy
            .as_ref()
            .map(|strategy| (self.epoch, Arc::clone(strategy)))
    }

    /// The strategy a poller should query, or `None` if `poller_id` is stale.
    fn poll_target(&self, poller_id: u64) -> Option<Arc<dyn ProtocolStrategy>> {
        let (_, strategy) = self.target()?;
        let owns_poller = self
            .poller
            .as_ref()
            .is_some_and(|handle| handle.id() == poller_id && handle.is_active());
        (owns_poller && strategy.capabilities().position_polling).then_some(strategy)
    }

    /// Drops the poller handle if it is the one identified by `poller_id`.
    fn retire_poller(&mut self, poller_id: u64) {
        if self.poller.as_ref().is_some_and(|h| h.id() == poller_id) {
            self.poller = None;
        }
    }
}

/// Transport commands sharing the fire-and-forget path.
#[derive(Debug, Clone, Copy)]
enum Transport {
    Play,
    Pause,
    Stop,
}

struct ControllerInner {
    backend: Arc<dyn CastBackend>,
    emitter: Arc<dyn EventEmitter>,
    spawner: Arc<dyn TaskSpawner>,
    config: CastConfig,
    bus: NotificationBus,
    state: Mutex<ActiveSession>,
}

/// Public surface of the cast session.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct CastController {
    inner: Arc<ControllerInner>,
}

impl CastController {
    /// Creates a controller with a disconnected session.
    ///
    /// # Arguments
    /// * `backend` - Command surface of the protocol backends
    /// * `emitter` - Sink for lifecycle and failure events
    /// * `spawner` - Runtime on which the position poller runs
    /// * `config` - Controller configuration (validated here)
    pub fn new(
        backend: Arc<dyn CastBackend>,
        emitter: Arc<dyn EventEmitter>,
        spawner: Arc<dyn TaskSpawner>,
        config: CastConfig,
    ) -> CastResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ControllerInner {
                backend,
                emitter,
                spawner,
                config,
                bus: NotificationBus::new(),
                state: Mutex::new(ActiveSession::default()),
            }),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Connection
    // ─────────────────────────────────────────────────────────────────────────

    /// Connects to `device` over `protocol`.
    ///
    /// On success the whole session is replaced, including any previous
    /// connection and its poller. On failure the session is left untouched.
    pub async fn connect_to_device(
        &self,
        device: CastDevice,
        protocol: CastProtocol,
    ) -> CastResult<()> {
        let strategy = strategy_for(protocol, Arc::clone(&self.inner.backend));

        log::info!(
            "[CastController] Connecting to {} ({}:{}) via {}",
            device.name,
            device.ip,
            device.port,
            protocol
        );

        if let Err(e) = strategy.connect(&device).await {
            log::warn!("[CastController] Connection to {} failed: {}", device.name, e);
            return Err(CastError::Connection(e.source.to_string()));
        }

        self.inner.publish(|state| {
            if let Some(previous) = state.record.device.as_ref() {
                log::warn!(
                    "[CastController] Replacing active connection to {} without disconnecting",
                    previous.name
                );
            }
            *state = ActiveSession {
                record: Session::connected(device.clone(), protocol),
                strategy: Some(strategy),
                poller: None,
                epoch: state.epoch + 1,
            };
            Some(())
        });

        log::info!("[CastController] Connected to {} via {}", device.name, protocol);
        self.inner.emitter.emit_cast(CastEvent::Connected {
            device,
            protocol,
            timestamp: now_millis(),
        });
        Ok(())
    }

    /// Tears down the connection. Never fails.
    ///
    /// Stops the poller, then asks the device to stop and disconnect. Backend
    /// failures are logged; the session is reset to the disconnected defaults
    /// in every case.
    pub async fn disconnect(&self) {
        let (strategy, poller) = {
            let mut state = self.inner.state.lock();
            (state.strategy.clone(), state.poller.take())
        };
        drop(poller);

        if let Some(strategy) = strategy {
            log::info!("[CastController] Disconnecting ({})", strategy.protocol());
            if let Err(e) = strategy.stop().await {
                log::warn!("[CastController] Stop before disconnect failed: {}", e);
            }
            if let Err(e) = strategy.disconnect().await {
                log::warn!("[CastController] Disconnect failed: {}", e);
            }
        }

        self.inner.publish(|state| {
            let epoch = state.epoch + 1;
            *state = ActiveSession {
                epoch,
                ..ActiveSession::default()
            };
            Some(())
        });

        self.inner.emitter.emit_cast(CastEvent::Disconnected {
            timestamp: now_millis(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads and starts a track on the connected device.
    ///
    /// Starts the position poller when the protocol needs one; an already
    /// running poller is reused.
    pub async fn cast_track(&self, track_id: TrackId, metadata: TrackMetadata) -> CastResult<()> {
        let (epoch, strategy) = self.inner.target().ok_or(CastError::NotConnected)?;

        if let Err(e) = strategy.load_track(track_id, &metadata).await {
            log::warn!("[CastController] Failed to cast track {}: {}", track_id, e);
            return Err(CastError::command(e.command, &e.source));
        }

        let polls = strategy.capabilities().position_polling;
        let applied = self.inner.publish(|state| {
            if state.epoch != epoch {
                return None;
            }
            state.record.load_track(track_id, metadata.duration_secs);
            if polls {
                ControllerInner::ensure_poller(&self.inner, state);
            }
            Some(())
        });

        if applied.is_none() {
            log::warn!(
                "[CastController] Session changed while loading track {}, result dropped",
                track_id
            );
            return Err(CastError::NotConnected);
        }

        log::info!(
            "[CastController] Casting track {} ({} - {}) via {}",
            track_id,
            metadata.artist,
            metadata.title,
            strategy.protocol()
        );
        self.inner.emitter.emit_cast(CastEvent::TrackLoaded {
            track_id,
            timestamp: now_millis(),
        });
        Ok(())
    }

    /// Resumes playback. No-op when not connected.
    pub async fn cast_play(&self) {
        self.transport(Transport::Play).await;
    }

    /// Pauses playback. No-op when not connected.
    pub async fn cast_pause(&self) {
        self.transport(Transport::Pause).await;
    }

    /// Stops playback and clears the current track. No-op when not connected.
    pub async fn cast_stop(&self) {
        self.transport(Transport::Stop).await;
    }

    /// Seeks within the current track.
    ///
    /// Skipped without a backend call on protocols that cannot seek. The
    /// local position is not updated; it catches up with the next position
    /// report.
    pub async fn cast_seek(&self, position_secs: f64) {
        let Some((_, strategy)) = self.inner.target() else {
            log::debug!("[CastController] Seek ignored: not connected");
            return;
        };
        if !strategy.capabilities().seek {
            log::debug!(
                "[CastController] Seek not supported by {}, skipped",
                strategy.protocol()
            );
            return;
        }

        if let Err(e) = strategy.seek(position_secs.max(0.0)).await {
            self.inner.report_failure(&e);
        }
    }

    /// Sets the device volume from a UI percentage (clamped to 0-100).
    pub async fn cast_set_volume(&self, percent: f64) {
        let Some((_, strategy)) = self.inner.target() else {
            log::debug!("[CastController] Volume ignored: not connected");
            return;
        };

        if let Err(e) = strategy.set_volume(normalize_volume(percent)).await {
            self.inner.report_failure(&e);
        }
    }

    async fn transport(&self, command: Transport) {
        let Some((epoch, strategy)) = self.inner.target() else {
            log::debug!("[CastController] {:?} ignored: not connected", command);
            return;
        };

        let result = match command {
            Transport::Play => strategy.play().await,
            Transport::Pause => strategy.pause().await,
            Transport::Stop => strategy.stop().await,
        };

        if let Err(e) = result {
            self.inner.report_failure(&e);
            return;
        }

        self.inner.publish(|state| {
            if state.epoch != epoch {
                return None;
            }
            match command {
                Transport::Play => state.record.set_playing(true),
                Transport::Pause => state.record.set_playing(false),
                Transport::Stop => state.record.stop(),
            }
            Some(())
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Poller
    // ─────────────────────────────────────────────────────────────────────────

    /// Stops the position poller, if running.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.inner.state.lock().poller.take() {
            log::debug!("[CastController] Poller #{} stopped on request", handle.id());
        }
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .state
            .lock()
            .poller
            .as_ref()
            .is_some_and(PollerHandle::is_active)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State access
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a listener notified after every session mutation.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(listener)
    }

    /// Returns a snapshot of the session.
    pub fn cast_state(&self) -> Session {
        self.inner.state.lock().record.clone()
    }

    pub fn is_casting(&self) -> bool {
        self.inner.state.lock().record.is_connected
    }

    pub fn connected_device(&self) -> Option<CastDevice> {
        self.inner.state.lock().record.device.clone()
    }

    pub fn connected_protocol(&self) -> Option<CastProtocol> {
        self.inner.state.lock().record.protocol
    }

    pub fn cast_position(&self) -> CastPosition {
        self.inner.state.lock().record.position()
    }
}

impl ControllerInner {
    fn target(&self) -> Option<(u64, Arc<dyn ProtocolStrategy>)> {
        self.state.lock().target()
    }

    /// Runs `mutate` on the session and notifies subscribers once if it
    /// returns `Some`.
    fn publish<R>(&self, mutate: impl FnOnce(&mut ActiveSession) -> Option<R>) -> Option<R> {
        let _dispatch = self.bus.dispatch_lock();
        let (result, snapshot) = {
            let mut state = self.state.lock();
            let result = mutate(&mut state);
            let snapshot = result.is_some().then(|| state.record.clone());
            (result, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.bus.notify(&snapshot);
        }
        result
    }

    fn report_failure(&self, err: &DispatchError) {
        log::warn!("[CastController] {} failed: {}", err.command, err.source);
        self.emitter.emit_cast(CastEvent::CommandFailed {
            command: err.command.clone(),
            error: err.source.to_string(),
            timestamp: now_millis(),
        });
    }

    /// Starts the poller unless one is already running for this session.
    fn ensure_poller(this: &Arc<Self>, state: &mut ActiveSession) {
        if state.poller.as_ref().is_some_and(PollerHandle::is_active) {
            return;
        }

        let weak = Arc::downgrade(this);
        let handle = PollerHandle::spawn(
            this.spawner.as_ref(),
            this.config.poll_interval(),
            move |poller_id| Self::poll_tick(weak.clone(), poller_id),
        );
        log::debug!("[CastController] Poller #{} started", handle.id());
        state.poller = Some(handle);
    }

    async fn poll_tick(inner: Weak<Self>, poller_id: u64) -> ControlFlow<()> {
        let Some(this) = inner.upgrade() else {
            return ControlFlow::Break(());
        };

        let strategy = {
            let mut state = this.state.lock();
            match state.poll_target(poller_id) {
                Some(strategy) => strategy,
                None => {
                    state.retire_poller(poller_id);
                    log::debug!("[CastController] Poller #{} is stale, stopping", poller_id);
                    return ControlFlow::Break(());
                }
            }
        };

        match strategy.position().await {
            Ok(info) => this.apply_position(poller_id, info),
            Err(e) => {
                log::debug!("[CastController] Position poll failed: {}", e);
                ControlFlow::Continue(())
            }
        }
    }

    fn apply_position(&self, poller_id: u64, info: PositionInfo) -> ControlFlow<()> {
        let outcome = self.publish(|state| {
            if state.poll_target(poller_id).is_none() {
                state.retire_poller(poller_id);
                return None;
            }
            let was_playing = state.record.is_playing;
            state.record.apply_position(&info);
            let ended = was_playing && info.transport_state == TransportState::Stopped;
            Some(ended.then_some(state.record.current_track_id))
        });

        match outcome {
            None => ControlFlow::Break(()),
            Some(Some(track_id)) => {
                log::info!("[CastController] Track {:?} ended on device", track_id);
                self.emitter.emit_cast(CastEvent::TrackEnded {
                    track_id,
                    timestamp: now_millis(),
                });
                ControlFlow::Continue(())
            }
            Some(None) => ControlFlow::Continue(()),
        }
    }
}
