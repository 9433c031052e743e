//! Shared test doubles for the dispatch, poller and controller tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{CastBackend, WireMetadata};
use crate::error::{BackendError, BackendResult};
use crate::events::{CastEvent, EventEmitter};
use crate::runtime::{BackgroundTask, TaskSpawner, TokioSpawner};
use crate::types::{CastProtocol, PositionInfo, TrackId, TransportState};

/// A recorded backend command. Position queries are only counted.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Connect {
        protocol: CastProtocol,
        device_id: String,
    },
    Disconnect(CastProtocol),
    PlayTrack {
        protocol: CastProtocol,
        track_id: TrackId,
        metadata: WireMetadata,
    },
    LoadMedia {
        protocol: CastProtocol,
        metadata: WireMetadata,
    },
    Play(CastProtocol),
    Pause(CastProtocol),
    Stop(CastProtocol),
    Seek {
        protocol: CastProtocol,
        position_secs: f64,
    },
    SetVolume {
        protocol: CastProtocol,
        volume: f32,
    },
}

/// Recording backend with per-command failure injection.
pub struct MockBackend {
    calls: Mutex<Vec<BackendCall>>,
    failing: Mutex<HashSet<&'static str>>,
    positions: Mutex<VecDeque<PositionInfo>>,
    fallback_position: Mutex<PositionInfo>,
    position_delay: Mutex<Option<Duration>>,
    position_queries: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            positions: Mutex::new(VecDeque::new()),
            fallback_position: Mutex::new(PositionInfo {
                position_secs: 0.0,
                duration_secs: 0.0,
                transport_state: TransportState::Playing,
            }),
            position_delay: Mutex::new(None),
            position_queries: AtomicUsize::new(0),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Makes the named command (`"connect"`, `"seek"`, ...) fail from now on.
    pub fn fail_on(&self, command: &'static str) {
        self.failing.lock().insert(command);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    /// Queues a position report; the last one queued keeps being returned.
    pub fn push_position(&self, position: f64, duration: f64, state: TransportState) {
        let info = PositionInfo {
            position_secs: position,
            duration_secs: duration,
            transport_state: state,
        };
        self.positions.lock().push_back(info);
    }

    /// Makes every position query take `delay` before answering.
    pub fn delay_positions(&self, delay: Duration) {
        *self.position_delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn position_queries(&self) -> usize {
        self.position_queries.load(Ordering::SeqCst)
    }

    fn record(&self, command: &'static str, call: BackendCall) -> BackendResult<()> {
        self.calls.lock().push(call);
        self.check(command)
    }

    fn check(&self, command: &'static str) -> BackendResult<()> {
        if !self.failing.lock().contains(command) {
            return Ok(());
        }
        Err(match command {
            "connect" => BackendError::Connection("connect rejected".to_string()),
            "get_position" => BackendError::Timeout("get_position".to_string()),
            other => BackendError::Playback(format!("{} rejected", other)),
        })
    }
}

#[async_trait]
impl CastBackend for MockBackend {
    async fn connect(&self, protocol: CastProtocol, device_id: &str) -> BackendResult<()> {
        self.record(
            "connect",
            BackendCall::Connect {
                protocol,
                device_id: device_id.to_string(),
            },
        )
    }

    async fn disconnect(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.record("disconnect", BackendCall::Disconnect(protocol))
    }

    async fn play_track(
        &self,
        protocol: CastProtocol,
        track_id: TrackId,
        metadata: &WireMetadata,
    ) -> BackendResult<()> {
        self.record(
            "play_track",
            BackendCall::PlayTrack {
                protocol,
                track_id,
                metadata: metadata.clone(),
            },
        )
    }

    async fn load_media(
        &self,
        protocol: CastProtocol,
        metadata: &WireMetadata,
    ) -> BackendResult<()> {
        self.record(
            "load_media",
            BackendCall::LoadMedia {
                protocol,
                metadata: metadata.clone(),
            },
        )
    }

    async fn play(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.record("play", BackendCall::Play(protocol))
    }

    async fn pause(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.record("pause", BackendCall::Pause(protocol))
    }

    async fn stop(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.record("stop", BackendCall::Stop(protocol))
    }

    async fn seek(&self, protocol: CastProtocol, position_secs: f64) -> BackendResult<()> {
        self.record(
            "seek",
            BackendCall::Seek {
                protocol,
                position_secs,
            },
        )
    }

    async fn set_volume(&self, protocol: CastProtocol, volume: f32) -> BackendResult<()> {
        self.record("set_volume", BackendCall::SetVolume { protocol, volume })
    }

    async fn get_position(&self, _protocol: CastProtocol) -> BackendResult<PositionInfo> {
        self.position_queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.position_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check("get_position")?;

        let mut queue = self.positions.lock();
        let mut fallback = self.fallback_position.lock();
        if let Some(next) = queue.pop_front() {
            *fallback = next;
        }
        Ok(*fallback)
    }
}

/// Emitter that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<CastEvent>>,
}

impl RecordingEmitter {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CastEvent> {
        self.events.lock().clone()
    }

    pub fn failed_commands(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                CastEvent::CommandFailed { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn track_endings(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, CastEvent::TrackEnded { .. }))
            .count()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit_cast(&self, event: CastEvent) {
        self.events.lock().push(event);
    }
}

/// Tokio spawner that counts the tasks handed to it.
pub struct RecordingSpawner {
    inner: TokioSpawner,
    spawned: AtomicUsize,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self {
            inner: TokioSpawner::current(),
            spawned: AtomicUsize::new(0),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl TaskSpawner for RecordingSpawner {
    fn spawn_cancellable(&self, cancel: CancellationToken, task: BackgroundTask) {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        self.inner.spawn_cancellable(cancel, task);
    }
}
