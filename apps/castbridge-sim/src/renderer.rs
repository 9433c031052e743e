//! In-process renderer standing in for the real protocol backends.
//!
//! Playback position advances with the (tokio) clock while playing, so the
//! DLNA poller sees a moving position and an eventual end of track.

use std::collections::HashSet;

use async_trait::async_trait;
use castbridge_core::{
    BackendError, BackendResult, CastBackend, CastProtocol, PositionInfo, TrackId, TransportState,
    WireMetadata,
};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Playback {
    title: String,
    duration_secs: f64,
    /// Position at the last state change.
    offset_secs: f64,
    /// Set while playing.
    resumed_at: Option<Instant>,
}

impl Playback {
    fn position(&self) -> f64 {
        let elapsed = self
            .resumed_at
            .map(|at| at.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let position = self.offset_secs + elapsed;
        if self.duration_secs > 0.0 {
            position.min(self.duration_secs)
        } else {
            position
        }
    }

    fn finished(&self) -> bool {
        self.duration_secs > 0.0 && self.position() >= self.duration_secs
    }

    fn freeze(&mut self) {
        self.offset_secs = self.position();
        self.resumed_at = None;
    }
}

#[derive(Debug, Default)]
struct RendererState {
    connected: Option<CastProtocol>,
    media: Option<Playback>,
    volume: f32,
}

/// Simulated renderer speaking every protocol.
pub struct SimulatedRenderer {
    state: Mutex<RendererState>,
    failing: HashSet<String>,
}

impl SimulatedRenderer {
    /// Creates a renderer that fails the named commands (`"seek"`, ...).
    pub fn new(fail_commands: impl IntoIterator<Item = String>) -> Self {
        Self {
            state: Mutex::new(RendererState {
                volume: 1.0,
                ..Default::default()
            }),
            failing: fail_commands.into_iter().collect(),
        }
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn check(&self, command: &str, protocol: CastProtocol) -> BackendResult<()> {
        if self.failing.contains(command) {
            return Err(BackendError::Playback(format!(
                "{} rejected by simulated renderer",
                command
            )));
        }
        match self.state.lock().connected {
            Some(active) if active == protocol => Ok(()),
            _ => Err(BackendError::NotConnected),
        }
    }

    fn load(&self, metadata: &WireMetadata, autoplay: bool) {
        let duration_secs = metadata.duration_secs.unwrap_or(0) as f64;
        log::info!(
            "[SimRenderer] Loaded \"{}\" ({}s){}",
            metadata.title,
            duration_secs,
            if autoplay { ", playing" } else { "" }
        );
        self.state.lock().media = Some(Playback {
            title: metadata.title.clone(),
            duration_secs,
            offset_secs: 0.0,
            resumed_at: autoplay.then(Instant::now),
        });
    }

    fn with_media<T>(&self, f: impl FnOnce(&mut Playback) -> T) -> BackendResult<T> {
        let mut state = self.state.lock();
        let media = state
            .media
            .as_mut()
            .ok_or_else(|| BackendError::Playback("no media loaded".to_string()))?;
        Ok(f(media))
    }
}

#[async_trait]
impl CastBackend for SimulatedRenderer {
    async fn connect(&self, protocol: CastProtocol, device_id: &str) -> BackendResult<()> {
        if self.failing.contains("connect") {
            return Err(BackendError::Connection(format!(
                "{} refused the connection",
                device_id
            )));
        }
        log::info!("[SimRenderer] {} connected as {}", device_id, protocol);
        let mut state = self.state.lock();
        state.connected = Some(protocol);
        state.media = None;
        Ok(())
    }

    async fn disconnect(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.check("disconnect", protocol)?;
        let mut state = self.state.lock();
        state.connected = None;
        state.media = None;
        Ok(())
    }

    async fn play_track(
        &self,
        protocol: CastProtocol,
        track_id: TrackId,
        metadata: &WireMetadata,
    ) -> BackendResult<()> {
        self.check("play_track", protocol)?;
        log::debug!("[SimRenderer] play_track {}", track_id);
        self.load(metadata, true);
        Ok(())
    }

    async fn load_media(
        &self,
        protocol: CastProtocol,
        metadata: &WireMetadata,
    ) -> BackendResult<()> {
        self.check("load_media", protocol)?;
        self.load(metadata, false);
        Ok(())
    }

    async fn play(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.check("play", protocol)?;
        self.with_media(|media| {
            if media.resumed_at.is_none() && !media.finished() {
                media.resumed_at = Some(Instant::now());
            }
        })
    }

    async fn pause(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.check("pause", protocol)?;
        self.with_media(Playback::freeze)
    }

    async fn stop(&self, protocol: CastProtocol) -> BackendResult<()> {
        self.check("stop", protocol)?;
        if let Some(media) = self.state.lock().media.take() {
            log::info!("[SimRenderer] Stopped \"{}\"", media.title);
        }
        Ok(())
    }

    async fn seek(&self, protocol: CastProtocol, position_secs: f64) -> BackendResult<()> {
        self.check("seek", protocol)?;
        self.with_media(|media| {
            let playing = media.resumed_at.is_some();
            let upper = if media.duration_secs > 0.0 {
                media.duration_secs
            } else {
                f64::MAX
            };
            media.offset_secs = position_secs.clamp(0.0, upper);
            media.resumed_at = playing.then(Instant::now);
        })
    }

    async fn set_volume(&self, protocol: CastProtocol, volume: f32) -> BackendResult<()> {
        self.check("set_volume", protocol)?;
        self.state.lock().volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    async fn get_position(&self, protocol: CastProtocol) -> BackendResult<PositionInfo> {
        self.check("get_position", protocol)?;
        let state = self.state.lock();
        let Some(media) = state.media.as_ref() else {
            return Ok(PositionInfo {
                position_secs: 0.0,
                duration_secs: 0.0,
                transport_state: TransportState::NoMediaPresent,
            });
        };

        let transport_state = if media.finished() {
            TransportState::Stopped
        } else if media.resumed_at.is_some() {
            TransportState::Playing
        } else {
            TransportState::Paused
        };
        Ok(PositionInfo {
            position_secs: media.position(),
            duration_secs: media.duration_secs,
            transport_state,
        })
    }
}
