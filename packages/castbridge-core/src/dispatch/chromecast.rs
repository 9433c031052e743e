//! Chromecast dispatch strategy.
//!
//! Chromecast receivers load and start a track with a single command and
//! push status updates on their own channel, so no polling is needed.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    run, Capabilities, CastBackend, CastOperation, DispatchResult, ProtocolStrategy, WireMetadata,
};
use crate::types::{CastDevice, CastProtocol, TrackId, TrackMetadata};

const PROTOCOL: CastProtocol = CastProtocol::Chromecast;

pub struct ChromecastStrategy {
    backend: Arc<dyn CastBackend>,
}

impl ChromecastStrategy {
    pub fn new(backend: Arc<dyn CastBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ProtocolStrategy for ChromecastStrategy {
    fn protocol(&self) -> CastProtocol {
        PROTOCOL
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            seek: true,
            position_polling: false,
        }
    }

    async fn connect(&self, device: &CastDevice) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Connect, self.backend.connect(PROTOCOL, &device.id)).await
    }

    async fn disconnect(&self) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Disconnect, self.backend.disconnect(PROTOCOL)).await
    }

    async fn load_track(&self, track_id: TrackId, metadata: &TrackMetadata) -> DispatchResult<()> {
        let wire = WireMetadata::from(metadata);
        run(
            PROTOCOL,
            CastOperation::PlayTrack,
            self.backend.play_track(PROTOCOL, track_id, &wire),
        )
        .await
    }

    async fn play(&self) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Play, self.backend.play(PROTOCOL)).await
    }

    async fn pause(&self) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Pause, self.backend.pause(PROTOCOL)).await
    }

    async fn stop(&self) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Stop, self.backend.stop(PROTOCOL)).await
    }

    async fn seek(&self, position_secs: f64) -> DispatchResult<()> {
        run(
            PROTOCOL,
            CastOperation::Seek,
            self.backend.seek(PROTOCOL, position_secs),
        )
        .await
    }

    async fn set_volume(&self, volume: f32) -> DispatchResult<()> {
        run(
            PROTOCOL,
            CastOperation::SetVolume,
            self.backend.set_volume(PROTOCOL, volume),
        )
        .await
    }
}
