//! AirPlay dispatch strategy.
//!
//! RAOP senders load media and start it as two separate commands, and have
//! no seek. The default [`ProtocolStrategy::seek`] rejects it without a
//! backend call.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    run, Capabilities, CastBackend, CastOperation, DispatchResult, ProtocolStrategy, WireMetadata,
};
use crate::types::{CastDevice, CastProtocol, TrackId, TrackMetadata};

const PROTOCOL: CastProtocol = CastProtocol::Airplay;

pub struct AirPlayStrategy {
    backend: Arc<dyn CastBackend>,
}

impl AirPlayStrategy {
    pub fn new(backend: Arc<dyn CastBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ProtocolStrategy for AirPlayStrategy {
    fn protocol(&self) -> CastProtocol {
        PROTOCOL
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            seek: false,
            position_polling: false,
        }
    }

    async fn connect(&self, device: &CastDevice) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Connect, self.backend.connect(PROTOCOL, &device.id)).await
    }

    async fn disconnect(&self) -> DispatchResult<()> {
        run(PROTOCOL, CastOperation::Disconnect, self.backend.disconnect(PROTOCOL)).await
    }

    async fn load_track(
        &self,
        _track_id: TrackId,
        metadata: &TrackMetadata,
    ) -> DispatchResult<()> {
        let wire = WireMetadata::from(metadata);
        run(
            PROTOCOL,
            CastOperation::LoadMedia,
            self.backend.load_media(PROTOCOL, &wire),
        )
        .await?;
        run(PROTOCOL, CastOperation::Play, self.backend.play(PROTOCOL)).await
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

    async fn set_volume(&self, volume: f32) -> DispatchResult<()> {
        run(
            PROTOCOL,
            CastOperation::SetVolume,
            self.backend.set_volume(PROTOCOL, volume),
        )
        .await
    }
}
