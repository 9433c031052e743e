//! Command surface of the external protocol backends.
//!
//! The backends own discovery, sockets and the media-control wire protocols.
//! The controller reaches them only through [`CastBackend`], which makes the
//! whole session logic testable without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;
use crate::types::{CastProtocol, PositionInfo, TrackId, TrackMetadata};

/// Flat metadata schema expected by every backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_url: Option<String>,
    pub duration_secs: Option<u64>,
}

impl From<&TrackMetadata> for WireMetadata {
    fn from(meta: &TrackMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            artist: meta.artist.clone(),
            album: meta.album.clone(),
            artwork_url: meta.artwork_url.clone(),
            duration_secs: meta
                .duration_secs
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| secs.round() as u64),
        }
    }
}

/// Asynchronous commands exposed by the protocol backends.
///
/// Every method addresses the backend of one protocol. Not every protocol
/// implements every command: AirPlay has no `seek`, and only DLNA answers
/// `get_position`. The dispatch strategies know which calls are valid.
#[async_trait]
pub trait CastBackend: Send + Sync {
    /// Opens a control connection to a discovered device.
    async fn connect(&self, protocol: CastProtocol, device_id: &str) -> BackendResult<()>;

    /// Closes the control connection.
    async fn disconnect(&self, protocol: CastProtocol) -> BackendResult<()>;

    /// Loads and starts a track in one call (Chromecast, DLNA).
    async fn play_track(
        &self,
        protocol: CastProtocol,
        track_id: TrackId,
        metadata: &WireMetadata,
    ) -> BackendResult<()>;

    /// Loads media without starting it (AirPlay).
    async fn load_media(&self, protocol: CastProtocol, metadata: &WireMetadata)
        -> BackendResult<()>;

    async fn play(&self, protocol: CastProtocol) -> BackendResult<()>;

    async fn pause(&self, protocol: CastProtocol) -> BackendResult<()>;

    async fn stop(&self, protocol: CastProtocol) -> BackendResult<()>;

    /// Seeks within the current track.
    async fn seek(&self, protocol: CastProtocol, position_secs: f64) -> BackendResult<()>;

    /// Sets the device volume, normalized to `[0.0, 1.0]`.
    async fn set_volume(&self, protocol: CastProtocol, volume: f32) -> BackendResult<()>;

    /// Queries position, duration and transport state (DLNA).
    async fn get_position(&self, protocol: CastProtocol) -> BackendResult<PositionInfo>;
}
