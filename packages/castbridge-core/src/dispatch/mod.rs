//! Protocol dispatch layer.
//!
//! Translates an abstract session operation into the right backend command
//! and payload for one protocol. Each protocol is a [`ProtocolStrategy`];
//! [`strategy_for`] is the only place that maps a [`CastProtocol`] tag to
//! its strategy, so adding a protocol touches this module alone.

mod airplay;
mod backend;
mod chromecast;
mod dlna;

pub use airplay::AirPlayStrategy;
pub use backend::{CastBackend, WireMetadata};
pub use chromecast::ChromecastStrategy;
pub use dlna::DlnaStrategy;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{BackendError, BackendResult};
use crate::types::{CastDevice, CastProtocol, PositionInfo, TrackId, TrackMetadata};

/// Abstract operations a session can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOperation {
    Connect,
    Disconnect,
    PlayTrack,
    LoadMedia,
    Play,
    Pause,
    Stop,
    Seek,
    SetVolume,
    GetPosition,
}

impl CastOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::PlayTrack => "play_track",
            Self::LoadMedia => "load_media",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Seek => "seek",
            Self::SetVolume => "set_volume",
            Self::GetPosition => "get_position",
        }
    }
}

/// Wire command name of an operation, e.g. `dlna_play_track`.
pub fn command_name(protocol: CastProtocol, operation: CastOperation) -> String {
    format!("{}_{}", protocol.as_str(), operation.as_str())
}

/// A backend command failed during dispatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{command}: {source}")]
pub struct DispatchError {
    /// Wire name of the command that failed.
    pub command: String,
    #[source]
    pub source: BackendError,
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// What a protocol supports beyond the common command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The device accepts seek commands.
    pub seek: bool,
    /// The device pushes no position updates and must be polled.
    pub position_polling: bool,
}

/// One protocol's translation of session operations into backend commands.
#[async_trait]
pub trait ProtocolStrategy: Send + Sync {
    fn protocol(&self) -> CastProtocol;

    fn capabilities(&self) -> Capabilities;

    async fn connect(&self, device: &CastDevice) -> DispatchResult<()>;

    async fn disconnect(&self) -> DispatchResult<()>;

    /// Loads `track_id` and starts playback.
    async fn load_track(&self, track_id: TrackId, metadata: &TrackMetadata) -> DispatchResult<()>;

    async fn play(&self) -> DispatchResult<()>;

    async fn pause(&self) -> DispatchResult<()>;

    async fn stop(&self) -> DispatchResult<()>;

    /// Seeks within the current track.
    ///
    /// Protocols without [`Capabilities::seek`] fail with
    /// [`BackendError::Unsupported`] and make no backend call.
    async fn seek(&self, _position_secs: f64) -> DispatchResult<()> {
        Err(unsupported(self.protocol(), CastOperation::Seek))
    }

    /// Sets the normalized volume (`0.0..=1.0`).
    async fn set_volume(&self, volume: f32) -> DispatchResult<()>;

    /// Queries the playback position.
    ///
    /// Only protocols with [`Capabilities::position_polling`] answer.
    async fn position(&self) -> DispatchResult<PositionInfo> {
        Err(unsupported(self.protocol(), CastOperation::GetPosition))
    }
}

/// Returns the strategy for `protocol`, bound to `backend`.
pub fn strategy_for(
    protocol: CastProtocol,
    backend: Arc<dyn CastBackend>,
) -> Arc<dyn ProtocolStrategy> {
    match protocol {
        CastProtocol::Chromecast => Arc::new(ChromecastStrategy::new(backend)),
        CastProtocol::Dlna => Arc::new(DlnaStrategy::new(backend)),
        CastProtocol::Airplay => Arc::new(AirPlayStrategy::new(backend)),
    }
}

/// Failure for an operation the protocol does not have.
fn unsupported(protocol: CastProtocol, operation: CastOperation) -> DispatchError {
    let command = command_name(protocol, operation);
    DispatchError {
        source: BackendError::Unsupported(command.clone()),
        command,
    }
}

/// Runs one backend command, tagging a failure with its wire name.
pub(crate) async fn run<T, Fut>(
    protocol: CastProtocol,
    operation: CastOperation,
    command: Fut,
) -> DispatchResult<T>
where
    Fut: Future<Output = BackendResult<T>>,
{
    command.await.map_err(|source| DispatchError {
        command: command_name(protocol, operation),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BackendCall, MockBackend};

    fn device() -> CastDevice {
        CastDevice {
            id: "dev-1".to_string(),
            name: "Kitchen".to_string(),
            ip: "10.0.0.5".to_string(),
            port: 8009,
        }
    }

    fn metadata() -> TrackMetadata {
        TrackMetadata {
            title: "Blue in Green".to_string(),
            artist: "Miles Davis".to_string(),
            album: "Kind of Blue".to_string(),
            artwork_url: None,
            duration_secs: Some(337.0),
        }
    }

    #[test]
    fn command_names_are_protocol_prefixed() {
        assert_eq!(
            command_name(CastProtocol::Dlna, CastOperation::PlayTrack),
            "dlna_play_track"
        );
        assert_eq!(
            command_name(CastProtocol::Airplay, CastOperation::LoadMedia),
            "airplay_load_media"
        );
    }

    #[test]
    fn table_covers_every_protocol() {
        let backend = MockBackend::arc();
        for protocol in CastProtocol::ALL {
            assert_eq!(strategy_for(protocol, backend.clone()).protocol(), protocol);
        }
    }

    #[test]
    fn capabilities_per_protocol() {
        let backend = MockBackend::arc();
        let caps = |p| strategy_for(p, backend.clone()).capabilities();

        assert!(caps(CastProtocol::Chromecast).seek);
        assert!(!caps(CastProtocol::Chromecast).position_polling);
        assert!(caps(CastProtocol::Dlna).seek);
        assert!(caps(CastProtocol::Dlna).position_polling);
        assert!(!caps(CastProtocol::Airplay).seek);
        assert!(!caps(CastProtocol::Airplay).position_polling);
    }

    #[tokio::test]
    async fn single_call_load_for_chromecast_and_dlna() {
        for protocol in [CastProtocol::Chromecast, CastProtocol::Dlna] {
            let backend = MockBackend::arc();
            let strategy = strategy_for(protocol, backend.clone());

            strategy.load_track(7, &metadata()).await.unwrap();

            assert_eq!(
                backend.calls(),
                vec![BackendCall::PlayTrack {
                    protocol,
                    track_id: 7,
                    metadata: WireMetadata::from(&metadata()),
                }]
            );
        }
    }

    #[tokio::test]
    async fn airplay_load_is_load_media_then_play() {
        let backend = MockBackend::arc();
        let strategy = strategy_for(CastProtocol::Airplay, backend.clone());

        strategy.load_track(7, &metadata()).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::LoadMedia {
                    protocol: CastProtocol::Airplay,
                    metadata: WireMetadata::from(&metadata()),
                },
                BackendCall::Play(CastProtocol::Airplay),
            ]
        );
    }

    #[tokio::test]
    async fn airplay_load_stops_after_failed_load_media() {
        let backend = MockBackend::arc();
        backend.fail_on("load_media");
        let strategy = strategy_for(CastProtocol::Airplay, backend.clone());

        let err = strategy.load_track(7, &metadata()).await.unwrap_err();
        assert_eq!(err.command, "airplay_load_media");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn airplay_seek_makes_no_backend_call() {
        let backend = MockBackend::arc();
        let strategy = strategy_for(CastProtocol::Airplay, backend.clone());

        let err = strategy.seek(30.0).await.unwrap_err();
        assert_eq!(err.command, "airplay_seek");
        assert!(matches!(err.source, BackendError::Unsupported(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn connect_passes_device_id() {
        let backend = MockBackend::arc();
        let strategy = strategy_for(CastProtocol::Chromecast, backend.clone());

        strategy.connect(&device()).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Connect {
                protocol: CastProtocol::Chromecast,
                device_id: "dev-1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn failures_carry_wire_command_name() {
        let backend = MockBackend::arc();
        backend.fail_on("pause");
        let strategy = strategy_for(CastProtocol::Dlna, backend.clone());

        let err = strategy.pause().await.unwrap_err();
        assert_eq!(err.command, "dlna_pause");
        assert_eq!(
            err.to_string(),
            "dlna_pause: Playback error: pause rejected"
        );
    }

    #[tokio::test]
    async fn only_dlna_answers_position() {
        let backend = MockBackend::arc();

        let err = strategy_for(CastProtocol::Chromecast, backend.clone())
            .position()
            .await
            .unwrap_err();
        assert_eq!(err.command, "chromecast_get_position");

        strategy_for(CastProtocol::Dlna, backend.clone())
            .position()
            .await
            .unwrap();
        assert_eq!(backend.position_queries(), 1);
    }
}
