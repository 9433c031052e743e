//! Value types shared by the controller, the dispatch layer and backends.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a track in the music catalogue.
pub type TrackId = u64;

/// Remote playback protocol of a cast connection.
///
/// Selects the dispatch strategy and the capability set of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastProtocol {
    Chromecast,
    Dlna,
    Airplay,
}

impl CastProtocol {
    /// All supported protocols, in dispatch-table order.
    pub const ALL: [CastProtocol; 3] = [Self::Chromecast, Self::Dlna, Self::Airplay];

    /// Lower-case tag used as the prefix of wire command names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chromecast => "chromecast",
            Self::Dlna => "dlna",
            Self::Airplay => "airplay",
        }
    }
}

impl std::fmt::Display for CastProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown protocol tag.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown cast protocol: {0}")]
pub struct ParseCastProtocolError(String);

impl std::str::FromStr for CastProtocol {
    type Err = ParseCastProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromecast" | "googlecast" => Ok(Self::Chromecast),
            "dlna" | "upnp" => Ok(Self::Dlna),
            "airplay" => Ok(Self::Airplay),
            _ => Err(ParseCastProtocolError(s.to_string())),
        }
    }
}

/// A rendering device found by external discovery.
///
/// The controller never mutates a device; it keeps a copy for the lifetime
/// of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastDevice {
    /// Backend-assigned device identifier (passed to `connect`).
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// IPv4/IPv6 address of the device.
    pub ip: String,
    /// Control port of the device.
    pub port: u16,
}

/// Display metadata handed to a cast call.
///
/// Only `duration_secs` outlives the call, as the session's initial duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// Transport state reported by a polled renderer.
///
/// Parsed leniently: strings outside the UPnP AVTransport vocabulary map to
/// [`TransportState::Unknown`] rather than failing the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportState {
    Playing,
    #[serde(rename = "PAUSED_PLAYBACK")]
    Paused,
    Stopped,
    Transitioning,
    NoMediaPresent,
    Unknown,
}

impl TransportState {
    /// Parses a raw AVTransport state string. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PLAYING" => Self::Playing,
            "PAUSED_PLAYBACK" | "PAUSED" => Self::Paused,
            "STOPPED" => Self::Stopped,
            "TRANSITIONING" => Self::Transitioning,
            "NO_MEDIA_PRESENT" => Self::NoMediaPresent,
            _ => Self::Unknown,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Playing => write!(f, "PLAYING"),
            Self::Paused => write!(f, "PAUSED_PLAYBACK"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Transitioning => write!(f, "TRANSITIONING"),
            Self::NoMediaPresent => write!(f, "NO_MEDIA_PRESENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl<'de> Deserialize<'de> for TransportState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Position report returned by `get_position` on polled renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub position_secs: f64,
    pub duration_secs: f64,
    pub transport_state: TransportState,
}

/// Playback position of the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastPosition {
    pub position_secs: f64,
    pub duration_secs: f64,
}
