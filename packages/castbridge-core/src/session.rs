//! The session record: the single authoritative state of a cast connection.
//!
//! All mutations go through the methods below so the record invariants hold
//! after every transition:
//! - `protocol.is_some() == is_connected == device.is_some()`
//! - `0 <= position_secs <= duration_secs`
//! - `current_track_id` is only set while connected

use serde::Serialize;

use crate::types::{CastDevice, CastPosition, CastProtocol, PositionInfo, TrackId};

/// Snapshot of the current cast connection and its playback state.
///
/// Serializes to the camelCase shape consumed by UI layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_connected: bool,
    pub protocol: Option<CastProtocol>,
    pub device: Option<CastDevice>,
    pub is_playing: bool,
    pub current_track_id: Option<TrackId>,
    pub position_secs: f64,
    pub duration_secs: f64,
}

impl Session {
    /// A freshly connected session with no track loaded.
    pub fn connected(device: CastDevice, protocol: CastProtocol) -> Self {
        Self {
            is_connected: true,
            protocol: Some(protocol),
            device: Some(device),
            ..Self::default()
        }
    }

    /// Resets every field to the disconnected defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a successfully loaded track.
    ///
    /// Position restarts at zero; the duration comes from the track metadata
    /// when known and is otherwise zero until the device reports one.
    pub fn load_track(&mut self, track_id: TrackId, duration_secs: Option<f64>) {
        if !self.is_connected {
            return;
        }
        self.is_playing = true;
        self.current_track_id = Some(track_id);
        self.position_secs = 0.0;
        self.duration_secs = sanitize_secs(duration_secs.unwrap_or(0.0));
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = self.is_connected && playing;
    }

    /// Stops playback and forgets the current track.
    pub fn stop(&mut self) {
        self.is_playing = false;
        self.current_track_id = None;
    }

    /// Applies a polled position report.
    ///
    /// A reported duration of zero means the renderer does not know it; the
    /// previously known duration is kept. The duration is widened to cover
    /// the position so the record stays ordered.
    pub fn apply_position(&mut self, info: &PositionInfo) {
        self.is_playing = self.is_connected && info.transport_state.is_playing();

        let position = sanitize_secs(info.position_secs);
        let reported = sanitize_secs(info.duration_secs);
        let duration = if reported > 0.0 {
            reported
        } else {
            self.duration_secs
        };

        self.position_secs = position;
        self.duration_secs = duration.max(position);
    }

    pub fn position(&self) -> CastPosition {
        CastPosition {
            position_secs: self.position_secs,
            duration_secs: self.duration_secs,
        }
    }
}

/// Maps negative and non-finite values to zero.
fn sanitize_secs(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransportState;

    fn device() -> CastDevice {
        CastDevice {
            id: "renderer-1".to_string(),
            name: "Living Room".to_string(),
            ip: "192.168.1.40".to_string(),
            port: 1400,
        }
    }

    fn report(position: f64, duration: f64, state: TransportState) -> PositionInfo {
        PositionInfo {
            position_secs: position,
            duration_secs: duration,
            transport_state: state,
        }
    }

    fn assert_invariants(session: &Session) {
        assert_eq!(session.protocol.is_some(), session.is_connected);
        assert_eq!(session.device.is_some(), session.is_connected);
        assert!(session.position_secs >= 0.0);
        assert!(session.position_secs <= session.duration_secs);
        if session.current_track_id.is_some() {
            assert!(session.is_connected);
        }
    }

    #[test]
    fn default_is_disconnected() {
        let session = Session::default();
        assert!(!session.is_connected);
        assert!(!session.is_playing);
        assert_eq!(session.position_secs, 0.0);
        assert_eq!(session.duration_secs, 0.0);
        assert_invariants(&session);
    }

    #[test]
    fn connected_session_has_no_track() {
        let session = Session::connected(device(), CastProtocol::Dlna);
        assert!(session.is_connected);
        assert_eq!(session.protocol, Some(CastProtocol::Dlna));
        assert!(session.current_track_id.is_none());
        assert!(!session.is_playing);
        assert_invariants(&session);
    }

    #[test]
    fn load_track_requires_connection() {
        let mut session = Session::default();
        session.load_track(7, Some(200.0));
        assert!(session.current_track_id.is_none());
        assert_invariants(&session);
    }

    #[test]
    fn load_track_resets_position_and_takes_duration() {
        let mut session = Session::connected(device(), CastProtocol::Chromecast);
        session.position_secs = 12.0;
        session.duration_secs = 30.0;

        session.load_track(7, Some(200.0));
        assert!(session.is_playing);
        assert_eq!(session.current_track_id, Some(7));
        assert_eq!(session.position_secs, 0.0);
        assert_eq!(session.duration_secs, 200.0);

        session.load_track(8, None);
        assert_eq!(session.duration_secs, 0.0);
        assert_invariants(&session);
    }

    #[test]
    fn stop_clears_track() {
        let mut session = Session::connected(device(), CastProtocol::Airplay);
        session.load_track(7, Some(100.0));
        session.stop();
        assert!(!session.is_playing);
        assert!(session.current_track_id.is_none());
        assert!(session.is_connected);
    }

    #[test]
    fn reset_is_total() {
        let mut session = Session::connected(device(), CastProtocol::Dlna);
        session.load_track(7, Some(100.0));
        session.apply_position(&report(42.0, 100.0, TransportState::Playing));

        session.reset();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn apply_position_maps_transport_state() {
        let mut session = Session::connected(device(), CastProtocol::Dlna);
        session.load_track(1, Some(200.0));

        session.apply_position(&report(42.0, 200.0, TransportState::Playing));
        assert!(session.is_playing);
        assert_eq!(session.position_secs, 42.0);

        session.apply_position(&report(43.0, 200.0, TransportState::Transitioning));
        assert!(!session.is_playing);
        assert_invariants(&session);
    }

    #[test]
    fn apply_position_keeps_known_duration_when_device_reports_zero() {
        let mut session = Session::connected(device(), CastProtocol::Dlna);
        session.load_track(1, Some(180.0));

        session.apply_position(&report(10.0, 0.0, TransportState::Playing));
        assert_eq!(session.duration_secs, 180.0);
        assert_invariants(&session);
    }

    #[test]
    fn apply_position_never_breaks_ordering() {
        let mut session = Session::connected(device(), CastProtocol::Dlna);
        session.load_track(1, None);

        session.apply_position(&report(55.0, 0.0, TransportState::Playing));
        assert_eq!(session.position_secs, 55.0);
        assert_eq!(session.duration_secs, 55.0);

        session.apply_position(&report(-3.0, f64::NAN, TransportState::Paused));
        assert_eq!(session.position_secs, 0.0);
        assert_invariants(&session);
    }

    #[test]
    fn serializes_camel_case() {
        let mut session = Session::connected(device(), CastProtocol::Dlna);
        session.load_track(99, Some(60.0));

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["isConnected"], true);
        assert_eq!(json["protocol"], "dlna");
        assert_eq!(json["currentTrackId"], 99);
        assert_eq!(json["durationSecs"], 60.0);
        assert_eq!(json["device"]["name"], "Living Room");
    }
}
