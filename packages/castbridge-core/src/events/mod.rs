//! Event system for cast lifecycle and non-fatal failure reporting.
//!
//! This module provides:
//! - [`EventEmitter`] trait for the controller to emit events
//! - [`BroadcastEventBridge`] for fan-out to any number of UI receivers
//! - [`CastEvent`], the event vocabulary
//!
//! Session state changes are delivered separately through the synchronous
//! [`NotificationBus`](crate::bus::NotificationBus); events here describe
//! things that happened rather than the resulting state.

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::types::{CastDevice, CastProtocol, TrackId};

/// Events related to the cast session lifecycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CastEvent {
    /// A device connection was established.
    Connected {
        device: CastDevice,
        protocol: CastProtocol,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The session was reset to the disconnected state.
    Disconnected {
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A track was loaded and started on the device.
    TrackLoaded {
        #[serde(rename = "trackId")]
        track_id: TrackId,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A fire-and-forget command failed on the device.
    ///
    /// Nothing was changed locally; the UI may show transient feedback.
    CommandFailed {
        /// Wire name of the failed command (e.g. `dlna_seek`).
        command: String,
        /// Error message describing the failure.
        error: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A polled device went from playing to stopped.
    TrackEnded {
        #[serde(rename = "trackId")]
        #[serde(skip_serializing_if = "Option::is_none")]
        track_id: Option<TrackId>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}
