//! Castbridge Core - one cast session over Chromecast, DLNA and AirPlay.
//!
//! This crate keeps a single playback session against a remote renderer and
//! exposes it to the rest of an application regardless of which protocol the
//! renderer speaks. It is designed to be embedded in a desktop shell and in the
//! headless simulator binary.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`controller`]: The session controller, the public command surface
//! - [`session`]: The session record and its transitions
//! - [`dispatch`]: Per-protocol translation of operations into backend commands
//! - [`bus`]: Change notifications for session subscribers
//! - [`poller`]: Cancellable periodic task used for DLNA position polling
//! - [`events`]: Lifecycle and failure events for the host application
//! - [`config`]: Controller configuration
//! - [`runtime`]: Where the poller task runs, with cancellation
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`CastBackend`](dispatch::CastBackend): The device-facing command surface
//! - [`ProtocolStrategy`](dispatch::ProtocolStrategy): One protocol's dispatch rules
//! - [`TaskSpawner`](runtime::TaskSpawner): Running cancellable background tasks
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod poller;
pub mod runtime;
pub mod session;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at the crate root
pub use bus::{NotificationBus, Subscription};
pub use config::CastConfig;
pub use controller::CastController;
pub use dispatch::{CastBackend, DispatchError, ProtocolStrategy, WireMetadata};
pub use error::{BackendError, BackendResult, CastError, CastResult, ErrorCode};
pub use events::{BroadcastEventBridge, CastEvent, EventEmitter, LoggingEventEmitter};
pub use runtime::{BackgroundTask, TaskSpawner, TokioSpawner};
pub use session::Session;
pub use types::{
    CastDevice, CastPosition, CastProtocol, PositionInfo, TrackId, TrackMetadata, TransportState,
};
