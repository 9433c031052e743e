//! Centralized error types for the Castbridge core library.
//!
//! Two layers of errors exist:
//! - [`BackendError`]: failures reported by the external protocol backends
//! - [`CastError`]: failures surfaced by the session controller to its callers
//!
//! Both carry machine-readable codes via [`ErrorCode`] so a UI layer can
//! localize messages without parsing strings.

use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for UI consumers.
    fn code(&self) -> &'static str;
}

/// Error reported by a protocol backend command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The device could not be reached or refused the session.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The device rejected a playback command.
    #[error("Playback error: {0}")]
    Playback(String),

    /// The transport layer failed (socket, HTTP, SOAP).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend holds no connection for the protocol.
    #[error("Not connected")]
    NotConnected,

    /// The protocol has no such command.
    #[error("Unsupported command: {0}")]
    Unsupported(String),

    /// The device did not answer in time.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl ErrorCode for BackendError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "backend_connection_failed",
            Self::Playback(_) => "backend_playback_failed",
            Self::Transport(_) => "backend_transport_failed",
            Self::NotConnected => "backend_not_connected",
            Self::Unsupported(_) => "backend_unsupported",
            Self::Timeout(_) => "backend_timeout",
        }
    }
}

/// Convenient Result alias for backend commands.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error surfaced by the cast session controller.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum CastError {
    /// Connecting to a device failed. The session is unchanged.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A command that reports its outcome to the caller failed.
    #[error("Command {command} failed: {message}")]
    Command {
        /// Wire name of the failed command (e.g. `airplay_load_media`).
        command: String,
        /// Backend error message.
        message: String,
    },

    /// The operation requires an active cast connection.
    #[error("Not connected to a cast device")]
    NotConnected,

    /// Invalid controller configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CastError {
    /// Wraps a backend failure of the named wire command.
    pub fn command(command: impl Into<String>, err: &BackendError) -> Self {
        Self::Command {
            command: command.into(),
            message: err.to_string(),
        }
    }
}

impl ErrorCode for CastError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_failed",
            Self::Command { .. } => "command_failed",
            Self::NotConnected => "not_connected",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

/// Convenient Result alias for controller operations.
pub type CastResult<T> = Result<T, CastError>;
