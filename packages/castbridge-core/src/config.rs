//! Controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CastError;

/// Default period of the DLNA position poller.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Configuration for the cast session controller.
///
/// All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CastConfig {
    /// Period between position polls on polling protocols (milliseconds).
    pub poll_interval_ms: u64,

    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,
}

impl CastConfig {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), CastError> {
        if self.poll_interval_ms == 0 {
            return Err(CastError::Configuration(
                "poll_interval_ms must be >= 1 (interval panics on a zero period)".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(CastError::Configuration(
                "event_channel_capacity must be >= 1 (broadcast::channel panics on 0)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            event_channel_capacity: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = CastConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CastError::Configuration(_))
        ));
    }

    #[test]
    fn zero_channel_capacity_is_rejected() {
        let config = CastConfig {
            event_channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: CastConfig = serde_json::from_str(r#"{"poll_interval_ms":250}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.event_channel_capacity, 100);
    }
}
