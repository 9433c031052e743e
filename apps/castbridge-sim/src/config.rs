//! Simulator configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use castbridge_core::{CastConfig, CastDevice, CastProtocol};
use serde::Deserialize;

/// Simulator configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Protocol the scripted session connects with.
    /// Override: `CASTBRIDGE_PROTOCOL`
    pub protocol: CastProtocol,

    /// Display name of the simulated renderer.
    pub device_name: String,

    /// Address reported for the simulated renderer.
    pub device_ip: String,

    /// Port reported for the simulated renderer.
    pub device_port: u16,

    /// Length of the scripted track in seconds.
    /// Override: `CASTBRIDGE_TRACK_DURATION`
    pub track_duration_secs: f64,

    /// Position poll period for DLNA sessions (milliseconds).
    /// Override: `CASTBRIDGE_POLL_INTERVAL_MS`
    pub poll_interval_ms: u64,

    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,

    /// Volume applied during the script, as a UI percentage.
    pub volume_percent: f64,

    /// Renderer commands that fail on purpose (e.g. `["seek"]`).
    pub fail_commands: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let core = CastConfig::default();
        Self {
            protocol: CastProtocol::Dlna,
            device_name: "Simulated Renderer".to_string(),
            device_ip: "127.0.0.1".to_string(),
            device_port: 49152,
            track_duration_secs: 20.0,
            poll_interval_ms: core.poll_interval_ms,
            event_channel_capacity: core.event_channel_capacity,
            volume_percent: 60.0,
            fail_commands: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CASTBRIDGE_PROTOCOL") {
            match val.parse() {
                Ok(protocol) => self.protocol = protocol,
                Err(e) => log::warn!("Ignoring CASTBRIDGE_PROTOCOL: {}", e),
            }
        }

        if let Ok(val) = std::env::var("CASTBRIDGE_TRACK_DURATION") {
            if let Ok(secs) = val.parse() {
                self.track_duration_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("CASTBRIDGE_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                self.poll_interval_ms = ms;
            }
        }

        // Note: CASTBRIDGE_LOG_LEVEL is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to castbridge-core's CastConfig type.
    pub fn to_cast_config(&self) -> CastConfig {
        CastConfig {
            poll_interval_ms: self.poll_interval_ms,
            event_channel_capacity: self.event_channel_capacity,
        }
    }

    /// The device the scripted session connects to.
    pub fn device(&self) -> CastDevice {
        CastDevice {
            id: format!("sim:{}", self.protocol),
            name: self.device_name.clone(),
            ip: self.device_ip.clone(),
            port: self.device_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimConfig::from_yaml("{}").unwrap();
        assert_eq!(config.protocol, CastProtocol::Dlna);
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(config.fail_commands.is_empty());
    }

    #[test]
    fn yaml_fields_are_read() {
        let config = SimConfig::from_yaml(
            "protocol: airplay\n\
             device_name: Bedroom\n\
             track_duration_secs: 5\n\
             fail_commands: [seek, set_volume]\n",
        )
        .unwrap();

        assert_eq!(config.protocol, CastProtocol::Airplay);
        assert_eq!(config.device_name, "Bedroom");
        assert_eq!(config.track_duration_secs, 5.0);
        assert_eq!(config.fail_commands, vec!["seek", "set_volume"]);
        assert_eq!(config.device().id, "sim:airplay");
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        assert!(SimConfig::from_yaml("protocol: bluetooth").is_err());
    }

    #[test]
    fn converts_to_cast_config() {
        let config = SimConfig {
            poll_interval_ms: 250,
            ..Default::default()
        };
        let core = config.to_cast_config();
        assert_eq!(core.poll_interval_ms, 250);
        assert!(core.validate().is_ok());
    }
}
