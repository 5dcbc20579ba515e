//! Configuration management for lumatone-link
//!
//! Handles loading, parsing, and hot-reloading of the YAML configuration file.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::fs;
use tracing::info;

pub use watcher::ConfigWatcher;

use crate::monitor::MonitorConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub midi: MidiConfig,
}

/// Device detection and liveness settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Look for a keyboard whenever none is connected
    #[serde(default = "default_true")]
    pub detect_if_disconnected: bool,
    /// Probe the keyboard after a period of silence
    #[serde(default = "default_true")]
    pub check_if_inactive: bool,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_detect_routine_timeout_ms")]
    pub detect_routine_timeout_ms: u64,
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,
    #[serde(default = "default_max_missed_probes")]
    pub max_missed_probes: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            detect_if_disconnected: true,
            check_if_inactive: true,
            response_timeout_ms: default_response_timeout_ms(),
            detect_routine_timeout_ms: default_detect_routine_timeout_ms(),
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
            max_missed_probes: default_max_missed_probes(),
        }
    }
}

impl ConnectionConfig {
    pub fn to_monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            detect_if_disconnected: self.detect_if_disconnected,
            check_if_inactive: self.check_if_inactive,
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            detect_routine_timeout: Duration::from_millis(self.detect_routine_timeout_ms),
            inactivity_timeout: Duration::from_millis(self.inactivity_timeout_ms),
            max_missed_probes: self.max_missed_probes,
        }
    }
}

/// MIDI client settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MidiConfig {
    /// Client name announced to the MIDI backend
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Device id of the input to try first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_input: Option<String>,
    /// Device id of the output to try first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_output: Option<String>,
    /// How often the driver loop ticks the monitor
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            preferred_input: None,
            preferred_output: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl MidiConfig {
    /// Preferred pair, only when both halves are configured
    pub fn preferred_pair(&self) -> Option<(String, String)> {
        match (&self.preferred_input, &self.preferred_output) {
            (Some(input), Some(output)) => Some((input.clone(), output.clone())),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file; a missing file yields the defaults
    pub async fn load(path: &str) -> Result<Self> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config file: {}", path))
            }
        };

        let config: AppConfig = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path))?
        };

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        let connection = &self.connection;
        if connection.response_timeout_ms == 0 {
            anyhow::bail!("connection.response_timeout_ms must be greater than 0");
        }
        if connection.detect_routine_timeout_ms == 0 {
            anyhow::bail!("connection.detect_routine_timeout_ms must be greater than 0");
        }
        if connection.inactivity_timeout_ms == 0 {
            anyhow::bail!("connection.inactivity_timeout_ms must be greater than 0");
        }
        if connection.max_missed_probes == 0 {
            anyhow::bail!("connection.max_missed_probes must be at least 1");
        }

        if self.midi.client_name.trim().is_empty() {
            anyhow::bail!("midi.client_name cannot be empty");
        }
        if self.midi.tick_interval_ms == 0 {
            anyhow::bail!("midi.tick_interval_ms must be greater than 0");
        }
        if self.midi.preferred_input.is_some() != self.midi.preferred_output.is_some() {
            anyhow::bail!("midi.preferred_input and midi.preferred_output must be set together");
        }

        Ok(())
    }
}

fn default_true() -> bool { true }
fn default_response_timeout_ms() -> u64 { 600 }
fn default_detect_routine_timeout_ms() -> u64 { 1000 }
fn default_inactivity_timeout_ms() -> u64 { 2000 }
fn default_max_missed_probes() -> u32 { 2 }
fn default_client_name() -> String { "lumatone-link".to_string() }
fn default_tick_interval_ms() -> u64 { 5 }
