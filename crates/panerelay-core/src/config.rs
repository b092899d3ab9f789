//! Relay configuration
//!
//! Loaded from `<home>/config.yaml`. Every field has a default, so a missing
//! file is not an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::transport::MONOSPACE_WRAPPER_LEN;

/// Environment variable overriding the relay home directory
pub const HOME_ENV: &str = "PANERELAY_HOME";

/// Config file name inside the relay home
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// How new pane content reaches the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Cleaned reply segments, deduplicated by fingerprint
    #[default]
    Extracted,
    /// Chrome-trimmed verbatim echo, deduplicated by the line cursor only
    Raw,
}

/// tmux session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    pub session: String,
    pub width: u16,
    pub height: u16,
    pub history_lines: u32,
    pub command: String,
    pub unattended_flag: String,
    pub env: BTreeMap<String, String>,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("LANG".to_string(), "C.UTF-8".to_string());
        env.insert(
            "CLAUDE_CODE_ENABLE_PROMPT_SUGGESTION".to_string(),
            "false".to_string(),
        );
        Self {
            session: "claude".to_string(),
            width: 200,
            height: 50,
            history_lines: 100,
            command: "claude".to_string(),
            unattended_flag: "--dangerously-skip-permissions".to_string(),
            env,
        }
    }
}

/// Bounded wait for the prompt after session creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadyConfig {
    pub timeout_ms: u64,
    pub interval_ms: u64,
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            interval_ms: 500,
        }
    }
}

impl ReadyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub max_message_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_len: 4000,
        }
    }
}

/// Top-level relay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub poll_interval_ms: u64,
    pub stability_ticks: u32,
    pub typing_throttle_ms: u64,
    pub delivery: DeliveryMode,
    pub tmux: TmuxConfig,
    pub ready: ReadyConfig,
    pub transport: TransportConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            stability_ticks: 2,
            typing_throttle_ms: 4000,
            delivery: DeliveryMode::default(),
            tmux: TmuxConfig::default(),
            ready: ReadyConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load from a YAML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = ?path, "No config found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        info!(path = ?path, "Config loaded");
        Ok(config)
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.stability_ticks == 0 {
            return Err(ConfigError::Invalid(
                "stability_ticks must be greater than zero".to_string(),
            ));
        }
        if self.transport.max_message_len <= MONOSPACE_WRAPPER_LEN {
            return Err(ConfigError::Invalid(format!(
                "transport.max_message_len must exceed {}",
                MONOSPACE_WRAPPER_LEN
            )));
        }
        if self.tmux.session.trim().is_empty() {
            return Err(ConfigError::Invalid("tmux.session must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn typing_throttle(&self) -> Duration {
        Duration::from_millis(self.typing_throttle_ms)
    }
}

/// Relay home: `$PANERELAY_HOME`, else `~/.panerelay`
pub fn default_relay_home() -> PathBuf {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .map(|h| h.join(".panerelay"))
        .unwrap_or_else(|| PathBuf::from(".panerelay"))
}

/// Default config path inside the relay home
pub fn default_config_path() -> PathBuf {
    default_relay_home().join(CONFIG_FILE_NAME)
}
