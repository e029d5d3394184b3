use serde::{Deserialize, Serialize};
use thiserror::Error;
use viewport_badge_protocol::STORAGE_KEY;

pub const DEFAULT_POLL_INTERVAL_MS: u32 = 500;
pub const DEFAULT_STATUS_REVERT_MS: u32 = 1500;
pub const DEFAULT_LABEL_ID: &str = "viewport-dimensions-display";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("storage key must not be empty")]
    EmptyStorageKey,
}

/// How an agent learns about settings changes made elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Only direct notifications from the editor.
    Push,
    /// Only periodic re-reads of the store (plus attention events).
    Poll,
    /// Push as the fast path, polling as the backstop.
    #[default]
    PushAndPoll,
}

impl Strategy {
    pub fn push_enabled(self) -> bool {
        matches!(self, Self::Push | Self::PushAndPoll)
    }

    pub fn poll_enabled(self) -> bool {
        matches!(self, Self::Poll | Self::PushAndPoll)
    }
}

/// Per-context overlay agent configuration. Every field has a default, so
/// `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    pub storage_key: String,
    pub poll_interval_ms: u32,
    pub strategy: Strategy,
    /// DOM id of the label element. Any existing element with this id is
    /// replaced on mount.
    pub label_id: String,
    pub debug_logging: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            strategy: Strategy::default(),
            label_id: DEFAULT_LABEL_ID.to_string(),
            debug_logging: false,
        }
    }
}

impl AgentConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.strategy.poll_enabled() && self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

/// Settings panel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub storage_key: String,
    /// How long "Saved!" / "Error!" stays on the save button.
    pub status_revert_ms: u32,
    pub debug_logging: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            status_revert_ms: DEFAULT_STATUS_REVERT_MS,
            debug_logging: false,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(config)
    }
}
