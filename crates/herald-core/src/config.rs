//! Herald configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HeraldError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeraldConfig {
    #[serde(default)]
    pub onebot: OneBotConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

impl HeraldConfig {
    /// Load config from the default path (~/.herald/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HeraldError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| HeraldError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| HeraldError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Herald's data directory (~/.herald).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".herald")
    }
}

/// OneBot v11 HTTP API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneBotConfig {
    /// Base URL of the OneBot HTTP API (e.g. "http://127.0.0.1:3000").
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Optional bearer token for the API.
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_api_base() -> String {
    "http://127.0.0.1:3000".into()
}

impl Default for OneBotConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: None,
        }
    }
}

/// Broadcast policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Group ids that must not receive broadcasts. Toggled by operator
    /// commands and saved back here.
    #[serde(default)]
    pub disabled_groups: Vec<String>,
    /// Inclusive lower bound of the per-send jitter, in seconds.
    #[serde(default = "default_jitter_min")]
    pub jitter_min_secs: u64,
    /// Inclusive upper bound of the per-send jitter, in seconds.
    #[serde(default = "default_jitter_max")]
    pub jitter_max_secs: u64,
    /// Trigger times armed at startup, as "HH:MM" tokens. Empty = start idle.
    #[serde(default)]
    pub times: Vec<String>,
}

fn default_jitter_min() -> u64 {
    1
}
fn default_jitter_max() -> u64 {
    3
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            disabled_groups: Vec::new(),
            jitter_min_secs: default_jitter_min(),
            jitter_max_secs: default_jitter_max(),
            times: Vec::new(),
        }
    }
}

impl BroadcastConfig {
    /// The jitter range, clamped so min never exceeds max.
    pub fn jitter_range(&self) -> std::ops::RangeInclusive<u64> {
        let min = self.jitter_min_secs.min(self.jitter_max_secs);
        let max = self.jitter_min_secs.max(self.jitter_max_secs);
        min..=max
    }
}
