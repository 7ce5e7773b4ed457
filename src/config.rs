use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::DEFAULT_INTERVAL_MINUTES;

/// Engine-wide settings. Per-feed interval/enabled state lives on the feed
/// itself and is re-read from the store every iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub default_interval_minutes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            user_agent: "feedpoll/0.1".to_owned(),
            default_interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

impl EngineConfig {
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("feedpoll").join("config.json"))
    }

    /// Load from the config dir, falling back to defaults on any problem.
    pub fn load() -> Self {
        let Some(path) = Self::config_file_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(error = %err, path = %path.display(), "config file unreadable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::config_file_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).expect("config serializes");
        std::fs::write(path, json)
    }
}
