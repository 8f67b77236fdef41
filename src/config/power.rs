//! `power_settings.json`: the last power profile chosen by the user

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{write_atomic, ConfigError};

pub const POWER_SETTINGS_FILE: &str = "power_settings.json";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PowerSettings {
    #[serde(default)]
    pub last_profile: Option<String>,
}

impl PowerSettings {
    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(POWER_SETTINGS_FILE)
    }

    /// Missing or unreadable files yield the default
    pub fn load(config_dir: &Path) -> Self {
        let path = Self::path(config_dir);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), "Ignoring malformed power settings: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = Self::path(config_dir);
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&path, json.as_bytes())
    }
}
