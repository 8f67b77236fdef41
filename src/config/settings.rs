// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `settings.json`: tab layout and preferences
//!
//! The document is loaded and saved wholesale; last writer wins. Keys this
//! version does not know are carried through a load/save round trip
//! untouched, so an older binary never strips settings a newer one wrote.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::config::{write_atomic, ConfigError};

pub const SETTINGS_FILE: &str = "settings.json";

/// Neutral colour temperature; the blue-light filter is off at this value
pub const DEFAULT_GAMMA: u32 = 6500;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Tab name -> shown
    pub visibility: BTreeMap<String, bool>,
    /// Tab name -> index
    pub positions: BTreeMap<String, usize>,
    pub tab_order: Vec<String>,
    pub usbguard_hidden_devices: Vec<String>,
    /// Last blue-light temperature in Kelvin
    pub gamma: u32,
    pub power_mode: String,
    pub language: String,
    pub vertical_tabs: bool,
    pub vertical_tabs_icon_only: bool,
    /// Unknown keys, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            visibility: BTreeMap::new(),
            positions: BTreeMap::new(),
            tab_order: Vec::new(),
            usbguard_hidden_devices: Vec::new(),
            gamma: DEFAULT_GAMMA,
            power_mode: "balanced".to_string(),
            language: "en".to_string(),
            vertical_tabs: false,
            vertical_tabs_icon_only: false,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Tabs are visible unless explicitly hidden
    pub fn is_visible(&self, tab: &str) -> bool {
        self.visibility.get(tab).copied().unwrap_or(true)
    }
}

const KNOWN_KEYS: [&str; 9] = [
    "visibility",
    "positions",
    "tab_order",
    "usbguard_hidden_devices",
    "gamma",
    "power_mode",
    "language",
    "vertical_tabs",
    "vertical_tabs_icon_only",
];

/// Older releases stored only `{tabName: bool}`
fn is_legacy(object: &Map<String, Value>) -> bool {
    !object.is_empty()
        && !KNOWN_KEYS.iter().any(|key| object.contains_key(*key))
        && object.values().all(Value::is_boolean)
}

/// Parses settings text, repairing a missing opening brace
pub fn parse_settings(content: &str) -> Result<Settings, serde_json::Error> {
    let trimmed = content.trim();
    let repaired;
    let text = if trimmed.starts_with('{') {
        trimmed
    } else {
        repaired = format!("{{{}", trimmed);
        repaired.as_str()
    };

    let value: Value = serde_json::from_str(text)?;

    if let Value::Object(object) = &value {
        if is_legacy(object) {
            let visibility = object
                .iter()
                .filter_map(|(tab, shown)| shown.as_bool().map(|b| (tab.clone(), b)))
                .collect();
            return Ok(Settings {
                visibility,
                ..Settings::default()
            });
        }
    }

    serde_json::from_value(value)
}

/// Loads and saves `settings.json` in a config directory
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to defaults on any error
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!(path = %self.path.display(), "Using default settings (file not found)");
                Settings::default()
            }
            Err(e) => {
                error!("Error loading settings: {}", e);
                Settings::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist
    pub fn try_load(&self) -> Result<Option<Settings>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !content.trim_start().starts_with('{') {
            warn!(path = %self.path.display(), "Settings file is missing its opening brace, repairing");
        }

        parse_settings(&content)
            .map(Some)
            .map_err(|e| ConfigError::Json {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Writes the whole document atomically, creating the directory
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(settings).map_err(|e| ConfigError::Json {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        write_atomic(&self.path, json.as_bytes())?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
