//! Persisted sets of USB device keys
//!
//! `hidden_devices.json` lists devices the USBGuard view should not show;
//! `permanent_devices.json` lists devices the user allowed permanently.
//! Both are a JSON array of strings, written sorted. Entries are
//! [`UsbDevice::store_key`](crate::core::UsbDevice::store_key) values, so
//! they survive the runtime id changing on replug.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, error};

use crate::config::{write_atomic, ConfigError};

pub const HIDDEN_DEVICES_FILE: &str = "hidden_devices.json";
pub const PERMANENT_DEVICES_FILE: &str = "permanent_devices.json";

#[derive(Clone, Debug)]
pub struct DeviceStore {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl DeviceStore {
    /// Opens `file` under `config_dir`; a missing or malformed file is empty
    pub fn open(config_dir: &Path, file: &str) -> Self {
        let path = config_dir.join(file);
        let ids = read_ids(&path);
        Self { path, ids }
    }

    pub fn hidden(config_dir: &Path) -> Self {
        Self::open(config_dir, HIDDEN_DEVICES_FILE)
    }

    pub fn permanent(config_dir: &Path) -> Self {
        Self::open(config_dir, PERMANENT_DEVICES_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file, dropping in-memory changes
    pub fn reload(&mut self) {
        self.ids = read_ids(&self.path);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Adds `id` and persists; `Ok(false)` if it was already present
    ///
    /// The in-memory set only changes once the file is written.
    pub fn add(&mut self, id: &str) -> Result<bool, ConfigError> {
        if self.ids.contains(id) {
            return Ok(false);
        }
        let mut ids = self.ids.clone();
        ids.insert(id.to_string());
        self.write(&ids)?;
        self.ids = ids;
        Ok(true)
    }

    /// Removes `id` and persists; `Ok(false)` if it was absent
    pub fn remove(&mut self, id: &str) -> Result<bool, ConfigError> {
        if !self.ids.contains(id) {
            return Ok(false);
        }
        let mut ids = self.ids.clone();
        ids.remove(id);
        self.write(&ids)?;
        self.ids = ids;
        Ok(true)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.write(&self.ids)
    }

    fn write(&self, ids: &BTreeSet<String>) -> Result<(), ConfigError> {
        let ids: Vec<&String> = ids.iter().collect();
        let json = serde_json::to_string_pretty(&ids).map_err(|e| ConfigError::Json {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), count = ids.len(), "Device list saved");
        Ok(())
    }
}

fn read_ids(path: &Path) -> BTreeSet<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeSet::new(),
        Err(e) => {
            error!(path = %path.display(), "Error reading device list: {}", e);
            return BTreeSet::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&content) {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            error!(path = %path.display(), "Device list is not a JSON string array: {}", e);
            BTreeSet::new()
        }
    }
}
