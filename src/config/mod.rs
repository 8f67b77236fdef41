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

//! Persistent state with atomic writes and backup support.
//!
//! Everything the application writes lives under one config directory
//! (`$XDG_CONFIG_HOME/better-control` by default):
//!
//! - **settings.json**: Tab order, visibility and preferences ([`settings`])
//! - **hidden_devices.json / permanent_devices.json**: USB id sets ([`devices`])
//! - **power_settings.json**: Last chosen power profile ([`power`])
//! - **backups/**: Timestamped copies of compositor configs taken before
//!   every autostart edit ([`ConfigTransaction`])
//!
//! All writes use temp-file-then-rename so an interrupted write never
//! leaves a half-written file behind.
//!
//! # Example
//!
//! ```no_run
//! use better_control::config::{ConfigManager, ConfigTransaction};
//!
//! let manager = ConfigManager::new(
//!     "/home/user/.config/hypr/hyprland.conf".into(),
//!     "/home/user/.config/better-control/backups".into(),
//! )?;
//!
//! let content = manager.read_config()?;
//! let tx = ConfigTransaction::begin(&manager)?;
//! tx.commit(&content.replace("exec-once = waybar", "# exec-once = waybar"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod devices;
pub mod power;
pub mod settings;
pub mod transaction;

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use atomic_write_file::AtomicWriteFile;
use chrono::Local;
use thiserror::Error;
use tracing::warn;

pub use devices::DeviceStore;
pub use power::PowerSettings;
pub use settings::{Settings, SettingsStore};
pub use transaction::ConfigTransaction;

/// Directory name under `$XDG_CONFIG_HOME`
pub const APP_DIR_NAME: &str = "better-control";

/// Errors that can occur during configuration management.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// No config directory could be determined (no `$HOME`, no override).
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    /// Backup directory cannot be created or written to.
    #[error("Backup directory not writable: {0}")]
    BackupDirNotWritable(PathBuf),

    /// Failed to create backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),

    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),

    /// (De)serialising a JSON document failed.
    #[error("Invalid JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },

    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves the config directory
///
/// An explicit override (`--config-dir`) is tilde-expanded; otherwise
/// `dirs::config_dir()` (which honours `$XDG_CONFIG_HOME`) plus
/// `better-control`.
pub fn resolve_config_dir(override_dir: Option<&str>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(dir) => Ok(expand_path(dir)),
        None => dirs::config_dir()
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir),
    }
}

/// Expands a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Atomically replaces `path` with `content`, creating parent directories
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = AtomicWriteFile::options().open(path).map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e))
    })?;

    file.write_all(content)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit().map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e))
    })?;

    Ok(())
}

/// Manages a compositor configuration file with safe atomic operations.
///
/// Read access is direct; writes go through [`ConfigTransaction`] so every
/// change is preceded by a timestamped backup.
#[derive(Debug)]
pub struct ConfigManager {
    /// Path to the compositor configuration file.
    config_path: PathBuf,
    backup_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager for the given config file.
    ///
    /// Validates that the config file exists and creates the backup
    /// directory if it doesn't exist. Symlinked configs (dotfile managers)
    /// are allowed; the link target is what gets rewritten.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the config file doesn't exist.
    /// Returns `ConfigError::BackupDirNotWritable` if the backup directory
    /// cannot be created.
    pub fn new(config_path: PathBuf, backup_dir: PathBuf) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }

        if config_path.read_link().is_ok() {
            warn!(path = %config_path.display(), "Config file is a symlink");
        }

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        Ok(Self {
            config_path,
            backup_dir,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Reads the current configuration file content.
    pub fn read_config(&self) -> Result<String, ConfigError> {
        Ok(fs::read_to_string(&self.config_path)?)
    }

    /// File name used as the backup prefix
    fn config_file_name(&self) -> Result<&str, ConfigError> {
        self.config_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ConfigError::BackupFailed(format!(
                    "Config path has no usable file name: {}",
                    self.config_path.display()
                ))
            })
    }

    /// Copies the config to `backups/<name>.<YYYY-MM-DD_HHMMSS>`
    pub(crate) fn create_timestamped_backup(&self) -> Result<PathBuf, ConfigError> {
        let content = fs::read_to_string(&self.config_path)?;
        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");

        let backup_filename = format!("{}.{}", self.config_file_name()?, timestamp);
        let backup_path = self.backup_dir.join(&backup_filename);

        fs::write(&backup_path, &content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        Ok(backup_path)
    }

    /// Backups of this config, oldest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let prefix = format!("{}.", self.config_file_name()?);

        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .collect();

        // Timestamps sort lexically
        backups.sort();
        Ok(backups)
    }
}
