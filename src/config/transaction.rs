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

//! Compositor config transactions with automatic backups
//!
//! Used by the autostart tool to comment and uncomment `exec` lines in
//! hyprland.conf and the sway config.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{write_atomic, ConfigError, ConfigManager};

/// Atomic configuration transaction with automatic backup.
///
/// # Lifecycle
///
/// 1. `begin()` - Creates timestamped backup immediately
/// 2. Caller prepares new content (in memory)
/// 3. `commit()` - Writes atomically; dropping the transaction instead
///    leaves the config untouched with the backup on disk
///
/// # Example
///
/// ```no_run
/// use better_control::config::{ConfigManager, ConfigTransaction};
/// use std::path::PathBuf;
///
/// let manager = ConfigManager::new(
///     PathBuf::from("sway/config"),
///     PathBuf::from("backups"),
/// )?;
/// let tx = ConfigTransaction::begin(&manager)?;
///
/// match tx.commit("exec swayidle -w\n") {
///     Ok(()) => println!("Changes applied"),
///     Err(e) => eprintln!("Commit failed: {}", e),
/// }
/// # Ok::<(), better_control::config::ConfigError>(())
/// ```
pub struct ConfigTransaction<'a> {
    manager: &'a ConfigManager,
    backup_path: PathBuf,
}

impl<'a> ConfigTransaction<'a> {
    /// Begins a new transaction by creating a timestamped backup.
    ///
    /// The backup exists before any modification is attempted. The
    /// transaction cannot outlive its manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read or the backup file
    /// cannot be written. No changes have been made in that case.
    pub fn begin(manager: &'a ConfigManager) -> Result<Self, ConfigError> {
        let backup_path = manager.create_timestamped_backup()?;
        debug!(backup = %backup_path.display(), "Transaction started");

        Ok(Self {
            manager,
            backup_path,
        })
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Atomically writes `new_content` to the config file.
    ///
    /// Consumes the transaction. On failure the original config is
    /// untouched and the backup is still on disk.
    pub fn commit(self, new_content: &str) -> Result<(), ConfigError> {
        write_atomic(self.manager.config_path(), new_content.as_bytes())?;
        info!(path = %self.manager.config_path().display(), "Config updated");
        Ok(())
    }
}
