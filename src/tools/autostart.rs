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

//! Autostart entries: XDG desktop files and compositor `exec` lines
//!
//! Desktop files are disabled by renaming them to `*.desktop.disabled`.
//! Compositor entries are disabled by commenting their line out; every
//! such edit goes through a [`ConfigTransaction`] so a timestamped backup
//! exists before the file is touched, and the compositor is reloaded
//! afterwards.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::config::{expand_path, ConfigManager, ConfigTransaction};
use crate::core::{
    parser::autostart::{self, ExecLine},
    AutostartEntry, AutostartSource,
};
use crate::system::{allow_write, CommandRunner, Invocation, ToolError};
use crate::tools::display::Session;

const DESKTOP_SUFFIX: &str = ".desktop";
const DISABLED_SUFFIX: &str = ".disabled";

/// Where autostart entries are looked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutostartPaths {
    pub user_dir: PathBuf,
    pub system_dir: PathBuf,
    pub hyprland: Vec<PathBuf>,
    pub sway: Vec<PathBuf>,
    /// Compositor config backups
    pub backup_dir: PathBuf,
}

impl AutostartPaths {
    /// The usual locations under `~/.config`
    pub fn standard(backup_dir: PathBuf) -> Self {
        Self {
            user_dir: expand_path("~/.config/autostart"),
            system_dir: PathBuf::from("/etc/xdg/autostart"),
            hyprland: vec![
                expand_path("~/.config/hypr/hyprland.conf"),
                expand_path("~/.config/hypr/autostart.conf"),
            ],
            sway: vec![
                expand_path("~/.config/sway/config"),
                expand_path("~/.config/sway/autostart"),
            ],
            backup_dir,
        }
    }

    /// Same layout rooted at `config_home` instead of `~/.config`
    pub fn under(config_home: &Path, system_dir: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            user_dir: config_home.join("autostart"),
            system_dir,
            hyprland: vec![
                config_home.join("hypr/hyprland.conf"),
                config_home.join("hypr/autostart.conf"),
            ],
            sway: vec![
                config_home.join("sway/config"),
                config_home.join("sway/autostart"),
            ],
            backup_dir,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Also read `/etc/xdg/autostart`
    pub include_system: bool,
    /// Keep desktop files marked `Hidden=true`
    pub include_hidden: bool,
}

fn desktop_entries(dir: &Path, options: ListOptions) -> Vec<AutostartEntry> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        debug!(dir = %dir.display(), "Autostart directory not readable");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for path in read_dir.filter_map(Result::ok).map(|entry| entry.path()) {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let (stem, enabled) = if let Some(stem) = file_name.strip_suffix(".desktop.disabled") {
            (stem, false)
        } else if let Some(stem) = file_name.strip_suffix(DESKTOP_SUFFIX) {
            (stem, true)
        } else {
            continue;
        };

        let parsed = match fs::read_to_string(&path) {
            Ok(content) => autostart::parse_desktop_entry(&content),
            Err(e) => {
                warn!(path = %path.display(), "Could not read desktop file: {}", e);
                autostart::DesktopEntry::default()
            }
        };

        if parsed.hidden && enabled && !options.include_hidden {
            continue;
        }

        entries.push(AutostartEntry {
            name: stem.to_string(),
            source: AutostartSource::Desktop,
            line: None,
            command: parsed.exec.unwrap_or_default(),
            enabled,
            hidden: parsed.hidden && enabled,
            path,
        });
    }
    entries
}

fn compositor_entries(
    files: &[PathBuf],
    source: AutostartSource,
    parse: fn(&str) -> Vec<ExecLine>,
) -> Vec<AutostartEntry> {
    files
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok().map(|content| (path, content)))
        .flat_map(|(path, content)| {
            parse(&content).into_iter().map(move |exec| AutostartEntry {
                name: exec.command.clone(),
                source,
                path: path.clone(),
                line: Some(exec.line),
                command: exec.command,
                enabled: exec.enabled,
                hidden: false,
            })
        })
        .collect()
}

/// Every autostart entry for `session`, sorted by name
///
/// Names are unique; a compositor entry shadows a desktop file of the
/// same name.
pub fn list_entries(
    paths: &AutostartPaths,
    session: &Session,
    options: ListOptions,
) -> Vec<AutostartEntry> {
    let mut by_name = BTreeMap::new();

    let mut dirs = vec![&paths.user_dir];
    if options.include_system {
        dirs.push(&paths.system_dir);
    }
    for dir in dirs {
        for entry in desktop_entries(dir, options) {
            by_name.insert(entry.name.clone(), entry);
        }
    }

    let compositor = match session {
        Session::Hyprland => {
            compositor_entries(&paths.hyprland, AutostartSource::Hyprland, autostart::parse_hyprland_exec)
        }
        Session::Sway => compositor_entries(&paths.sway, AutostartSource::Sway, autostart::parse_sway_exec),
        Session::Other(_) => Vec::new(),
    };
    for entry in compositor {
        by_name.insert(entry.name.clone(), entry);
    }

    debug!(count = by_name.len(), "Found autostart entries");
    by_name.into_values().collect()
}

/// Flips `entry` between enabled and disabled, returning the new state
pub fn toggle(
    runner: &dyn CommandRunner,
    paths: &AutostartPaths,
    entry: &AutostartEntry,
) -> Result<AutostartEntry, ToolError> {
    let updated = match entry.source {
        AutostartSource::Desktop => toggle_desktop(runner, entry)?,
        AutostartSource::Hyprland | AutostartSource::Sway => {
            let updated = toggle_compositor_line(runner, paths, entry)?;
            reload_compositor(runner, entry.source);
            updated
        }
    };

    info!(
        name = %updated.name,
        enabled = updated.enabled,
        source = %updated.source,
        "Autostart entry toggled"
    );
    Ok(updated)
}

/// Enables or disables the entry called `name`; a no-op when it is
/// already in the requested state
pub fn set_enabled(
    runner: &dyn CommandRunner,
    paths: &AutostartPaths,
    session: &Session,
    name: &str,
    enabled: bool,
) -> Result<AutostartEntry, ToolError> {
    let options = ListOptions {
        include_system: true,
        include_hidden: true,
    };
    let entry = list_entries(paths, session, options)
        .into_iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| ToolError::NotFound(format!("No autostart entry named '{}'", name)))?;

    if entry.enabled == enabled {
        return Ok(entry);
    }
    toggle(runner, paths, &entry)
}

fn toggle_desktop(
    runner: &dyn CommandRunner,
    entry: &AutostartEntry,
) -> Result<AutostartEntry, ToolError> {
    let current = entry.path.to_string_lossy();
    let new_path = if entry.enabled {
        PathBuf::from(format!("{}{}", current, DISABLED_SUFFIX))
    } else {
        let Some(stripped) = current.strip_suffix(DISABLED_SUFFIX) else {
            return Err(ToolError::NotFound(format!(
                "{} is not a disabled desktop file",
                entry.path.display()
            )));
        };
        PathBuf::from(stripped)
    };

    let what = format!("rename {} to {}", entry.path.display(), new_path.display());
    if allow_write(runner, &what)? {
        fs::rename(&entry.path, &new_path)?;
    }
    Ok(AutostartEntry {
        path: new_path,
        enabled: !entry.enabled,
        ..entry.clone()
    })
}

fn toggle_compositor_line(
    runner: &dyn CommandRunner,
    paths: &AutostartPaths,
    entry: &AutostartEntry,
) -> Result<AutostartEntry, ToolError> {
    let line_index = entry
        .line
        .ok_or_else(|| ToolError::NotFound(format!("{} has no config line", entry.name)))?;

    let manager = ConfigManager::new(entry.path.clone(), paths.backup_dir.clone())?;
    let content = manager.read_config()?;

    // The file may have changed since it was listed
    let parse: fn(&str) -> Vec<ExecLine> = match entry.source {
        AutostartSource::Sway => autostart::parse_sway_exec,
        _ => autostart::parse_hyprland_exec,
    };
    let still_there = parse(&content)
        .iter()
        .any(|exec| exec.line == line_index && exec.command == entry.command);
    if !still_there {
        return Err(ToolError::NotFound(format!(
            "'{}' is no longer on line {} of {}",
            entry.command,
            line_index + 1,
            entry.path.display()
        )));
    }

    let enable = !entry.enabled;
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    lines[line_index] = autostart::toggle_line(&lines[line_index], enable);

    let mut new_content = lines.join("\n");
    if content.ends_with('\n') {
        new_content.push('\n');
    }

    let what = format!("line {} of {}", line_index + 1, entry.path.display());
    if allow_write(runner, &what)? {
        let tx = ConfigTransaction::begin(&manager)?;
        debug!(backup = %tx.backup_path().display(), "Backup created");
        tx.commit(&new_content)?;
    }

    Ok(AutostartEntry {
        enabled: enable,
        ..entry.clone()
    })
}

/// Compositor config files for `session` that exist, with their source
pub fn compositor_configs(paths: &AutostartPaths, session: &Session) -> Vec<(AutostartSource, PathBuf)> {
    let (source, files) = match session {
        Session::Hyprland => (AutostartSource::Hyprland, &paths.hyprland),
        Session::Sway => (AutostartSource::Sway, &paths.sway),
        Session::Other(_) => return Vec::new(),
    };
    files
        .iter()
        .filter(|path| path.is_file())
        .map(|path| (source, path.clone()))
        .collect()
}

/// Timestamped backups of `config`, oldest first
pub fn backups(paths: &AutostartPaths, config: &Path) -> Result<Vec<PathBuf>, ToolError> {
    if !paths.backup_dir.is_dir() {
        return Ok(Vec::new());
    }
    let manager = ConfigManager::new(config.to_path_buf(), paths.backup_dir.clone())?;
    Ok(manager.list_backups()?)
}

/// Puts the newest backup of `config` back in place and reloads
///
/// The restore is itself a transaction, so the content it replaces is
/// backed up first and can be restored in turn. Returns the backup used.
pub fn restore_latest(
    runner: &dyn CommandRunner,
    paths: &AutostartPaths,
    source: AutostartSource,
    config: &Path,
) -> Result<PathBuf, ToolError> {
    let manager = ConfigManager::new(config.to_path_buf(), paths.backup_dir.clone())?;
    let Some(latest) = manager.list_backups()?.pop() else {
        return Err(ToolError::NotFound(format!("No backups of {}", config.display())));
    };
    let content = fs::read_to_string(&latest)?;

    if allow_write(runner, &config.display().to_string())? {
        let tx = ConfigTransaction::begin(&manager)?;
        tx.commit(&content)?;
    }
    info!(config = %config.display(), backup = %latest.display(), "Config restored");
    reload_compositor(runner, source);
    Ok(latest)
}

/// Asks the compositor to re-read its config; failure only warns since
/// the edit itself already succeeded
fn reload_compositor(runner: &dyn CommandRunner, source: AutostartSource) {
    let command = match source {
        AutostartSource::Hyprland => Invocation::mutate("hyprctl").arg("reload"),
        AutostartSource::Sway => Invocation::mutate("swaymsg").arg("reload"),
        AutostartSource::Desktop => return,
    };
    if let Err(e) = runner.run(&command) {
        warn!("Compositor reload failed: {}", e);
    }
}
