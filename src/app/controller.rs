// Copyright 2025 bakri (tidynest@proton.me)
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

//! Tab layout controller
//!
//! # Responsibilities
//!
//! - Own the loaded [`Settings`] and the store they came from
//! - Resolve the effective tab order from whatever was persisted
//! - Reorder and hide tabs, persisting every change immediately
//! - Pick the tab to open first from the command-line flags
//!
//! The controller knows nothing about rendering; `pages` and the CLI ask
//! it which tabs exist and in what order.

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, Settings, SettingsStore};
use crate::core::Tab;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The Settings tab is pinned last and always shown
    #[error("The {0} tab cannot be hidden or moved")]
    Pinned(Tab),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Page-selection flags from the command line (`-V`, `-w`, `-b`, `-B`, `-d`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StartFlags {
    pub volume: bool,
    pub wifi: bool,
    pub bluetooth: bool,
    pub battery: bool,
    pub display: bool,
}

impl StartFlags {
    /// The requested tab; earlier flags win when several are given
    fn requested(&self) -> Option<Tab> {
        [
            (self.volume, Tab::Volume),
            (self.wifi, Tab::Wifi),
            (self.bluetooth, Tab::Bluetooth),
            (self.battery, Tab::Battery),
            (self.display, Tab::Display),
        ]
        .into_iter()
        .find_map(|(set, tab)| set.then_some(tab))
    }
}

/// Persisted name -> tab; only exact names count
fn tab_named(name: &str) -> Option<Tab> {
    Tab::ALL.into_iter().find(|tab| tab.name() == name)
}

/// Effective order of the configurable tabs
///
/// Starts from `persisted`, drops unknown names and duplicates, then adds
/// every missing tab: before USBGuard when it is present, else at the end.
pub fn resolve_order(persisted: &[String]) -> Vec<Tab> {
    let mut order: Vec<Tab> = Vec::with_capacity(Tab::ALL.len());

    for name in persisted {
        match tab_named(name) {
            Some(tab) if tab.is_configurable() && !order.contains(&tab) => order.push(tab),
            Some(_) => {}
            None => debug!(tab = %name, "Dropping unknown tab from saved order"),
        }
    }

    for tab in Tab::ALL.into_iter().filter(Tab::is_configurable) {
        if order.contains(&tab) {
            continue;
        }
        match order.iter().position(|t| *t == Tab::UsbGuard) {
            Some(idx) if tab != Tab::UsbGuard => order.insert(idx, tab),
            _ => order.push(tab),
        }
    }

    order
}

pub struct Controller {
    store: SettingsStore,
    settings: Settings,
    /// False under `--dry-run`: changes stay in memory
    persist: bool,
}

impl Controller {
    /// Loads settings from `store`, falling back to defaults
    pub fn new(store: SettingsStore) -> Self {
        let settings = store.load();
        Self::with_settings(store, settings)
    }

    pub fn with_settings(store: SettingsStore, settings: Settings) -> Self {
        Self {
            store,
            settings,
            persist: true,
        }
    }

    /// Keeps every later change in memory instead of writing `settings.json`
    pub fn dry_run(mut self) -> Self {
        self.persist = false;
        self
    }

    fn save(&self) -> Result<(), ConfigError> {
        if !self.persist {
            info!(path = %self.store.path().display(), "dry-run: settings not saved");
            return Ok(());
        }
        self.store.save(&self.settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Every tab in display order, Settings last
    pub fn tab_order(&self) -> Vec<Tab> {
        let mut order = resolve_order(&self.settings.tab_order);
        order.push(Tab::Settings);
        order
    }

    /// [`Self::tab_order`] without the hidden tabs
    pub fn visible_tabs(&self) -> Vec<Tab> {
        self.tab_order()
            .into_iter()
            .filter(|tab| !tab.is_configurable() || self.settings.is_visible(tab.name()))
            .collect()
    }

    pub fn is_visible(&self, tab: Tab) -> bool {
        !tab.is_configurable() || self.settings.is_visible(tab.name())
    }

    /// Swaps `tab` with its left neighbour; `Ok(false)` when already first
    pub fn move_up(&mut self, tab: Tab) -> Result<bool, ControllerError> {
        self.shift(tab, -1)
    }

    /// Swaps `tab` with its right neighbour; `Ok(false)` when already last
    pub fn move_down(&mut self, tab: Tab) -> Result<bool, ControllerError> {
        self.shift(tab, 1)
    }

    fn shift(&mut self, tab: Tab, delta: isize) -> Result<bool, ControllerError> {
        if !tab.is_configurable() {
            return Err(ControllerError::Pinned(tab));
        }

        let mut order = resolve_order(&self.settings.tab_order);
        let Some(idx) = order.iter().position(|t| *t == tab) else {
            return Ok(false);
        };
        let Some(target) = idx.checked_add_signed(delta).filter(|t| *t < order.len()) else {
            debug!(tab = %tab, "Tab already at the edge");
            return Ok(false);
        };

        order.swap(idx, target);
        self.persist_order(&order)?;
        info!(tab = %tab, position = target, "Tab moved");
        Ok(true)
    }

    fn persist_order(&mut self, order: &[Tab]) -> Result<(), ConfigError> {
        self.settings.tab_order = order.iter().map(|tab| tab.name().to_string()).collect();
        self.settings.positions = order
            .iter()
            .enumerate()
            .map(|(idx, tab)| (tab.name().to_string(), idx))
            .collect();
        self.save()
    }

    pub fn set_visible(&mut self, tab: Tab, visible: bool) -> Result<(), ControllerError> {
        if !tab.is_configurable() {
            return Err(ControllerError::Pinned(tab));
        }

        self.settings
            .visibility
            .insert(tab.name().to_string(), visible);
        self.save()?;
        info!(tab = %tab, visible, "Tab visibility changed");
        Ok(())
    }

    /// Remembers the blue-light temperature last applied
    pub fn set_gamma(&mut self, kelvin: u32) -> Result<(), ConfigError> {
        self.settings.gamma = kelvin;
        self.save()
    }

    /// Tab to open first
    ///
    /// An explicit flag wins even for a hidden tab. Otherwise the first
    /// visible tab; Settings when everything else is hidden.
    pub fn start_tab(&self, flags: StartFlags) -> Tab {
        flags
            .requested()
            .or_else(|| self.visible_tabs().into_iter().next())
            .unwrap_or(Tab::Settings)
    }
}
