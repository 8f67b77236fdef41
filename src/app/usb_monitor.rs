//! USB device reconciliation loop
//!
//! Polls `usbguard list-devices` and diffs successive snapshots of its
//! lines. The first poll only records a baseline. New lines are
//! "connected" devices, vanished lines "disconnected" ones. A device whose
//! line changed but kept its id changed authorisation, which is not a plug
//! event and raises no notification.
//!
//! With `block_unknown` set, a newly connected device that USBGuard
//! currently allows and that is not in the permanent allow list is blocked
//! on the spot. The stores are matched by device key (hash), since the
//! runtime id changes every time a device is plugged in.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::app::file_watcher::FileWatcher;
use crate::config::DeviceStore;
use crate::core::{parser::usbguard as parser, redact, UsbStatus};
use crate::system::{CommandRunner, ToolError};
use crate::tools::{notify, usbguard};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Granularity at which the stop flag is checked between polls
const STOP_CHECK: Duration = Duration::from_millis(200);

const NOTIFY_ICON: &str = "drive-removable-media-symbolic";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Block allowed devices not in `permanent_devices.json`
    pub block_unknown: bool,
    /// Send desktop notifications for plug events
    pub notify: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsbEvent {
    Connected { id: String, name: String },
    Disconnected { id: String, name: String },
    Blocked { id: String, name: String },
}

/// What one `list-devices` line says about its device
#[derive(Clone, Debug)]
struct Seen {
    /// Key into the device stores, stable across replugs
    key: String,
    name: String,
    status: Option<UsbStatus>,
}

fn describe(line: &str) -> Option<(String, Seen)> {
    let id = parser::line_device_id(line)?.to_string();
    let seen = match parser::parse_device_line(line) {
        Ok(device) => Seen {
            key: device.store_key(),
            name: device.display_name().to_string(),
            status: Some(device.status),
        },
        Err(e) => {
            debug!("Unparsed device line: {}", e);
            Seen {
                key: id.clone(),
                name: id.clone(),
                status: None,
            }
        }
    };
    Some((id, seen))
}

/// Lines keyed by runtime device id
fn by_id(lines: &BTreeSet<String>) -> BTreeMap<String, Seen> {
    lines.iter().filter_map(|line| describe(line)).collect()
}

pub struct UsbMonitor<'a> {
    runner: &'a dyn CommandRunner,
    options: MonitorOptions,
    previous: Option<BTreeSet<String>>,
    /// Ids changed by us; their next transition is not reported
    manual: HashSet<String>,
    hidden: DeviceStore,
    permanent: DeviceStore,
}

impl<'a> UsbMonitor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config_dir: &Path, options: MonitorOptions) -> Self {
        Self {
            runner,
            options,
            previous: None,
            manual: HashSet::new(),
            hidden: DeviceStore::hidden(config_dir),
            permanent: DeviceStore::permanent(config_dir),
        }
    }

    pub fn permanent(&self) -> &DeviceStore {
        &self.permanent
    }

    pub fn hidden(&self) -> &DeviceStore {
        &self.hidden
    }

    /// Re-reads both device stores after an outside change
    pub fn reload_stores(&mut self) {
        self.permanent.reload();
        self.hidden.reload();
        info!(
            permanent = self.permanent.len(),
            hidden = self.hidden.len(),
            "Device lists reloaded"
        );
    }

    /// Marks `id` as changed by the user so the next poll stays quiet
    pub fn mark_manual(&mut self, id: &str) {
        self.manual.insert(id.to_string());
    }

    /// One reconciliation step; returns what happened since the last one
    pub fn poll_once(&mut self) -> Result<Vec<UsbEvent>, ToolError> {
        let current = usbguard::device_lines(self.runner)?;
        let Some(previous) = self.previous.replace(current.clone()) else {
            debug!(devices = current.len(), "USB baseline recorded");
            return Ok(Vec::new());
        };

        let added: BTreeSet<String> = current.difference(&previous).cloned().collect();
        let removed: BTreeSet<String> = previous.difference(&current).cloned().collect();
        let added = by_id(&added);
        let mut removed = by_id(&removed);

        let mut events = Vec::new();
        for (id, seen) in added {
            // Same id on both sides: authorisation changed, not a plug event
            if removed.remove(&id).is_some() {
                debug!(device = %redact::mask(&id), "USB device status changed");
                continue;
            }
            if self.manual.contains(&id) {
                continue;
            }

            self.announce(&seen.key, &format!("USB device connected: {}", seen.name));
            events.push(UsbEvent::Connected {
                id: id.clone(),
                name: seen.name.clone(),
            });

            if self.should_block(&seen) {
                match usbguard::block(self.runner, &id) {
                    Ok(()) => {
                        let body = format!("Blocked unknown USB device: {}", seen.name);
                        self.announce(&seen.key, &body);
                        events.push(UsbEvent::Blocked {
                            id: id.clone(),
                            name: seen.name,
                        });
                        // The resulting status change is ours
                        self.mark_manual(&id);
                        continue;
                    }
                    Err(e) => warn!(device = %redact::mask(&id), "Could not block device: {}", e),
                }
            }
        }

        for (id, seen) in removed {
            if self.manual.contains(&id) {
                continue;
            }
            self.announce(&seen.key, &format!("USB device disconnected: {}", seen.name));
            events.push(UsbEvent::Disconnected { id, name: seen.name });
        }

        // Blocks issued during this poll stay marked for the next one
        let blocked: HashSet<String> = events
            .iter()
            .filter_map(|event| match event {
                UsbEvent::Blocked { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect();
        self.manual = blocked;

        Ok(events)
    }

    fn should_block(&self, seen: &Seen) -> bool {
        self.options.block_unknown
            && seen.status == Some(UsbStatus::Allow)
            && !self.permanent.contains(&seen.key)
    }

    /// Desktop notification, skipped for hidden devices
    fn announce(&self, key: &str, body: &str) {
        if !self.options.notify || self.hidden.contains(key) {
            return;
        }
        notify::send_quietly(
            self.runner,
            &notify::Notification::new("Better Control", body).icon(NOTIFY_ICON),
        );
    }

    /// Polls every [`POLL_INTERVAL`] until `stop` is set
    ///
    /// `watchers` report edits to the device stores; a failed poll is
    /// logged and retried on the next tick.
    pub fn run(&mut self, stop: &AtomicBool, watchers: &[FileWatcher]) {
        info!("USB monitor started");
        while !stop.load(Ordering::Relaxed) {
            // Every watcher is drained, even after the first hit
            let changed = watchers
                .iter()
                .fold(false, |changed, watcher| watcher.check_for_changes() || changed);
            if changed {
                self.reload_stores();
            }

            match self.poll_once() {
                Ok(events) => {
                    for event in &events {
                        debug!(?event, "USB event");
                    }
                }
                Err(e) => warn!("USB poll failed: {}", e),
            }

            let deadline = Instant::now() + POLL_INTERVAL;
            while Instant::now() < deadline && !stop.load(Ordering::Relaxed) {
                thread::sleep(STOP_CHECK);
            }
        }
        info!("USB monitor stopped");
    }
}
