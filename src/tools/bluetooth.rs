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

//! Bluetooth through `bluetoothctl`, with audio hand-over
//!
//! Connecting a headset is only half the job: PipeWire/PulseAudio creates
//! the `bluez_output.*` sink a moment after the link comes up, and the
//! default sink has to be moved onto it. [`BluetoothManager::connect`]
//! polls for that sink with exponential back-off and remembers it, so
//! [`BluetoothManager::restore_last_sink`] can re-apply it later.

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::config::{write_atomic, APP_DIR_NAME};
use crate::core::{parser::bluetoothctl, redact, validator::validate_mac, BluetoothDevice};
use crate::system::{allow_write, CommandRunner, Invocation, ToolError};
use crate::tools::{audio, notify};

/// File under the state dir holding the last Bluetooth sink name
pub const LAST_SINK_FILE: &str = "last_sink";

/// Substring identifying sinks created by BlueZ
const BLUEZ_SINK: &str = "bluez_output";

/// Pairing and connecting wait on the remote device
const LINK_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry schedule for work that waits on another daemon
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay after the first failed attempt; doubles after each one
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay after the zero-based `attempt` failed
    pub fn delay(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Runtime directory for transient state (`$XDG_RUNTIME_DIR/better-control`)
pub fn default_state_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn query() -> Invocation {
    Invocation::query("bluetoothctl")
}

fn mutate() -> Invocation {
    Invocation::mutate("bluetoothctl")
}

/// Bluetooth adapter and device operations
///
/// Created once by the caller and handed to whoever needs it.
pub struct BluetoothManager<'a> {
    runner: &'a dyn CommandRunner,
    state_dir: PathBuf,
    retry: RetryPolicy,
}

impl<'a> BluetoothManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, state_dir: PathBuf) -> Self {
        Self {
            runner,
            state_dir,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn last_sink_path(&self) -> PathBuf {
        self.state_dir.join(LAST_SINK_FILE)
    }

    /// Whether the default adapter is powered
    pub fn powered(&self) -> Result<bool, ToolError> {
        let output = self.runner.stdout(&query().arg("show"))?;
        bluetoothctl::parse_powered(&output)
            .ok_or_else(|| ToolError::NotFound("No Bluetooth adapter found".to_string()))
    }

    pub fn set_powered(&self, enabled: bool) -> Result<(), ToolError> {
        let state = if enabled { "on" } else { "off" };
        self.runner.run(&mutate().args(["power", state]))?;
        info!("Bluetooth powered {}", state);
        Ok(())
    }

    /// Details of one device; fields `info` does not report stay default
    pub fn device_info(&self, mac: &str) -> Result<BluetoothDevice, ToolError> {
        validate_mac(mac)?;
        let output = self.runner.stdout(&query().args(["info", mac]))?;
        let mut device = BluetoothDevice {
            mac: mac.to_string(),
            name: mac.to_string(),
            ..BluetoothDevice::default()
        };
        bluetoothctl::apply_info(&mut device, &output);
        Ok(device)
    }

    /// Every known device (paired and discovered) with its details
    pub fn devices(&self) -> Result<Vec<BluetoothDevice>, ToolError> {
        let output = self.runner.stdout(&query().arg("devices"))?;
        let mut devices = bluetoothctl::parse_devices(&output);

        for device in &mut devices {
            match self.runner.stdout(&query().args(["info", device.mac.as_str()])) {
                Ok(info) => bluetoothctl::apply_info(device, &info),
                Err(e) => debug!(mac = %redact::mask(&device.mac), "info failed: {}", e),
            }
        }
        Ok(devices)
    }

    /// Scans for `seconds`, then returns every known device
    pub fn discover(&self, seconds: u64) -> Result<Vec<BluetoothDevice>, ToolError> {
        let scan = mutate()
            .args(["--timeout".to_string(), seconds.to_string(), "scan".into(), "on".into()])
            .with_timeout(Duration::from_secs(seconds + 5));
        self.runner.run(&scan)?;
        self.devices()
    }

    /// Pairs if needed, connects, then moves audio to the device
    ///
    /// Returns the device as reported after connecting.
    pub fn connect(&self, mac: &str) -> Result<BluetoothDevice, ToolError> {
        let before = self.device_info(mac)?;

        if !before.paired {
            self.runner
                .run(&mutate().args(["pair", mac]).with_timeout(LINK_TIMEOUT))?;
            info!(mac = %redact::mask(mac), "Paired");
        }

        self.runner
            .run(&mutate().args(["connect", mac]).with_timeout(LINK_TIMEOUT))?;

        let device = self.device_info(mac).unwrap_or(before);
        info!(device = %redact::mask(&device.name), "Connected");

        // Input devices never get a sink; skip the wait for them
        if device.is_audio() || device.icon.is_none() {
            if let Err(e) = self.switch_audio_to_bluetooth() {
                warn!("Could not switch audio output: {}", e);
            }
        }

        let body = match device.battery {
            Some(battery) => format!("{} Connected (Battery: {}%)", device.name, battery),
            None => format!("{} Connected", device.name),
        };
        notify::send_quietly(
            self.runner,
            &notify::Notification::new(notify::APP_NAME, body).icon("bluetooth-symbolic"),
        );

        Ok(device)
    }

    pub fn disconnect(&self, mac: &str) -> Result<(), ToolError> {
        validate_mac(mac)?;
        let name = self
            .device_info(mac)
            .map(|device| device.name)
            .unwrap_or_else(|_| mac.to_string());

        self.runner.run(&mutate().args(["disconnect", mac]))?;
        info!(device = %redact::mask(&name), "Disconnected");

        notify::send_quietly(
            self.runner,
            &notify::Notification::new(notify::APP_NAME, format!("{} Disconnected", name))
                .icon("bluetooth-symbolic"),
        );
        Ok(())
    }

    /// Removes the pairing
    pub fn forget(&self, mac: &str) -> Result<(), ToolError> {
        validate_mac(mac)?;
        self.runner.run(&mutate().args(["remove", mac]))?;
        info!(mac = %redact::mask(mac), "Device removed");
        Ok(())
    }

    pub fn trust(&self, mac: &str) -> Result<(), ToolError> {
        validate_mac(mac)?;
        self.runner.run(&mutate().args(["trust", mac]))?;
        Ok(())
    }

    /// Waits for a BlueZ sink to appear and makes it the default
    ///
    /// Returns `Ok(None)` when no sink showed up within the retry budget.
    pub fn switch_audio_to_bluetooth(&self) -> Result<Option<String>, ToolError> {
        for attempt in 0..self.retry.attempts {
            let sink = audio::short_sinks(self.runner)?
                .into_iter()
                .map(|(_, name)| name)
                .find(|name| name.contains(BLUEZ_SINK));

            if let Some(sink) = sink {
                audio::set_default_sink(self.runner, &sink)?;
                let path = self.last_sink_path();
                if allow_write(self.runner, &path.display().to_string())? {
                    write_atomic(&path, sink.as_bytes())?;
                }
                info!(sink = %sink, "Audio switched to Bluetooth");
                return Ok(Some(sink));
            }

            if attempt + 1 < self.retry.attempts {
                let delay = self.retry.delay(attempt);
                debug!(attempt, ?delay, "Bluetooth sink not ready");
                thread::sleep(delay);
            }
        }

        warn!(
            attempts = self.retry.attempts,
            "No Bluetooth sink appeared"
        );
        Ok(None)
    }

    /// The remembered sink, if any
    pub fn last_sink(&self) -> Option<String> {
        fs::read_to_string(self.last_sink_path())
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Re-applies the remembered sink while it still exists
    pub fn restore_last_sink(&self) -> Result<Option<String>, ToolError> {
        let Some(last) = self.last_sink() else {
            return Ok(None);
        };

        let available = audio::short_sinks(self.runner)?;
        if !available.iter().any(|(_, name)| *name == last) {
            info!(sink = %last, "Remembered sink is gone");
            return Ok(None);
        }

        audio::set_default_sink(self.runner, &last)?;
        info!(sink = %last, "Restored audio sink");
        Ok(Some(last))
    }
}
