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

//! Better Control
//!
//! A Linux control center for Wi-Fi, Bluetooth, audio, display, power,
//! USBGuard and autostart, driven entirely through the system's own
//! command-line tools.
//!
//! # Features
//!
//! - **Audio:** Volume, mute, default devices and per-application streams (`pactl`)
//! - **Network:** Scan, connect, forget and share Wi-Fi networks (`nmcli`)
//! - **Bluetooth:** Pair and connect, with automatic audio hand-over (`bluetoothctl`)
//! - **Display:** Brightness, blue-light filter and output rotation
//! - **Power:** Batteries, power profiles and session actions
//! - **USBGuard:** Device policy plus a plug/unplug monitor
//! - **Autostart:** Desktop files and compositor `exec` lines, with backups
//!
//! # Architecture
//!
//! - **`core`:** Record types, output parsers, argument validation, log redaction
//! - **`system`:** The [`system::CommandRunner`] seam every tool goes through
//! - **`tools`:** One wrapper module per external tool
//! - **`config`:** Settings and device stores, atomic writes, config transactions
//! - **`app`:** Tab controller, page rendering and the USB monitor
//!
//! # Safety
//!
//! - **No shell:** Commands are argument vectors, never strings for `sh -c`
//! - **Validated arguments:** Control characters never reach a tool
//! - **Atomic file operations:** No partial writes
//! - **Dry-run and read-only modes:** Nothing changes unless asked to
//!
//! # Examples
//!
//! ## Reading the volume
//!
//! ```no_run
//! use better_control::system::{ClientMode, SystemRunner};
//! use better_control::tools::audio::{self, Direction};
//!
//! let runner = SystemRunner::new(ClientMode::ReadOnly);
//! let volume = audio::get_volume(&runner, Direction::Output)?;
//! println!("Volume: {}%", volume);
//! # Ok::<(), better_control::system::ToolError>(())
//! ```
//!
//! ## Resolving the tab order
//!
//! ```no_run
//! use better_control::app::Controller;
//! use better_control::config::{resolve_config_dir, SettingsStore};
//!
//! let dir = resolve_config_dir(None)?;
//! let controller = Controller::new(SettingsStore::new(&dir));
//! for tab in controller.visible_tabs() {
//!     println!("{}", tab);
//! }
//! # Ok::<(), better_control::config::ConfigError>(())
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod system;
pub mod tools;

// Re-export commonly used types for convenience
pub use core::{BluetoothDevice, Sink, Tab, UsbDevice, WifiNetwork};
