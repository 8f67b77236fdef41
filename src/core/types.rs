//! src/core/types.rs
//!
//! Core record types re-derived from tool output on every refresh
//!
//! This module defines the records the tool wrappers return:
//! - Audio: `AudioDevice` (sinks and sources), `AppStream`
//! - Network: `WifiNetwork`, `Security`
//! - Devices: `BluetoothDevice`, `UsbDevice`, `BatteryInfo`
//! - Session: `AutostartEntry`, `Monitor`, `PowerProfile`
//! - Navigation: `Tab`
//!
//! None of these are cached; every refresh parses fresh output.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// A PulseAudio/PipeWire sink or source
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AudioDevice {
    /// Numeric index from the `Sink #N` header
    pub id: u32,
    /// Internal name (`alsa_output.pci-0000_00_1f.3.analog-stereo`)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// RUNNING, IDLE or SUSPENDED
    pub state: String,
    pub muted: bool,
    /// First channel volume in percent
    pub volume: Option<u32>,
    pub active_port: Option<String>,
    /// Whether this is the current default device
    pub active: bool,
    /// Sources only: monitor of a sink rather than a real input
    pub monitor: bool,
}

pub type Sink = AudioDevice;
pub type Source = AudioDevice;

/// An application playback (sink input) or recording (source output) stream
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AppStream {
    pub id: u32,
    pub name: String,
    /// `application.process.binary`
    pub binary: Option<String>,
    pub icon: String,
    pub volume: u32,
    /// Sink id for playback streams, source id for recording streams
    pub device: Option<u32>,
    pub muted: bool,
}

/// Wi-Fi security classification
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Security {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
}

impl Security {
    /// Classifies a free-form security column
    ///
    /// Precedence is WPA2, WPA3, WPA, WEP, then Open: mixed-mode networks
    /// that advertise `WPA2 WPA3` are reported as WPA2.
    pub fn from_text(text: &str) -> Self {
        if text.contains("WPA2") {
            Security::Wpa2
        } else if text.contains("WPA3") {
            Security::Wpa3
        } else if text.contains("WPA") {
            Security::Wpa
        } else if text.contains("WEP") {
            Security::Wep
        } else {
            Security::Open
        }
    }

    pub fn is_secured(&self) -> bool {
        *self != Security::Open
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Security::Open => write!(f, "Open"),
            Security::Wep => write!(f, "WEP"),
            Security::Wpa => write!(f, "WPA"),
            Security::Wpa2 => write!(f, "WPA2"),
            Security::Wpa3 => write!(f, "WPA3"),
        }
    }
}

/// A visible wireless network
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WifiNetwork {
    pub in_use: bool,
    pub ssid: String,
    pub bssid: Option<String>,
    /// Signal strength in percent (0-100)
    pub signal: u8,
    pub security: Security,
    /// Raw security column as printed by nmcli
    pub security_text: String,
    pub bars: Option<String>,
    pub channel: Option<u32>,
    pub rate: Option<String>,
}

impl WifiNetwork {
    /// Signal-strength icon name in the symbolic icon theme
    pub fn signal_icon(&self) -> &'static str {
        match self.signal {
            80.. => "network-wireless-signal-excellent-symbolic",
            60..=79 => "network-wireless-signal-good-symbolic",
            40..=59 => "network-wireless-signal-ok-symbolic",
            1..=39 => "network-wireless-signal-weak-symbolic",
            0 => "network-wireless-signal-none-symbolic",
        }
    }
}

/// A known or discovered Bluetooth device
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BluetoothDevice {
    pub mac: String,
    pub name: String,
    pub paired: bool,
    pub connected: bool,
    pub trusted: bool,
    /// Device class icon (`audio-headset`, `input-mouse`)
    pub icon: Option<String>,
    /// Battery percentage reported over the Battery service
    pub battery: Option<u8>,
}

impl BluetoothDevice {
    /// Whether connecting should switch the audio output
    pub fn is_audio(&self) -> bool {
        self.icon
            .as_deref()
            .is_some_and(|icon| icon.starts_with("audio-"))
    }
}

/// A power supply known to UPower
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BatteryInfo {
    /// D-Bus object path from `upower -e`
    pub path: String,
    /// `battery`, `mouse`, `keyboard`, ...
    pub kind: String,
    /// Ordered, human-labelled details (`Charge`, `Manufacturer`, ...)
    pub details: Vec<(String, String)>,
    pub percentage: Option<f64>,
    pub state: Option<String>,
}

impl BatteryInfo {
    pub fn detail(&self, label: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_peripheral(&self) -> bool {
        matches!(self.kind.as_str(), "mouse" | "keyboard" | "gaming-input" | "headset")
    }
}

/// USBGuard authorisation target
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum UsbStatus {
    Allow,
    Block,
    Reject,
}

impl fmt::Display for UsbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbStatus::Allow => write!(f, "allow"),
            UsbStatus::Block => write!(f, "block"),
            UsbStatus::Reject => write!(f, "reject"),
        }
    }
}

/// A device line from `usbguard list-devices`
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UsbDevice {
    /// Runtime device number (the leading `N:`)
    pub id: String,
    pub status: UsbStatus,
    /// `vid:pid`
    pub vendor_product: Option<String>,
    pub name: Option<String>,
    pub serial: Option<String>,
    pub hash: Option<String>,
    pub parent_hash: Option<String>,
    pub via_port: Option<String>,
    pub with_interface: Option<String>,
    pub connect_type: Option<String>,
    /// Rule text after the id, as printed
    pub rule: String,
}

impl UsbDevice {
    /// Name for display, falling back when the device reports none
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Device name cannot be retrieved",
        }
    }

    /// Identity that survives re-plugging, used by the device stores
    ///
    /// The USBGuard hash when present, otherwise `vid:pid` plus the serial,
    /// otherwise the runtime id.
    pub fn store_key(&self) -> String {
        if let Some(hash) = self.hash.as_deref().filter(|h| !h.is_empty()) {
            return hash.to_string();
        }
        match (self.vendor_product.as_deref(), self.serial.as_deref()) {
            (Some(vid_pid), Some(serial)) if !serial.is_empty() => format!("{}:{}", vid_pid, serial),
            (Some(vid_pid), _) => vid_pid.to_string(),
            (None, _) => self.id.clone(),
        }
    }
}

/// Where an autostart entry lives
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AutostartSource {
    /// XDG `.desktop` file
    Desktop,
    /// `exec-once` line in hyprland.conf
    Hyprland,
    /// `exec` / `exec_always` line in the sway config
    Sway,
}

impl fmt::Display for AutostartSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutostartSource::Desktop => write!(f, "desktop"),
            AutostartSource::Hyprland => write!(f, "hyprland"),
            AutostartSource::Sway => write!(f, "sway"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AutostartEntry {
    pub name: String,
    pub source: AutostartSource,
    pub path: PathBuf,
    /// Config line for compositor entries (0-based), `None` for desktop files
    pub line: Option<usize>,
    /// Command for compositor entries, `Exec=` for desktop files
    pub command: String,
    pub enabled: bool,
    /// Desktop files with `Hidden=true`
    pub hidden: bool,
}

/// A connected output
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Monitor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transform: u8,
    #[serde(default)]
    pub focused: bool,
}

/// A power profile as listed by `powerprofilesctl list`
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PowerProfile {
    pub name: String,
    pub active: bool,
}

/// A page of the control center
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Tab {
    Volume,
    #[serde(rename = "Wi-Fi")]
    Wifi,
    Bluetooth,
    Battery,
    Display,
    Power,
    Autostart,
    #[serde(rename = "USBGuard")]
    UsbGuard,
    Settings,
}

impl Tab {
    /// Every tab in default order, Settings last
    pub const ALL: [Tab; 9] = [
        Tab::Volume,
        Tab::Wifi,
        Tab::Bluetooth,
        Tab::Battery,
        Tab::Display,
        Tab::Power,
        Tab::Autostart,
        Tab::UsbGuard,
        Tab::Settings,
    ];

    /// Name as persisted in settings.json
    pub fn name(&self) -> &'static str {
        match self {
            Tab::Volume => "Volume",
            Tab::Wifi => "Wi-Fi",
            Tab::Bluetooth => "Bluetooth",
            Tab::Battery => "Battery",
            Tab::Display => "Display",
            Tab::Power => "Power",
            Tab::Autostart => "Autostart",
            Tab::UsbGuard => "USBGuard",
            Tab::Settings => "Settings",
        }
    }

    /// Settings can never be hidden or reordered
    pub fn is_configurable(&self) -> bool {
        *self != Tab::Settings
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Tab {
    type Err = String;

    /// Case-insensitive, accepting the persisted names and short aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "volume" | "audio" => Ok(Tab::Volume),
            "wi-fi" | "wifi" => Ok(Tab::Wifi),
            "bluetooth" | "bt" => Ok(Tab::Bluetooth),
            "battery" => Ok(Tab::Battery),
            "display" => Ok(Tab::Display),
            "power" => Ok(Tab::Power),
            "autostart" => Ok(Tab::Autostart),
            "usbguard" | "usb" => Ok(Tab::UsbGuard),
            "settings" => Ok(Tab::Settings),
            other => Err(format!("Unknown tab '{}'", other)),
        }
    }
}
