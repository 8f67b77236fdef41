//! `bluetoothctl` output parser

use std::sync::LazyLock;

use regex::Regex;

use super::{split_field, yes_no};
use crate::core::types::BluetoothDevice;

static BATTERY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d{1,3})\)").expect("Battery regex should be valid regex")
});

/// `bluetoothctl devices [Paired|Connected]`: `Device <MAC> <Name>` lines
///
/// Devices that only advertise their address print the MAC (with dashes)
/// as the name; those are kept, since they can still be paired.
pub fn parse_devices(output: &str) -> Vec<BluetoothDevice> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (mac, name) = rest.split_once(' ').unwrap_or((rest, ""));
            let name = name.trim();
            Some(BluetoothDevice {
                mac: mac.to_string(),
                name: if name.is_empty() { mac.to_string() } else { name.to_string() },
                ..BluetoothDevice::default()
            })
        })
        .collect()
}

/// `bluetoothctl info <MAC>` merged into the record from `devices`
pub fn apply_info(device: &mut BluetoothDevice, output: &str) {
    let mut alias = None;

    for (key, value) in output.lines().filter_map(split_field) {
        match key {
            "Name" if !value.is_empty() => device.name = value.to_string(),
            "Alias" if !value.is_empty() => alias = Some(value.to_string()),
            "Icon" => device.icon = Some(value.to_string()),
            "Paired" => device.paired = yes_no(value),
            "Trusted" => device.trusted = yes_no(value),
            "Connected" => device.connected = yes_no(value),
            "Battery Percentage" => device.battery = parse_battery(value),
            _ => {}
        }
    }

    // Alias is what the user renamed the device to
    if let Some(alias) = alias {
        device.name = alias;
    }
}

/// `0x46 (70)` -> 70
pub fn parse_battery(value: &str) -> Option<u8> {
    BATTERY_REGEX
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .filter(|pct| *pct <= 100)
        .or_else(|| {
            let hex = value.trim().strip_prefix("0x")?;
            u8::from_str_radix(hex, 16).ok().filter(|pct| *pct <= 100)
        })
}

/// `bluetoothctl show`: whether the default controller is powered
///
/// `None` when no controller is present.
pub fn parse_powered(output: &str) -> Option<bool> {
    if !output.lines().any(|line| line.starts_with("Controller ")) {
        return None;
    }

    output
        .lines()
        .filter_map(split_field)
        .find(|(key, _)| *key == "Powered")
        .map(|(_, value)| yes_no(value))
}
