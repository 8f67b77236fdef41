//! UPower (`upower -e`, `upower -i <path>`) output parser

use super::split_field;
use crate::core::types::BatteryInfo;

/// `upower -e` object paths that describe a battery
///
/// Peripheral batteries (`/org/freedesktop/UPower/devices/mouse_hidpp_battery_0`)
/// match too; `BatteryInfo::kind` tells them apart.
pub fn parse_battery_paths(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.to_lowercase().contains("battery"))
        .map(str::to_string)
        .collect()
}

/// Human-readable label for a `upower -i` key
pub fn display_label(key: &str) -> String {
    let label = match key {
        "vendor" => "Manufacturer",
        "model" => "Model",
        "state" => "State",
        "warning-level" => "Warning Level",
        "energy" => "Energy",
        "energy-empty" => "Energy Empty",
        "energy-full" => "Energy Full",
        "energy-full-design" => "Energy Full Design",
        "energy-rate" => "Energy Rate",
        "voltage" => "Voltage",
        "time to empty" => "Time to Empty",
        "time to full" => "Time to Full",
        "percentage" => "Charge",
        "capacity" => "Capacity",
        "technology" => "Technology",
        other => return capitalize(other),
    };
    label.to_string()
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `upower -i <path>` into labelled details
///
/// The device kind is the first indented line without a colon
/// (`  battery`, `  mouse`). Empty values are dropped and a repeated
/// label keeps its first value.
pub fn parse_battery_info(path: &str, output: &str) -> BatteryInfo {
    let mut info = BatteryInfo {
        path: path.to_string(),
        ..BatteryInfo::default()
    };

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = split_field(line) else {
            if info.kind.is_empty() {
                info.kind = line.to_string();
            }
            continue;
        };

        if value.is_empty() {
            continue;
        }

        match key {
            "percentage" => {
                info.percentage = value.trim_end_matches('%').trim().parse().ok();
            }
            "state" => info.state = Some(value.to_string()),
            _ => {}
        }

        let label = display_label(key);
        if info.detail(&label).is_none() {
            info.details.push((label, value.to_string()));
        }
    }

    info
}
