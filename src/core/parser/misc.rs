//! Small parsers: brightnessctl, powerprofilesctl, compositor monitor JSON

use serde::Deserialize;

use super::ParseError;
use crate::core::types::{Monitor, PowerProfile};

/// Strict integer parse of a single-value tool output (`brightnessctl g`)
pub fn parse_int(output: &str) -> Result<u32, ParseError> {
    let trimmed = output.trim();
    trimmed
        .parse()
        .map_err(|_| ParseError::InvalidNumber(trimmed.to_string()))
}

/// `current * 100 / max`, rounded to the nearest percent
pub fn brightness_percent(current: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    ((u64::from(current) * 100 + u64::from(max) / 2) / u64::from(max)) as u32
}

/// Raw brightnessctl value for a percentage of `max`
pub fn brightness_raw(percent: u32, max: u32) -> u32 {
    (u64::from(percent.min(100)) * u64::from(max) / 100) as u32
}

/// `powerprofilesctl list`
///
/// Profiles are the lines ending in `:` at the outer indentation level;
/// the active one is prefixed with `*`. Indented detail lines are skipped.
pub fn parse_power_profiles(output: &str) -> Vec<PowerProfile> {
    output
        .lines()
        .filter(|line| !line.starts_with("    ") && !line.starts_with('\t'))
        .filter_map(|line| {
            let active = line.trim_start().starts_with('*');
            let body = line.trim().trim_start_matches('*').trim();
            let name = body.strip_suffix(':')?;
            (!name.is_empty() && !name.contains(':') && !name.contains(char::is_whitespace))
                .then(|| PowerProfile {
                    name: name.to_string(),
                    active,
                })
        })
        .collect()
}

/// `hyprctl -j monitors`
pub fn parse_hyprland_monitors(json: &str) -> Result<Vec<Monitor>, ParseError> {
    serde_json::from_str(json).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

#[derive(Deserialize)]
struct SwayOutput {
    name: String,
    #[serde(default)]
    make: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    transform: Option<String>,
    #[serde(default)]
    focused: bool,
}

/// Sway transform names in Wayland transform order (0-7)
pub const SWAY_TRANSFORMS: [&str; 8] = [
    "normal",
    "90",
    "180",
    "270",
    "flipped",
    "flipped-90",
    "flipped-180",
    "flipped-270",
];

/// `swaymsg -t get_outputs -r`
pub fn parse_sway_outputs(json: &str) -> Result<Vec<Monitor>, ParseError> {
    let outputs: Vec<SwayOutput> =
        serde_json::from_str(json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    Ok(outputs
        .into_iter()
        .map(|output| Monitor {
            description: format!("{} {}", output.make, output.model).trim().to_string(),
            transform: output
                .transform
                .as_deref()
                .and_then(|t| SWAY_TRANSFORMS.iter().position(|name| *name == t))
                .map(|idx| idx as u8)
                .unwrap_or(0),
            focused: output.focused,
            name: output.name,
        })
        .collect())
}
