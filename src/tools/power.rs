//! Batteries (`upower`), power profiles (`powerprofilesctl`) and session
//! actions (`systemctl`)

use std::{fmt, path::Path, str::FromStr};

use tracing::{info, warn};

use crate::config::{power::POWER_SETTINGS_FILE, PowerSettings};
use crate::core::{
    parser::{misc, upower},
    validator::validate_identifier,
    BatteryInfo, PowerProfile,
};
use crate::system::{allow_write, CommandRunner, Invocation, ToolError};

/// Object paths of every battery UPower knows about
pub fn battery_paths(runner: &dyn CommandRunner) -> Result<Vec<String>, ToolError> {
    let output = runner.stdout(&Invocation::query("upower").arg("-e"))?;
    Ok(upower::parse_battery_paths(&output))
}

pub fn battery_info(runner: &dyn CommandRunner, path: &str) -> Result<BatteryInfo, ToolError> {
    let output = runner.stdout(&Invocation::query("upower").args(["-i", path]))?;
    Ok(upower::parse_battery_info(path, &output))
}

/// Details for every battery; one unreadable battery does not hide the rest
pub fn batteries(runner: &dyn CommandRunner) -> Result<Vec<BatteryInfo>, ToolError> {
    Ok(battery_paths(runner)?
        .iter()
        .filter_map(|path| match battery_info(runner, path) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(path = %path, "Failed reading battery: {}", e);
                None
            }
        })
        .collect())
}

/// Label shown for a peripheral battery
pub fn peripheral_label(battery: &BatteryInfo) -> &'static str {
    match battery.kind.as_str() {
        "mouse" => "Wireless Mouse Battery",
        "keyboard" => "Wireless Keyboard Battery",
        "headset" => "Wireless Headset Battery",
        _ => "Wireless Device Battery",
    }
}

/// First mouse, keyboard or other peripheral with a battery
pub fn peripheral_battery(runner: &dyn CommandRunner) -> Result<Option<BatteryInfo>, ToolError> {
    Ok(batteries(runner)?
        .into_iter()
        .find(BatteryInfo::is_peripheral))
}

pub fn active_profile(runner: &dyn CommandRunner) -> Result<String, ToolError> {
    let output = runner.stdout(&Invocation::query("powerprofilesctl").arg("get"))?;
    let profile = output.trim();
    if profile.is_empty() {
        return Err(ToolError::parse("powerprofilesctl", "empty profile name"));
    }
    Ok(profile.to_string())
}

pub fn list_profiles(runner: &dyn CommandRunner) -> Result<Vec<PowerProfile>, ToolError> {
    let output = runner.stdout(&Invocation::query("powerprofilesctl").arg("list"))?;
    Ok(misc::parse_power_profiles(&output))
}

/// Switches profile and remembers it in `power_settings.json`
pub fn set_profile(
    runner: &dyn CommandRunner,
    config_dir: &Path,
    profile: &str,
) -> Result<(), ToolError> {
    validate_identifier(profile)?;

    let profiles = list_profiles(runner)?;
    if !profiles.is_empty() && !profiles.iter().any(|p| p.name == profile) {
        return Err(ToolError::NotFound(format!("Unknown power profile '{}'", profile)));
    }

    runner.run(&Invocation::mutate("powerprofilesctl").args(["set", profile]))?;
    if allow_write(runner, POWER_SETTINGS_FILE)? {
        PowerSettings {
            last_profile: Some(profile.to_string()),
        }
        .save(config_dir)?;
    }

    info!(profile, "Power profile changed");
    Ok(())
}

/// Profile recorded by the last successful [`set_profile`]
pub fn last_profile(config_dir: &Path) -> Option<String> {
    PowerSettings::load(config_dir).last_profile
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionAction {
    Suspend,
    Reboot,
    Poweroff,
}

impl SessionAction {
    fn verb(self) -> &'static str {
        match self {
            SessionAction::Suspend => "suspend",
            SessionAction::Reboot => "reboot",
            SessionAction::Poweroff => "poweroff",
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb())
    }
}

impl FromStr for SessionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suspend" => Ok(SessionAction::Suspend),
            "reboot" | "restart" => Ok(SessionAction::Reboot),
            "poweroff" | "shutdown" => Ok(SessionAction::Poweroff),
            other => Err(format!("Unknown session action '{}'", other)),
        }
    }
}

/// Starts `systemctl <action>` without waiting for it
pub fn session_action(runner: &dyn CommandRunner, action: SessionAction) -> Result<(), ToolError> {
    info!("Running systemctl {}", action);
    runner.spawn_detached(&Invocation::mutate("systemctl").arg(action.verb()))
}
