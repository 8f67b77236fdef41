//! Brightness, blue-light filter and output rotation

use std::{env, fmt};

use tracing::{debug, info};

use crate::core::{
    parser::misc::{self, SWAY_TRANSFORMS},
    validator::{validate_brightness, validate_identifier, validate_temperature, validate_transform},
    Monitor,
};
use crate::config::settings::DEFAULT_GAMMA;
use crate::system::{CommandRunner, Invocation, ToolError};

/// Compositor family, as far as rotation and autostart care
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Session {
    Hyprland,
    Sway,
    Other(String),
}

impl Session {
    /// Classifies an `XDG_CURRENT_DESKTOP` value (`Hyprland`, `sway`, `GNOME`)
    pub fn from_desktop(desktop: Option<&str>) -> Self {
        let desktop = desktop.unwrap_or_default();
        let lower = desktop.to_lowercase();
        if lower.contains("hyprland") {
            Session::Hyprland
        } else if lower.contains("sway") {
            Session::Sway
        } else {
            Session::Other(desktop.to_string())
        }
    }

    pub fn current() -> Self {
        Self::from_desktop(env::var("XDG_CURRENT_DESKTOP").ok().as_deref())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Hyprland => write!(f, "Hyprland"),
            Session::Sway => write!(f, "Sway"),
            Session::Other(name) if name.is_empty() => write!(f, "unknown"),
            Session::Other(name) => write!(f, "{}", name),
        }
    }
}

fn brightnessctl(arg: &str) -> Invocation {
    Invocation::query("brightnessctl").arg(arg)
}

/// Current brightness in percent of the maximum
pub fn get_brightness(runner: &dyn CommandRunner) -> Result<u32, ToolError> {
    let current = misc::parse_int(&runner.stdout(&brightnessctl("g"))?)
        .map_err(|e| ToolError::parse("brightnessctl", e.to_string()))?;
    let max = max_brightness(runner)?;
    Ok(misc::brightness_percent(current, max))
}

pub fn max_brightness(runner: &dyn CommandRunner) -> Result<u32, ToolError> {
    misc::parse_int(&runner.stdout(&brightnessctl("m"))?)
        .map_err(|e| ToolError::parse("brightnessctl", e.to_string()))
}

/// Sets brightness to `percent`, converted to the device's raw scale
pub fn set_brightness(runner: &dyn CommandRunner, percent: u32) -> Result<(), ToolError> {
    validate_brightness(percent)?;
    let raw = misc::brightness_raw(percent, max_brightness(runner)?);
    runner.run(&Invocation::mutate("brightnessctl").args(["s".to_string(), raw.to_string()]))?;
    info!(percent, raw, "Brightness set");
    Ok(())
}

/// Stops any running gammastep; a non-match (exit 1) is not an error
fn kill_gammastep(runner: &dyn CommandRunner) -> Result<(), ToolError> {
    match runner.run(&Invocation::mutate("pkill").args(["-f", "gammastep"])) {
        Ok(_) | Err(ToolError::Failed { code: Some(1), .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Applies a colour temperature; 6500 K turns the filter off
pub fn set_blue_light(runner: &dyn CommandRunner, kelvin: u32) -> Result<(), ToolError> {
    validate_temperature(kelvin)?;
    kill_gammastep(runner)?;

    if kelvin == DEFAULT_GAMMA {
        info!("Blue light filter off");
        return Ok(());
    }

    runner.spawn_detached(&Invocation::mutate("gammastep").args(["-O".to_string(), kelvin.to_string()]))?;
    info!(kelvin, "Blue light filter applied");
    Ok(())
}

/// Connected outputs for the running compositor
pub fn list_monitors(runner: &dyn CommandRunner, session: &Session) -> Result<Vec<Monitor>, ToolError> {
    match session {
        Session::Hyprland => {
            let json = runner.stdout(&Invocation::query("hyprctl").args(["-j", "monitors"]))?;
            misc::parse_hyprland_monitors(&json).map_err(|e| ToolError::parse("hyprctl", e.to_string()))
        }
        Session::Sway => {
            let json = runner.stdout(&Invocation::query("swaymsg").args(["-t", "get_outputs", "-r"]))?;
            misc::parse_sway_outputs(&json).map_err(|e| ToolError::parse("swaymsg", e.to_string()))
        }
        Session::Other(_) => Err(ToolError::NotFound(format!(
            "Monitor listing is not supported on {}",
            session
        ))),
    }
}

/// Rotates `monitor` to Wayland transform `transform` (0-7)
pub fn set_rotation(
    runner: &dyn CommandRunner,
    session: &Session,
    monitor: &str,
    transform: u8,
) -> Result<(), ToolError> {
    validate_identifier(monitor)?;
    validate_transform(transform)?;

    let command = match session {
        Session::Hyprland => Invocation::mutate("hyprctl").args([
            "keyword".to_string(),
            "monitor".to_string(),
            format!("{},transform,{}", monitor, transform),
        ]),
        Session::Sway => Invocation::mutate("swaymsg").args([
            "output",
            monitor,
            "transform",
            SWAY_TRANSFORMS[usize::from(transform)],
        ]),
        Session::Other(_) => {
            return Err(ToolError::NotFound(format!(
                "Rotation is not supported on {}",
                session
            )))
        }
    };

    debug!(monitor, transform, "Rotating output");
    runner.run(&command)?;
    info!(monitor, transform, "Output rotated");
    Ok(())
}
