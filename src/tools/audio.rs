//! Volume, microphone and per-application audio via `pactl`

use tracing::{debug, info, warn};

use crate::core::{
    parser::pactl,
    validator::{validate_identifier, validate_volume},
    AppStream, Sink, Source,
};
use crate::system::{CommandRunner, Invocation, ToolError};
use crate::tools::notify;

pub const DEFAULT_SINK: &str = "@DEFAULT_SINK@";
pub const DEFAULT_SOURCE: &str = "@DEFAULT_SOURCE@";

/// Which side of the audio graph a call addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Playback (`@DEFAULT_SINK@`)
    Output,
    /// Capture (`@DEFAULT_SOURCE@`)
    Input,
}

impl Direction {
    fn target(self) -> &'static str {
        match self {
            Direction::Output => DEFAULT_SINK,
            Direction::Input => DEFAULT_SOURCE,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Direction::Output => "sink",
            Direction::Input => "source",
        }
    }
}

fn query(args: &[&str]) -> Invocation {
    Invocation::query("pactl").args(args.iter().copied())
}

fn mutate(args: &[&str]) -> Invocation {
    Invocation::mutate("pactl").args(args.iter().copied())
}

/// Volume of the default sink or source in percent
pub fn get_volume(runner: &dyn CommandRunner, direction: Direction) -> Result<u32, ToolError> {
    let verb = format!("get-{}-volume", direction.noun());
    let output = runner.stdout(&query(&[&verb, direction.target()]))?;
    pactl::first_percentage(&output)
        .ok_or_else(|| ToolError::parse("pactl", format!("no percentage in {} output", verb)))
}

pub fn set_volume(
    runner: &dyn CommandRunner,
    direction: Direction,
    percent: u32,
) -> Result<(), ToolError> {
    validate_volume(percent)?;
    let verb = format!("set-{}-volume", direction.noun());
    runner.run(&mutate(&[&verb, direction.target(), &format!("{}%", percent)]))?;
    info!(percent, "Set {} volume", direction.noun());
    Ok(())
}

pub fn is_muted(runner: &dyn CommandRunner, direction: Direction) -> Result<bool, ToolError> {
    let verb = format!("get-{}-mute", direction.noun());
    let output = runner.stdout(&query(&[&verb, direction.target()]))?;
    Ok(pactl::parse_mute(&output))
}

pub fn toggle_mute(runner: &dyn CommandRunner, direction: Direction) -> Result<(), ToolError> {
    let verb = format!("set-{}-mute", direction.noun());
    runner.run(&mutate(&[&verb, direction.target(), "toggle"]))?;
    Ok(())
}

pub fn set_mute(
    runner: &dyn CommandRunner,
    direction: Direction,
    muted: bool,
) -> Result<(), ToolError> {
    let verb = format!("set-{}-mute", direction.noun());
    runner.run(&mutate(&[&verb, direction.target(), if muted { "1" } else { "0" }]))?;
    Ok(())
}

fn default_name(runner: &dyn CommandRunner, verb: &str) -> Option<String> {
    match runner.stdout(&query(&[verb])) {
        Ok(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            warn!("pactl {} failed: {}", verb, e);
            None
        }
    }
}

/// Every sink, with the default one flagged `active`
pub fn list_sinks(runner: &dyn CommandRunner) -> Result<Vec<Sink>, ToolError> {
    let default = default_name(runner, "get-default-sink");
    let output = runner.stdout(&query(&["list", "sinks"]))?;
    Ok(pactl::parse_sinks(&output, default.as_deref()))
}

/// Every source; monitors included when `include_monitors`
pub fn list_sources(
    runner: &dyn CommandRunner,
    include_monitors: bool,
) -> Result<Vec<Source>, ToolError> {
    let default = default_name(runner, "get-default-source");
    let output = runner.stdout(&query(&["list", "sources"]))?;
    Ok(pactl::parse_sources(&output, default.as_deref())
        .into_iter()
        .filter(|source| include_monitors || !source.monitor)
        .collect())
}

/// Playback streams (sink inputs)
pub fn list_applications(runner: &dyn CommandRunner) -> Result<Vec<AppStream>, ToolError> {
    let output = runner.stdout(&query(&["list", "sink-inputs"]))?;
    Ok(pactl::parse_sink_inputs(&output))
}

/// Recording streams (source outputs)
pub fn list_recording_apps(runner: &dyn CommandRunner) -> Result<Vec<AppStream>, ToolError> {
    let output = runner.stdout(&query(&["list", "source-outputs"]))?;
    Ok(pactl::parse_source_outputs(&output))
}

/// `(index, name)` of every sink from the short listing
pub fn short_sinks(runner: &dyn CommandRunner) -> Result<Vec<(String, String)>, ToolError> {
    let output = runner.stdout(&query(&["list", "short", "sinks"]))?;
    Ok(pactl::parse_short_list(&output))
}

/// Moves every running playback stream to `sink`
///
/// A stream that refuses to move is logged and skipped.
pub fn move_all_streams(runner: &dyn CommandRunner, sink: &str) -> Result<usize, ToolError> {
    let output = runner.stdout(&query(&["list", "short", "sink-inputs"]))?;
    let mut moved = 0;
    for (stream, _) in pactl::parse_short_list(&output) {
        match runner.run(&mutate(&["move-sink-input", &stream, sink])) {
            Ok(_) => moved += 1,
            Err(e) => warn!(stream = %stream, "Could not move stream: {}", e),
        }
    }
    debug!(moved, "Moved streams");
    Ok(moved)
}

/// Makes `sink` the default and moves every running stream onto it
pub fn set_default_sink(runner: &dyn CommandRunner, sink: &str) -> Result<(), ToolError> {
    validate_identifier(sink)?;
    runner.run(&mutate(&["set-default-sink", sink]))?;
    info!(sink, "Default sink changed");
    move_all_streams(runner, sink)?;
    Ok(())
}

pub fn set_default_source(runner: &dyn CommandRunner, source: &str) -> Result<(), ToolError> {
    validate_identifier(source)?;
    runner.run(&mutate(&["set-default-source", source]))?;
    info!(source, "Default source changed");
    Ok(())
}

pub fn set_application_volume(
    runner: &dyn CommandRunner,
    stream: u32,
    percent: u32,
) -> Result<(), ToolError> {
    validate_volume(percent)?;
    runner.run(&mutate(&[
        "set-sink-input-volume",
        &stream.to_string(),
        &format!("{}%", percent),
    ]))?;
    Ok(())
}

pub fn set_recording_volume(
    runner: &dyn CommandRunner,
    stream: u32,
    percent: u32,
) -> Result<(), ToolError> {
    validate_volume(percent)?;
    runner.run(&mutate(&[
        "set-source-output-volume",
        &stream.to_string(),
        &format!("{}%", percent),
    ]))?;
    Ok(())
}

pub fn move_application_to_sink(
    runner: &dyn CommandRunner,
    stream: u32,
    sink: &str,
) -> Result<(), ToolError> {
    validate_identifier(sink)?;
    runner.run(&mutate(&["move-sink-input", &stream.to_string(), sink]))?;
    Ok(())
}

/// `None` toggles
pub fn mute_application(
    runner: &dyn CommandRunner,
    stream: u32,
    muted: Option<bool>,
) -> Result<(), ToolError> {
    let state = match muted {
        Some(true) => "1",
        Some(false) => "0",
        None => "toggle",
    };
    runner.run(&mutate(&["set-sink-input-mute", &stream.to_string(), state]))?;
    Ok(())
}

/// Icon for an output device, by name and description keywords
pub fn sink_icon_name(name: &str, description: &str) -> &'static str {
    let name = name.to_lowercase();
    let description = description.to_lowercase();
    let either = |term: &str| name.contains(term) || description.contains(term);

    if ["headphone", "headset", "earphone", "earbud"].iter().any(|t| either(t)) {
        "audio-headphones-symbolic"
    } else if name.contains("bluetooth") || name.contains("bluez") || description.contains("bt") {
        "bluetooth-symbolic"
    } else if ["hdmi", "displayport", "dp", "tv"].iter().any(|t| either(t)) {
        "video-display-symbolic"
    } else if either("usb") {
        "audio-card-symbolic"
    } else {
        "audio-speakers-symbolic"
    }
}

/// Icon for an input device
pub fn source_icon_name(name: &str, description: &str) -> &'static str {
    let name = name.to_lowercase();
    let description = description.to_lowercase();
    let either = |term: &str| name.contains(term) || description.contains(term);

    if either("cam") {
        "camera-web-symbolic"
    } else if either("headset") || either("headphone") {
        "audio-headset-symbolic"
    } else if name.contains("bluetooth") || name.contains("bluez") || description.contains("bt") {
        "bluetooth-symbolic"
    } else {
        "audio-input-microphone-symbolic"
    }
}

const APP_ICONS: [(&str, &str); 20] = [
    ("Firefox", "firefox"),
    ("firefox", "firefox"),
    ("Brave", "brave-browser"),
    ("brave", "brave-browser"),
    ("Chromium", "chromium"),
    ("chromium", "chromium"),
    ("Google Chrome", "google-chrome"),
    ("chrome", "google-chrome"),
    ("Spotify", "spotify"),
    ("spotify", "spotify"),
    ("VLC", "vlc"),
    ("vlc", "vlc"),
    ("mpv", "mpv"),
    ("MPV", "mpv"),
    ("Discord", "discord"),
    ("discord", "discord"),
    ("Telegram", "telegram"),
    ("telegram", "telegram"),
    ("Zoom", "zoom"),
    ("zoom", "zoom"),
];

const GENERIC_APP_ICON: &str = "audio-x-generic-symbolic";

/// Icon for an application stream; an icon the app supplied wins
pub fn app_icon_name<'a>(app_name: &str, provided: &'a str) -> &'a str {
    if !provided.is_empty() {
        return provided;
    }
    APP_ICONS
        .iter()
        .find(|(key, _)| app_name.contains(key))
        .map(|(_, icon)| *icon)
        .unwrap_or(GENERIC_APP_ICON)
}

/// Theme icon for `stream`
///
/// The parser falls back to the binary or the dashed name when the app
/// supplies no icon; a known application icon beats those guesses.
pub fn stream_icon(stream: &AppStream) -> &str {
    let guessed = stream
        .binary
        .as_deref()
        .is_some_and(|binary| binary.to_lowercase() == stream.icon)
        || stream.icon == stream.name.to_lowercase().replace(' ', "-");
    if !guessed {
        return &stream.icon;
    }
    match app_icon_name(&stream.name, "") {
        GENERIC_APP_ICON => &stream.icon,
        known => known,
    }
}

/// Announces a new default device with an icon matching its kind
pub fn notify_default_device(runner: &dyn CommandRunner, direction: Direction, name: &str) {
    let devices = match direction {
        Direction::Output => list_sinks(runner),
        Direction::Input => list_sources(runner, true),
    };
    let description = devices
        .ok()
        .and_then(|devices| devices.into_iter().find(|device| device.name == name))
        .map(|device| device.description)
        .unwrap_or_else(|| name.to_string());

    let (label, icon) = match direction {
        Direction::Output => ("Output", sink_icon_name(name, &description)),
        Direction::Input => ("Input", source_icon_name(name, &description)),
    };
    notify::send_quietly(
        runner,
        &notify::Notification::new(notify::APP_NAME, format!("{}: {}", label, description)).icon(icon),
    );
}

/// Announces a stream moved to another sink, with the application's icon
pub fn notify_stream_moved(runner: &dyn CommandRunner, stream: &AppStream, sink: &str) {
    notify::send_quietly(
        runner,
        &notify::Notification::new(notify::APP_NAME, format!("{} moved to {}", stream.name, sink))
            .icon(stream_icon(stream)),
    );
}
