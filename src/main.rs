//! CLI entry point for better-control
//!
//! With no subcommand, prints the start tab as a read-only page. Each
//! subcommand maps onto one tool wrapper; anything that changes system
//! state goes through a live (or `--dry-run`) runner.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::{atomic::AtomicBool, Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use better_control::app::{
    file_watcher::FileWatcher, pages, Controller, MonitorOptions, StartFlags, UsbMonitor,
};
use better_control::config::{expand_path, resolve_config_dir, DeviceStore, SettingsStore};
use better_control::core::{redact, AutostartSource, Tab};
use better_control::system::{ClientMode, CommandRunner, SystemRunner};
use better_control::tools::{
    audio::{self, Direction},
    autostart::{self, AutostartPaths, ListOptions},
    bluetooth::default_state_dir,
    dependencies,
    display::{self, Session},
    power::{self, SessionAction},
    usbguard, wifi, BluetoothManager, RetryPolicy,
};

#[derive(Parser)]
#[command(name = "better-control")]
#[command(author, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool,

    /// Exit with an error when a required tool is missing
    #[arg(short, long)]
    force: bool,

    /// Start on the Volume tab
    #[arg(short = 'V', long = "volume")]
    volume_tab: bool,

    /// Start on the Wi-Fi tab
    #[arg(short = 'w', long = "wifi")]
    wifi_tab: bool,

    /// Start on the Bluetooth tab
    #[arg(short = 'b', long = "bluetooth")]
    bluetooth_tab: bool,

    /// Start on the Battery tab
    #[arg(short = 'B', long = "battery")]
    battery_tab: bool,

    /// Start on the Display tab
    #[arg(short = 'd', long = "display")]
    display_tab: bool,

    /// Verbosity 0-3, or a file to append logs to
    #[arg(short, long, value_name = "LEVEL|FILE")]
    log: Option<String>,

    /// Mask SSIDs, MAC addresses and device ids in logs
    #[arg(short, long)]
    redact: bool,

    /// Validate and log commands without running anything that changes state
    #[arg(long, global = true)]
    dry_run: bool,

    /// Config directory (default: ~/.config/better-control)
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Output volume and devices
    Volume {
        #[command(subcommand)]
        action: Option<LevelAction>,
    },

    /// Microphone volume and devices
    Mic {
        #[command(subcommand)]
        action: Option<LevelAction>,
    },

    /// Per-application playback and recording streams
    Apps {
        #[command(subcommand)]
        action: Option<AppsAction>,
    },

    /// Wireless networks
    Wifi {
        #[command(subcommand)]
        action: Option<WifiAction>,
    },

    /// Bluetooth adapter and devices
    Bluetooth {
        #[command(subcommand)]
        action: Option<BluetoothAction>,
    },

    /// Battery levels
    Battery,

    /// Brightness, blue light and outputs
    Display {
        #[command(subcommand)]
        action: Option<DisplayAction>,
    },

    /// Power profiles and session actions
    Power {
        #[command(subcommand)]
        action: Option<PowerAction>,
    },

    /// Autostart entries
    Autostart {
        #[command(subcommand)]
        action: Option<AutostartAction>,
    },

    /// USBGuard devices, rules and the plug monitor
    Usb {
        #[command(subcommand)]
        action: Option<UsbAction>,
    },

    /// Tab order and visibility
    Tabs {
        #[command(subcommand)]
        action: Option<TabsAction>,
    },

    /// Check that the required tools are installed
    Deps,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn enabled(self) -> bool {
        matches!(self, Switch::On)
    }
}

#[derive(Subcommand)]
enum LevelAction {
    /// Set the level in percent
    Set { percent: u32 },
    /// Toggle mute, or force it on or off
    Mute { state: Option<Switch> },
    /// List devices
    Devices,
    /// Make a device the default
    Default { name: String },
}

#[derive(Subcommand)]
enum AppsAction {
    /// Set a stream's volume
    Volume {
        stream: u32,
        percent: u32,
        /// Address a recording stream instead of a playback one
        #[arg(long)]
        recording: bool,
    },
    /// Toggle a playback stream's mute
    Mute { stream: u32 },
    /// Move a playback stream to another sink
    Move { stream: u32, sink: String },
}

#[derive(Subcommand)]
enum WifiAction {
    /// Visible networks
    List {
        #[arg(long)]
        rescan: bool,
    },
    Connect {
        ssid: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Do not connect automatically in future
        #[arg(long)]
        no_remember: bool,
        /// Create a named profile instead of letting nmcli pick one
        #[arg(long)]
        new_profile: bool,
    },
    Disconnect,
    Forget { ssid: String },
    /// Turn the radio on or off
    Radio { state: Switch },
    /// Saved connection details
    Info {
        ssid: String,
        #[arg(long)]
        show_password: bool,
    },
    /// QR payload for sharing a saved network
    Share { ssid: String },
    /// Measure throughput over one second
    Speed,
}

#[derive(Subcommand)]
enum BluetoothAction {
    Power { state: Switch },
    /// Discover nearby devices
    Scan {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
    Connect {
        mac: String,
        /// Tries before giving up on a device that is slow to answer
        #[arg(long, default_value_t = 5)]
        attempts: u32,
    },
    Disconnect { mac: String },
    Forget { mac: String },
    Trust { mac: String },
    /// Make the remembered Bluetooth sink the default again
    Restore,
}

#[derive(Subcommand)]
enum DisplayAction {
    /// Show or set brightness in percent
    Brightness { percent: Option<u32> },
    /// Colour temperature in Kelvin (6500 turns the filter off)
    BlueLight { kelvin: u32 },
    Monitors,
    /// Wayland transform 0-7
    Rotate { monitor: String, transform: u8 },
}

#[derive(Subcommand)]
enum PowerAction {
    /// Show or set the power profile
    Profile { name: Option<String> },
    /// suspend, reboot or poweroff
    Session { action: SessionAction },
}

#[derive(Subcommand)]
enum AutostartAction {
    List {
        /// Include /etc/xdg/autostart
        #[arg(long)]
        system: bool,
        /// Include entries marked Hidden
        #[arg(long)]
        hidden: bool,
    },
    Enable { name: String },
    Disable { name: String },
    Toggle { name: String },
    /// Backups of a compositor config, oldest first
    Backups {
        /// Defaults to the first config of the running session
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Put back the newest backup of a compositor config
    Restore {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UsbAction {
    Allow {
        id: String,
        /// Add a persistent rule and remember the device
        #[arg(short, long)]
        permanent: bool,
    },
    Block { id: String },
    /// Silence notifications for a device
    Hide { id: String },
    /// Show a hidden device again, by id or stored key
    Unhide { device: String },
    Rules,
    /// Start or stop the usbguard service
    Service { state: Switch },
    /// Watch for plug events until interrupted
    Monitor {
        /// Block devices that are not permanently allowed
        #[arg(long)]
        block_unknown: bool,
        #[arg(long)]
        no_notify: bool,
    },
}

#[derive(Subcommand)]
enum TabsAction {
    Up { tab: Tab },
    Down { tab: Tab },
    Show { tab: Tab },
    Hide { tab: Tab },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("better-control {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(cli.log.as_deref())?;
    redact::set_enabled(cli.redact);

    if cli.force {
        let missing = dependencies::check_all();
        if !missing.is_empty() {
            for dep in &missing {
                eprintln!("{} {}\n", "✗".red().bold(), dep.message());
            }
            bail!("{} required tool(s) missing", missing.len());
        }
    }

    let config_dir = resolve_config_dir(cli.config_dir.as_deref())
        .context("Could not determine the config directory")?;
    debug!(config_dir = %config_dir.display(), "Using config directory");

    let live = SystemRunner::new(if cli.dry_run {
        ClientMode::DryRun
    } else {
        ClientMode::Live
    });
    let read_only = SystemRunner::new(ClientMode::ReadOnly);
    let mut controller = Controller::new(SettingsStore::new(&config_dir));
    if cli.dry_run {
        controller = controller.dry_run();
    }

    let Some(command) = cli.command else {
        let flags = StartFlags {
            volume: cli.volume_tab,
            wifi: cli.wifi_tab,
            bluetooth: cli.bluetooth_tab,
            battery: cli.battery_tab,
            display: cli.display_tab,
        };
        let tab = controller.start_tab(flags);
        show_page(tab, &read_only, &config_dir, &controller);
        return Ok(());
    };

    match command {
        Commands::Volume { action: None } => {
            show_page(Tab::Volume, &read_only, &config_dir, &controller)
        }
        Commands::Volume { action: Some(action) } => level(&live, Direction::Output, action)?,
        Commands::Mic { action: None } => level(&read_only, Direction::Input, LevelAction::Devices)?,
        Commands::Mic { action: Some(action) } => level(&live, Direction::Input, action)?,
        Commands::Apps { action } => apps(&live, &read_only, action)?,
        Commands::Wifi { action: None } => show_page(Tab::Wifi, &read_only, &config_dir, &controller),
        Commands::Wifi { action: Some(action) } => wifi_command(&live, action)?,
        Commands::Bluetooth { action: None } => {
            show_page(Tab::Bluetooth, &read_only, &config_dir, &controller)
        }
        Commands::Bluetooth { action: Some(action) } => bluetooth_command(&live, action)?,
        Commands::Battery => show_page(Tab::Battery, &read_only, &config_dir, &controller),
        Commands::Display { action: None } => {
            show_page(Tab::Display, &read_only, &config_dir, &controller)
        }
        Commands::Display { action: Some(action) } => display_command(&live, &mut controller, action)?,
        Commands::Power { action: None } => show_page(Tab::Power, &read_only, &config_dir, &controller),
        Commands::Power { action: Some(action) } => power_command(&live, &config_dir, action)?,
        Commands::Autostart { action: None } => {
            show_page(Tab::Autostart, &read_only, &config_dir, &controller)
        }
        Commands::Autostart { action: Some(action) } => autostart_command(&live, &config_dir, action)?,
        Commands::Usb { action: None } => {
            show_page(Tab::UsbGuard, &read_only, &config_dir, &controller)
        }
        Commands::Usb { action: Some(action) } => usb_command(&live, &config_dir, action)?,
        Commands::Tabs { action: None } => {
            show_page(Tab::Settings, &read_only, &config_dir, &controller)
        }
        Commands::Tabs { action: Some(action) } => tabs_command(&mut controller, action)?,
        Commands::Deps => deps(),
    }

    Ok(())
}

/// Configures the tracing subscriber from `-l`
///
/// `0`-`3` pick the verbosity on stderr; anything else is a file path that
/// receives plain (uncoloured) logs. `RUST_LOG` wins when it is set.
fn init_logging(log: Option<&str>) -> anyhow::Result<()> {
    let (level, file) = match log {
        None => ("warn", None),
        Some("0") => ("error", None),
        Some("1") => ("info", None),
        Some("2") => ("debug", None),
        Some("3") => ("trace", None),
        Some(path) => ("info", Some(expand_path(path))),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Could not open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

/// Renders one tab with read-only tools
fn show_page(tab: Tab, runner: &dyn CommandRunner, config_dir: &Path, controller: &Controller) {
    let ctx = pages::PageContext {
        runner,
        config_dir,
        session: Session::current(),
        autostart: AutostartPaths::standard(backup_dir(config_dir)),
        bluetooth: BluetoothManager::new(runner, default_state_dir()),
    };
    println!("{}", pages::render(tab, &ctx, controller));
}

fn backup_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("backups")
}

fn done(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green(), message);
}

fn level(runner: &dyn CommandRunner, direction: Direction, action: LevelAction) -> anyhow::Result<()> {
    match action {
        LevelAction::Set { percent } => {
            audio::set_volume(runner, direction, percent).context("Could not set volume")?;
            done(format!("Volume set to {}%", percent));
        }
        LevelAction::Mute { state: Some(state) } => {
            audio::set_mute(runner, direction, state.enabled()).context("Could not set mute")?;
            done(if state.enabled() { "Muted" } else { "Unmuted" });
        }
        LevelAction::Mute { state: None } => {
            audio::toggle_mute(runner, direction).context("Could not toggle mute")?;
            let muted = audio::is_muted(runner, direction).unwrap_or(false);
            done(if muted { "Muted" } else { "Unmuted" });
        }
        LevelAction::Devices => {
            let level = audio::get_volume(runner, direction).context("Could not read volume")?;
            println!("{} {}%", "Volume:".bold(), level);
            let devices = match direction {
                Direction::Output => audio::list_sinks(runner),
                Direction::Input => audio::list_sources(runner, false),
            }
            .context("Could not list devices")?;
            for device in devices {
                let marker = if device.active { "*".green().bold() } else { " ".normal() };
                println!("{} {} {}", marker, device.description, device.name.dimmed());
            }
        }
        LevelAction::Default { name } => {
            match direction {
                Direction::Output => audio::set_default_sink(runner, &name),
                Direction::Input => audio::set_default_source(runner, &name),
            }
            .with_context(|| format!("Could not make {} the default", name))?;
            audio::notify_default_device(runner, direction, &name);
            done(format!("Default device: {}", name));
        }
    }
    Ok(())
}

fn apps(
    live: &dyn CommandRunner,
    read_only: &dyn CommandRunner,
    action: Option<AppsAction>,
) -> anyhow::Result<()> {
    match action {
        None => {
            println!("{}", "Playback".bold().cyan());
            for app in audio::list_applications(read_only).context("Could not list playback streams")? {
                println!("  #{:<4} {:<30} {}%", app.id, app.name, app.volume);
            }
            println!("{}", "Recording".bold().cyan());
            for app in audio::list_recording_apps(read_only).context("Could not list recording streams")? {
                println!("  #{:<4} {:<30} {}%", app.id, app.name, app.volume);
            }
        }
        Some(AppsAction::Volume {
            stream,
            percent,
            recording,
        }) => {
            if recording {
                audio::set_recording_volume(live, stream, percent)
            } else {
                audio::set_application_volume(live, stream, percent)
            }
            .with_context(|| format!("Could not set volume of stream {}", stream))?;
            done(format!("Stream {} at {}%", stream, percent));
        }
        Some(AppsAction::Mute { stream }) => {
            audio::mute_application(live, stream, None)
                .with_context(|| format!("Could not toggle mute of stream {}", stream))?;
            done(format!("Toggled mute of stream {}", stream));
        }
        Some(AppsAction::Move { stream, sink }) => {
            audio::move_application_to_sink(live, stream, &sink)
                .with_context(|| format!("Could not move stream {}", stream))?;
            let moved = audio::list_applications(read_only)
                .ok()
                .and_then(|streams| streams.into_iter().find(|app| app.id == stream));
            if let Some(moved) = moved {
                audio::notify_stream_moved(live, &moved, &sink);
            }
            done(format!("Stream {} moved to {}", stream, sink));
        }
    }
    Ok(())
}

fn wifi_command(runner: &dyn CommandRunner, action: WifiAction) -> anyhow::Result<()> {
    match action {
        WifiAction::List { rescan } => {
            let saved = wifi::saved_connections(runner).unwrap_or_default();
            for network in wifi::list_networks(runner, rescan).context("Could not list networks")? {
                let marker = if network.in_use { "*".green().bold() } else { " ".normal() };
                let known = if saved.contains(&network.ssid) { "saved" } else { "" };
                let lock = if network.security.is_secured() { pages::LOCK } else { " " };
                println!(
                    "{} {:<32} {:>3}% {} {:<6} {}",
                    marker,
                    network.ssid,
                    network.signal,
                    lock,
                    network.security,
                    known.dimmed()
                );
            }
        }
        WifiAction::Connect {
            ssid,
            password,
            no_remember,
            new_profile,
        } => {
            if new_profile {
                wifi::connect_with_profile(runner, &ssid, password.as_deref(), !no_remember)
            } else {
                wifi::connect(runner, &ssid, password.as_deref(), !no_remember)
            }
            .with_context(|| format!("Could not connect to {}", redact::mask(&ssid)))?;
            wifi::notify_connected(runner, &ssid);
            done(format!("Connected to {}", ssid));
        }
        WifiAction::Disconnect => match wifi::disconnect(runner).context("Could not disconnect")? {
            Some(ssid) => done(format!("Disconnected from {}", ssid)),
            None => println!("{}", "Not connected".yellow()),
        },
        WifiAction::Forget { ssid } => {
            wifi::forget(runner, &ssid).with_context(|| format!("Could not forget {}", ssid))?;
            done(format!("Forgot {}", ssid));
        }
        WifiAction::Radio { state } => {
            wifi::set_radio(runner, state.enabled()).context("Could not switch the Wi-Fi radio")?;
            done(format!("Wi-Fi {}", if state.enabled() { "enabled" } else { "disabled" }));
        }
        WifiAction::Info { ssid, show_password } => {
            let info = wifi::connection_info(runner, &ssid, show_password)
                .with_context(|| format!("Could not read connection {}", ssid))?;
            let mut keys: Vec<_> = info.fields.keys().collect();
            keys.sort();
            for key in keys {
                if key.ends_with(".psk") {
                    continue;
                }
                println!("{:<40} {}", key.dimmed(), info.fields[key]);
            }
            if let Some(password) = info.password {
                println!("{:<40} {}", "password".bold(), password);
            }
        }
        WifiAction::Share { ssid } => {
            let info = wifi::connection_info(runner, &ssid, true)
                .with_context(|| format!("Could not read connection {}", ssid))?;
            let security = info
                .get("802-11-wireless-security.key-mgmt")
                .unwrap_or_default();
            let password = info.password.as_deref().unwrap_or_default();
            let payload = wifi::qr_payload(&ssid, password, security);
            println!("{}", wifi::qr_code(&payload).context("Could not render the QR code")?);
            println!("{}", payload.dimmed());
        }
        WifiAction::Speed => {
            let interface = wifi::wifi_interface(runner)
                .context("Could not find the Wi-Fi interface")?
                .context("No Wi-Fi interface present")?;
            let sys_net = Path::new(wifi::SYS_NET);
            let before = wifi::read_counters(sys_net, &interface)?;
            let started = Instant::now();
            thread::sleep(Duration::from_secs(1));
            let after = wifi::read_counters(sys_net, &interface)?;
            let (down, up) = wifi::speed_mbps(before, after, started.elapsed());
            println!("{}  ↓ {:.2} Mbps  ↑ {:.2} Mbps", interface.bold(), down, up);
        }
    }
    Ok(())
}

fn bluetooth_command(runner: &dyn CommandRunner, action: BluetoothAction) -> anyhow::Result<()> {
    let manager = BluetoothManager::new(runner, default_state_dir());
    match action {
        BluetoothAction::Power { state } => {
            manager
                .set_powered(state.enabled())
                .context("Could not switch the Bluetooth adapter")?;
            done(format!("Bluetooth {}", if state.enabled() { "on" } else { "off" }));
        }
        BluetoothAction::Scan { seconds } => {
            println!("{} Scanning for {}s...", "→".cyan(), seconds);
            for device in manager.discover(seconds).context("Discovery failed")? {
                let state = if device.connected { "connected".green() } else { "".normal() };
                println!("  {} {:<30} {}", device.mac.dimmed(), device.name, state);
            }
        }
        BluetoothAction::Connect { mac, attempts } => {
            let retry = RetryPolicy {
                attempts,
                ..RetryPolicy::default()
            };
            let device = BluetoothManager::new(runner, default_state_dir())
                .with_retry(retry)
                .connect(&mac)
                .with_context(|| format!("Could not connect to {}", redact::mask(&mac)))?;
            done(format!("Connected to {}", device.name));
        }
        BluetoothAction::Disconnect { mac } => {
            manager
                .disconnect(&mac)
                .with_context(|| format!("Could not disconnect {}", redact::mask(&mac)))?;
            done("Disconnected");
        }
        BluetoothAction::Forget { mac } => {
            manager.forget(&mac).context("Could not remove the device")?;
            done("Device removed");
        }
        BluetoothAction::Trust { mac } => {
            manager.trust(&mac).context("Could not trust the device")?;
            done("Device trusted");
        }
        BluetoothAction::Restore => match manager.restore_last_sink().context("Could not restore audio")? {
            Some(sink) => done(format!("Audio restored to {}", sink)),
            None => println!("{}", "No previous sink to restore".yellow()),
        },
    }
    Ok(())
}

fn display_command(
    runner: &dyn CommandRunner,
    controller: &mut Controller,
    action: DisplayAction,
) -> anyhow::Result<()> {
    match action {
        DisplayAction::Brightness { percent: None } => {
            let level = display::get_brightness(runner).context("Could not read brightness")?;
            println!("{} {}%", "Brightness:".bold(), level);
        }
        DisplayAction::Brightness { percent: Some(percent) } => {
            display::set_brightness(runner, percent).context("Could not set brightness")?;
            done(format!("Brightness set to {}%", percent));
        }
        DisplayAction::BlueLight { kelvin } => {
            display::set_blue_light(runner, kelvin).context("Could not set the blue-light filter")?;
            controller
                .set_gamma(kelvin)
                .context("Could not save the colour temperature")?;
            done(format!("Colour temperature {}K", kelvin));
        }
        DisplayAction::Monitors => {
            let session = Session::current();
            for monitor in display::list_monitors(runner, &session).context("Could not list outputs")? {
                let marker = if monitor.focused { "*".green().bold() } else { " ".normal() };
                println!(
                    "{} {:<12} transform {} {}",
                    marker,
                    monitor.name,
                    monitor.transform,
                    monitor.description.dimmed()
                );
            }
        }
        DisplayAction::Rotate { monitor, transform } => {
            display::set_rotation(runner, &Session::current(), &monitor, transform)
                .with_context(|| format!("Could not rotate {}", monitor))?;
            done(format!("{} transform {}", monitor, transform));
        }
    }
    Ok(())
}

fn power_command(runner: &dyn CommandRunner, config_dir: &Path, action: PowerAction) -> anyhow::Result<()> {
    match action {
        PowerAction::Profile { name: None } => {
            match power::active_profile(runner) {
                Ok(active) => println!("{} {}", "Active:".bold(), active),
                Err(e) => warn!("Could not read the active power profile: {}", e),
            }
            for profile in power::list_profiles(runner).context("Could not list power profiles")? {
                let marker = if profile.active { "*".green().bold() } else { " ".normal() };
                println!("{} {}", marker, profile.name);
            }
        }
        PowerAction::Profile { name: Some(name) } => {
            power::set_profile(runner, config_dir, &name)
                .with_context(|| format!("Could not switch to {}", name))?;
            done(format!("Power profile: {}", name));
        }
        PowerAction::Session { action } => {
            power::session_action(runner, action).with_context(|| format!("Could not {}", action))?;
        }
    }
    Ok(())
}

fn autostart_command(
    runner: &dyn CommandRunner,
    config_dir: &Path,
    action: AutostartAction,
) -> anyhow::Result<()> {
    let paths = AutostartPaths::standard(backup_dir(config_dir));
    let session = Session::current();

    let (name, enabled) = match action {
        AutostartAction::List { system, hidden } => {
            let options = ListOptions {
                include_system: system,
                include_hidden: hidden,
            };
            for entry in autostart::list_entries(&paths, &session, options) {
                let state = if entry.enabled { "on ".green() } else { "off".red() };
                println!("{} {:<30} {}", state, entry.name, entry.source.to_string().dimmed());
            }
            return Ok(());
        }
        AutostartAction::Toggle { name } => {
            let options = ListOptions {
                include_system: true,
                include_hidden: true,
            };
            let entry = autostart::list_entries(&paths, &session, options)
                .into_iter()
                .find(|entry| entry.name == name)
                .with_context(|| format!("No autostart entry named '{}'", name))?;
            let updated = autostart::toggle(runner, &paths, &entry)
                .with_context(|| format!("Could not toggle {}", name))?;
            done(format!("{} {}", name, if updated.enabled { "enabled" } else { "disabled" }));
            return Ok(());
        }
        AutostartAction::Backups { config } => {
            let Some((_, config)) = compositor_config(&paths, &session, config) else {
                bail!("No compositor config found for this session");
            };
            let backups = autostart::backups(&paths, &config)
                .with_context(|| format!("Could not list backups of {}", config.display()))?;
            if backups.is_empty() {
                println!("{}", "No backups yet".yellow());
            }
            for backup in backups {
                println!("{}", backup.display());
            }
            return Ok(());
        }
        AutostartAction::Restore { config } => {
            let Some((source, config)) = compositor_config(&paths, &session, config) else {
                bail!("No compositor config found for this session");
            };
            let backup = autostart::restore_latest(runner, &paths, source, &config)
                .with_context(|| format!("Could not restore {}", config.display()))?;
            done(format!("{} restored from {}", config.display(), backup.display()));
            return Ok(());
        }
        AutostartAction::Enable { name } => (name, true),
        AutostartAction::Disable { name } => (name, false),
    };

    autostart::set_enabled(runner, &paths, &session, &name, enabled)
        .with_context(|| format!("Could not update {}", name))?;
    done(format!("{} {}", name, if enabled { "enabled" } else { "disabled" }));
    Ok(())
}

/// An explicit `--config`, or the running session's first compositor config
fn compositor_config(
    paths: &AutostartPaths,
    session: &Session,
    config: Option<PathBuf>,
) -> Option<(AutostartSource, PathBuf)> {
    match config {
        Some(config) => {
            let source = if paths.sway.contains(&config) {
                AutostartSource::Sway
            } else {
                AutostartSource::Hyprland
            };
            Some((source, config))
        }
        None => autostart::compositor_configs(paths, session).into_iter().next(),
    }
}

fn usb_command(runner: &dyn CommandRunner, config_dir: &Path, action: UsbAction) -> anyhow::Result<()> {
    match action {
        UsbAction::Allow { id, permanent: true } => {
            let mut store = DeviceStore::permanent(config_dir);
            usbguard::allow_permanently(runner, &id, &mut store)
                .with_context(|| format!("Could not allow device {}", id))?;
            done(format!("Device {} allowed permanently", id));
        }
        UsbAction::Allow { id, permanent: false } => {
            usbguard::allow(runner, &id).with_context(|| format!("Could not allow device {}", id))?;
            done(format!("Device {} allowed", id));
        }
        UsbAction::Block { id } => {
            usbguard::block(runner, &id).with_context(|| format!("Could not block device {}", id))?;
            done(format!("Device {} blocked", id));
        }
        UsbAction::Hide { id } => {
            let mut store = DeviceStore::hidden(config_dir);
            usbguard::hide(runner, &mut store, &id).with_context(|| format!("Could not hide device {}", id))?;
            done(format!("Device {} hidden", id));
        }
        UsbAction::Unhide { device } => {
            let mut store = DeviceStore::hidden(config_dir);
            if usbguard::unhide(runner, &mut store, &device)
                .with_context(|| format!("Could not unhide device {}", device))?
            {
                done(format!("Device {} shown", device));
            } else {
                println!("Device {} was not hidden", device);
            }
        }
        UsbAction::Rules => {
            for rule in usbguard::list_rules(runner).context("Could not list rules")? {
                println!("{}", rule);
            }
        }
        UsbAction::Service { state } => {
            usbguard::set_service(runner, state.enabled()).context("Could not change the usbguard service")?;
            done(format!("usbguard {}", if state.enabled() { "started" } else { "stopped" }));
        }
        UsbAction::Monitor {
            block_unknown,
            no_notify,
        } => {
            let stop = Arc::new(AtomicBool::new(false));
            for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
                signal_hook::flag::register(signal, Arc::clone(&stop))
                    .context("Could not install signal handler")?;
            }

            let options = MonitorOptions {
                block_unknown,
                notify: !no_notify,
            };
            let mut monitor = UsbMonitor::new(runner, config_dir, options);
            let mut watchers = Vec::new();
            for path in [monitor.permanent().path(), monitor.hidden().path()] {
                match FileWatcher::new(path) {
                    Ok(watcher) => watchers.push(watcher),
                    Err(e) => warn!(path = %path.display(), "Not watching device list: {}", e),
                }
            }

            println!("{} Watching USB devices (Ctrl+C to stop)", "→".cyan());
            monitor.run(&stop, &watchers);
        }
    }
    Ok(())
}

fn tabs_command(controller: &mut Controller, action: TabsAction) -> anyhow::Result<()> {
    let moved = match action {
        TabsAction::Up { tab } => controller.move_up(tab)?,
        TabsAction::Down { tab } => controller.move_down(tab)?,
        TabsAction::Show { tab } => {
            controller.set_visible(tab, true)?;
            true
        }
        TabsAction::Hide { tab } => {
            controller.set_visible(tab, false)?;
            true
        }
    };
    if !moved {
        println!("{}", "Already at the edge".yellow());
    }

    for (index, tab) in controller.tab_order().iter().enumerate() {
        let state = if controller.is_visible(*tab) { "shown".green() } else { "hidden".red() };
        println!("{}. {:<12} {}", index + 1, tab.name(), state);
    }
    Ok(())
}

fn deps() {
    let missing = dependencies::check_all();
    if missing.is_empty() {
        done("All required tools are installed");
        return;
    }
    for dep in missing {
        println!("{} {}\n", "✗".red().bold(), dep.message());
    }
}
