//! Text rendering of each tab
//!
//! Pages are read-only snapshots. A tool that fails is logged and shown as
//! "unavailable" so one broken daemon never hides the rest of the page.

use std::{fmt::Display, path::Path};

use colored::Colorize;
use tracing::warn;

use crate::app::Controller;
use crate::config::DeviceStore;
use crate::core::Tab;
use crate::system::{CommandRunner, ToolError};
use crate::tools::{
    audio::{self, Direction},
    autostart::{self, AutostartPaths, ListOptions},
    display::{self, Session},
    power, usbguard, wifi, BluetoothManager,
};

/// Everything a page needs to query its tools
pub struct PageContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub config_dir: &'a Path,
    pub session: Session,
    pub autostart: AutostartPaths,
    pub bluetooth: BluetoothManager<'a>,
}

/// Line-oriented page builder
#[derive(Default)]
struct Page {
    lines: Vec<String>,
}

impl Page {
    fn heading(&mut self, title: &str) {
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.push(title.bold().cyan().to_string());
    }

    fn row(&mut self, label: &str, value: impl Display) {
        self.lines.push(format!("  {:<20} {}", label, value));
    }

    fn item(&mut self, active: bool, text: impl Display) {
        let marker = if active { "*".green().bold().to_string() } else { " ".to_string() };
        self.lines.push(format!("  {} {}", marker, text));
    }

    fn note(&mut self, text: &str) {
        self.lines.push(format!("  {}", text.dimmed()));
    }

    fn unavailable(&mut self, what: &str, error: &ToolError) {
        warn!("{} unavailable: {}", what, error);
        self.lines.push(format!("  {}: {}", what, "unavailable".yellow()));
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Marks networks that need a password
pub const LOCK: &str = "🔒";

fn on_off(enabled: bool) -> colored::ColoredString {
    if enabled {
        "on".green()
    } else {
        "off".red()
    }
}

/// Renders `tab` as text
pub fn render(tab: Tab, ctx: &PageContext<'_>, controller: &Controller) -> String {
    let mut page = Page::default();
    match tab {
        Tab::Volume => volume_page(&mut page, ctx),
        Tab::Wifi => wifi_page(&mut page, ctx),
        Tab::Bluetooth => bluetooth_page(&mut page, ctx),
        Tab::Battery => battery_page(&mut page, ctx),
        Tab::Display => display_page(&mut page, ctx, controller),
        Tab::Power => power_page(&mut page, ctx),
        Tab::Autostart => autostart_page(&mut page, ctx),
        Tab::UsbGuard => usbguard_page(&mut page, ctx),
        Tab::Settings => settings_page(&mut page, controller),
    }
    page.finish()
}

fn volume_page(page: &mut Page, ctx: &PageContext<'_>) {
    page.heading("Output");
    match audio::get_volume(ctx.runner, Direction::Output) {
        Ok(volume) => page.row("Volume", format!("{}%", volume)),
        Err(e) => page.unavailable("Volume", &e),
    }
    if let Ok(muted) = audio::is_muted(ctx.runner, Direction::Output) {
        page.row("Muted", if muted { "yes" } else { "no" });
    }
    match audio::list_sinks(ctx.runner) {
        Ok(sinks) => {
            for sink in sinks {
                page.item(sink.active, &sink.description);
            }
        }
        Err(e) => page.unavailable("Output devices", &e),
    }

    page.heading("Input");
    match audio::get_volume(ctx.runner, Direction::Input) {
        Ok(volume) => page.row("Microphone", format!("{}%", volume)),
        Err(e) => page.unavailable("Microphone", &e),
    }
    match audio::list_sources(ctx.runner, false) {
        Ok(sources) => {
            for source in sources {
                page.item(source.active, &source.description);
            }
        }
        Err(e) => page.unavailable("Input devices", &e),
    }

    page.heading("Applications");
    match audio::list_applications(ctx.runner) {
        Ok(apps) if apps.is_empty() => page.note("No applications playing audio"),
        Ok(apps) => {
            for app in apps {
                let muted = if app.muted { " (muted)" } else { "" };
                page.row(&format!("[{}] {}", app.id, app.name), format!("{}%{}", app.volume, muted));
            }
        }
        Err(e) => page.unavailable("Applications", &e),
    }
}

fn wifi_page(page: &mut Page, ctx: &PageContext<'_>) {
    page.heading("Wi-Fi");
    match wifi::radio_enabled(ctx.runner) {
        Ok(enabled) => page.row("Radio", on_off(enabled)),
        Err(e) => {
            page.unavailable("Radio", &e);
            return;
        }
    }

    let saved = wifi::saved_connections(ctx.runner).unwrap_or_default();
    match wifi::list_networks(ctx.runner, false) {
        Ok(networks) if networks.is_empty() => page.note("No networks found"),
        Ok(networks) => {
            for network in networks {
                let saved_marker = if saved.contains(&network.ssid) { " (saved)" } else { "" };
                let lock = if network.security.is_secured() { LOCK } else { " " };
                page.item(
                    network.in_use,
                    format!(
                        "{:<32} {:>3}% {} {}{}",
                        network.ssid, network.signal, lock, network.security, saved_marker
                    ),
                );
            }
        }
        Err(e) => page.unavailable("Networks", &e),
    }
}

fn bluetooth_page(page: &mut Page, ctx: &PageContext<'_>) {
    page.heading("Bluetooth");
    match ctx.bluetooth.powered() {
        Ok(powered) => page.row("Adapter", on_off(powered)),
        Err(e) => {
            page.unavailable("Adapter", &e);
            return;
        }
    }

    match ctx.bluetooth.devices() {
        Ok(devices) if devices.is_empty() => page.note("No known devices"),
        Ok(devices) => {
            for device in devices {
                let battery = device
                    .battery
                    .map(|pct| format!("  {}%", pct))
                    .unwrap_or_default();
                page.item(device.connected, format!("{:<28} {}{}", device.name, device.mac, battery));
            }
        }
        Err(e) => page.unavailable("Devices", &e),
    }

    if let Ok(Some(battery)) = power::peripheral_battery(ctx.runner) {
        let level = battery
            .percentage
            .map(|pct| format!("{:.0}%", pct))
            .unwrap_or_else(|| "unknown".to_string());
        page.row(power::peripheral_label(&battery), level);
    }
}

fn battery_page(page: &mut Page, ctx: &PageContext<'_>) {
    match power::batteries(ctx.runner) {
        Ok(batteries) if batteries.is_empty() => {
            page.heading("Battery");
            page.note("No batteries found");
        }
        Ok(batteries) => {
            for battery in batteries {
                let title = if battery.is_peripheral() {
                    power::peripheral_label(&battery)
                } else {
                    "Battery"
                };
                page.heading(title);
                for (label, value) in &battery.details {
                    page.row(label, value);
                }
            }
        }
        Err(e) => {
            page.heading("Battery");
            page.unavailable("Batteries", &e);
        }
    }

    profiles_section(page, ctx);
}

fn profiles_section(page: &mut Page, ctx: &PageContext<'_>) {
    page.heading("Power Profile");
    match power::list_profiles(ctx.runner) {
        Ok(profiles) => {
            for profile in profiles {
                page.item(profile.active, &profile.name);
            }
        }
        Err(e) => page.unavailable("Profiles", &e),
    }
}

fn display_page(page: &mut Page, ctx: &PageContext<'_>, controller: &Controller) {
    page.heading("Display");
    match display::get_brightness(ctx.runner) {
        Ok(brightness) => page.row("Brightness", format!("{}%", brightness)),
        Err(e) => page.unavailable("Brightness", &e),
    }
    page.row("Blue light", format!("{}K", controller.settings().gamma));
    page.row("Session", &ctx.session);

    if matches!(ctx.session, Session::Other(_)) {
        return;
    }
    page.heading("Monitors");
    match display::list_monitors(ctx.runner, &ctx.session) {
        Ok(monitors) => {
            for monitor in monitors {
                page.item(
                    monitor.focused,
                    format!("{:<12} transform {}  {}", monitor.name, monitor.transform, monitor.description),
                );
            }
        }
        Err(e) => page.unavailable("Monitors", &e),
    }
}

fn power_page(page: &mut Page, ctx: &PageContext<'_>) {
    profiles_section(page, ctx);
    if let Some(last) = power::last_profile(ctx.config_dir) {
        page.row("Last chosen", last);
    }

    page.heading("Session");
    for action in [
        power::SessionAction::Suspend,
        power::SessionAction::Reboot,
        power::SessionAction::Poweroff,
    ] {
        page.note(&format!("better-control power session {}", action));
    }
}

fn autostart_page(page: &mut Page, ctx: &PageContext<'_>) {
    page.heading("Autostart");
    let entries = autostart::list_entries(&ctx.autostart, &ctx.session, ListOptions::default());
    if entries.is_empty() {
        page.note("No autostart entries");
    }
    for entry in entries {
        page.item(entry.enabled, format!("{:<28} [{}] {}", entry.name, entry.source, entry.command));
    }
}

fn usbguard_page(page: &mut Page, ctx: &PageContext<'_>) {
    page.heading("USBGuard");
    match usbguard::service_active(ctx.runner) {
        Ok(true) => page.row("Service", on_off(true)),
        Ok(false) => {
            page.row("Service", on_off(false));
            page.note("USBGuard service is not running. Enable it to manage devices.");
            return;
        }
        Err(e) => {
            page.unavailable("Service", &e);
            return;
        }
    }

    let hidden = DeviceStore::hidden(ctx.config_dir);
    let permanent = DeviceStore::permanent(ctx.config_dir);
    match usbguard::list_devices(ctx.runner) {
        Ok(devices) => {
            for device in devices.iter().filter(|d| !hidden.contains(&d.store_key())) {
                let pinned = if permanent.contains(&device.store_key()) { " (permanent)" } else { "" };
                page.row(
                    &format!("{}: {}", device.id, device.status),
                    format!("{}{}", device.display_name(), pinned),
                );
            }
        }
        Err(e) => page.unavailable("Devices", &e),
    }
}

fn settings_page(page: &mut Page, controller: &Controller) {
    page.heading("Tabs");
    for (idx, tab) in controller.tab_order().into_iter().enumerate() {
        let shown = if controller.is_visible(tab) { "shown".green() } else { "hidden".red() };
        page.row(&format!("{}. {}", idx + 1, tab), shown);
    }
}
