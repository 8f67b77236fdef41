use std::path::PathBuf;

use tempfile::TempDir;

use crate::app::pages::{render, PageContext, LOCK};
use crate::app::Controller;
use crate::config::{DeviceStore, SettingsStore};
use crate::core::Tab;
use crate::system::testing::{FakeRunner, Response};
use crate::tools::{autostart::AutostartPaths, display::Session, BluetoothManager};

// Helper: context rooted in a temp dir
fn context<'a>(fake: &'a FakeRunner, temp: &'a TempDir, session: Session) -> PageContext<'a> {
    PageContext {
        runner: fake,
        config_dir: temp.path(),
        session,
        autostart: AutostartPaths::under(
            &temp.path().join("config"),
            PathBuf::from("/nonexistent/xdg/autostart"),
            temp.path().join("backups"),
        ),
        bluetooth: BluetoothManager::new(fake, temp.path().join("state")),
    }
}

#[test]
fn test_volume_page_lists_devices_and_apps() {
    let fake = FakeRunner::new();
    fake.on("pactl get-sink-volume @DEFAULT_SINK@", "Volume: front-left: 42598 /  65% / -11.23 dB");
    fake.on("pactl get-default-sink", "alsa_output.analog-stereo");
    fake.on(
        "pactl list sinks",
        "Sink #0\n\tState: RUNNING\n\tName: alsa_output.analog-stereo\n\tDescription: Built-in Audio\n\tMute: no\n\tVolume: front-left: 42598 /  65% / -11.23 dB\n",
    );
    fake.on(
        "pactl list sink-inputs",
        "Sink Input #12\n\tSink: 0\n\tMute: no\n\tVolume: front-left: 65536 / 100% / 0.00 dB\n\tProperties:\n\t\tapplication.name = \"Firefox\"\n",
    );
    let temp = TempDir::new().unwrap();
    let controller = Controller::new(SettingsStore::new(temp.path()));

    let page = render(Tab::Volume, &context(&fake, &temp, Session::Hyprland), &controller);

    assert!(page.contains("65%"));
    assert!(page.contains("Built-in Audio"));
    assert!(page.contains("Firefox"));
}

#[test]
fn test_failing_tool_renders_placeholder() {
    let fake = FakeRunner::new();
    fake.respond("nmcli radio wifi", Response::Missing);
    let temp = TempDir::new().unwrap();
    let controller = Controller::new(SettingsStore::new(temp.path()));

    let page = render(Tab::Wifi, &context(&fake, &temp, Session::Sway), &controller);

    assert!(page.contains("Radio"));
    assert!(page.contains("unavailable"));
    assert!(!fake.calls().iter().any(|call| call.contains("device wifi list")));
}

#[test]
fn test_usbguard_page_stops_when_service_down() {
    let fake = FakeRunner::new();
    fake.fail("systemctl is-active usbguard", 3, "inactive");
    let temp = TempDir::new().unwrap();
    let controller = Controller::new(SettingsStore::new(temp.path()));

    let page = render(Tab::UsbGuard, &context(&fake, &temp, Session::Hyprland), &controller);

    assert!(page.contains("not running"));
    assert!(!fake.was_called("usbguard list-devices"));
}

#[test]
fn test_display_page_skips_monitors_outside_compositor() {
    let fake = FakeRunner::new();
    fake.on("brightnessctl g", "50");
    fake.on("brightnessctl m", "100");
    let temp = TempDir::new().unwrap();
    let controller = Controller::new(SettingsStore::new(temp.path()));

    let page = render(
        Tab::Display,
        &context(&fake, &temp, Session::Other("GNOME".into())),
        &controller,
    );

    assert!(page.contains("50%"));
    assert!(page.contains("6500K"));
    assert!(!fake.calls().iter().any(|call| call.starts_with("hyprctl")));
}

#[test]
fn test_settings_page_shows_hidden_tabs() {
    let fake = FakeRunner::new();
    let temp = TempDir::new().unwrap();
    let mut controller = Controller::new(SettingsStore::new(temp.path()));
    controller.set_visible(Tab::Battery, false).unwrap();

    let page = render(Tab::Settings, &context(&fake, &temp, Session::Hyprland), &controller);

    assert!(page.contains("4. Battery"));
    assert!(page.contains("hidden"));
    assert!(page.contains("9. Settings"));
    assert!(fake.calls().is_empty());
}

#[test]
fn test_wifi_page_marks_secured_networks() {
    let fake = FakeRunner::new();
    fake.on("nmcli radio wifi", "enabled\n");
    fake.on("nmcli -t -f DEVICE,TYPE,STATE device", "wlan0:wifi:connected\n");
    fake.on(
        "nmcli -t -f IN-USE,BSSID,SSID,MODE,CHAN,RATE,SIGNAL,BARS,SECURITY device wifi list",
        "*:AA\\:BB\\:CC\\:DD\\:EE\\:01:Home:Infra:36:540 Mbit/s:82:▂▄▆█:WPA2\n\
         :AA\\:BB\\:CC\\:DD\\:EE\\:02:Cafe:Infra:6:130 Mbit/s:45:▂▄__:\n",
    );
    let temp = TempDir::new().unwrap();
    let controller = Controller::new(SettingsStore::new(temp.path()));

    let page = render(Tab::Wifi, &context(&fake, &temp, Session::Hyprland), &controller);

    let home = page.lines().find(|line| line.contains("Home")).unwrap();
    let cafe = page.lines().find(|line| line.contains("Cafe")).unwrap();
    assert!(home.contains(LOCK));
    assert!(!cafe.contains(LOCK));
}

#[test]
fn test_usbguard_page_matches_stores_by_device_hash() {
    let fake = FakeRunner::new();
    fake.on("systemctl is-active usbguard", "active\n");
    // Runtime ids differ from the ones the stores were written with
    fake.on(
        "usbguard list-devices",
        "11: allow id 1d6b:0002 serial \"0000:00:14.0\" name \"xHCI Host Controller\" hash \"jEP/6WzviqdJ=\"\n\
         12: allow id 0951:1666 serial \"E0D55EA5\" name \"DataTraveler 3.0\" hash \"kRfXsBPZ0ABG=\"\n",
    );
    let temp = TempDir::new().unwrap();
    DeviceStore::hidden(temp.path()).add("kRfXsBPZ0ABG=").unwrap();
    DeviceStore::permanent(temp.path()).add("jEP/6WzviqdJ=").unwrap();
    let controller = Controller::new(SettingsStore::new(temp.path()));

    let page = render(Tab::UsbGuard, &context(&fake, &temp, Session::Hyprland), &controller);

    assert!(!page.contains("DataTraveler"));
    let host = page.lines().find(|line| line.contains("xHCI")).unwrap();
    assert!(host.contains("(permanent)"));
}
