use std::{fs, time::Duration};

use tempfile::TempDir;

use crate::system::testing::FakeRunner;
use crate::system::ToolError;
use crate::tools::wifi::*;

const DEVICES: &str = "wlan0:wifi:connected\nlo:loopback:unmanaged\n";

const WIFI_LIST: &str = "*:AA\\:BB\\:CC\\:DD\\:EE\\:01:Home:Infra:36:540 Mbit/s:82:▂▄▆█:WPA2\n\
 :AA\\:BB\\:CC\\:DD\\:EE\\:02:Cafe:Infra:6:130 Mbit/s:45:▂▄__:\n";

const SAVED: &str = "Home\nWork VPN\n";

#[test]
fn test_radio_status() {
    let fake = FakeRunner::new();
    fake.on("nmcli radio wifi", "enabled\n");
    assert!(radio_enabled(&fake).unwrap());

    set_radio(&fake, false).unwrap();
    assert!(fake.was_called("nmcli radio wifi off"));
}

#[test]
fn test_list_networks_with_rescan() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f DEVICE,TYPE,STATE device", DEVICES).on(
        "nmcli -t -f IN-USE,BSSID,SSID,MODE,CHAN,RATE,SIGNAL,BARS,SECURITY device wifi list",
        WIFI_LIST,
    );

    let networks = list_networks(&fake, true).unwrap();
    assert!(fake.was_called("nmcli device wifi rescan"));
    assert_eq!(networks.len(), 2);
    assert!(networks[0].in_use);
    assert_eq!(networks[0].ssid, "Home");
    assert_eq!(networks[0].bssid.as_deref(), Some("AA:BB:CC:DD:EE:01"));
    assert_eq!(networks[1].security_text, "none");
}

#[test]
fn test_list_networks_falls_back_to_table_columns() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f DEVICE,TYPE,STATE device", DEVICES).on(
        "nmcli -t -f IN-USE,BSSID,SSID,MODE,CHAN,RATE,SIGNAL,BARS,SECURITY device wifi list",
        "IN-USE  BSSID              SSID  MODE   CHAN  RATE        SIGNAL  BARS  SECURITY\n\
         AA:BB:CC:DD:EE:02  Cafe  Infra  6     130 Mbit/s  91      ▂▄▆█  WPA2\n",
    );

    let networks = list_networks(&fake, false).unwrap();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].ssid, "Cafe");
    assert_eq!(networks[0].signal, 91);
}

#[test]
fn test_list_networks_without_wifi_device() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f DEVICE,TYPE,STATE device", "eth0:ethernet:connected\n");

    assert!(list_networks(&fake, false).unwrap().is_empty());
    assert_eq!(fake.calls().len(), 1, "Should not list without a wifi device");
}

#[test]
fn test_connect_prefers_saved_profile() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f NAME connection show", SAVED);

    connect(&fake, "Home", Some("ignored"), true).unwrap();

    assert_eq!(
        fake.calls(),
        vec!["nmcli -t -f NAME connection show", "nmcli connection up Home"]
    );
}

#[test]
fn test_connect_new_network_with_password() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f NAME connection show", SAVED);

    connect(&fake, "Cafe", Some("latte123"), true).unwrap();

    assert!(fake.was_called("nmcli device wifi connect Cafe password latte123"));
    assert!(!fake.calls().iter().any(|c| c.contains("autoconnect")));
}

#[test]
fn test_connect_without_remembering_disables_autoconnect() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f NAME connection show", "");

    connect(&fake, "Cafe", None, false).unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            "nmcli -t -f NAME connection show",
            "nmcli device wifi connect Cafe",
            "nmcli connection modify Cafe connection.autoconnect no",
        ]
    );
}

#[test]
fn test_saved_profile_failure_falls_back_to_password() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f NAME connection show", SAVED)
        .fail("nmcli connection up Home", 4, "Secrets were required");

    connect(&fake, "Home", Some("newpass1"), true).unwrap();
    assert!(fake.was_called("nmcli device wifi connect Home password newpass1"));
}

#[test]
fn test_saved_profile_failure_without_password_is_error() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f NAME connection show", SAVED)
        .fail("nmcli connection up Home", 4, "Secrets were required");

    assert!(matches!(
        connect(&fake, "Home", None, true),
        Err(ToolError::Failed { code: Some(4), .. })
    ));
}

#[test]
fn test_connect_with_profile_uses_real_ssid() {
    let fake = FakeRunner::new();
    connect_with_profile(&fake, "Office", Some("s3cret99"), false).unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            "nmcli connection add type wifi con-name Office ssid Office \
             wifi-sec.key-mgmt wpa-psk wifi-sec.psk s3cret99 connection.autoconnect no",
            "nmcli connection up Office",
        ]
    );
}

#[test]
fn test_disconnect_picks_wireless_connection() {
    let fake = FakeRunner::new();
    fake.on(
        "nmcli -t -f NAME,TYPE,DEVICE connection show --active",
        "Wired:802-3-ethernet:eth0\nHome:802-11-wireless:wlan0\n",
    );

    assert_eq!(disconnect(&fake).unwrap().as_deref(), Some("Home"));
    assert!(fake.was_called("nmcli connection down Home"));
}

#[test]
fn test_disconnect_when_nothing_active() {
    let fake = FakeRunner::new();
    fake.on(
        "nmcli -t -f NAME,TYPE,DEVICE connection show --active",
        "Wired:802-3-ethernet:eth0\n",
    );

    assert_eq!(disconnect(&fake).unwrap(), None);
    assert_eq!(fake.calls().len(), 1);
}

#[test]
fn test_forget_validates_ssid() {
    let fake = FakeRunner::new();
    assert!(forget(&fake, "").is_err());
    assert!(forget(&fake, &"x".repeat(33)).is_err());

    forget(&fake, "Cafe").unwrap();
    assert_eq!(fake.calls(), vec!["nmcli connection delete Cafe"]);
}

#[test]
fn test_connection_info_with_password() {
    let fake = FakeRunner::new();
    fake.on(
        "nmcli -t --show-secrets connection show Home",
        "connection.id:Home\n802-11-wireless-security.key-mgmt:wpa-psk\n802-11-wireless-security.psk:hunter22\n",
    );

    let info = connection_info(&fake, "Home", true).unwrap();
    assert_eq!(info.password.as_deref(), Some("hunter22"));
    assert_eq!(info.get("connection.id"), Some("Home"));
}

#[test]
fn test_connection_info_without_password() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t connection show Home", "connection.id:Home\n");

    let info = connection_info(&fake, "Home", false).unwrap();
    assert_eq!(info.password, None);
}

#[test]
fn test_traffic_counters_and_speed() {
    let temp_dir = TempDir::new().unwrap();
    let stats = temp_dir.path().join("wlan0").join("statistics");
    fs::create_dir_all(&stats).unwrap();
    fs::write(stats.join("rx_bytes"), "1000\n").unwrap();
    fs::write(stats.join("tx_bytes"), "500\n").unwrap();

    let before = read_counters(temp_dir.path(), "wlan0").unwrap();
    assert_eq!(before.rx_bytes, 1000);

    fs::write(stats.join("rx_bytes"), format!("{}\n", 1000 + 1024 * 1024)).unwrap();
    fs::write(stats.join("tx_bytes"), format!("{}\n", 500 + 512 * 1024)).unwrap();
    let after = read_counters(temp_dir.path(), "wlan0").unwrap();

    let (down, up) = speed_mbps(before, after, Duration::from_secs(2));
    assert!((down - 4.0).abs() < 1e-9, "1 MiB over 2 s is 4 Mbps, got {}", down);
    assert!((up - 2.0).abs() < 1e-9);
}

#[test]
fn test_read_counters_rejects_path_tricks() {
    let temp_dir = TempDir::new().unwrap();
    assert!(read_counters(temp_dir.path(), "../etc").is_err());
}

#[test]
fn test_qr_payload() {
    assert_eq!(qr_payload("Home", "pass", "WPA2"), "WIFI:T:WPA;S:Home;P:pass;;");
    assert_eq!(qr_payload("Guest", "", "none"), "WIFI:T:nopass;S:Guest;P:;;");
    assert_eq!(
        qr_payload("My;Net", "a:b\\c", "WPA1 WPA2"),
        "WIFI:T:WPA;S:My\\;Net;P:a\\:b\\\\c;;"
    );
}

#[test]
fn test_qr_code_renders_square_block() {
    let payload = qr_payload("HomeNetwork", "correct horse battery", "WPA2");
    let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    let rendered = qr_code(&payload).unwrap();

    let lines: Vec<&str> = rendered.lines().collect();
    let width = lines[0].chars().count();
    assert!(width >= code.width());
    assert!(lines.iter().all(|line| line.chars().count() == width));
    // Two modules per character row
    assert!(lines.len() >= code.width() / 2);
    assert!(rendered.chars().any(|c| matches!(c, '█' | '▀' | '▄')));
}

#[test]
fn test_connected_notification_uses_signal_icon() {
    let fake = FakeRunner::new();
    fake.on("nmcli -t -f DEVICE,TYPE,STATE device", DEVICES).on(
        "nmcli -t -f IN-USE,BSSID,SSID,MODE,CHAN,RATE,SIGNAL,BARS,SECURITY device wifi list",
        WIFI_LIST,
    );

    notify_connected(&fake, "Cafe");
    notify_connected(&fake, "Gone");

    let sent: Vec<String> = fake
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("notify-send"))
        .collect();
    assert!(sent[0].contains("-i network-wireless-signal-ok-symbolic"));
    assert!(sent[1].contains("-i network-wireless-symbolic"));
}
