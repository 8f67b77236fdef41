use crate::core::types::{BatteryInfo, Security, Tab, UsbDevice, UsbStatus, WifiNetwork};

#[test]
fn test_security_precedence() {
    // Mixed-mode networks advertise both; WPA2 wins
    assert_eq!(Security::from_text("WPA2 WPA3"), Security::Wpa2);
    assert_eq!(Security::from_text("WPA3"), Security::Wpa3);
    assert_eq!(Security::from_text("WPA1"), Security::Wpa);
    assert_eq!(Security::from_text("WEP"), Security::Wep);
    assert_eq!(Security::from_text("--"), Security::Open);
}

#[test]
fn test_security_display() {
    assert_eq!(format!("{}", Security::Wpa2), "WPA2");
    assert_eq!(format!("{}", Security::Open), "Open");
    assert!(!Security::Open.is_secured());
    assert!(Security::Wep.is_secured());
}

#[test]
fn test_signal_icon_thresholds() {
    let mut network = WifiNetwork {
        in_use: false,
        ssid: "Home".to_string(),
        bssid: None,
        signal: 80,
        security: Security::Wpa2,
        security_text: "WPA2".to_string(),
        bars: None,
        channel: None,
        rate: None,
    };
    assert_eq!(network.signal_icon(), "network-wireless-signal-excellent-symbolic");

    network.signal = 60;
    assert_eq!(network.signal_icon(), "network-wireless-signal-good-symbolic");

    network.signal = 1;
    assert_eq!(network.signal_icon(), "network-wireless-signal-weak-symbolic");

    network.signal = 0;
    assert_eq!(network.signal_icon(), "network-wireless-signal-none-symbolic");
}

#[test]
fn test_tab_names_round_trip() {
    for tab in Tab::ALL {
        let parsed: Tab = tab.name().parse().unwrap();
        assert_eq!(parsed, tab, "'{}' should parse back to itself", tab.name());
    }
}

#[test]
fn test_tab_aliases_case_insensitive() {
    assert_eq!("WIFI".parse::<Tab>().unwrap(), Tab::Wifi);
    assert_eq!("usb".parse::<Tab>().unwrap(), Tab::UsbGuard);
    assert_eq!("Audio".parse::<Tab>().unwrap(), Tab::Volume);
    assert!("Keyboard".parse::<Tab>().is_err());
}

#[test]
fn test_tab_serde_uses_persisted_names() {
    let json = serde_json::to_string(&Tab::Wifi).unwrap();
    assert_eq!(json, "\"Wi-Fi\"");

    let tab: Tab = serde_json::from_str("\"USBGuard\"").unwrap();
    assert_eq!(tab, Tab::UsbGuard);
}

#[test]
fn test_settings_tab_not_configurable() {
    assert!(!Tab::Settings.is_configurable());
    assert!(Tab::Volume.is_configurable());
}

#[test]
fn test_usb_display_name_fallback() {
    let mut device = UsbDevice {
        id: "3".to_string(),
        status: UsbStatus::Block,
        vendor_product: Some("1234:5678".to_string()),
        name: Some("   ".to_string()),
        serial: None,
        hash: None,
        parent_hash: None,
        via_port: None,
        with_interface: None,
        connect_type: None,
        rule: String::new(),
    };
    assert_eq!(device.display_name(), "Device name cannot be retrieved");

    device.name = Some("Keyboard".to_string());
    assert_eq!(device.display_name(), "Keyboard");
}

#[test]
fn test_battery_detail_lookup() {
    let info = BatteryInfo {
        path: "/org/freedesktop/UPower/devices/battery_BAT0".to_string(),
        kind: "battery".to_string(),
        details: vec![("Charge".to_string(), "85%".to_string())],
        percentage: Some(85.0),
        state: Some("discharging".to_string()),
    };

    assert_eq!(info.detail("Charge"), Some("85%"));
    assert_eq!(info.detail("Model"), None);
    assert!(!info.is_peripheral());
}
