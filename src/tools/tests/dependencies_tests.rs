use crate::tools::dependencies::*;

#[test]
fn test_nothing_missing_when_all_installed() {
    assert!(missing_with(|_| true).is_empty());
}

#[test]
fn test_reports_missing_in_table_order() {
    let missing = missing_with(|command| !matches!(command, "gammastep" | "nmcli"));
    let commands: Vec<&str> = missing.iter().map(|dep| dep.command).collect();

    assert_eq!(commands, vec!["nmcli", "gammastep"]);
}

#[test]
fn test_message_includes_install_hint() {
    let bluez = DEPENDENCIES
        .iter()
        .find(|dep| dep.command == "bluetoothctl")
        .unwrap();
    let message = bluez.message();

    assert!(message.starts_with("Bluetooth Control is required but not installed!"));
    assert!(message.contains("sudo pacman -S bluez bluez-utils"));
}

#[test]
fn test_every_dependency_has_a_hint() {
    for dep in DEPENDENCIES.iter() {
        assert!(!dep.install.is_empty(), "{} has no install hint", dep.command);
    }
}
