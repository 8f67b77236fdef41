// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::core::validator::{
    validate_argument, validate_brightness, validate_device_id, validate_identifier,
    validate_mac, validate_ssid, validate_temperature, validate_transform, validate_volume,
    ValidationError, MAX_ARGUMENT_LEN,
};

#[test]
fn test_valid_macs() {
    assert!(validate_mac("AA:BB:CC:DD:EE:FF").is_ok());
    assert!(validate_mac("00:1a:7d:da:71:13").is_ok());
}

#[test]
fn test_invalid_macs() {
    assert_eq!(
        validate_mac("AA:BB:CC:DD:EE"),
        Err(ValidationError::InvalidMac("AA:BB:CC:DD:EE".to_string()))
    );
    assert!(validate_mac("AA-BB-CC-DD-EE-FF").is_err());
    assert!(validate_mac("AA:BB:CC:DD:EE:FF\nremove").is_err());
}

#[test]
fn test_device_ids_are_numeric() {
    assert!(validate_device_id("12").is_ok());
    assert!(validate_device_id("").is_err());
    assert!(validate_device_id("1; reboot").is_err());
    assert!(validate_device_id("-1").is_err());
}

#[test]
fn test_identifier_whitelist() {
    assert!(validate_identifier("alsa_output.pci-0000_00_1f.3.analog-stereo").is_ok());
    assert!(validate_identifier("bluez_output.AA_BB_CC_DD_EE_FF.1").is_ok());
    assert!(validate_identifier("HDMI-A-1").is_ok());
    assert!(validate_identifier("power-saver").is_ok());
}

#[test]
fn test_identifier_rejects_metacharacters() {
    assert!(matches!(
        validate_identifier("sink; rm -rf /"),
        Err(ValidationError::InvalidIdentifier(_))
    ));
    assert!(validate_identifier("$(whoami)").is_err());
    assert!(validate_identifier("a b").is_err());
    assert_eq!(validate_identifier(""), Err(ValidationError::Empty("identifier")));
}

#[test]
fn test_ssid_limits() {
    assert!(validate_ssid("Café Wi-Fi").is_ok());
    assert!(validate_ssid(&"x".repeat(32)).is_ok());
    assert!(matches!(
        validate_ssid(&"x".repeat(33)),
        Err(ValidationError::OutOfRange { value: 33, .. })
    ));
    assert_eq!(validate_ssid(""), Err(ValidationError::Empty("SSID")));
}

#[test]
fn test_numeric_ranges() {
    assert!(validate_volume(150).is_ok());
    assert!(validate_volume(151).is_err());
    assert!(validate_brightness(100).is_ok());
    assert!(validate_brightness(101).is_err());
    assert!(validate_temperature(1000).is_ok());
    assert!(validate_temperature(25000).is_ok());
    assert!(validate_temperature(999).is_err());
    assert!(validate_transform(7).is_ok());
    assert!(validate_transform(8).is_err());
}

#[test]
fn test_out_of_range_message() {
    let err = validate_volume(200).unwrap_err();
    assert_eq!(err.to_string(), "Volume 200 out of range (0-150)");
}

#[test]
fn test_argument_rejects_nul_and_tab() {
    assert!(validate_argument("abc\0def").is_err());
    assert!(validate_argument("abc\tdef").is_err());
}

#[test]
fn test_rejects_newline_injection() {
    // bluetoothctl reads commands line by line
    let malicious = "AA:BB:CC:DD:EE:FF\nremove 11:22:33:44:55:66";
    assert!(matches!(
        validate_argument(malicious),
        Err(ValidationError::ControlCharacters(_))
    ));
}

#[test]
fn test_allows_printable_free_text() {
    assert!(validate_argument("My Café; WiFi $5").is_ok());
    assert!(validate_argument("--timeout").is_ok());
}

#[test]
fn test_argument_length_limit() {
    let long_arg = "a".repeat(MAX_ARGUMENT_LEN + 1);
    assert_eq!(
        validate_argument(&long_arg),
        Err(ValidationError::ArgumentTooLong(MAX_ARGUMENT_LEN + 1))
    );
}
