// Copyright 2025 bakri (tidynest@proton.me)
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

//! Argument validation for external tool invocations
//!
//! Commands are never run through a shell, so the concern here is not
//! classic shell injection but:
//! - Control characters that line-oriented tools (`bluetoothctl`,
//!   `usbguard`) would interpret as a second command
//! - Identifiers (sink names, monitor names, profiles) that must match a
//!   strict whitelist before being handed to a tool
//! - Numeric ranges the tools would otherwise silently clamp or reject
//!
//! # Security Philosophy
//! Identifiers use WHITELIST validation (allow known-good). Free text such
//! as SSIDs and passwords only has control characters rejected, since any
//! printable byte is legal there.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest argument accepted by the runner
pub const MAX_ARGUMENT_LEN: usize = 4096;

/// Longest SSID allowed by 802.11
pub const MAX_SSID_BYTES: usize = 32;

/// Volume percentage ceiling (pactl allows boosting past 100%)
pub const MAX_VOLUME: u32 = 150;

/// Validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Argument contains a newline, NUL or other control character
    #[error("Argument contains control characters: '{0}'")]
    ControlCharacters(String),

    /// Argument exceeds maximum length
    #[error("Argument too long: {0} characters (max 4096)")]
    ArgumentTooLong(usize),

    /// Not a colon-separated 6-octet MAC address
    #[error("Invalid MAC address '{0}'")]
    InvalidMac(String),

    /// USBGuard device ids are plain decimal numbers
    #[error("Invalid USBGuard device id '{0}'")]
    InvalidDeviceId(String),

    /// Identifier contains characters outside the whitelist
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Numeric value outside the accepted range
    #[error("{what} {value} out of range ({min}-{max})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Required value was empty
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

static MAC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").expect("MAC regex should be valid regex")
});

/// Validates any argument passed to an external tool
///
/// Rejects control characters (including newlines) and oversized input.
pub fn validate_argument(arg: &str) -> Result<(), ValidationError> {
    if arg.len() > MAX_ARGUMENT_LEN {
        return Err(ValidationError::ArgumentTooLong(arg.len()));
    }

    if arg.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters(arg.escape_debug().to_string()));
    }

    Ok(())
}

/// Validates a Bluetooth MAC address (`AA:BB:CC:DD:EE:FF`)
pub fn validate_mac(mac: &str) -> Result<(), ValidationError> {
    if MAC_REGEX.is_match(mac) {
        Ok(())
    } else {
        Err(ValidationError::InvalidMac(mac.to_string()))
    }
}

/// Validates a USBGuard device id (the leading number of `list-devices`)
pub fn validate_device_id(id: &str) -> Result<(), ValidationError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDeviceId(id.to_string()))
    }
}

/// Validates a tool-level identifier such as a sink, monitor or profile name
///
/// Accepts alphanumerics plus `. _ : @ + -`, which covers PulseAudio names
/// (`alsa_output.pci-0000_00_1f.3.analog-stereo`), DRM connector names
/// (`HDMI-A-1`) and power profiles.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty("identifier"));
    }

    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '@' | '+' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates an SSID: non-empty, at most 32 bytes, no control characters
pub fn validate_ssid(ssid: &str) -> Result<(), ValidationError> {
    if ssid.is_empty() {
        return Err(ValidationError::Empty("SSID"));
    }
    if ssid.len() > MAX_SSID_BYTES {
        return Err(ValidationError::OutOfRange {
            what: "SSID length",
            value: ssid.len() as i64,
            min: 1,
            max: MAX_SSID_BYTES as i64,
        });
    }
    validate_argument(ssid)
}

fn check_range(what: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { what, value, min, max })
    }
}

/// Volume percentage, 0-150
pub fn validate_volume(percent: u32) -> Result<(), ValidationError> {
    check_range("Volume", i64::from(percent), 0, i64::from(MAX_VOLUME))
}

/// Brightness percentage, 0-100
pub fn validate_brightness(percent: u32) -> Result<(), ValidationError> {
    check_range("Brightness", i64::from(percent), 0, 100)
}

/// Colour temperature in Kelvin, 1000-25000 (gammastep's accepted range)
pub fn validate_temperature(kelvin: u32) -> Result<(), ValidationError> {
    check_range("Temperature", i64::from(kelvin), 1000, 25000)
}

/// Wayland output transform, 0-7
pub fn validate_transform(transform: u8) -> Result<(), ValidationError> {
    check_range("Transform", i64::from(transform), 0, 7)
}
