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

//! src/core/parser/mod.rs
//!
//! Text parsers for external tool output
//!
//! Every parser is a pure `&str -> records` function. Nothing here spawns
//! processes or touches the filesystem, so each one is tested directly
//! against captured tool output.
//!
//! Parsers are lenient by default: a line that does not match is skipped,
//! because tools add fields between releases. The strict entry points
//! (`usbguard::parse_device_line`, `misc::parse_int`) return a
//! [`ParseError`] with line context instead.

pub mod autostart;
pub mod bluetoothctl;
pub mod misc;
pub mod nmcli;
pub mod pactl;
pub mod upower;
pub mod usbguard;

use thiserror::Error;

/// Parse errors with line number context
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Parse error on line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("Expected a number, found '{0}'")]
    InvalidNumber(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

/// Splits `key: value` and trims both halves
pub(crate) fn split_field(line: &str) -> Option<(&str, &str)> {
    line.split_once(':')
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// `yes` / `no` as printed by bluetoothctl and pactl
pub(crate) fn yes_no(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}
