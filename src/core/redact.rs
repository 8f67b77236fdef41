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

//! Log redaction for `-r/--redact`
//!
//! When enabled, identifying values (SSIDs, MAC addresses, device ids,
//! serials) are masked before they reach a log line. Logs are often pasted
//! into bug reports.

use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicBool, Ordering},
        LazyLock,
    },
};

use regex::Regex;

static ENABLED: AtomicBool = AtomicBool::new(false);

const PLACEHOLDER: &str = "<redacted>";

static SENSITIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}\b",
        r"|\b\d{1,3}(?:\.\d{1,3}){3}\b",
        r"|\b[0-9a-fA-F]{4}:[0-9a-fA-F]{4}\b",
    ))
    .expect("Redaction regex should be valid regex")
});

/// Turns redaction on or off for the whole process
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Masks `value` if redaction is enabled
pub fn mask(value: &str) -> Cow<'_, str> {
    if is_enabled() {
        Cow::Owned(mask_always(value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Replaces MACs, IPv4 addresses and `vid:pid` ids in `text` if
/// redaction is enabled
pub fn scrub(text: &str) -> Cow<'_, str> {
    if is_enabled() {
        scrub_always(text)
    } else {
        Cow::Borrowed(text)
    }
}

/// Keeps the first and last character, masks the rest
pub fn mask_always(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.as_slice() {
        [] => String::new(),
        [_] | [_, _] => "***".to_string(),
        [first, .., last] => format!("{first}***{last}"),
    }
}

pub fn scrub_always(text: &str) -> Cow<'_, str> {
    SENSITIVE_REGEX.replace_all(text, PLACEHOLDER)
}
