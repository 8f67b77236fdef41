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

//! NetworkManager (`nmcli`) output parser
//!
//! Terse mode (`-t`) separates fields with `:` and escapes literal colons
//! and backslashes inside values (`AA\:BB\:CC...`). The legacy
//! whitespace-aligned table is still understood for callers that already
//! hold a row of it.

use std::collections::{HashMap, HashSet};

use crate::core::types::{Security, WifiNetwork};

/// Fields requested from `nmcli dev wifi list`, in order
pub const WIFI_FIELDS: &str = "IN-USE,BSSID,SSID,MODE,CHAN,RATE,SIGNAL,BARS,SECURITY";

/// Splits one terse line, honouring `\:` and `\\` escapes
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != "--").then(|| value.to_string())
}

fn network_from_fields(fields: &[String]) -> Option<WifiNetwork> {
    let [in_use, bssid, ssid, _mode, chan, rate, signal, bars, security, ..] = fields else {
        return None;
    };

    let ssid = ssid.trim();
    if ssid.is_empty() {
        return None;
    }

    Some(WifiNetwork {
        in_use: in_use.contains('*'),
        ssid: ssid.to_string(),
        bssid: non_empty(bssid),
        signal: signal.trim().parse::<u8>().unwrap_or(0).min(100),
        security: Security::from_text(security),
        security_text: non_empty(security).unwrap_or_else(|| "none".to_string()),
        bars: non_empty(bars),
        channel: chan.trim().parse().ok(),
        rate: non_empty(rate),
    })
}

/// `nmcli -t -f IN-USE,BSSID,SSID,MODE,CHAN,RATE,SIGNAL,BARS,SECURITY dev wifi list`
///
/// Hidden networks (empty SSID) are skipped. An SSID seen on several
/// access points is reported once: the in-use entry wins, otherwise the
/// strongest signal. Results are sorted in-use first, then by signal.
pub fn parse_wifi_list(output: &str) -> Vec<WifiNetwork> {
    let mut by_ssid: HashMap<String, WifiNetwork> = HashMap::new();

    for network in output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| network_from_fields(&split_terse(line)))
    {
        match by_ssid.get(&network.ssid) {
            Some(existing)
                if existing.in_use
                    || (!network.in_use && existing.signal >= network.signal) => {}
            _ => {
                by_ssid.insert(network.ssid.clone(), network);
            }
        }
    }

    let mut networks: Vec<WifiNetwork> = by_ssid.into_values().collect();
    networks.sort_by(|a, b| {
        b.in_use
            .cmp(&a.in_use)
            .then(b.signal.cmp(&a.signal))
            .then_with(|| a.ssid.cmp(&b.ssid))
    });
    networks
}

/// One row of the column-aligned `nmcli -f ... dev wifi list` table
///
/// Columns are whitespace-split, so SSIDs containing spaces are truncated
/// to their first word; the terse parser has no such limitation.
pub fn parse_legacy_row(row: &str) -> Option<WifiNetwork> {
    let parts: Vec<&str> = row.split_whitespace().collect();
    let first = parts.first()?;

    let ssid = parts.get(1).copied().unwrap_or("Unknown");

    Some(WifiNetwork {
        in_use: first.contains('*'),
        ssid: ssid.to_string(),
        bssid: None,
        signal: legacy_signal(&parts),
        security: Security::from_text(row),
        security_text: Security::from_text(row).to_string(),
        bars: None,
        channel: None,
        rate: None,
    })
}

/// Column-aligned `dev wifi list` output, header row included
///
/// Only used when nmcli printed its table instead of terse output.
pub fn parse_legacy_table(output: &str) -> Vec<WifiNetwork> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !is_table_header(line))
        .filter_map(parse_legacy_row)
        .filter(|network| network.ssid != "--")
        .collect()
}

/// Whether `line` is the `IN-USE  BSSID  SSID ...` header of the table form
pub fn is_table_header(line: &str) -> bool {
    line.trim_start().starts_with("IN-USE")
}

/// Signal is column 7 when numeric, else the first 0-100 number outside the
/// channel column
fn legacy_signal(parts: &[&str]) -> u8 {
    let is_number = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());

    if let Some(signal) = parts.get(6).filter(|p| is_number(p)) {
        return signal.parse::<u32>().map(|s| s.min(100) as u8).unwrap_or(0);
    }

    parts
        .iter()
        .enumerate()
        .filter(|(idx, p)| *idx != 4 && is_number(p))
        .filter_map(|(_, p)| p.parse::<u8>().ok())
        .find(|value| *value <= 100)
        .unwrap_or(0)
}

/// `nmcli -t [--show-secrets] connection show <name>` as a key/value map
pub fn parse_connection_show(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// A row of `nmcli -t -f DEVICE,TYPE,STATE device`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRow {
    pub device: String,
    pub kind: String,
    pub state: String,
}

pub fn parse_device_status(output: &str) -> Vec<DeviceRow> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields = split_terse(line);
            let [device, kind, rest @ ..] = fields.as_slice() else {
                return None;
            };
            Some(DeviceRow {
                device: device.clone(),
                kind: kind.clone(),
                state: rest.first().cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// A row of `nmcli -t -f NAME,TYPE,DEVICE connection show --active`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveConnection {
    pub name: String,
    pub kind: String,
    pub device: Option<String>,
}

impl ActiveConnection {
    pub fn is_wireless(&self) -> bool {
        self.kind.contains("wireless") || self.kind.contains("wifi")
    }
}

pub fn parse_active_connections(output: &str) -> Vec<ActiveConnection> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields = split_terse(line);
            let [name, kind, rest @ ..] = fields.as_slice() else {
                return None;
            };
            Some(ActiveConnection {
                name: name.clone(),
                kind: kind.clone(),
                device: rest.first().and_then(|d| non_empty(d)),
            })
        })
        .collect()
}

/// Saved connection names from `nmcli -t -f NAME connection show`
pub fn parse_connection_names(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| split_terse(line).into_iter().next())
        .filter(|name| !name.is_empty())
        .collect()
}
