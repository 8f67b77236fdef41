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

//! `usbguard list-devices` / `list-rules` parser
//!
//! Each line is a device number followed by a rule in the USBGuard rule
//! language:
//! ```text
//! 5: allow id 046d:c52b serial "" name "USB Receiver" hash "Ql8S..." parent-hash "jEP/..." via-port "1-2" with-interface { 03:01:01 03:01:02 } with-connect-type "hotplug"
//! ```
//! Attribute values are quoted strings (with `\"` and `\xHH` escapes),
//! brace-delimited sets, or bare tokens.

use nom::{
    branch::alt,
    bytes::complete::{escaped, is_not, tag, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, none_of, space0, space1},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, preceded, terminated},
    IResult, Parser,
};

use tracing::warn;

use super::ParseError;
use crate::core::types::{UsbDevice, UsbStatus};

/// Device line broken into its parts before typing
type RawLine<'a> = (&'a str, UsbStatus, Vec<(&'a str, String)>, &'a str);

fn status(input: &str) -> IResult<&str, UsbStatus> {
    alt((
        value(UsbStatus::Allow, tag("allow")),
        value(UsbStatus::Block, tag("block")),
        value(UsbStatus::Reject, tag("reject")),
    ))
    .parse(input)
}

/// Decodes USBGuard string escapes; `\xHH` bytes are joined and read as
/// UTF-8, so names like `Caf\xc3\xa9` come out as `Café`
fn unescape(raw: &str) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        if c != '\\' {
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => bytes.push(byte),
                    Err(_) => {
                        bytes.push(b'x');
                        bytes.extend_from_slice(hex.as_bytes());
                    }
                }
            }
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some(other) => bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes()),
            None => {}
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped(is_not("\\\""), '\\', anychar)),
            char('"'),
        ),
        |inner: Option<&str>| inner.map(unescape).unwrap_or_default(),
    )
    .parse(input)
}

fn braced(input: &str) -> IResult<&str, String> {
    map(delimited(char('{'), take_until("}"), char('}')), |inner: &str| {
        inner.split_whitespace().collect::<Vec<_>>().join(" ")
    })
    .parse(input)
}

/// Unquoted token; a stray `"` or `{` here means a malformed value
fn bare(input: &str) -> IResult<&str, String> {
    map(
        recognize((none_of("\"{} \t"), take_while(|c: char| !c.is_whitespace()))),
        str::to_string,
    )
    .parse(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, String)> {
    (
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'),
        preceded(space1, alt((quoted, braced, bare))),
    )
        .parse(input)
}

fn device_number(input: &str) -> IResult<&str, &str> {
    terminated(digit1, (char(':'), space0)).parse(input)
}

fn device_line(input: &str) -> IResult<&str, RawLine<'_>> {
    let (rule, id) = device_number(input)?;
    (status, many0(preceded(space1, attribute)), space0)
        .map(|(status, attributes, _)| (id, status, attributes, rule))
        .parse(rule)
}

/// Parses one device line, rejecting anything that is not fully consumed
pub fn parse_device_line(line: &str) -> Result<UsbDevice, ParseError> {
    let line = line.trim();
    let (remaining, (id, status, attributes, rule)) =
        device_line(line).map_err(|e| ParseError::InvalidSyntax {
            line: 0,
            message: format!("{:?}", e),
        })?;

    if !remaining.is_empty() {
        return Err(ParseError::InvalidSyntax {
            line: 0,
            message: format!("Unexpected trailing input '{}'", remaining),
        });
    }

    let mut device = UsbDevice {
        id: id.to_string(),
        status,
        vendor_product: None,
        name: None,
        serial: None,
        hash: None,
        parent_hash: None,
        via_port: None,
        with_interface: None,
        connect_type: None,
        rule: rule.to_string(),
    };

    for (key, value) in attributes {
        let slot = match key {
            "id" => &mut device.vendor_product,
            "name" => &mut device.name,
            "serial" => &mut device.serial,
            "hash" => &mut device.hash,
            "parent-hash" => &mut device.parent_hash,
            "via-port" => &mut device.via_port,
            "with-interface" => &mut device.with_interface,
            "with-connect-type" => &mut device.connect_type,
            _ => continue,
        };
        *slot = Some(value);
    }

    Ok(device)
}

/// `usbguard list-devices`; a malformed line is logged and skipped so one
/// odd device does not hide the rest
pub fn parse_devices(output: &str) -> Vec<UsbDevice> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match parse_device_line(line) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!(line = idx + 1, "Skipping unparsed usbguard device: {}", e);
                None
            }
        })
        .collect()
}

/// Device number at the start of a raw line (`"5: allow ..."` -> `"5"`)
pub fn line_device_id(line: &str) -> Option<&str> {
    let (id, _) = line.trim().split_once(':')?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
}

/// `usbguard list-rules`: one rule per non-empty line
pub fn parse_rules(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
