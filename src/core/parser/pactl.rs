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

//! `pactl list ...` output parser
//!
//! `pactl list sinks` prints one block per object:
//! ```text
//! Sink #0
//! 	State: SUSPENDED
//! 	Name: alsa_output.pci-0000_00_1f.3.analog-stereo
//! 	Mute: no
//! 	Volume: front-left: 32768 /  50% / -18.06 dB,   front-right: ...
//! 	        balance 0.00
//! 	Properties:
//! 		device.description = "Built-in Audio"
//! 	Active Port: analog-output-speaker
//! ```
//! Lines indented by exactly one tab are top-level fields. Deeper lines of
//! the form `key = "value"` are properties. Everything else (port lists,
//! continuation lines) is ignored.

use std::{collections::HashMap, sync::LazyLock};

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{digit1, space0},
    combinator::{map_res, rest},
    sequence::preceded,
    IResult, Parser,
};
use regex::Regex;

use super::{split_field, yes_no};
use crate::core::types::{AppStream, AudioDevice};

static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("Percent regex should be valid regex"));

/// Block header prefixes as printed by `pactl list`
pub const SINK_HEADER: &str = "Sink #";
pub const SOURCE_HEADER: &str = "Source #";
pub const SINK_INPUT_HEADER: &str = "Sink Input #";
pub const SOURCE_OUTPUT_HEADER: &str = "Source Output #";

/// One `Sink #N` / `Source #N` / `Sink Input #N` block
#[derive(Debug, Default, PartialEq)]
pub struct Block {
    pub id: u32,
    pub fields: Vec<(String, String)>,
    pub properties: HashMap<String, String>,
}

impl Block {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn block_header<'a>(line: &'a str, prefix: &str) -> IResult<&'a str, u32> {
    map_res(preceded(tag(prefix), digit1), |id: &str| id.parse::<u32>()).parse(line)
}

/// Parses `key = "value"`, unquoting the value
fn property_line(line: &str) -> IResult<&str, (&str, &str)> {
    (
        preceded(space0::<&str, nom::error::Error<&str>>, take_until(" = ")),
        tag(" = "),
        rest,
    )
        .map(|(key, _, value)| (key.trim(), value.trim().trim_matches('"')))
        .parse(line)
}

/// Splits `pactl list <kind>` output into blocks introduced by `prefix`
pub fn parse_blocks(output: &str, prefix: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for line in output.lines() {
        if let Ok((remaining, id)) = block_header(line.trim_end(), prefix) {
            if remaining.is_empty() {
                blocks.extend(current.take());
                current = Some(Block { id, ..Block::default() });
                continue;
            }
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        match line.strip_prefix('\t') {
            Some(body) if !body.starts_with('\t') && !body.starts_with(' ') => {
                if let Some((key, value)) = split_field(body) {
                    block.fields.push((key.to_string(), value.to_string()));
                }
            }
            _ => {
                if let Ok((_, (key, value))) = property_line(line) {
                    block.properties.insert(key.to_string(), value.to_string());
                }
            }
        }
    }

    blocks.extend(current);
    blocks
}

/// First `NN%` figure in `text`
pub fn first_percentage(text: &str) -> Option<u32> {
    PERCENT_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// `pactl get-sink-mute @DEFAULT_SINK@` prints `Mute: yes`
pub fn parse_mute(output: &str) -> bool {
    output.contains("yes")
}

fn device_from_block(block: &Block, default_name: Option<&str>) -> AudioDevice {
    let name = block.field("Name").unwrap_or_default().to_string();
    let description = block
        .field("Description")
        .or_else(|| block.property("device.description"))
        .unwrap_or(&name)
        .to_string();

    AudioDevice {
        id: block.id,
        active: default_name.is_some_and(|default| default == name),
        monitor: name.ends_with(".monitor"),
        description,
        state: block.field("State").unwrap_or_default().to_string(),
        muted: block.field("Mute").is_some_and(yes_no),
        volume: block.field("Volume").and_then(first_percentage),
        active_port: block.field("Active Port").map(str::to_string),
        name,
    }
}

/// `pactl list sinks`; `default_sink` marks the active one
pub fn parse_sinks(output: &str, default_sink: Option<&str>) -> Vec<AudioDevice> {
    parse_blocks(output, SINK_HEADER)
        .iter()
        .map(|block| device_from_block(block, default_sink))
        .collect()
}

/// `pactl list sources`; monitors are flagged, not removed
pub fn parse_sources(output: &str, default_source: Option<&str>) -> Vec<AudioDevice> {
    parse_blocks(output, SOURCE_HEADER)
        .iter()
        .map(|block| device_from_block(block, default_source))
        .collect()
}

fn stream_from_block(block: &Block, device_field: &str) -> Option<AppStream> {
    let name = block
        .property("application.name")
        .or_else(|| block.property("media.name"))?
        .to_string();
    let volume = block.field("Volume").and_then(first_percentage)?;
    let binary = block
        .property("application.process.binary")
        .map(str::to_string);

    let icon = block
        .property("application.icon_name")
        .map(str::to_string)
        .or_else(|| binary.as_ref().map(|b| b.to_lowercase()))
        .unwrap_or_else(|| name.to_lowercase().replace(' ', "-"));

    Some(AppStream {
        id: block.id,
        device: block.field(device_field).and_then(|d| d.parse().ok()),
        muted: block.field("Mute").is_some_and(yes_no),
        name,
        binary,
        icon,
        volume,
    })
}

/// `pactl list sink-inputs`; streams without a name or volume are skipped
pub fn parse_sink_inputs(output: &str) -> Vec<AppStream> {
    parse_blocks(output, SINK_INPUT_HEADER)
        .iter()
        .filter_map(|block| stream_from_block(block, "Sink"))
        .collect()
}

/// `pactl list source-outputs`
pub fn parse_source_outputs(output: &str) -> Vec<AppStream> {
    parse_blocks(output, SOURCE_OUTPUT_HEADER)
        .iter()
        .filter_map(|block| stream_from_block(block, "Source"))
        .collect()
}

/// `pactl list short <kind>`: (index, name) per line
pub fn parse_short_list(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            Some((columns.next()?.to_string(), columns.next()?.to_string()))
        })
        .collect()
}
