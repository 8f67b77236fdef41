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

//! src/core/mod.rs
//!
//! Core logic with no I/O
//!
//! This module contains:
//! - Record types for everything the tools report
//! - Parsers turning tool output into those records
//! - Argument validation applied before any tool runs
//! - Log redaction for identifying values
//!
//! Nothing here spawns processes or touches the filesystem, so all of it
//! is unit tested against captured tool output.

pub mod parser;
pub mod redact;
pub mod types;
pub mod validator;

pub use parser::ParseError;
pub use types::*;
pub use validator::ValidationError;

#[cfg(test)]
mod tests;
