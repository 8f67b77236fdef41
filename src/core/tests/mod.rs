//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Tool output parsers (one suite per tool)
//! - Input validation tests
//! - Type tests (Security, Tab, UsbDevice, etc.)

#[cfg(test)]
mod pactl_tests;
#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod validator_tests;
