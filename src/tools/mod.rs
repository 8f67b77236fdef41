//! One wrapper module per external tool
//!
//! Every function takes a `&dyn CommandRunner`, builds argument vectors,
//! runs them, and parses the output with `core::parser`. Arguments are
//! validated before anything is spawned. Callers decide whether a failure
//! is fatal or just logged.

pub mod audio;
pub mod autostart;
pub mod bluetooth;
pub mod dependencies;
pub mod display;
pub mod notify;
pub mod power;
pub mod usbguard;
pub mod wifi;

pub use bluetooth::{BluetoothManager, RetryPolicy};
pub use display::Session;

#[cfg(test)]
mod tests;
