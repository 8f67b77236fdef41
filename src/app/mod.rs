//! Front-end logic shared by the command line
//!
//! # Module Structure
//!
//! ```text
//! app/
//! ├── controller.rs    // Tab order, visibility and start tab
//! ├── file_watcher.rs  // inotify watch on a single store file
//! ├── pages.rs         // Text rendering of each tab
//! └── usb_monitor.rs   // USBGuard reconciliation loop
//! ```

pub mod controller;
pub mod file_watcher;
pub mod pages;
pub mod usb_monitor;

pub use controller::{Controller, ControllerError, StartFlags};
pub use usb_monitor::{MonitorOptions, UsbEvent, UsbMonitor};

#[cfg(test)]
mod tests;
