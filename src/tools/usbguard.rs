//! USB device policy through the `usbguard` CLI

use std::{collections::BTreeSet, time::Duration};

use tracing::info;

use crate::config::DeviceStore;
use crate::core::{parser::usbguard, validator::validate_device_id, UsbDevice};
use crate::system::{allow_write, CommandRunner, Invocation, ToolError};

/// `list-rules` can hang when the daemon is wedged
pub const RULES_TIMEOUT: Duration = Duration::from_secs(5);

pub fn list_devices(runner: &dyn CommandRunner) -> Result<Vec<UsbDevice>, ToolError> {
    let output = runner.stdout(&Invocation::query("usbguard").arg("list-devices"))?;
    Ok(usbguard::parse_devices(&output))
}

/// Trimmed, non-empty `list-devices` lines, for change detection
pub fn device_lines(runner: &dyn CommandRunner) -> Result<BTreeSet<String>, ToolError> {
    let output = runner.stdout(&Invocation::query("usbguard").arg("list-devices"))?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn allow(runner: &dyn CommandRunner, id: &str) -> Result<(), ToolError> {
    validate_device_id(id)?;
    runner.run(&Invocation::mutate("usbguard").args(["allow-device", id]))?;
    info!(device = id, "USB device allowed");
    Ok(())
}

/// The currently attached device with runtime id `id`
pub fn find_device(runner: &dyn CommandRunner, id: &str) -> Result<UsbDevice, ToolError> {
    validate_device_id(id)?;
    list_devices(runner)?
        .into_iter()
        .find(|device| device.id == id)
        .ok_or_else(|| ToolError::NotFound(format!("No USB device with id {}", id)))
}

/// Allows with a persistent rule (`-p`) and records the device in `store`
///
/// The store holds the device's [`UsbDevice::store_key`], not `id`.
pub fn allow_permanently(
    runner: &dyn CommandRunner,
    id: &str,
    store: &mut DeviceStore,
) -> Result<(), ToolError> {
    validate_device_id(id)?;
    let key = if allow_write(runner, &store.path().display().to_string())? {
        Some(find_device(runner, id)?.store_key())
    } else {
        None
    };

    runner.run(&Invocation::mutate("usbguard").args(["allow-device", "-p", id]))?;
    if let Some(key) = key {
        store.add(&key)?;
    }
    info!(device = id, "USB device allowed permanently");
    Ok(())
}

/// Hides the attached device `id` from the USBGuard view
pub fn hide(runner: &dyn CommandRunner, store: &mut DeviceStore, id: &str) -> Result<(), ToolError> {
    validate_device_id(id)?;
    if allow_write(runner, &store.path().display().to_string())? {
        store.add(&find_device(runner, id)?.store_key())?;
    }
    info!(device = id, "USB device hidden");
    Ok(())
}

/// Shows a hidden device again
///
/// `device` is either a stored key, which works after the device is
/// unplugged, or the runtime id of an attached device. `Ok(false)` means
/// it was not hidden.
pub fn unhide(
    runner: &dyn CommandRunner,
    store: &mut DeviceStore,
    device: &str,
) -> Result<bool, ToolError> {
    if !allow_write(runner, &store.path().display().to_string())? {
        return Ok(true);
    }
    let key = if store.contains(device) {
        device.to_string()
    } else {
        find_device(runner, device)?.store_key()
    };
    let removed = store.remove(&key)?;
    info!(device, removed, "USB device unhidden");
    Ok(removed)
}

pub fn block(runner: &dyn CommandRunner, id: &str) -> Result<(), ToolError> {
    validate_device_id(id)?;
    runner.run(&Invocation::mutate("usbguard").args(["block-device", id]))?;
    info!(device = id, "USB device blocked");
    Ok(())
}

pub fn list_rules(runner: &dyn CommandRunner) -> Result<Vec<String>, ToolError> {
    let command = Invocation::query("usbguard")
        .arg("list-rules")
        .with_timeout(RULES_TIMEOUT);
    Ok(usbguard::parse_rules(&runner.stdout(&command)?))
}

/// Whether the usbguard daemon is running
///
/// `systemctl is-active` exits non-zero for every state but `active`.
pub fn service_active(runner: &dyn CommandRunner) -> Result<bool, ToolError> {
    match runner.run(&Invocation::query("systemctl").args(["is-active", "usbguard"])) {
        Ok(output) => Ok(output.stdout.trim() == "active"),
        Err(ToolError::Failed { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Starts or stops the daemon through polkit
pub fn set_service(runner: &dyn CommandRunner, running: bool) -> Result<(), ToolError> {
    let verb = if running { "start" } else { "stop" };
    runner.run(&Invocation::mutate("pkexec").args(["systemctl", verb, "usbguard"]))?;
    info!("usbguard service {}", if running { "started" } else { "stopped" });
    Ok(())
}
