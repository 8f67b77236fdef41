//! Wi-Fi through NetworkManager's `nmcli`

use std::{
    collections::HashMap,
    fs,
    path::Path,
    time::Duration,
};

use qrcode::{render::unicode, QrCode};
use tracing::{debug, info, warn};

use crate::core::{
    parser::nmcli::{self, WIFI_FIELDS},
    redact,
    validator::{validate_argument, validate_identifier, validate_ssid},
    WifiNetwork,
};
use crate::system::{CommandRunner, Invocation, ToolError};
use crate::tools::notify;

/// Root of the kernel's per-interface counters
pub const SYS_NET: &str = "/sys/class/net";

/// Key holding the pre-shared key in `connection show --show-secrets`
const PSK_KEY: &str = "802-11-wireless-security.psk";

/// Scans can take a while on some drivers
const RESCAN_TIMEOUT: Duration = Duration::from_secs(15);

fn nmcli_query() -> Invocation {
    Invocation::query("nmcli")
}

fn nmcli_mutate() -> Invocation {
    Invocation::mutate("nmcli")
}

/// Whether the Wi-Fi radio is enabled
pub fn radio_enabled(runner: &dyn CommandRunner) -> Result<bool, ToolError> {
    let output = runner.stdout(&nmcli_query().args(["radio", "wifi"]))?;
    Ok(output.trim() == "enabled")
}

pub fn set_radio(runner: &dyn CommandRunner, enabled: bool) -> Result<(), ToolError> {
    let state = if enabled { "on" } else { "off" };
    runner.run(&nmcli_mutate().args(["radio", "wifi", state]))?;
    info!("Wi-Fi radio turned {}", state);
    Ok(())
}

/// First wireless interface, if the machine has one
pub fn wifi_interface(runner: &dyn CommandRunner) -> Result<Option<String>, ToolError> {
    let output = runner.stdout(&nmcli_query().args(["-t", "-f", "DEVICE,TYPE,STATE", "device"]))?;
    Ok(nmcli::parse_device_status(&output)
        .into_iter()
        .find(|row| row.kind == "wifi")
        .map(|row| row.device))
}

/// Visible networks, strongest first with the connected one on top
///
/// `rescan` asks NetworkManager for a fresh scan before listing.
pub fn list_networks(
    runner: &dyn CommandRunner,
    rescan: bool,
) -> Result<Vec<WifiNetwork>, ToolError> {
    if wifi_interface(runner)?.is_none() {
        warn!("Wi-Fi is not supported on this machine");
        return Ok(Vec::new());
    }

    if rescan {
        let scan = Invocation::query("nmcli")
            .args(["device", "wifi", "rescan"])
            .with_timeout(RESCAN_TIMEOUT);
        // A rescan refused while a scan is in flight is not fatal
        if let Err(e) = runner.run(&scan) {
            debug!("Rescan failed: {}", e);
        }
    }

    let output = runner.stdout(&nmcli_query().args(["-t", "-f", WIFI_FIELDS, "device", "wifi", "list"]))?;
    let table = output.lines().find(|line| !line.trim().is_empty()).is_some_and(nmcli::is_table_header);
    if table {
        debug!("nmcli printed a table, parsing columns");
        return Ok(nmcli::parse_legacy_table(&output));
    }
    Ok(nmcli::parse_wifi_list(&output))
}

/// Names of saved connection profiles
pub fn saved_connections(
    runner: &dyn CommandRunner,
) -> Result<std::collections::HashSet<String>, ToolError> {
    let output = runner.stdout(&nmcli_query().args(["-t", "-f", "NAME", "connection", "show"]))?;
    Ok(nmcli::parse_connection_names(&output))
}

/// Connects to `ssid`
///
/// Activates a saved profile when one exists, otherwise asks nmcli to
/// create one. With `remember == false` the new profile has autoconnect
/// disabled so it is never joined again on its own.
pub fn connect(
    runner: &dyn CommandRunner,
    ssid: &str,
    password: Option<&str>,
    remember: bool,
) -> Result<(), ToolError> {
    validate_ssid(ssid)?;

    if saved_connections(runner)?.contains(ssid) {
        match runner.run(&nmcli_mutate().args(["connection", "up"]).sensitive_arg(ssid)) {
            Ok(_) => {
                info!(ssid = %redact::mask(ssid), "Connected using saved profile");
                return Ok(());
            }
            Err(e) if password.is_some() => {
                warn!("Saved profile failed, retrying with password: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    let mut command = nmcli_mutate().args(["device", "wifi", "connect"]).sensitive_arg(ssid);
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        validate_argument(password)?;
        command = command.arg("password").secret_arg(password);
    }
    runner.run(&command)?;

    if !remember {
        runner.run(
            &nmcli_mutate()
                .args(["connection", "modify"])
                .sensitive_arg(ssid)
                .args(["connection.autoconnect", "no"]),
        )?;
    }

    info!(ssid = %redact::mask(ssid), "Connected");
    Ok(())
}

/// Desktop notification for a finished connect, iconed by signal strength
pub fn notify_connected(runner: &dyn CommandRunner, ssid: &str) {
    let network = list_networks(runner, false)
        .ok()
        .and_then(|networks| networks.into_iter().find(|network| network.ssid == ssid));
    let icon = network
        .as_ref()
        .map(WifiNetwork::signal_icon)
        .unwrap_or("network-wireless-symbolic");
    notify::send_quietly(
        runner,
        &notify::Notification::new(notify::APP_NAME, format!("Connected to {}", ssid)).icon(icon),
    );
}

/// Creates an explicit profile named after the network and activates it
pub fn connect_with_profile(
    runner: &dyn CommandRunner,
    ssid: &str,
    password: Option<&str>,
    remember: bool,
) -> Result<(), ToolError> {
    validate_ssid(ssid)?;

    let mut add = nmcli_mutate()
        .args(["connection", "add", "type", "wifi", "con-name"])
        .sensitive_arg(ssid)
        .arg("ssid")
        .sensitive_arg(ssid);
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        validate_argument(password)?;
        add = add
            .args(["wifi-sec.key-mgmt", "wpa-psk", "wifi-sec.psk"])
            .secret_arg(password);
    }
    if !remember {
        add = add.args(["connection.autoconnect", "no"]);
    }

    runner.run(&add)?;
    runner.run(&nmcli_mutate().args(["connection", "up"]).sensitive_arg(ssid))?;
    info!(ssid = %redact::mask(ssid), "Connected with new profile");
    Ok(())
}

/// Brings down the active wireless connection
///
/// Returns the name of the connection taken down, `None` when no
/// wireless connection was active.
pub fn disconnect(runner: &dyn CommandRunner) -> Result<Option<String>, ToolError> {
    let output = runner.stdout(&nmcli_query().args([
        "-t",
        "-f",
        "NAME,TYPE,DEVICE",
        "connection",
        "show",
        "--active",
    ]))?;

    let Some(active) = nmcli::parse_active_connections(&output)
        .into_iter()
        .find(|conn| conn.is_wireless())
    else {
        info!("No active Wi-Fi connection");
        return Ok(None);
    };

    runner.run(&nmcli_mutate().args(["connection", "down"]).sensitive_arg(&active.name))?;
    info!(ssid = %redact::mask(&active.name), "Disconnected");
    Ok(Some(active.name))
}

/// Deletes the saved profile for `ssid`
pub fn forget(runner: &dyn CommandRunner, ssid: &str) -> Result<(), ToolError> {
    validate_ssid(ssid)?;
    runner.run(&nmcli_mutate().args(["connection", "delete"]).sensitive_arg(ssid))?;
    info!(ssid = %redact::mask(ssid), "Forgot network");
    Ok(())
}

/// `connection show` fields plus the stored password when requested
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub fields: HashMap<String, String>,
    pub password: Option<String>,
}

impl ConnectionInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

pub fn connection_info(
    runner: &dyn CommandRunner,
    ssid: &str,
    with_password: bool,
) -> Result<ConnectionInfo, ToolError> {
    validate_ssid(ssid)?;

    let mut command = nmcli_query().arg("-t");
    if with_password {
        command = command.arg("--show-secrets");
    }
    let output = runner.stdout(&command.args(["connection", "show"]).sensitive_arg(ssid))?;

    let fields = nmcli::parse_connection_show(&output);
    let password = with_password
        .then(|| fields.get(PSK_KEY).filter(|psk| !psk.is_empty()).cloned())
        .flatten();

    Ok(ConnectionInfo { fields, password })
}

/// Byte counters of one interface at one instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrafficCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Reads `<sys_net>/<iface>/statistics/{rx,tx}_bytes`
pub fn read_counters(sys_net: &Path, interface: &str) -> Result<TrafficCounters, ToolError> {
    validate_identifier(interface)?;
    let stats = sys_net.join(interface).join("statistics");

    let read = |file: &str| -> Result<u64, ToolError> {
        let raw = fs::read_to_string(stats.join(file))?;
        raw.trim()
            .parse()
            .map_err(|_| ToolError::parse("sysfs", format!("{} is not a counter: {:?}", file, raw.trim())))
    };

    Ok(TrafficCounters {
        rx_bytes: read("rx_bytes")?,
        tx_bytes: read("tx_bytes")?,
    })
}

/// Download and upload speed in Mbps between two samples
pub fn speed_mbps(
    before: TrafficCounters,
    after: TrafficCounters,
    elapsed: Duration,
) -> (f64, f64) {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return (0.0, 0.0);
    }
    let mbps = |delta: u64| (delta as f64 * 8.0) / (1024.0 * 1024.0) / seconds;
    (
        mbps(after.rx_bytes.saturating_sub(before.rx_bytes)),
        mbps(after.tx_bytes.saturating_sub(before.tx_bytes)),
    )
}

/// Escapes the characters the Wi-Fi QR format reserves
fn escape_qr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Payload for a Wi-Fi sharing QR code
///
/// `security` is the nmcli security column; `none` (or empty) means an
/// open network.
pub fn qr_payload(ssid: &str, password: &str, security: &str) -> String {
    let kind = if security.is_empty() || security.eq_ignore_ascii_case("none") {
        "nopass"
    } else {
        "WPA"
    };
    format!(
        "WIFI:T:{};S:{};P:{};;",
        kind,
        escape_qr(ssid),
        escape_qr(password)
    )
}

/// Renders `payload` as a QR code of half-block characters for a terminal
///
/// Colours are inverted so the code scans on a dark background.
pub fn qr_code(payload: &str) -> Result<String, ToolError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}
