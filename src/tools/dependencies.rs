//! External tools the control center needs, with install hints

use tracing::error;

use crate::system;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dependency {
    /// Executable looked up in `$PATH`
    pub command: &'static str,
    pub name: &'static str,
    pub install: &'static str,
}

impl Dependency {
    pub fn message(&self) -> String {
        format!(
            "{} is required but not installed!\n\nInstall it using:\n{}",
            self.name, self.install
        )
    }
}

pub const DEPENDENCIES: [Dependency; 7] = [
    Dependency {
        command: "powerprofilesctl",
        name: "Power Profiles Control",
        install: "- Debian/Ubuntu: sudo apt install power-profiles-daemon\n- Arch Linux: sudo pacman -S power-profiles-daemon\n- Fedora: sudo dnf install power-profiles-daemon",
    },
    Dependency {
        command: "nmcli",
        name: "Network Manager CLI",
        install: "- Install NetworkManager package for your distro",
    },
    Dependency {
        command: "bluetoothctl",
        name: "Bluetooth Control",
        install: "- Debian/Ubuntu: sudo apt install bluez\n- Arch Linux: sudo pacman -S bluez bluez-utils\n- Fedora: sudo dnf install bluez",
    },
    Dependency {
        command: "pactl",
        name: "PulseAudio Control",
        install: "- Install PulseAudio or PipeWire depending on your distro",
    },
    Dependency {
        command: "brightnessctl",
        name: "Brightness Control",
        install: "- Debian/Ubuntu: sudo apt install brightnessctl\n- Arch Linux: sudo pacman -S brightnessctl\n- Fedora: sudo dnf install brightnessctl",
    },
    Dependency {
        command: "gammastep",
        name: "Blue Light Filter",
        install: "- Debian/Ubuntu: sudo apt install gammastep\n- Arch Linux: sudo pacman -S gammastep\n- Fedora: sudo dnf install gammastep",
    },
    Dependency {
        command: "upower",
        name: "Battery Information",
        install: "- Debian/Ubuntu: sudo apt install upower\n- Arch Linux: sudo pacman -S upower\n- Fedora: sudo dnf install upower",
    },
];

/// Dependencies for which `is_installed` returns false
pub fn missing_with(is_installed: impl Fn(&str) -> bool) -> Vec<&'static Dependency> {
    DEPENDENCIES
        .iter()
        .filter(|dep| !is_installed(dep.command))
        .inspect(|dep| error!("{}", dep.message()))
        .collect()
}

/// Dependencies not found in `$PATH`
pub fn check_all() -> Vec<&'static Dependency> {
    missing_with(|command| system::which(command).is_some())
}
