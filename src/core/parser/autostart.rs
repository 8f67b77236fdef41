//! Autostart sources: XDG `.desktop` files and compositor config lines
//!
//! Compositor entries are identified by the line they live on. A line is
//! disabled by commenting it out, so both enabled and commented-out
//! `exec-once` / `exec` lines are reported.

/// An autostart line found in a compositor config
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecLine {
    /// 0-based line index in the file
    pub line: usize,
    pub command: String,
    pub enabled: bool,
}

/// Strips leading `#` and whitespace, returning the bare directive
fn uncommented(line: &str) -> &str {
    line.trim().trim_start_matches('#').trim()
}

fn unquote(command: &str) -> &str {
    command.trim().trim_matches('"')
}

/// `exec-once = cmd` (or `exec-once cmd`) lines of hyprland.conf
pub fn parse_hyprland_exec(content: &str) -> Vec<ExecLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let directive = uncommented(line);
            let rest = directive.strip_prefix("exec-once")?;

            let command = match rest.trim_start().strip_prefix('=') {
                Some(after_eq) => unquote(after_eq),
                None if rest.starts_with(char::is_whitespace) => unquote(rest),
                None => return None,
            };

            (!command.is_empty()).then(|| ExecLine {
                line: idx,
                command: command.to_string(),
                enabled: !line.trim().starts_with('#'),
            })
        })
        .collect()
}

/// `exec cmd` / `exec_always cmd` lines of a sway config
pub fn parse_sway_exec(content: &str) -> Vec<ExecLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let directive = uncommented(line);
            let (keyword, rest) = directive.split_once(char::is_whitespace)?;
            if keyword != "exec" && keyword != "exec_always" {
                return None;
            }

            let command = unquote(rest);
            (!command.is_empty()).then(|| ExecLine {
                line: idx,
                command: command.to_string(),
                enabled: !line.trim().starts_with('#'),
            })
        })
        .collect()
}

/// Comments a config line out (`disable`) or uncomments it (`enable`)
///
/// Disabling normalises to `# <directive>`; enabling strips every leading
/// `#` and space.
pub fn toggle_line(line: &str, enable: bool) -> String {
    let bare = line.trim_start_matches(['#', ' ']).trim();
    if enable {
        bare.to_string()
    } else {
        format!("# {}", bare)
    }
}

/// The fields of a `.desktop` file the autostart list cares about
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: Option<String>,
    pub exec: Option<String>,
    pub hidden: bool,
}

/// Reads the `[Desktop Entry]` group; other groups (actions) are ignored
pub fn parse_desktop_entry(content: &str) -> DesktopEntry {
    let mut entry = DesktopEntry::default();
    let mut in_main_group = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_main_group {
            continue;
        }

        match line.split_once('=') {
            Some(("Name", value)) if entry.name.is_none() => entry.name = Some(value.trim().to_string()),
            Some(("Exec", value)) => entry.exec = Some(value.trim().to_string()),
            Some(("Hidden", value)) => entry.hidden = value.trim() == "true",
            _ => {}
        }
    }

    entry
}
