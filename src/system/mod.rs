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

//! Subprocess execution for every external tool
//!
//! All tool wrappers go through a [`CommandRunner`]. The production
//! implementation, [`SystemRunner`], operates in one of three modes:
//! - **DryRun**: Validates and logs, never executes
//! - **ReadOnly**: Executes queries, refuses anything that changes state
//! - **Live**: Executes everything
//!
//! Commands are built as argument vectors and spawned directly, never
//! through a shell. Every argument is still checked by the validator so
//! that control characters cannot reach line-oriented tools such as
//! `bluetoothctl`.
//!
//! # Example
//! ```
//! use better_control::system::{ClientMode, CommandRunner, Invocation, SystemRunner};
//!
//! // DryRun never spawns anything, so this is safe anywhere
//! let runner = SystemRunner::new(ClientMode::DryRun);
//! let invocation = Invocation::mutate("nmcli").args(["radio", "wifi", "off"]);
//! assert!(runner.run(&invocation).is_ok());
//! ```

use std::{
    borrow::Cow,
    env,
    io::Read,
    path::PathBuf,
    process::{Command, Output, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::core::{redact, validator::{self, ValidationError}};

#[cfg(test)]
pub(crate) mod testing;

/// How often a timed child is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Placeholder printed instead of secret arguments
const SECRET_PLACEHOLDER: &str = "********";

/// Errors raised while running or interpreting an external tool
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable does not exist in `$PATH`
    #[error("'{0}' is not installed or not in PATH")]
    Missing(String),

    /// The tool ran but exited unsuccessfully
    #[error("{program} failed (exit code {code:?}): {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool did not finish before its deadline and was killed
    #[error("{program} timed out after {seconds}s")]
    TimedOut { program: String, seconds: u64 },

    /// A state-changing command was attempted through a read-only runner
    #[error("Runner in read-only mode - refusing to run '{0}'")]
    ReadOnly(String),

    /// An argument was rejected before the tool was spawned
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The tool produced output we could not interpret
    #[error("Unexpected output from {program}: {message}")]
    Parse { program: String, message: String },

    /// The requested object (adapter, battery, entry) does not exist
    #[error("{0}")]
    NotFound(String),

    /// Persisting tool state failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data does not fit in a QR code
    #[error("Could not encode QR code: {0}")]
    QrCode(#[from] qrcode::types::QrError),

    /// Generic I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Builds a parse error for `program`
    pub fn parse(program: &str, message: impl Into<String>) -> Self {
        ToolError::Parse {
            program: program.to_string(),
            message: message.into(),
        }
    }
}

/// Whether a command only reads state or changes it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Reads state (list, get, show)
    Query,
    /// Changes state (set, connect, toggle)
    Mutate,
}

/// Runner operation mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientMode {
    /// Validation only - NEVER spawns a process
    DryRun,

    /// Runs queries, refuses mutations
    ReadOnly,

    /// Full access
    Live,
}

/// A single command line, built without a shell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub kind: CommandKind,
    pub timeout: Option<Duration>,
    /// Indexes into `args` that must never be logged
    secrets: Vec<usize>,
    /// Indexes into `args` masked when redaction is on
    sensitive: Vec<usize>,
}

impl Invocation {
    fn new(program: &str, kind: CommandKind) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            kind,
            timeout: None,
            secrets: Vec::new(),
            sensitive: Vec::new(),
        }
    }

    /// Starts a read-only command
    pub fn query(program: &str) -> Self {
        Self::new(program, CommandKind::Query)
    }

    /// Starts a state-changing command
    pub fn mutate(program: &str) -> Self {
        Self::new(program, CommandKind::Mutate)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends an argument that is masked in every log line
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secrets.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Appends an identifying argument (SSID, profile name) that `-r`
    /// masks in log lines
    pub fn sensitive_arg(mut self, arg: impl Into<String>) -> Self {
        self.sensitive.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Kills the child if it has not exited after `limit`
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// The exact command line, secrets included
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The command line as it may appear in logs
    pub fn display_line(&self) -> String {
        let parts: Vec<Cow<'_, str>> = std::iter::once(Cow::Borrowed(self.program.as_str()))
            .chain(self.args.iter().enumerate().map(|(idx, arg)| {
                if self.secrets.contains(&idx) {
                    Cow::Borrowed(SECRET_PLACEHOLDER)
                } else if self.sensitive.contains(&idx) {
                    redact::mask(arg)
                } else {
                    Cow::Borrowed(arg.as_str())
                }
            }))
            .collect();
        redact::scrub(&parts.join(" ")).into_owned()
    }
}

/// Captured result of a finished command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// The seam through which every external tool is executed
pub trait CommandRunner {
    /// Runs the command to completion. A non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolError>;

    /// Starts the command and returns immediately without waiting
    fn spawn_detached(&self, invocation: &Invocation) -> Result<(), ToolError>;

    /// Convenience wrapper returning stdout only
    fn stdout(&self, invocation: &Invocation) -> Result<String, ToolError> {
        Ok(self.run(invocation)?.stdout)
    }

    /// Mode that also governs the file writes tools make alongside commands
    fn mode(&self) -> ClientMode {
        ClientMode::Live
    }
}

/// Decides whether a tool may write `what` to disk under the runner's mode
///
/// DryRun logs the would-be write and returns `Ok(false)`; ReadOnly refuses.
pub fn allow_write(runner: &dyn CommandRunner, what: &str) -> Result<bool, ToolError> {
    match runner.mode() {
        ClientMode::DryRun => {
            info!(write = %redact::scrub(what), "dry-run: skipping write");
            Ok(false)
        }
        ClientMode::ReadOnly => Err(ToolError::ReadOnly(format!("write {what}"))),
        ClientMode::Live => Ok(true),
    }
}

/// Runs real processes, gated by [`ClientMode`]
#[derive(Clone, Copy, Debug)]
pub struct SystemRunner {
    mode: ClientMode,
}

impl SystemRunner {
    pub fn new(mode: ClientMode) -> Self {
        Self { mode }
    }

    /// Validates the invocation and decides whether it may execute
    ///
    /// Returns `Ok(false)` in DryRun mode: valid, but nothing is spawned.
    fn admit(&self, invocation: &Invocation) -> Result<bool, ToolError> {
        validator::validate_argument(&invocation.program)?;
        for arg in &invocation.args {
            validator::validate_argument(arg)?;
        }

        match (self.mode, invocation.kind) {
            (ClientMode::DryRun, _) => {
                info!(command = %invocation.display_line(), "dry-run");
                Ok(false)
            }
            (ClientMode::ReadOnly, CommandKind::Mutate) => {
                Err(ToolError::ReadOnly(invocation.display_line()))
            }
            _ => Ok(true),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn mode(&self) -> ClientMode {
        self.mode
    }

    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolError> {
        if !self.admit(invocation)? {
            return Ok(CommandOutput::ok(""));
        }

        debug!(command = %invocation.display_line(), "running");
        let mut command = build_command(invocation);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = match invocation.timeout {
            None => command
                .output()
                .map_err(|e| spawn_error(&invocation.program, e))?,
            Some(limit) => wait_with_timeout(command, &invocation.program, limit)?,
        };

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };

        if result.success() {
            Ok(result)
        } else {
            Err(ToolError::Failed {
                program: invocation.program.clone(),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    fn spawn_detached(&self, invocation: &Invocation) -> Result<(), ToolError> {
        if !self.admit(invocation)? {
            return Ok(());
        }

        debug!(command = %invocation.display_line(), "spawning detached");
        build_command(invocation)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(&invocation.program, e))?;

        Ok(())
    }
}

/// Builds the process with a fixed locale so tool output parses the same
/// on every machine
fn build_command(invocation: &Invocation) -> Command {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null());
    command
}

fn spawn_error(program: &str, error: std::io::Error) -> ToolError {
    if error.kind() == std::io::ErrorKind::NotFound {
        ToolError::Missing(program.to_string())
    } else {
        ToolError::Io(error)
    }
}

/// Waits for the child, killing it once `limit` has elapsed
///
/// stdout and stderr are drained on helper threads so a chatty child
/// cannot block on a full pipe while we poll.
fn wait_with_timeout(
    mut command: Command,
    program: &str,
    limit: Duration,
) -> Result<Output, ToolError> {
    let mut child = command.spawn().map_err(|e| spawn_error(program, e))?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + limit;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolError::TimedOut {
                program: program.to_string(),
                seconds: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = reader.read_to_end(&mut buffer);
        buffer
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Looks `program` up in `$PATH`
pub fn which(program: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests;
