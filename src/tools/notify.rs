//! Desktop notifications via `notify-send`

use std::fmt;

use tracing::warn;

use crate::system::{CommandRunner, Invocation, ToolError};

pub const APP_NAME: &str = "Control Center";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Normal => write!(f, "normal"),
            Urgency::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub app_name: String,
    pub urgency: Urgency,
    pub icon: String,
    pub summary: String,
    pub body: String,
}

impl Notification {
    pub fn new(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            urgency: Urgency::Normal,
            icon: "settings".to_string(),
            summary: summary.into(),
            body: body.into(),
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Command line with empty options left out
    pub fn invocation(&self) -> Invocation {
        let mut command = Invocation::mutate("notify-send").args(["-u".to_string(), self.urgency.to_string()]);
        if !self.icon.is_empty() {
            command = command.args(["-i", self.icon.as_str()]);
        }
        if !self.app_name.is_empty() {
            command = command.args(["-a", self.app_name.as_str()]);
        }
        for text in [&self.summary, &self.body] {
            if !text.is_empty() {
                command = command.arg(text.as_str());
            }
        }
        command
    }
}

pub fn send(runner: &dyn CommandRunner, notification: &Notification) -> Result<(), ToolError> {
    runner.run(&notification.invocation())?;
    Ok(())
}

/// Sends and logs failures; a missing notification daemon never fails
/// the action that triggered it
pub fn send_quietly(runner: &dyn CommandRunner, notification: &Notification) {
    if let Err(e) = send(runner, notification) {
        warn!("Error sending notification: {}", e);
    }
}
