//! Scripted runner for tool wrapper tests

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use super::{ClientMode, CommandOutput, CommandRunner, Invocation, ToolError};
use crate::core::validator;

/// Canned reply for one command line
#[derive(Clone, Debug)]
pub(crate) enum Response {
    Ok(String),
    Fail { code: i32, stderr: String },
    Missing,
}

/// Replies to exact command lines and records everything it was asked
///
/// Each command line owns a queue of responses; the last one repeats once
/// the queue is drained. Unscripted commands succeed with empty output.
#[derive(Debug, Default)]
pub(crate) struct FakeRunner {
    mode: Option<ClientMode>,
    responses: Mutex<HashMap<String, VecDeque<Response>>>,
    calls: Mutex<Vec<String>>,
    spawned: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reports DryRun so tools skip their file writes; commands still reply
    pub(crate) fn dry_run() -> Self {
        Self {
            mode: Some(ClientMode::DryRun),
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, command_line: &str, response: Response) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command_line.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn on(&self, command_line: &str, stdout: &str) -> &Self {
        self.respond(command_line, Response::Ok(stdout.to_string()))
    }

    pub(crate) fn fail(&self, command_line: &str, code: i32, stderr: &str) -> &Self {
        self.respond(
            command_line,
            Response::Fail {
                code,
                stderr: stderr.to_string(),
            },
        )
    }

    /// Every command line run so far, in order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    pub(crate) fn was_called(&self, command_line: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == command_line)
    }

    fn next_response(&self, command_line: &str) -> Option<Response> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(command_line)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl CommandRunner for FakeRunner {
    fn mode(&self) -> ClientMode {
        self.mode.unwrap_or(ClientMode::Live)
    }

    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolError> {
        validator::validate_argument(&invocation.program)?;
        for arg in &invocation.args {
            validator::validate_argument(arg)?;
        }

        let line = invocation.command_line();
        self.calls.lock().unwrap().push(line.clone());

        match self.next_response(&line) {
            None => Ok(CommandOutput::ok("")),
            Some(Response::Ok(stdout)) => Ok(CommandOutput::ok(stdout)),
            Some(Response::Fail { code, stderr }) => Err(ToolError::Failed {
                program: invocation.program.clone(),
                code: Some(code),
                stderr,
            }),
            Some(Response::Missing) => Err(ToolError::Missing(invocation.program.clone())),
        }
    }

    fn spawn_detached(&self, invocation: &Invocation) -> Result<(), ToolError> {
        self.spawned.lock().unwrap().push(invocation.command_line());
        Ok(())
    }
}
