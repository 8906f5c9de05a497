//! Taskwarrior backend — drives the `task` CLI.
//!
//! Commands are run directly (no shell) with stdin closed. Only `add` and
//! `uuids` output is captured; `annotate` and `undo` print straight to the
//! terminal.

use std::process::{Output, Stdio};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use crate::error::TrackerError;
use crate::tracker::{TaskId, TaskTracker};

/// Priority given to imported tasks.
pub const PRIORITY: &str = "pri:L";

/// Tag given to imported tasks.
pub const TAG: &str = "+email";

static CREATED_TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Created task (\d+)").expect("created-task pattern is valid"));

/// Parse `task add` output. Returns the matched line fragment and the ID.
pub fn parse_created_task(output: &str) -> Option<(&str, TaskId)> {
    let caps = CREATED_TASK.captures(output)?;
    let id = caps.get(1)?.as_str().parse().ok()?;
    Some((caps.get(0)?.as_str(), TaskId(id)))
}

/// Parse `task <id> uuids` output.
pub fn parse_uuid(output: &str) -> Option<Uuid> {
    Uuid::parse_str(output.trim()).ok()
}

/// Taskwarrior via its command-line interface.
#[derive(Debug, Clone)]
pub struct TaskwarriorCli {
    program: String,
}

impl TaskwarriorCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        debug!(program = %self.program, ?args, "Running task command");
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    async fn capture(&self, args: &[&str]) -> Result<Output, TrackerError> {
        self.command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| self.spawn_error(args, source))
    }

    async fn status(&self, args: &[&str]) -> Result<Option<i32>, TrackerError> {
        let status = self
            .command(args)
            .status()
            .await
            .map_err(|source| self.spawn_error(args, source))?;
        Ok(if status.success() {
            None
        } else {
            Some(status.code().unwrap_or(-1))
        })
    }

    fn spawn_error(&self, args: &[&str], source: std::io::Error) -> TrackerError {
        TrackerError::Spawn {
            program: self.program.clone(),
            command: args.join(" "),
            source,
        }
    }
}

#[async_trait]
impl TaskTracker for TaskwarriorCli {
    async fn create_task(&self, description: &str) -> Result<TaskId, TrackerError> {
        let output = self
            .capture(&["add", PRIORITY, TAG, "--", description])
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match parse_created_task(&stdout) {
            Some((line, id)) => {
                println!("{}", line.trim());
                Ok(id)
            }
            None => Err(TrackerError::NoTaskCreated {
                output: stdout.into_owned(),
            }),
        }
    }

    async fn get_uuid(&self, id: TaskId) -> Result<Uuid, TrackerError> {
        let task = id.to_string();
        let output = self.capture(&[task.as_str(), "uuids"]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_uuid(&stdout).ok_or_else(|| TrackerError::InvalidUuid {
            id,
            output: stdout.into_owned(),
        })
    }

    async fn annotate(&self, id: TaskId, text: &str) -> Result<(), TrackerError> {
        let task = id.to_string();
        match self.status(&[task.as_str(), "annotate", "--", text]).await? {
            None => Ok(()),
            code => Err(TrackerError::CommandFailed {
                id,
                command: "annotate".to_string(),
                code,
            }),
        }
    }

    async fn undo_last(&self) -> Result<(), TrackerError> {
        match self.status(&["rc.confirmation=off", "undo"]).await? {
            None => Ok(()),
            code => Err(TrackerError::UndoFailed { code }),
        }
    }
}
