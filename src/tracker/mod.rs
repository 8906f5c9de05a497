//! Task-tracker collaborator interface.
//!
//! The pipeline only talks to the tracker through [`TaskTracker`]; the
//! Taskwarrior CLI backend lives in [`taskwarrior`].

pub mod taskwarrior;

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TrackerError;

pub use taskwarrior::TaskwarriorCli;

/// Annotation added to every task created from an email.
pub const NOTES_ANNOTATION: &str = "email: Notes";

/// Short numeric task ID, valid until the tracker renumbers its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External task-management system.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Create a task and return its short ID.
    ///
    /// Returns [`TrackerError::NoTaskCreated`] when the tracker ran but did
    /// not report a new task.
    async fn create_task(&self, description: &str) -> Result<TaskId, TrackerError>;

    /// Look up the permanent UUID of a task.
    async fn get_uuid(&self, id: TaskId) -> Result<Uuid, TrackerError>;

    /// Attach an annotation to a task.
    async fn annotate(&self, id: TaskId, text: &str) -> Result<(), TrackerError>;

    /// Undo the most recent tracker operation.
    async fn undo_last(&self) -> Result<(), TrackerError>;
}
