//! Email → task pipeline.
//!
//! `ParseEmail → RenderBody → CreateTask → Annotate → WriteNotes`. Any
//! failure after the task exists is reported on stdout and rolled back with a
//! single tracker undo. Tracker failures never escape as errors; they become
//! an [`Outcome`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::message::{HtmlRenderer, ParsedEmail};
use crate::notes::NotesStore;
use crate::tracker::{NOTES_ANNOTATION, TaskId, TaskTracker};

/// Pipeline step that failed after the task was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uuid,
    Annotate,
    Notes,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Uuid => "uuid",
            Stage::Annotate => "annotate",
            Stage::Notes => "notes",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Task created, annotated and notes written.
    Completed {
        task_id: TaskId,
        uuid: Uuid,
        notes_file: PathBuf,
    },
    /// The tracker did not report a new task; nothing else was attempted.
    NoTaskCreated { output: String },
    /// A later step failed and the last tracker operation was undone.
    RolledBack {
        task_id: TaskId,
        stage: Stage,
        reason: String,
    },
}

/// Converts one email into a task plus notes file.
pub struct MailToTask {
    tracker: Arc<dyn TaskTracker>,
    renderer: Arc<dyn HtmlRenderer>,
    notes: NotesStore,
}

impl MailToTask {
    pub fn new(
        tracker: Arc<dyn TaskTracker>,
        renderer: Arc<dyn HtmlRenderer>,
        notes: NotesStore,
    ) -> Self {
        Self {
            tracker,
            renderer,
            notes,
        }
    }

    /// Run the pipeline on a raw email.
    ///
    /// Only fails if the body cannot be staged, which happens before any task
    /// is created.
    pub async fn run(&self, raw: &[u8]) -> Result<Outcome> {
        let email = ParsedEmail::parse(raw);
        let body = email.render_body(self.renderer.as_ref()).await;
        let staged = self.notes.stage(&body)?;

        let description = email.task_description();
        info!(description = %description, "Creating task");
        let task_id = match self.tracker.create_task(&description).await {
            Ok(id) => id,
            Err(TrackerError::NoTaskCreated { output }) => {
                warn!(output = %output.trim(), "Tracker did not report a created task");
                return Ok(Outcome::NoTaskCreated { output });
            }
            Err(e) => {
                error!(error = %e, "Task creation failed");
                return Ok(Outcome::NoTaskCreated {
                    output: e.to_string(),
                });
            }
        };

        let uuid = match self.tracker.get_uuid(task_id).await {
            Ok(uuid) => uuid,
            Err(e) => {
                println!("ERR: Sorry, cannot determine the UUID of task with ID={task_id}.");
                return Ok(self.rollback(task_id, Stage::Uuid, &e).await);
            }
        };
        info!(%task_id, %uuid, "Task created");

        if let Err(e) = self.tracker.annotate(task_id, NOTES_ANNOTATION).await {
            println!("ERR: Sorry, cannot annotate task with ID={task_id}.");
            return Ok(self.rollback(task_id, Stage::Annotate, &e).await);
        }

        match self.notes.persist(staged, &uuid) {
            Ok(notes_file) => {
                info!(%task_id, path = %notes_file.display(), "Notes written");
                Ok(Outcome::Completed {
                    task_id,
                    uuid,
                    notes_file,
                })
            }
            Err(e) => {
                println!(
                    "ERR: Sorry, cannot create notes file \"{}\".",
                    self.notes.notes_path(&uuid).display()
                );
                Ok(self.rollback(task_id, Stage::Notes, &e).await)
            }
        }
    }

    /// Undo the most recent tracker operation. A failing undo is only logged.
    async fn rollback(
        &self,
        task_id: TaskId,
        stage: Stage,
        cause: &(dyn std::error::Error + Send + Sync),
    ) -> Outcome {
        error!(%task_id, %stage, error = %cause, "Rolling back");
        println!("INFO: Rolling back incomplete task/note creation:");
        if let Err(e) = self.tracker.undo_last().await {
            warn!(%task_id, error = %e, "Undo failed, task may be left behind");
        }
        Outcome::RolledBack {
            task_id,
            stage,
            reason: cause.to_string(),
        }
    }
}
