//! Integration tests for the email → task pipeline.
//!
//! A stub tracker stands in for Taskwarrior and records every call, so each
//! test can check both the `Outcome` and what was asked of the tracker.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use mutt2task::error::{RenderError, TrackerError};
use mutt2task::message::HtmlRenderer;
use mutt2task::notes::NotesStore;
use mutt2task::pipeline::{MailToTask, Outcome, Stage};
use mutt2task::tracker::{TaskId, TaskTracker};

const UUID: &str = "0b9a3c1e-6f2d-4c8a-8e71-2d5f9b4a6c03";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Create(String),
    Uuid(TaskId),
    Annotate(TaskId, String),
    Undo,
}

/// Stub tracker with switchable failures.
#[derive(Default)]
struct StubTracker {
    calls: Mutex<Vec<Call>>,
    no_task: bool,
    bad_uuid: bool,
    annotate_fails: bool,
    undo_fails: bool,
}

impl StubTracker {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TaskTracker for StubTracker {
    async fn create_task(&self, description: &str) -> Result<TaskId, TrackerError> {
        self.record(Call::Create(description.to_string()));
        if self.no_task {
            return Err(TrackerError::NoTaskCreated {
                output: "Couldn't parse that.".to_string(),
            });
        }
        Ok(TaskId(5))
    }

    async fn get_uuid(&self, id: TaskId) -> Result<Uuid, TrackerError> {
        self.record(Call::Uuid(id));
        if self.bad_uuid {
            return Err(TrackerError::InvalidUuid {
                id,
                output: String::new(),
            });
        }
        Ok(Uuid::parse_str(UUID).unwrap())
    }

    async fn annotate(&self, id: TaskId, text: &str) -> Result<(), TrackerError> {
        self.record(Call::Annotate(id, text.to_string()));
        if self.annotate_fails {
            return Err(TrackerError::CommandFailed {
                id,
                command: "annotate".to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }

    async fn undo_last(&self) -> Result<(), TrackerError> {
        self.record(Call::Undo);
        if self.undo_fails {
            return Err(TrackerError::UndoFailed { code: Some(2) });
        }
        Ok(())
    }
}

/// Renderer that marks its output so tests can tell it ran.
struct StubRenderer;

#[async_trait]
impl HtmlRenderer for StubRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        Ok(format!("[rendered]{html}"))
    }
}

struct Harness {
    tracker: Arc<StubTracker>,
    pipeline: MailToTask,
    notes_dir: tempfile::TempDir,
}

impl Harness {
    fn new(tracker: StubTracker) -> Self {
        let notes_dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(tracker);
        let pipeline = MailToTask::new(
            tracker.clone(),
            Arc::new(StubRenderer),
            NotesStore::new(notes_dir.path()),
        );
        Self {
            tracker,
            pipeline,
            notes_dir,
        }
    }

    fn notes_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.notes_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

const PLAIN: &str = "From: Alice <alice@example.com>\r\n\
    Subject: Hello\r\n\
    MIME-Version: 1.0\r\n\
    Content-Type: multipart/mixed; boundary=\"x\"\r\n\
    \r\n\
    --x\r\n\
    Content-Type: text/plain; charset=utf-8\r\n\
    \r\n\
    part one\r\n\
    --x\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    \r\n\
    <p>ignored</p>\r\n\
    --x\r\n\
    Content-Type: text/plain; charset=iso-8859-1\r\n\
    Content-Transfer-Encoding: quoted-printable\r\n\
    \r\n\
    part two =E9t=E9\r\n\
    --x--\r\n";

#[tokio::test]
async fn plain_email_creates_task_and_notes() {
    let h = Harness::new(StubTracker::default());

    let outcome = h.pipeline.run(PLAIN.as_bytes()).await.unwrap();

    let expected_path = h.notes_dir.path().join(format!("{UUID}.txt"));
    assert_eq!(
        outcome,
        Outcome::Completed {
            task_id: TaskId(5),
            uuid: Uuid::parse_str(UUID).unwrap(),
            notes_file: expected_path.clone(),
        }
    );
    assert_eq!(
        std::fs::read_to_string(&expected_path).unwrap(),
        "part onepart two été"
    );
    assert_eq!(
        h.tracker.calls(),
        vec![
            Call::Create("E-Mail subject: Hello".to_string()),
            Call::Uuid(TaskId(5)),
            Call::Annotate(TaskId(5), "email: Notes".to_string()),
        ]
    );
}

#[tokio::test]
async fn html_only_email_is_rendered() {
    let h = Harness::new(StubTracker::default());
    let raw = "From: alice@example.com\r\n\
        Subject: News\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: multipart/alternative; boundary=\"y\"\r\n\
        \r\n\
        --y\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <p>one</p>\r\n\
        --y\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <p>two</p>\r\n\
        --y--\r\n";

    let outcome = h.pipeline.run(raw.as_bytes()).await.unwrap();

    let Outcome::Completed { notes_file, .. } = outcome else {
        panic!("expected completed outcome, got {outcome:?}");
    };
    assert_eq!(
        std::fs::read_to_string(notes_file).unwrap(),
        "[rendered]<p>one</p><p>two</p>"
    );
}

#[tokio::test]
async fn missing_subject_uses_placeholder_description() {
    let h = Harness::new(StubTracker::default());
    let raw = "From: alice@example.com\r\n\r\nno subject here\r\n";

    h.pipeline.run(raw.as_bytes()).await.unwrap();

    assert_eq!(
        h.tracker.calls()[0],
        Call::Create("E-Mail import: no subject specified.".to_string())
    );
}

#[tokio::test]
async fn no_created_task_stops_pipeline() {
    let h = Harness::new(StubTracker {
        no_task: true,
        ..Default::default()
    });

    let outcome = h.pipeline.run(PLAIN.as_bytes()).await.unwrap();

    assert!(matches!(outcome, Outcome::NoTaskCreated { .. }));
    assert_eq!(
        h.tracker.calls(),
        vec![Call::Create("E-Mail subject: Hello".to_string())]
    );
    assert!(h.notes_files().is_empty());
}

#[tokio::test]
async fn annotate_failure_rolls_back_without_notes() {
    let h = Harness::new(StubTracker {
        annotate_fails: true,
        ..Default::default()
    });

    let outcome = h.pipeline.run(PLAIN.as_bytes()).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::RolledBack {
            task_id: TaskId(5),
            stage: Stage::Annotate,
            ..
        }
    ));
    assert_eq!(h.tracker.calls().last(), Some(&Call::Undo));
    assert!(h.notes_files().is_empty());
}

#[tokio::test]
async fn invalid_uuid_rolls_back_before_annotating() {
    let h = Harness::new(StubTracker {
        bad_uuid: true,
        ..Default::default()
    });

    let outcome = h.pipeline.run(PLAIN.as_bytes()).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::RolledBack {
            stage: Stage::Uuid,
            ..
        }
    ));
    assert_eq!(
        h.tracker.calls(),
        vec![
            Call::Create("E-Mail subject: Hello".to_string()),
            Call::Uuid(TaskId(5)),
            Call::Undo,
        ]
    );
    assert!(h.notes_files().is_empty());
}

#[tokio::test]
async fn notes_failure_rolls_back() {
    let tracker = Arc::new(StubTracker::default());
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the notes folder should be.
    let bogus = tmp.path().join("notes");
    std::fs::write(&bogus, "not a directory").unwrap();
    let pipeline = MailToTask::new(
        tracker.clone(),
        Arc::new(StubRenderer),
        NotesStore::new(&bogus),
    );

    let outcome = pipeline.run(PLAIN.as_bytes()).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::RolledBack {
            stage: Stage::Notes,
            ..
        }
    ));
    assert_eq!(tracker.calls().len(), 4);
    assert_eq!(tracker.calls().last(), Some(&Call::Undo));
}

#[tokio::test]
async fn failed_undo_is_not_fatal() {
    let h = Harness::new(StubTracker {
        annotate_fails: true,
        undo_fails: true,
        ..Default::default()
    });

    let outcome = h.pipeline.run(PLAIN.as_bytes()).await.unwrap();

    assert!(matches!(outcome, Outcome::RolledBack { .. }));
    assert_eq!(h.tracker.calls().last(), Some(&Call::Undo));
}
