//! Notes files — one plain-text file per task, named `<uuid>.txt`.
//!
//! The body is staged in a temporary file before the task exists and only
//! copied into the notes folder once the task has been annotated.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::NotesError;

/// File extension of notes files.
pub const NOTES_EXTENSION: &str = "txt";

/// Notes folder handle.
#[derive(Debug, Clone)]
pub struct NotesStore {
    folder: PathBuf,
}

impl NotesStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Destination of the notes file for a task.
    pub fn notes_path(&self, uuid: &Uuid) -> PathBuf {
        self.folder.join(format!("{uuid}.{NOTES_EXTENSION}"))
    }

    /// Write the body to a temporary file.
    pub fn stage(&self, body: &str) -> Result<StagedNotes, NotesError> {
        let mut file = NamedTempFile::new().map_err(NotesError::Stage)?;
        file.write_all(body.as_bytes()).map_err(NotesError::Stage)?;
        file.flush().map_err(NotesError::Stage)?;
        debug!(path = %file.path().display(), bytes = body.len(), "Staged notes");
        Ok(StagedNotes { file })
    }

    /// Copy staged notes to `<folder>/<uuid>.txt` and remove the temporary file.
    ///
    /// On failure the temporary file is still removed when `staged` drops.
    pub fn persist(&self, staged: StagedNotes, uuid: &Uuid) -> Result<PathBuf, NotesError> {
        let dest = self.notes_path(uuid);
        std::fs::copy(staged.path(), &dest).map_err(|source| NotesError::Persist {
            path: dest.clone(),
            source,
        })?;

        if let Err(e) = staged.file.close() {
            warn!(error = %e, "Failed to remove staged notes file");
        }
        Ok(dest)
    }
}

/// Notes body waiting in a temporary file. Deleted on drop.
#[derive(Debug)]
pub struct StagedNotes {
    file: NamedTempFile,
}

impl StagedNotes {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
