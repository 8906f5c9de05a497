//! Error types for mutt2task.

use std::path::PathBuf;

use crate::tracker::TaskId;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notes error: {0}")]
    Notes(#[from] NotesError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create notes folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the external task-tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Failed to run `{program} {command}`: {source}")]
    Spawn {
        program: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracker did not report a created task: {output:?}")]
    NoTaskCreated { output: String },

    #[error("Tracker returned an invalid UUID for task {id}: {output:?}")]
    InvalidUuid { id: TaskId, output: String },

    #[error("`{command}` failed for task {id} with exit code {code:?}")]
    CommandFailed {
        id: TaskId,
        command: String,
        code: Option<i32>,
    },

    #[error("Undo failed with exit code {code:?}")]
    UndoFailed { code: Option<i32> },
}

/// Errors while staging or persisting a notes file.
#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("Failed to stage notes in a temporary file: {0}")]
    Stage(#[source] std::io::Error),

    #[error("Failed to copy notes to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTML renderer errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Renderer command is empty")]
    EmptyCommand,

    #[error("Failed to run renderer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer `{program}` exited with code {code:?}")]
    Failed { program: String, code: Option<i32> },
}

/// Result type alias for mutt2task.
pub type Result<T> = std::result::Result<T, Error>;
