//! mutt2task — turn an email into a Taskwarrior task with a notes file.

pub mod config;
pub mod error;
pub mod message;
pub mod notes;
pub mod pipeline;
pub mod tracker;
