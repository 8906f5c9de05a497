//! Configuration types.
//!
//! Settings come from the environment. The notes folder itself is resolved
//! from the taskopen configuration file (`~/.taskopenrc`), which this program
//! shares with `taskopen`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ConfigError;

/// Name of the configuration file looked up in the home directory.
pub const TASKOPENRC_FILE: &str = ".taskopenrc";

/// Notes folder used when the configuration file does not name one.
pub const DEFAULT_NOTES_DIR: &str = ".tasknotes";

/// Default HTML renderer command line.
pub const DEFAULT_HTML_RENDERER: &str = "elinks --dump";

/// Default task-tracker executable.
pub const DEFAULT_TASK_BIN: &str = "task";

/// Permissions for a freshly created notes folder.
#[cfg(unix)]
const NOTES_DIR_MODE: u32 = 0o750;

static NOTES_FOLDER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^#]*\s*NOTES_FOLDER\s*=\s*(.*)$").expect("NOTES_FOLDER pattern is valid")
});

/// Runtime settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub home_dir: PathBuf,
    /// Path of the taskopen configuration file (may not exist).
    pub taskopenrc: PathBuf,
    /// Task-tracker executable.
    pub task_bin: String,
    /// HTML renderer program followed by its arguments.
    pub html_renderer: Vec<String>,
}

impl Settings {
    /// Build settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from a variable lookup.
    ///
    /// `HOME` is required. `MUTT2TASK_TASKOPENRC`, `MUTT2TASK_TASK_BIN` and
    /// `MUTT2TASK_HTML_RENDERER` override the defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let home_dir = var("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("HOME".to_string()))?;

        let taskopenrc = var("MUTT2TASK_TASKOPENRC")
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir.join(TASKOPENRC_FILE));

        let task_bin = var("MUTT2TASK_TASK_BIN").unwrap_or_else(|| DEFAULT_TASK_BIN.to_string());

        let renderer =
            var("MUTT2TASK_HTML_RENDERER").unwrap_or_else(|| DEFAULT_HTML_RENDERER.to_string());
        let html_renderer = split_command(&renderer);
        if html_renderer.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "MUTT2TASK_HTML_RENDERER".to_string(),
                message: "command must not be empty".to_string(),
            });
        }

        Ok(Self {
            home_dir,
            taskopenrc,
            task_bin,
            html_renderer,
        })
    }

    /// Resolve the notes folder and make sure it exists.
    pub fn notes_folder(&self) -> Result<PathBuf, ConfigError> {
        let folder = resolve_notes_folder(&self.taskopenrc, &self.home_dir)?;
        ensure_notes_folder(&folder)?;
        Ok(folder)
    }
}

/// Split a command line on whitespace. No quoting support.
pub fn split_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(str::to_string).collect()
}

/// Find the notes folder named in taskopenrc contents.
///
/// The last `NOTES_FOLDER = ...` line wins. The value is trimmed, stripped of
/// surrounding double quotes and has `$HOME` expanded. Returns `None` when no
/// line names a non-empty folder.
pub fn notes_folder_from_rc(contents: &str, home_dir: &Path) -> Option<PathBuf> {
    let value = contents
        .lines()
        .filter_map(|line| NOTES_FOLDER_LINE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches('"').to_string())
        .last()?;

    let home = home_dir.to_string_lossy();
    let expanded = value.replace("$HOME", &home);
    if expanded.is_empty() {
        return None;
    }
    Some(PathBuf::from(expanded))
}

/// Resolve the notes folder from the configuration file, falling back to
/// `~/.tasknotes` when the file is absent or names no folder.
pub fn resolve_notes_folder(taskopenrc: &Path, home_dir: &Path) -> Result<PathBuf, ConfigError> {
    let from_rc = if taskopenrc.exists() {
        let contents = std::fs::read(taskopenrc).map_err(|source| ConfigError::Read {
            path: taskopenrc.to_path_buf(),
            source,
        })?;
        notes_folder_from_rc(&String::from_utf8_lossy(&contents), home_dir)
    } else {
        None
    };

    let folder = from_rc.unwrap_or_else(|| home_dir.join(DEFAULT_NOTES_DIR));
    debug!(folder = %folder.display(), "Resolved notes folder");
    Ok(folder)
}

/// Create the notes folder (mode 0750 on unix) if it does not exist yet.
pub fn ensure_notes_folder(folder: &Path) -> Result<(), ConfigError> {
    if folder.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(NOTES_DIR_MODE);
    }

    builder
        .create(folder)
        .map_err(|source| ConfigError::CreateDir {
            path: folder.to_path_buf(),
            source,
        })
}
