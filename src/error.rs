use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can go wrong while converting posts. Each variant carries
/// the directory (or path) it is about, so messages can be reported as-is.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Path not found or not a directory: '{}'", .0.display())]
    InvalidPath(PathBuf),

    #[error("No '{data_file}' post data found in '{}'", .dir.display())]
    EmptyInput { dir: PathBuf, data_file: String },

    #[error("Error parsing post data in '{}': {reason}", .dir.display())]
    Parse { dir: PathBuf, reason: String },

    #[error("Error writing '{}' for post '{}': {source}", .path.display(), .dir.display())]
    Write {
        dir: PathBuf,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error loading template '{name}': {reason}")]
    Template { name: String, reason: String },
}

impl ConvertError {
    pub fn parse(dir: &Path, reason: impl ToString) -> Self {
        ConvertError::Parse {
            dir: dir.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// The post directory this error is about, if it concerns a single post.
    pub fn post_dir(&self) -> Option<&Path> {
        match self {
            ConvertError::Parse { dir, .. } | ConvertError::Write { dir, .. } => Some(dir),
            _ => None,
        }
    }

    /// Per-post errors may be skipped in batch mode, the others always abort.
    pub fn is_recoverable(&self) -> bool {
        self.post_dir().is_some()
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
