//! Error types shared across the cache and menu engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why loading or rendering a served artifact failed.
#[derive(Debug, Error)]
pub enum FileError {
    /// The path did not exist at load time.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A stat, open, read, or directory-enumeration failure.
    #[error("io error on {}: {}", .path.display(), .source)]
    Io {
        /// The path the operation failed on.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Malformed gophermap structure. Currently never produced; reserved for
    /// stricter directive validation.
    #[error("malformed gophermap: {}", .0.display())]
    Parse(PathBuf),
}

impl FileError {
    /// Wraps an [`std::io::Error`], distinguishing the not-found cause.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// True if the underlying cause was a missing path.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
