// Fatal error taxonomy. Anything scoped to a single file never becomes one
// of these: it is recorded as a failed outcome by the batch uploader.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing credential or an unusable option value.
    #[error("{message}\n{hint}")]
    Configuration { message: String, hint: String },

    /// Source directory missing or unreadable.
    #[error("Folder \"{}\" does not exist or is not accessible: {err}\nPass an existing folder as the first argument (default: ./images)", path.display())]
    Directory {
        path: PathBuf,
        err: std::io::Error,
    },

    /// The results file could not be written.
    #[error("Failed to save results to {}: {err}", path.display())]
    Persistence {
        path: PathBuf,
        err: std::io::Error,
    },
}

impl AppError {
    pub fn directory(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        AppError::Directory {
            path: path.into(),
            err,
        }
    }
}
