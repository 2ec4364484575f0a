// Directory scanning: find the files in one folder that are worth sending
// to the upload service. SVG is deliberately absent from the allow-list;
// the service mishandles it, so it is filtered out before any request.

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Extensions accepted for upload, dot included.
pub const SUPPORTED_FORMATS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// A file selected by the scan, consumed once by the batch uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    path: PathBuf,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ImageFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as the display and report name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Whether `name` carries one of the supported extensions (case-insensitive).
pub fn is_eligible(name: &str) -> bool {
    // A leading dot marks a hidden file, not an extension: ".png" has none.
    let dot = match name.rfind('.') {
        Some(0) | None => return false,
        Some(dot) => dot,
    };
    let ext = name[dot..].to_lowercase();
    SUPPORTED_FORMATS.contains(&ext.as_str())
}

/// List the immediate entries of `dir` and keep the eligible regular files,
/// in the order the filesystem yields them.
pub fn scan(dir: &Path) -> Result<Vec<ImageFile>, AppError> {
    let entries = std::fs::read_dir(dir).map_err(|e| AppError::directory(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::directory(dir, e))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if !is_eligible(&name) {
            debug!("Skipping unsupported file: {}", path.display());
            continue;
        }

        // fs::metadata follows symlinks, so a link to a directory is excluded
        // and a link to a regular file is kept.
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(ImageFile::new(path)),
            Ok(_) => debug!("Skipping non-file entry: {}", path.display()),
            Err(e) => warn!("Cannot stat {}: {e}", path.display()),
        }
    }

    debug!("Found {} eligible file(s) in {}", files.len(), dir.display());
    Ok(files)
}
