//! Local file storage for uploaded cover photos.

use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};

/// Stores uploads under `<root>/users/<user id>/`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Save `content` for `user_id`, returning the stored path.
    pub fn save_file(&self, content: &[u8], original_filename: &str, user_id: &str) -> Result<PathBuf> {
        let target_dir = self.root.join("users").join(user_id);

        std::fs::create_dir_all(&target_dir).map_err(|e| {
            tracing::warn!(dir = %target_dir.display(), error = %e, "Failed to create upload folder");
            AppError::Io(e)
        })?;

        let stem = uuid::Uuid::new_v4().simple().to_string();
        let file_name = match file_extension(original_filename) {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };
        let target = target_dir.join(file_name);

        std::fs::write(&target, content).map_err(|e| {
            tracing::error!(path = %target.display(), error = %e, "File was not saved");
            AppError::Io(e)
        })?;

        tracing::info!(path = %target.display(), bytes = content.len(), "File saved");
        Ok(target)
    }
}

/// Read a stored file, logging and returning `None` on failure.
pub fn read_file(path: &str) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path, error = %e, "No file found in the path");
            None
        }
    }
}

/// Delete a stored file. Failures are logged and otherwise ignored.
pub fn remove_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "File removed"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "File was not removed"),
    }
}

/// Lowercased extension after the last '.', if any.
fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains(['/', '\\']) {
        return None;
    }
    Some(ext.to_lowercase())
}
