//! Small async filesystem helpers used by the catalog and the asset store.

use std::io;
use std::path::{Path, PathBuf};

use crate::layout::is_media_file_name;
use crate::types::Timestamp;

/// `true` if `path` exists and is a directory. A missing path is not an error.
pub async fn is_dir(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// `true` if `path` exists and is a regular file.
pub async fn is_file(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Sorted names of the media files directly inside `dir`.
///
/// Caption files, hidden files and subdirectories are skipped. A missing
/// directory yields an empty list.
pub async fn list_media_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
            continue;
        };
        if is_media_file_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Creation time of a file or directory, falling back to its modification time.
pub fn created_at(meta: &std::fs::Metadata) -> Option<Timestamp> {
    meta.created().or_else(|_| meta.modified()).ok().map(Timestamp::from)
}

/// Move `from` to `to`, copying across filesystems when a rename is not possible.
pub async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                error = %rename_err,
                from = %from.display(),
                to = %to.display(),
                "Rename failed, falling back to copy"
            );
            tokio::fs::copy(from, to).await?;
            if let Err(e) = tokio::fs::remove_file(from).await {
                tracing::warn!(error = %e, path = %from.display(), "Failed to remove staged file");
            }
            Ok(())
        }
    }
}

/// Tracks directories created during a multi-step operation so they can be
/// removed again if a later step fails.
///
/// Directories that already existed are never recorded and never removed.
#[derive(Debug, Default)]
pub struct DirTransaction {
    created: Vec<PathBuf>,
}

impl DirTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single directory (its parent must exist). An existing
    /// directory is accepted; an existing non-directory is an error.
    pub async fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        match tokio::fs::create_dir(path).await {
            Ok(()) => {
                self.created.push(path.to_path_buf());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if is_dir(path).await? {
                    Ok(())
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} exists and is not a directory", path.display()),
                    ))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Remove every directory this transaction created, newest first.
    pub async fn rollback(self) {
        for path in self.created.iter().rev() {
            if let Err(e) = tokio::fs::remove_dir(path).await {
                tracing::warn!(error = %e, path = %path.display(), "Rollback failed to remove directory");
            }
        }
    }

    /// Keep everything that was created.
    pub fn commit(self) -> Vec<PathBuf> {
        self.created
    }
}
