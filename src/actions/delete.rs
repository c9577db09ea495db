//! File deletion for confirmed duplicates.
//!
//! # Overview
//!
//! Deletion is always invoked by the caller, never by the scan itself:
//! - Permanent removal (default)
//! - Move to system trash (recoverable)
//! - Batch operations reporting one [`DeleteOutcome`] per path
//!
//! A batch never rolls back: files removed before a failure stay removed.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::delete::{delete_files, DeleteMode};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/path/to/copy1.txt"), PathBuf::from("/path/to/copy2.txt")];
//! let report = delete_files(&paths, DeleteMode::Permanent);
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// How files are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove the file from the filesystem.
    #[default]
    Permanent,
    /// Move the file to the platform trash.
    Trash,
}

/// Error type for a single deletion.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Per-path result of a deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file was removed (or trashed).
    Deleted,
    /// The file did not exist.
    NotFound,
    /// The file could not be removed for lack of permission.
    PermissionDenied,
    /// Any other failure, with its message.
    OtherIoError(String),
}

impl DeleteOutcome {
    /// Whether the file is gone as a result of this attempt.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl From<&DeleteError> for DeleteOutcome {
    fn from(err: &DeleteError) -> Self {
        match err {
            DeleteError::NotFound(_) => Self::NotFound,
            DeleteError::PermissionDenied(_) => Self::PermissionDenied,
            other => Self::OtherIoError(other.to_string()),
        }
    }
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::OtherIoError(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    /// One outcome per requested path, in request order.
    pub outcomes: Vec<(PathBuf, DeleteOutcome)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl DeleteReport {
    /// Number of successful deletions.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_deleted()).count()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.deleted_count()
    }

    /// Whether every requested file was deleted.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    /// One-line summary for the user.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.failure_count() {
            0 => "All files were successfully deleted.".to_string(),
            1 => "1 file wasn't deleted.".to_string(),
            n => format!("{} files weren't deleted.", n),
        }
    }
}

/// Delete one file with the given mode.
///
/// # Returns
///
/// The size of the removed file in bytes.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the platform trash rejects the file
pub fn delete_file(path: &Path, mode: DeleteMode) -> Result<u64, DeleteError> {
    // Size is captured before the file goes away
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    match mode {
        DeleteMode::Permanent => {
            fs::remove_file(path).map_err(|e| {
                log::error!("Permanent delete failed for {}: {}", path.display(), e);
                DeleteError::from_io(path, e)
            })?;
            log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
        }
        DeleteMode::Trash => {
            trash::delete(path).map_err(|e| {
                log::error!("Trash operation failed for {}: {}", path.display(), e);
                DeleteError::TrashFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
            log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
        }
    }

    Ok(size)
}

/// Delete every path, continuing past failures.
///
/// # Example
///
/// ```no_run
/// use dupsweep::actions::delete::{delete_files, DeleteMode, DeleteOutcome};
/// use std::path::PathBuf;
///
/// let report = delete_files(&[PathBuf::from("/dup.txt")], DeleteMode::Trash);
/// for (path, outcome) in &report.outcomes {
///     if *outcome != DeleteOutcome::Deleted {
///         eprintln!("{}: {}", path.display(), outcome);
///     }
/// }
/// ```
pub fn delete_files(paths: &[PathBuf], mode: DeleteMode) -> DeleteReport {
    let mut report = DeleteReport::default();

    for path in paths {
        let outcome = match delete_file(path, mode) {
            Ok(size) => {
                report.bytes_freed += size;
                DeleteOutcome::Deleted
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                DeleteOutcome::from(&e)
            }
        };
        report.outcomes.push((path.clone(), outcome));
    }

    log::info!(
        "Deleted {}/{} files ({} bytes freed)",
        report.deleted_count(),
        report.outcomes.len(),
        report.bytes_freed
    );

    report
}

/// Every member of each group except the first, which is kept.
#[must_use]
pub fn redundant_copies(groups: &[DuplicateGroup]) -> Vec<PathBuf> {
    groups
        .iter()
        .flat_map(|g| g.paths.iter().skip(1).cloned())
        .collect()
}
