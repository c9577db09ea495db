//! Directory collector built on `walkdir`.
//!
//! # Overview
//!
//! [`FileCollector`] enumerates every regular file below a root directory and
//! records its size. `walkdir` keeps pending directories on its own stack
//! rather than the call stack, so arbitrarily deep trees cannot overflow it,
//! and siblings are visited in file-name order.
//!
//! Symbolic links are never followed or reported, whether they point at
//! files or directories. Entries that cannot be inspected (permission denied,
//! removed mid-walk) are logged, remembered in [`Collection::skipped`], and
//! the walk carries on.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::FileCollector;
//! use std::path::Path;
//!
//! let collection = FileCollector::new(Path::new("/home/user/Downloads"))
//!     .collect()
//!     .expect("root must exist");
//! println!(
//!     "{} files, {} entries skipped",
//!     collection.records.len(),
//!     collection.skipped.len()
//! );
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileRecord, ScanError};

/// Result of a directory collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    /// Regular files found, in traversal order
    pub records: Vec<FileRecord>,
    /// Entries that were skipped because they could not be read
    pub skipped: Vec<ScanError>,
    /// Number of directories visited (including the root)
    pub directories: usize,
    /// Whether collection stopped early because cancellation was requested
    pub interrupted: bool,
}

/// Recursive file collector.
#[derive(Debug)]
pub struct FileCollector {
    root: PathBuf,
    shutdown_flags: Vec<Arc<AtomicBool>>,
}

impl FileCollector {
    /// Create a collector rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            shutdown_flags: Vec::new(),
        }
    }

    /// Add a cancellation flag, checked before entering each directory.
    ///
    /// May be called more than once; the walk stops when any flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flags.push(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flags.iter().any(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree and collect every regular file.
    ///
    /// Files come out depth first, siblings in file-name order.
    ///
    /// # Errors
    ///
    /// Fails only for the root itself: [`ScanError::NotFound`] when it does
    /// not exist and [`ScanError::NotADirectory`] when it is not a
    /// directory. Everything below the root is best-effort.
    pub fn collect(&self) -> Result<Collection, ScanError> {
        let root_meta = fs::metadata(&self.root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScanError::NotFound(self.root.clone()),
            _ => ScanError::from_io(self.root.clone(), e),
        })?;
        if !root_meta.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let mut collection = Collection::default();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    collection.skipped.push(self.skip(e));
                    continue;
                }
            };

            // Without follow_links the file type is that of the link itself.
            let file_type = entry.file_type();
            if file_type.is_dir() {
                if self.is_shutdown_requested() {
                    log::debug!("Collector: cancellation requested, stopping walk");
                    collection.interrupted = true;
                    break;
                }
                collection.directories += 1;
            } else if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => collection
                        .records
                        .push(FileRecord::new(entry.into_path(), meta.len())),
                    Err(e) => collection.skipped.push(self.skip(e)),
                }
            } else {
                log::trace!("Skipping special file: {}", entry.path().display());
            }
        }

        log::debug!(
            "Collected {} files from {} directories ({} skipped)",
            collection.records.len(),
            collection.directories,
            collection.skipped.len()
        );

        Ok(collection)
    }

    fn skip(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let err = ScanError::from_io(path, error.into());
        match &err {
            ScanError::NotFound(path) => {
                log::debug!("Entry vanished during walk: {}", path.display());
            }
            _ => log::warn!("Skipping {}", err),
        }
        err
    }
}
