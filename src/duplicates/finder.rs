//! Scan coordinator: runs the duplicate detection pipeline.
//!
//! # Overview
//!
//! The pipeline runs in four stages:
//! 1. **Collect** - walk the tree with [`FileCollector`]
//! 2. **Filter** - drop size-unique files, group empty files ([`filter_by_size`])
//! 3. **Distribute** - split candidates into byte-balanced lanes ([`distribute`])
//! 4. **Hash** - one worker per lane hashes its files and records them in
//!    the scan's [`Aggregator`](super::Aggregator)
//!
//! Stages 1-3 run on the coordinator thread. Stage 4 runs on a dedicated
//! rayon pool with one thread per lane. Cancellation is checked between
//! files only; a file being hashed always completes.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{ScanConfig, ScanCoordinator, ScanOutcome};
//! use std::path::Path;
//!
//! let coordinator = ScanCoordinator::new(ScanConfig::default().with_lanes(4));
//! let handle = coordinator.start(Path::new("/some/path")).unwrap();
//! handle.on_progress(|kib: u64| eprintln!("{} KiB hashed", kib));
//!
//! match handle.wait().unwrap() {
//!     ScanOutcome::Completed(report) => {
//!         println!("Found {} duplicate groups", report.groups.len());
//!     }
//!     ScanOutcome::Canceled => println!("Scan canceled"),
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::distributor::{distribute, Lane};
use super::groups::{filter_by_size, ContentKey, DuplicateGroup};
use super::state::{ScanPhase, ScanState};
use super::verify::confirm_groups;
use crate::progress::ProgressObserver;
use crate::scanner::{FileCollector, HashAlgorithm, HashError, Hasher, ScanError};

/// Configuration for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Upper bound on concurrent hashing lanes (at least 1).
    pub lanes: usize,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Confirm hash-equal groups byte for byte.
    pub verify: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            algorithm: HashAlgorithm::default(),
            verify: false,
        }
    }
}

impl ScanConfig {
    /// Set the lane count (clamped to at least 1).
    #[must_use]
    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable/disable byte-for-byte confirmation.
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// Lane count used when none is configured: the machine's parallelism.
#[must_use]
pub fn default_lanes() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Summary statistics for a completed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Regular files found under the root
    pub total_files: usize,
    /// Directories visited
    pub directories: usize,
    /// Entries skipped during collection
    pub skipped_entries: usize,
    /// Files eliminated because their size was unique
    pub eliminated_by_size: usize,
    /// Zero-byte files grouped without hashing
    pub empty_files: usize,
    /// Files sent to the hashing lanes
    pub candidate_files: usize,
    /// Sum of candidate sizes in bytes
    pub total_candidate_bytes: u64,
    /// Sum of whole KiB per candidate
    pub candidate_units: u64,
    /// Lanes actually used
    pub lanes: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files that could not be hashed or verified
    pub unhashable_files: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (members minus one per group)
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Human-readable reclaimable space.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }

    /// Progress range in KiB.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.candidate_units
    }
}

/// Result of a completed scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Duplicate groups in ascending [`ContentKey`] order
    pub groups: Vec<DuplicateGroup>,
    /// Files excluded because hashing (or verification) failed
    pub hash_errors: Vec<HashError>,
    /// Entries skipped while collecting
    pub skipped: Vec<ScanError>,
    /// Statistics
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Number of files that could not be hashed.
    #[must_use]
    pub fn unhashable(&self) -> usize {
        self.hash_errors.len()
    }

    /// Whether the scan completed with non-fatal errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.hash_errors.is_empty() || !self.skipped.is_empty()
    }
}

/// Terminal outcome of a scan that did not fail.
#[derive(Debug)]
pub enum ScanOutcome {
    /// Every lane processed all of its files.
    Completed(ScanReport),
    /// The scan was canceled; partial results are discarded.
    Canceled,
}

impl ScanOutcome {
    /// The report, if the scan completed.
    #[must_use]
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Canceled => None,
        }
    }

    /// Whether the scan was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root could not be inspected.
    #[error(transparent)]
    ScanError(ScanError),

    /// The coordinator thread could not be spawned.
    #[error("Failed to start scan thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The hashing thread pool could not be built.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A scan thread panicked.
    #[error("Scan thread panicked")]
    Panicked,
}

impl From<ScanError> for FinderError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::NotFound(p) => Self::PathNotFound(p),
            ScanError::NotADirectory(p) => Self::NotADirectory(p),
            other => Self::ScanError(other),
        }
    }
}

/// Entry point for scans.
///
/// A coordinator can start any number of scans; each gets its own
/// [`ScanState`].
#[derive(Clone, Default)]
pub struct ScanCoordinator {
    config: ScanConfig,
    observers: Vec<Arc<dyn ProgressObserver>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .field("shutdown_flag", &self.shutdown_flag)
            .finish()
    }
}

impl ScanCoordinator {
    /// Create a coordinator with the given configuration.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            shutdown_flag: None,
        }
    }

    /// Attach a progress observer to every scan started from now on.
    #[must_use]
    pub fn with_progress_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Set an external shutdown flag (e.g. Ctrl+C) that cancels scans.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The scan configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Start scanning `root` on a background thread and return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Spawn`] if the scan thread cannot be created.
    /// Problems with `root` itself are reported by [`ScanHandle::wait`].
    pub fn start(&self, root: &Path) -> Result<ScanHandle, FinderError> {
        let state = Arc::new(ScanState::new(self.shutdown_flag.clone()));
        for observer in &self.observers {
            state.add_observer(Arc::clone(observer));
        }

        let worker_state = Arc::clone(&state);
        let config = self.config.clone();
        let root = root.to_path_buf();
        let worker = std::thread::Builder::new()
            .name("dupsweep-scan".to_string())
            .spawn(move || run_scan(&root, &config, &worker_state))
            .map_err(FinderError::Spawn)?;

        Ok(ScanHandle {
            state,
            worker: Some(worker),
        })
    }

    /// Scan `root` and block until the scan ends.
    ///
    /// # Errors
    ///
    /// Same as [`ScanHandle::wait`].
    pub fn run(&self, root: &Path) -> Result<ScanOutcome, FinderError> {
        self.start(root)?.wait()
    }
}

/// Handle to a running scan.
#[derive(Debug)]
pub struct ScanHandle {
    state: Arc<ScanState>,
    worker: Option<JoinHandle<Result<ScanOutcome, FinderError>>>,
}

impl ScanHandle {
    /// Register a progress observer (any `Fn(u64) + Send + Sync` works).
    ///
    /// Observers run on worker threads.
    pub fn on_progress<O>(&self, observer: O)
    where
        O: ProgressObserver + 'static,
    {
        self.state.add_observer(Arc::new(observer));
    }

    /// Request cooperative cancellation. Never blocks.
    pub fn cancel(&self) {
        log::info!("Scan cancellation requested");
        self.state.cancel();
    }

    /// KiB hashed so far.
    #[must_use]
    pub fn progress(&self) -> u64 {
        self.state.progress()
    }

    /// Progress range in KiB, once size filtering has finished.
    #[must_use]
    pub fn total_units(&self) -> Option<u64> {
        self.state.total_units()
    }

    /// Current phase of the scan.
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.state.phase()
    }

    /// Whether the scan thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the scan completes, is canceled, or fails.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::PathNotFound`] / [`FinderError::NotADirectory`]
    /// when the root cannot be scanned, and [`FinderError::Panicked`] if the
    /// scan thread panicked.
    pub fn wait(mut self) -> Result<ScanOutcome, FinderError> {
        let Some(worker) = self.worker.take() else {
            return Err(FinderError::Panicked);
        };
        worker.join().map_err(|_| {
            self.state.transition(ScanPhase::Failed);
            FinderError::Panicked
        })?
    }
}

/// Run the whole pipeline on the current thread.
fn run_scan(
    root: &Path,
    config: &ScanConfig,
    state: &Arc<ScanState>,
) -> Result<ScanOutcome, FinderError> {
    let result = run_pipeline(root, config, state);
    let phase = match &result {
        Ok(ScanOutcome::Completed(_)) => ScanPhase::Completed,
        Ok(ScanOutcome::Canceled) => ScanPhase::Canceled,
        Err(_) => ScanPhase::Failed,
    };
    state.transition(phase);
    state.notify_finished();
    result
}

fn run_pipeline(
    root: &Path,
    config: &ScanConfig,
    state: &Arc<ScanState>,
) -> Result<ScanOutcome, FinderError> {
    let start_time = Instant::now();
    state.transition(ScanPhase::Scanning);
    log::info!("Starting duplicate scan of {}", root.display());

    // Stage 1: collect
    let mut collector = FileCollector::new(root);
    for flag in state.cancel_flags() {
        collector = collector.with_shutdown_flag(flag);
    }
    let collection = collector.collect().map_err(|e| {
        log::error!("Cannot scan {}: {}", root.display(), e);
        FinderError::from(e)
    })?;

    if collection.interrupted || state.is_canceled() {
        log::info!("Scan canceled during collection");
        return Ok(ScanOutcome::Canceled);
    }

    let mut summary = ScanSummary {
        total_files: collection.records.len(),
        directories: collection.directories,
        skipped_entries: collection.skipped.len(),
        ..ScanSummary::default()
    };
    log::info!(
        "Found {} files in {} directories",
        summary.total_files,
        summary.directories
    );

    // Stage 2: size filter
    let filtered = filter_by_size(collection.records);
    summary.eliminated_by_size = filtered.stats.eliminated_unique;
    summary.empty_files = filtered.stats.empty_files;
    summary.candidate_files = filtered.stats.candidates;
    summary.total_candidate_bytes = filtered.total_candidate_bytes;
    summary.candidate_units = filtered.total_candidate_units;

    // Each file contributes its own whole KiB, so the range is summed per file.
    state.set_total_units(filtered.total_candidate_units);
    state.record_empty_files(filtered.empty_files);

    // Stage 3: distribute
    let lanes = distribute(filtered.candidates, config.lanes);
    summary.lanes = lanes.len();

    // Stage 4: hash
    if !lanes.is_empty() {
        log::info!(
            "Hashing {} files ({}) across {} lanes with {}",
            summary.candidate_files,
            bytesize::ByteSize(summary.total_candidate_bytes),
            lanes.len(),
            config.algorithm
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(lanes.len())
            .thread_name(|i| format!("dupsweep-lane-{}", i))
            .build()?;
        let hasher = Hasher::new(config.algorithm);

        pool.install(|| {
            lanes
                .par_iter()
                .with_max_len(1)
                .for_each(|lane| hash_lane(lane, &hasher, state));
        });
    }

    if state.is_canceled() {
        log::info!("Scan canceled after {} files hashed", state.hashed_files());
        return Ok(ScanOutcome::Canceled);
    }

    let mut groups = state.take_groups();
    let mut hash_errors = state.take_hash_errors();
    if config.verify {
        log::info!("Verifying {} groups byte for byte", groups.len());
        let (confirmed, failed) = confirm_groups(groups);
        groups = confirmed;
        hash_errors.extend(failed);
    }

    summary.hashed_files = state.hashed_files();
    summary.unhashable_files = hash_errors.len();
    summary.duplicate_groups = groups.len();
    summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    summary.scan_duration = start_time.elapsed();

    log::info!(
        "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display()
    );
    if summary.unhashable_files > 0 {
        log::warn!("{} files could not be hashed", summary.unhashable_files);
    }

    Ok(ScanOutcome::Completed(ScanReport {
        groups,
        hash_errors,
        skipped: collection.skipped,
        summary,
    }))
}

/// Hash one lane's files in order, stopping early on cancellation.
fn hash_lane(lane: &Lane, hasher: &Hasher, state: &ScanState) {
    log::debug!(
        "Lane {} starting: {} files, {} bytes",
        lane.index,
        lane.len(),
        lane.total_bytes
    );

    for file in &lane.files {
        if state.is_canceled() {
            log::debug!("Lane {}: cancellation observed, stopping", lane.index);
            return;
        }

        match hasher.hash_file(&file.path, state) {
            Ok(hash) => state.record(ContentKey::new(file.size, hash), file.path.clone()),
            Err(e) => {
                log::warn!("Failed to hash {}", e);
                state.record_failure(e);
            }
        }
    }

    log::debug!("Lane {} finished", lane.index);
}
