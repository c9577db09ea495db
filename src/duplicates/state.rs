//! Scan-scoped shared state.
//!
//! One [`ScanState`] is created per scan and shared by `Arc` with every lane
//! worker. It is never reused: a new scan always gets a fresh state.
//!
//! The progress counter and the [`Aggregator`] live behind a single mutex.
//! Critical sections are an increment or a list append and never span file
//! I/O or observer callbacks.
//!
//! Observers are notified after that lock is released, through a separate
//! delivery lock that lanes only ever try to take. Whoever holds it delivers
//! the latest published count and re-checks after releasing it, so a count
//! published while another thread was delivering is never lost and values
//! reach observers in non-decreasing order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};

use super::aggregator::Aggregator;
use super::groups::{ContentKey, DuplicateGroup};
use crate::progress::{ProgressObserver, ProgressSink};
use crate::scanner::HashError;

/// Lifecycle of a scan.
///
/// `Idle → Scanning → {Completed, Canceled, Failed}`; terminal phases are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Created but not started
    Idle,
    /// Collecting, filtering or hashing
    Scanning,
    /// Every lane exhausted its files
    Completed,
    /// Stopped cooperatively after cancellation
    Canceled,
    /// The root directory could not be scanned
    Failed,
}

impl ScanPhase {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }
}

struct Shared {
    progress: u64,
    aggregator: Aggregator,
}

impl Shared {
    fn advance(&mut self, units: u64, published: &AtomicU64) {
        self.progress += units;
        published.store(self.progress, Ordering::SeqCst);
    }
}

struct Delivery {
    delivered: u64,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

/// Shared state for one scan.
pub struct ScanState {
    shared: Mutex<Shared>,
    published: AtomicU64,
    delivery: Mutex<Delivery>,
    canceled: Arc<AtomicBool>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    phase: Mutex<ScanPhase>,
    total_units: OnceLock<u64>,
    hashed_files: AtomicUsize,
    hash_errors: Mutex<Vec<HashError>>,
}

impl std::fmt::Debug for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanState")
            .field("phase", &self.phase())
            .field("progress", &self.progress())
            .field("canceled", &self.is_canceled())
            .field("total_units", &self.total_units.get())
            .finish()
    }
}

impl ScanState {
    /// Create a fresh state in the [`ScanPhase::Idle`] phase.
    ///
    /// # Arguments
    ///
    /// * `shutdown_flag` - Optional external flag (e.g. Ctrl+C) honored like
    ///   [`cancel`](Self::cancel)
    #[must_use]
    pub fn new(shutdown_flag: Option<Arc<AtomicBool>>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                progress: 0,
                aggregator: Aggregator::new(),
            }),
            published: AtomicU64::new(0),
            delivery: Mutex::new(Delivery {
                delivered: 0,
                observers: Vec::new(),
            }),
            canceled: Arc::new(AtomicBool::new(false)),
            shutdown_flag,
            phase: Mutex::new(ScanPhase::Idle),
            total_units: OnceLock::new(),
            hashed_files: AtomicUsize::new(0),
            hash_errors: Mutex::new(Vec::new()),
        }
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_delivery(&self) -> MutexGuard<'_, Delivery> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the latest published count to observers, outside the scan lock.
    ///
    /// Returns immediately if another thread is delivering; that thread picks
    /// up the new count before it lets go.
    fn deliver(&self) {
        loop {
            let mut delivery = match self.delivery.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            let target = self.published.load(Ordering::SeqCst);
            if target > delivery.delivered {
                delivery.delivered = target;
                for observer in &delivery.observers {
                    observer.on_progress(target);
                }
            }
            let delivered = delivery.delivered;
            drop(delivery);

            if self.published.load(Ordering::SeqCst) <= delivered {
                return;
            }
        }
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested through this state or the
    /// external shutdown flag.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
            || self
                .shutdown_flag
                .as_ref()
                .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Flags a directory walk should watch for cancellation.
    pub(crate) fn cancel_flags(&self) -> impl Iterator<Item = Arc<AtomicBool>> + '_ {
        std::iter::once(Arc::clone(&self.canceled)).chain(self.shutdown_flag.iter().cloned())
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next`, unless the current phase is terminal.
    ///
    /// Returns whether the transition happened.
    pub fn transition(&self, next: ScanPhase) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if phase.is_terminal() {
            log::debug!("Ignoring transition {:?} -> {:?}", *phase, next);
            return false;
        }
        log::trace!("Scan phase {:?} -> {:?}", *phase, next);
        *phase = next;
        true
    }

    /// Register a progress observer.
    ///
    /// A late observer is immediately told the range (if known) and the
    /// count delivered so far. Must not be called from inside an observer.
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        {
            let mut delivery = self.lock_delivery();
            if let Some(&total) = self.total_units.get() {
                observer.on_total(total);
                observer.on_progress(delivery.delivered);
            }
            delivery.observers.push(observer);
        }
        self.deliver();
    }

    /// Fix the progress range and announce it to observers.
    pub fn set_total_units(&self, total: u64) {
        let delivery = self.lock_delivery();
        if self.total_units.set(total).is_ok() {
            for observer in &delivery.observers {
                observer.on_total(total);
            }
        }
    }

    /// Progress range in KiB, once known.
    #[must_use]
    pub fn total_units(&self) -> Option<u64> {
        self.total_units.get().copied()
    }

    /// KiB hashed so far.
    #[must_use]
    pub fn progress(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    /// Record a hashed file under its content key.
    pub fn record(&self, key: ContentKey, path: PathBuf) {
        self.lock_shared().aggregator.insert(key, path);
        self.hashed_files.fetch_add(1, Ordering::SeqCst);
    }

    /// Record the zero-byte group, which needs no hashing.
    pub fn record_empty_files(&self, paths: Vec<PathBuf>) {
        if paths.len() > 1 {
            self.lock_shared()
                .aggregator
                .extend(ContentKey::empty(), paths);
        }
    }

    /// Record a file that could not be hashed.
    pub fn record_failure(&self, error: HashError) {
        self.hash_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    /// Number of files hashed successfully.
    #[must_use]
    pub fn hashed_files(&self) -> usize {
        self.hashed_files.load(Ordering::SeqCst)
    }

    /// Number of files that could not be hashed.
    #[must_use]
    pub fn unhashable_files(&self) -> usize {
        self.hash_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drain the aggregated groups (2+ members, key order).
    pub fn take_groups(&self) -> Vec<DuplicateGroup> {
        std::mem::take(&mut self.lock_shared().aggregator).into_groups()
    }

    /// Drain the recorded hash errors.
    pub fn take_hash_errors(&self) -> Vec<HashError> {
        std::mem::take(&mut *self.hash_errors.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Tell observers the scan is over.
    pub fn notify_finished(&self) {
        self.deliver();
        for observer in &self.lock_delivery().observers {
            observer.on_finish();
        }
    }
}

impl ProgressSink for ScanState {
    fn try_publish(&self, units: u64) -> bool {
        match self.shared.try_lock() {
            Ok(mut shared) => shared.advance(units, &self.published),
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().advance(units, &self.published);
            }
            Err(TryLockError::WouldBlock) => return false,
        }
        self.deliver();
        true
    }

    fn publish(&self, units: u64) {
        self.lock_shared().advance(units, &self.published);
        self.deliver();
    }
}
