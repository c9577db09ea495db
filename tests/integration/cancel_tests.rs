use dupsweep::duplicates::{ScanConfig, ScanCoordinator, ScanOutcome, ScanPhase};
use dupsweep::progress::ProgressObserver;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn populate(dir: &Path, files: usize, size: usize) {
    for i in 0..files {
        fs::write(dir.join(format!("f{:04}.bin", i)), vec![b'c'; size]).unwrap();
    }
}

/// Sets the shutdown flag on the first progress update.
struct CancelOnFirstProgress {
    flag: Arc<AtomicBool>,
    finished: AtomicUsize,
}

impl ProgressObserver for CancelOnFirstProgress {
    fn on_progress(&self, _units_done: u64) {
        self.flag.store(true, Ordering::SeqCst);
    }

    fn on_finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_cancel_mid_hash_discards_results() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 40, 64 * 1024);

    let flag = Arc::new(AtomicBool::new(false));
    let observer = Arc::new(CancelOnFirstProgress {
        flag: Arc::clone(&flag),
        finished: AtomicUsize::new(0),
    });
    let coordinator = ScanCoordinator::new(ScanConfig::default().with_lanes(1))
        .with_shutdown_flag(flag)
        .with_progress_observer(observer.clone());

    let handle = coordinator.start(dir.path()).unwrap();
    let outcome = handle.wait().unwrap();

    assert!(matches!(outcome, ScanOutcome::Canceled));
    assert_eq!(observer.finished.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancel_stops_lanes_between_files() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 40, 64 * 1024);

    let flag = Arc::new(AtomicBool::new(false));
    let observer = Arc::new(CancelOnFirstProgress {
        flag: Arc::clone(&flag),
        finished: AtomicUsize::new(0),
    });
    let handle = ScanCoordinator::new(ScanConfig::default().with_lanes(2))
        .with_shutdown_flag(flag)
        .with_progress_observer(observer)
        .start(dir.path())
        .unwrap();

    // At most one in-flight file per lane completes after the flag is set.
    let last_seen = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&last_seen);
    handle.on_progress(move |units: u64| {
        seen.store(units as usize, Ordering::SeqCst);
    });

    assert!(handle.wait().unwrap().is_canceled());
    assert!(last_seen.load(Ordering::SeqCst) <= 2 * 64);
}

#[test]
fn test_handle_cancel() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 500, 64 * 1024);

    let handle = ScanCoordinator::new(ScanConfig::default().with_lanes(2))
        .start(dir.path())
        .unwrap();
    handle.cancel();
    handle.cancel(); // idempotent

    let outcome = handle.wait().unwrap();
    assert!(outcome.is_canceled());
    assert!(outcome.report().is_none());
}

#[test]
fn test_cancel_after_completion_keeps_completed() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 2, 16);

    let handle = ScanCoordinator::default().start(dir.path()).unwrap();
    while !handle.is_finished() {
        std::thread::yield_now();
    }
    handle.cancel();

    assert_eq!(handle.phase(), ScanPhase::Completed);
    let outcome = handle.wait().unwrap();
    assert_eq!(outcome.report().map(|r| r.groups.len()), Some(1));
}

#[test]
fn test_preset_shutdown_flag_cancels_during_collection() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 3, 16);

    let outcome = ScanCoordinator::default()
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)))
        .run(dir.path())
        .unwrap();

    assert!(outcome.is_canceled());
}
