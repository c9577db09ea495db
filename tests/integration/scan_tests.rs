use dupsweep::duplicates::{FinderError, ScanConfig, ScanCoordinator, ScanOutcome, ScanPhase};
use dupsweep::scanner::HashAlgorithm;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn scan(root: &Path, config: ScanConfig) -> dupsweep::duplicates::ScanReport {
    match ScanCoordinator::new(config).run(root).unwrap() {
        ScanOutcome::Completed(report) => report,
        ScanOutcome::Canceled => panic!("scan unexpectedly canceled"),
    }
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let report = scan(dir.path(), ScanConfig::default());

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 0);
    assert_eq!(report.summary.duplicate_groups, 0);
}

#[test]
fn test_scan_only_equal_content_groups() {
    // A and B: 10 bytes "x", C: 10 bytes "y", D: 5 bytes "x"
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A", &[b'x'; 10]);
    let b = write(dir.path(), "B", &[b'x'; 10]);
    write(dir.path(), "C", &[b'y'; 10]);
    write(dir.path(), "D", &[b'x'; 5]);

    for lanes in [1, 2, 8] {
        let report = scan(dir.path(), ScanConfig::default().with_lanes(lanes));

        assert_eq!(report.groups.len(), 1, "lanes = {}", lanes);
        let mut members = report.groups[0].paths.clone();
        members.sort();
        assert_eq!(members, vec![a.clone(), b.clone()]);
        assert_eq!(report.groups[0].size(), 10);
        assert_eq!(report.summary.eliminated_by_size, 1);
        assert_eq!(report.summary.candidate_files, 3);
        assert_eq!(report.summary.duplicate_files, 1);
        assert_eq!(report.summary.reclaimable_space, 10);
    }
}

#[test]
fn test_scan_empty_files_form_one_group_without_hashing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "sub/e2", b"");
    write(dir.path(), "sub/deeper/e3", b"");
    write(dir.path(), "unique.txt", b"only one of these");

    let report = scan(dir.path(), ScanConfig::default());

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.size(), 0);
    assert_eq!(group.hash_hex(), "");
    assert_eq!(group.len(), 3);
    assert_eq!(report.summary.hashed_files, 0);
    assert_eq!(report.summary.candidate_files, 0);
    assert_eq!(report.summary.lanes, 0);
}

#[test]
fn test_scan_single_empty_file_is_not_a_group() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty", b"");
    write(dir.path(), "data", b"abc");

    let report = scan(dir.path(), ScanConfig::default());

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.eliminated_by_size, 2);
}

#[test]
fn test_scan_groups_sorted_by_key() {
    let dir = tempdir().unwrap();
    for name in ["big1", "big2"] {
        write(dir.path(), name, &[7u8; 300]);
    }
    for name in ["small1", "small2", "small3"] {
        write(dir.path(), name, &[1u8; 20]);
    }
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");

    let report = scan(dir.path(), ScanConfig::default().with_lanes(3));

    let sizes: Vec<u64> = report.groups.iter().map(|g| g.size()).collect();
    assert_eq!(sizes, vec![0, 20, 300]);
    assert_eq!(report.summary.duplicate_files, 1 + 2 + 1);
}

#[test]
fn test_scan_multi_block_files() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..400_000u32).map(|i| (i % 251) as u8).collect();
    let mut altered = content.clone();
    altered[399_999] ^= 0xff;

    write(dir.path(), "one.bin", &content);
    write(dir.path(), "two.bin", &content);
    write(dir.path(), "changed.bin", &altered);

    for algorithm in [HashAlgorithm::Sha224, HashAlgorithm::Blake3] {
        let report = scan(
            dir.path(),
            ScanConfig::default().with_lanes(2).with_algorithm(algorithm),
        );
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 2);
        assert!(!report.groups[0]
            .paths
            .iter()
            .any(|p| p.ends_with("changed.bin")));
        assert_eq!(report.groups[0].key.hash.len(), algorithm.digest_len());
    }
}

#[test]
fn test_scan_with_verify() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"identical bytes");
    write(dir.path(), "b", b"identical bytes");

    let report = scan(dir.path(), ScanConfig::default().with_verify(true));

    assert_eq!(report.groups.len(), 1);
    assert!(report.hash_errors.is_empty());
}

#[test]
fn test_rescan_is_stable() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path(), &format!("d{}/f{}", i % 4, i), &[(i % 5) as u8; 64]);
    }

    let first = scan(dir.path(), ScanConfig::default().with_lanes(4));
    let second = scan(dir.path(), ScanConfig::default().with_lanes(1));

    let normalize = |report: &dupsweep::duplicates::ScanReport| {
        report
            .groups
            .iter()
            .map(|g| {
                let mut paths = g.paths.clone();
                paths.sort();
                (g.key.clone(), paths)
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(normalize(&first), normalize(&second));
    assert_eq!(first.groups.len(), 5);
}

#[test]
fn test_progress_is_monotonic_and_complete() {
    let dir = tempdir().unwrap();
    let sizes = [70_000usize, 70_000, 3_000, 3_000, 200_000, 200_000];
    for (i, size) in sizes.iter().enumerate() {
        write(dir.path(), &format!("f{}", i), &vec![b'p'; *size]);
    }
    let expected: u64 = sizes.iter().map(|&s| (s as u64) >> 10).sum();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let coordinator = ScanCoordinator::new(ScanConfig::default().with_lanes(3))
        .with_progress_observer(Arc::new(move |units: u64| {
            sink.lock().unwrap().push(units);
        }));

    let handle = coordinator.start(dir.path()).unwrap();
    let outcome = handle.wait().unwrap();
    assert!(!outcome.is_canceled());

    let values = seen.lock().unwrap();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.last().copied().unwrap_or(0), expected);
}

#[test]
fn test_on_progress_after_start() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", &[1u8; 4096]);
    write(dir.path(), "b", &[1u8; 4096]);

    let latest = Arc::new(AtomicU64::new(0));
    let handle = ScanCoordinator::default().start(dir.path()).unwrap();
    let observer = Arc::clone(&latest);
    handle.on_progress(move |units: u64| observer.store(units, Ordering::SeqCst));

    let outcome = handle.wait().unwrap();
    assert!(outcome.report().is_some());
    // Registered late or early, the observer ends at the full count.
    assert_eq!(latest.load(Ordering::SeqCst), 8);
}

#[test]
fn test_scan_missing_root_fails() {
    let err = ScanCoordinator::default()
        .run(Path::new("/nonexistent/path/12345"))
        .unwrap_err();
    assert!(matches!(err, FinderError::PathNotFound(p) if p.ends_with("12345")));
}

#[test]
fn test_scan_file_root_fails() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "file.txt", b"data");

    let handle = ScanCoordinator::default().start(&file).unwrap();
    let err = handle.wait().unwrap_err();

    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[test]
fn test_phase_is_terminal_after_wait() {
    let dir = tempdir().unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let coordinator = ScanCoordinator::default().with_shutdown_flag(shutdown);

    let handle = coordinator.start(dir.path()).unwrap();
    while !handle.is_finished() {
        std::thread::yield_now();
    }
    assert_eq!(handle.phase(), ScanPhase::Completed);
    assert!(handle.wait().is_ok());
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same content");
    write(dir.path(), "b", b"same content");
    let locked = write(dir.path(), "c", b"same content");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root bypasses permission bits; only assert when the lock is effective.
    let effective = File::open(&locked).is_err();
    let report = scan(dir.path(), ScanConfig::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    if effective {
        assert_eq!(report.unhashable(), 1);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 2);
        assert_eq!(report.hash_errors[0].path(), locked.as_path());
    }
}
