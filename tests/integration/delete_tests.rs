use dupsweep::actions::{delete_files, redundant_copies, DeleteMode, DeleteOutcome};
use dupsweep::duplicates::{ScanCoordinator, ScanOutcome};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_delete_redundant_copies_after_scan() {
    let dir = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        fs::write(dir.path().join(name), b"duplicate body").unwrap();
    }
    fs::write(dir.path().join("unique.txt"), b"something else entirely").unwrap();

    let report = match ScanCoordinator::default().run(dir.path()).unwrap() {
        ScanOutcome::Completed(report) => report,
        ScanOutcome::Canceled => panic!("unexpected cancel"),
    };
    let keep = report.groups[0].paths[0].clone();
    let targets = redundant_copies(&report.groups);
    assert_eq!(targets.len(), 2);

    let deletion = delete_files(&targets, DeleteMode::Permanent);

    assert!(deletion.all_succeeded());
    assert_eq!(deletion.bytes_freed, 2 * 14);
    assert!(keep.exists());
    assert!(dir.path().join("unique.txt").exists());
    for target in &targets {
        assert!(!target.exists());
    }

    // A rescan finds nothing left to remove.
    let rescan = ScanCoordinator::default().run(dir.path()).unwrap();
    assert!(rescan.report().is_some_and(|r| r.groups.is_empty()));
}

#[test]
fn test_delete_continues_past_failures() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    fs::write(&present, b"x").unwrap();
    let missing = dir.path().join("missing.txt");

    let report = delete_files(&[missing.clone(), present.clone()], DeleteMode::Permanent);

    assert_eq!(report.outcomes[0], (missing, DeleteOutcome::NotFound));
    assert_eq!(report.outcomes[1], (present.clone(), DeleteOutcome::Deleted));
    assert_eq!(report.summary(), "1 file wasn't deleted.");
    assert!(!present.exists());
}

#[test]
fn test_delete_directory_is_refused() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();

    let report = delete_files(&[sub.clone()], DeleteMode::Permanent);

    assert!(!report.outcomes[0].1.is_deleted());
    assert!(!report.all_succeeded());
    assert!(sub.exists());
}
