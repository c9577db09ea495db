use clap::Parser;
use dupsweep::cli::Cli;
use dupsweep::error::ExitCode;
use dupsweep::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupsweep"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_scan_exit_code_with_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"twin").unwrap();
    fs::write(dir.path().join("b"), b"twin").unwrap();

    let code = run(&["-q", "scan", path_str(dir.path()), "--no-progress", "--output", "json"])
        .unwrap();

    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_scan_exit_code_without_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"one").unwrap();
    fs::write(dir.path().join("b"), b"three").unwrap();

    let code = run(&["-q", "scan", path_str(dir.path()), "--no-progress", "--output", "csv"])
        .unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_scan_missing_root_is_error() {
    let result = run(&["-q", "scan", "/nonexistent/path/12345", "--no-progress"]);

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("Path not found"));
}

#[test]
fn test_scan_delete_keeps_first_copy() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(name), b"copy").unwrap();
    }

    let code = run(&[
        "-q",
        "scan",
        path_str(dir.path()),
        "--no-progress",
        "--delete",
        "-y",
    ])
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let remaining = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(remaining, 1);
}

#[test]
fn test_delete_subcommand_reports_partial_failure() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present");
    fs::write(&present, b"x").unwrap();
    let missing = dir.path().join("missing");

    let code = run(&["-q", "delete", path_str(&present), path_str(&missing), "-y"]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(!present.exists());
}

#[test]
fn test_config_subcommand_with_explicit_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("dupsweep.toml");
    fs::write(&config_path, "lanes = 2\n").unwrap();

    let code = run(&["-q", "--config", path_str(&config_path), "config"]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let err = run(&["-q", "--config", "/nonexistent/dupsweep.toml", "config"]).unwrap_err();
    assert!(format!("{:#}", err).contains("Config file not found"));
}
