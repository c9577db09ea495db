//! dupsweep - duplicate file finder
//!
//! Finds groups of byte-identical files under a directory. Files are
//! bucketed by size, same-size candidates are hashed in parallel across
//! byte-balanced lanes, and files sharing `(size, digest)` are reported
//! together.
//!
//! The engine lives in [`scanner`] and [`duplicates`]; [`run_app`] drives it
//! from the command line.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{delete_files, redundant_copies, DeleteMode, DeleteReport};
use crate::cli::{Cli, Commands, DeleteArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{ScanCoordinator, ScanOutcome, ScanReport};
use crate::error::ExitCode;
use crate::logging::LogOptions;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::progress::TerminalProgress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable scan root, or
/// failures writing the report. Canceled scans are not errors; they map to
/// [`ExitCode::Interrupted`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(&LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Scan(args) => run_scan(args, config, cli.quiet, !cli.no_color),
        Commands::Delete(args) => run_delete(&args),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
    }
}

fn run_scan(args: ScanArgs, mut config: Config, quiet: bool, color: bool) -> Result<ExitCode> {
    if let Some(lanes) = args.lanes {
        config.lanes = Some(usize::try_from(lanes).unwrap_or(usize::MAX));
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    config.verify |= args.verify;
    config.progress &= !args.no_progress;

    let shutdown = signal::install_handler().context("Failed to install Ctrl+C handler")?;
    let progress = Arc::new(TerminalProgress::new(quiet || !config.progress));
    let coordinator = ScanCoordinator::new(config.scan_config())
        .with_progress_observer(progress)
        .with_shutdown_flag(shutdown.get_flag());

    let outcome = coordinator
        .run(&args.path)
        .with_context(|| format!("Scan of {} failed", args.path.display()))?;

    let report = match outcome {
        ScanOutcome::Completed(report) => report,
        ScanOutcome::Canceled => {
            log::warn!("Scan canceled");
            return Ok(ExitCode::Interrupted);
        }
    };

    let mut exit_code = scan_exit_code(&report);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => {
            let color = color && stdout.is_terminal();
            TextOutput::new(&report.groups, &report.summary, color).write_to(&mut out)?;
        }
        OutputFormat::Json => {
            JsonOutput::new(&report.groups, &report.summary, exit_code).write_to(&mut out, true)?;
        }
        OutputFormat::Csv => CsvOutput::new(&report.groups).write_to(&mut out)?,
    }
    out.flush()?;
    drop(out);

    for err in &report.hash_errors {
        log::debug!("Unhashable: {}", err);
    }
    if !report.skipped.is_empty() {
        log::warn!("{} entries could not be read during the scan", report.skipped.len());
    }

    if args.delete && !report.groups.is_empty() {
        let targets = redundant_copies(&report.groups);
        let mode = delete_mode(args.trash);
        let deletion = confirm_and_delete(&targets, mode, args.yes)?;
        if deletion.is_some_and(|d| !d.all_succeeded()) {
            exit_code = ExitCode::PartialSuccess;
        }
    }

    Ok(exit_code)
}

fn scan_exit_code(report: &ScanReport) -> ExitCode {
    if report.groups.is_empty() {
        ExitCode::NoDuplicates
    } else if report.unhashable() > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn run_delete(args: &DeleteArgs) -> Result<ExitCode> {
    match confirm_and_delete(&args.paths, delete_mode(args.trash), args.yes)? {
        Some(report) if !report.all_succeeded() => Ok(ExitCode::PartialSuccess),
        _ => Ok(ExitCode::Success),
    }
}

fn delete_mode(trash: bool) -> DeleteMode {
    if trash {
        DeleteMode::Trash
    } else {
        DeleteMode::Permanent
    }
}

/// Ask for confirmation (unless `yes`), delete, and print the outcome.
///
/// Returns `None` if the user declined.
fn confirm_and_delete(
    paths: &[PathBuf],
    mode: DeleteMode,
    yes: bool,
) -> Result<Option<DeleteReport>> {
    let verb = match mode {
        DeleteMode::Permanent => "Permanently delete",
        DeleteMode::Trash => "Move to trash",
    };
    let question = format!("{} {} files?", verb, paths.len());

    if !yes {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        if !confirm(&question, &mut stdin.lock(), &mut stderr)? {
            eprintln!("Deletion canceled.");
            return Ok(None);
        }
    }

    let report = delete_files(paths, mode);
    for (path, outcome) in report.outcomes.iter().filter(|(_, o)| !o.is_deleted()) {
        eprintln!("{}: {}", path.display(), outcome);
    }
    eprintln!("{}", report.summary());
    Ok(Some(report))
}

/// Print `question [y/N]` and read one answer line.
///
/// Only `y` or `yes` (any case) confirms; end of input declines.
///
/// # Errors
///
/// Returns the I/O error of the prompt or the read.
pub fn confirm<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    prompt: &mut W,
) -> io::Result<bool> {
    write!(prompt, "{} [y/N] ", question)?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
