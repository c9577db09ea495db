//! Logging setup for dupsweep.
//!
//! The engine logs through the `log` facade; the binary installs an
//! `env_logger` backend. The active filter comes from (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Default: info
//!
//! Debug builds prefix records with a timestamp, and with the module path
//! once verbose output is requested. Release builds print level and
//! message only.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupsweep::logging::{init_logging, LogOptions};
//!
//! init_logging(&LogOptions { verbose: 1, quiet: false, no_color: false });
//! log::debug!("Debug output enabled");
//! ```

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Logging options taken from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Verbosity count (0=info, 1=debug, 2+=trace)
    pub verbose: u8,
    /// Only show errors (overridden by `RUST_LOG`)
    pub quiet: bool,
    /// Disable ANSI styling of the level
    pub no_color: bool,
}

/// Initialize the logger once for the process.
///
/// Later calls are ignored, which lets integration tests drive
/// [`run_app`](crate::run_app) repeatedly.
pub fn init_logging(options: &LogOptions) {
    let from_env = env::var("RUST_LOG").is_ok();
    let mut builder = build_logger(options, from_env);

    if builder.try_init().is_err() {
        log::trace!("Logger already initialized");
        return;
    }

    if from_env {
        log::debug!(
            "Logging initialized from RUST_LOG: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(options.verbose, options.quiet)
        );
    }
}

/// Configure (but do not install) a logger for the given options.
fn build_logger(options: &LogOptions, from_env: bool) -> Builder {
    let mut builder = Builder::new();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(options.verbose, options.quiet));
    }

    if options.no_color {
        builder.write_style(WriteStyle::Never);
    }

    configure_format(&mut builder, options.verbose);
    builder
}

/// Map CLI flags to a level filter. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let style = buf.default_level_style(level);
            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(buf, "{} {style}{:<5}{style:#} {}", timestamp, level, record.args())
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        });
    }
}
