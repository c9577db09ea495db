//! Ctrl+C handling for graceful cancellation.
//!
//! A process-wide [`ShutdownHandler`] owns an `AtomicBool` that the `ctrlc`
//! hook sets on interrupt. The flag is handed to the
//! [`ScanCoordinator`](crate::duplicates::ScanCoordinator), which treats it
//! exactly like [`ScanHandle::cancel`](crate::duplicates::ScanHandle::cancel):
//! lanes stop between files and the scan ends as canceled (exit code 130).
//!
//! ```rust,no_run
//! use dupsweep::duplicates::{ScanConfig, ScanCoordinator};
//! use dupsweep::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let coordinator = ScanCoordinator::new(ScanConfig::default())
//!     .with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag set by Ctrl+C.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to pass to a scan.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can guard another scan.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C hook, or reuse the one already installed.
///
/// The returned handler's flag is reset, so each call starts clean.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if `ctrlc` rejects the hook and no
/// handler was installed earlier in this process.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut install_error = None;
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        let hooked = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = writeln!(std::io::stderr(), "\nInterrupted. Canceling scan...");
            let _ = std::io::stderr().flush();
            log::info!("Shutdown signal received");
        });
        if let Err(e) = hooked {
            // Another hook owns SIGINT (e.g. a test harness); keep a manual-only handler.
            log::debug!("Ctrl+C hook not installed: {}", e);
            install_error = Some(e);
        }
        handler
    });

    if let Some(e) = install_error {
        if !matches!(e, ctrlc::Error::MultipleHandlers) {
            return Err(SignalError::InstallFailed(e));
        }
    }

    handler.reset();
    Ok(handler.clone())
}
