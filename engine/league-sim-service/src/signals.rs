//! Signal handling for cancelling a running batch

use anyhow::{Context, Result};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Flag set by Ctrl+C (SIGINT) or SIGTERM.
///
/// A running batch stops claiming new runs once it is set and reports the
/// runs already completed.
pub fn setup_cancel_flag() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));

    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancel))
        .context("Failed to register SIGINT handler")?;

    #[cfg(unix)]
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&cancel))
        .context("Failed to register SIGTERM handler")?;

    info!("Signal handlers configured");
    Ok(cancel)
}
