//! CLI command implementations

pub mod config;
pub mod convert;
pub mod counter;

use std::path::PathBuf;

use anyhow::{Context, Result};
use storeledger_core::StoreLedgerContext;
use tracing::debug;

/// Get the storeledger directory from environment or default
pub fn get_storeledger_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STORELEDGER_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let config_dir = dirs::config_dir().context("Could not find the user config directory")?;
    Ok(config_dir.join("storeledger"))
}

/// Get storeledger context
pub fn get_context() -> Result<StoreLedgerContext> {
    let dir = get_storeledger_dir()?;
    debug!(dir = %dir.display(), "using storeledger directory");
    StoreLedgerContext::new(&dir).context("Failed to initialize storeledger context")
}
