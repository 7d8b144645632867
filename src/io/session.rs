//! JSON files for fit configuration and session state.
//!
//! - `FitConfig`: bounds, calibration constants and optimizer tolerances.
//!   Missing fields fall back to the built-in defaults.
//! - `FitSession`: last-used peak seeds, read before a fit and rewritten with
//!   the refined values afterwards.

use std::fs::File;
use std::path::Path;

use crate::domain::{FitConfig, FitSession};
use crate::error::AppError;

/// Read a fit configuration file and validate it.
pub fn read_fit_config(path: &Path) -> Result<FitConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open config '{}': {e}", path.display())))?;
    let config: FitConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::invalid_config(format!("Invalid config JSON '{}': {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Read a session file; a missing file yields `None`.
pub fn read_session(path: &Path) -> Result<Option<FitSession>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open session '{}': {e}", path.display())))?;
    let session = serde_json::from_reader(file)
        .map_err(|e| AppError::invalid_config(format!("Invalid session JSON '{}': {e}", path.display())))?;
    Ok(Some(session))
}

pub fn write_session(path: &Path, session: &FitSession) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create session '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, session)
        .map_err(|e| AppError::io(format!("Failed to write session JSON: {e}")))?;
    Ok(())
}
