//! Write spectra and fit decompositions to comma-delimited text.
//!
//! The files are meant to be easy to consume in spreadsheets, plotting tools or
//! downstream scripts. Values are written with Rust's shortest round-trip
//! formatting, so re-reading them is lossless.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Spectrum;
use crate::error::AppError;
use crate::fit::FitOutcome;

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

fn write_err(path: &Path, e: std::io::Error) -> AppError {
    AppError::io(format!("Failed to write '{}': {e}", path.display()))
}

/// Two columns `x,y`, no header.
pub fn write_spectrum_csv(path: &Path, spectrum: &Spectrum) -> Result<(), AppError> {
    let mut out = create(path)?;
    for (x, y) in spectrum.x.iter().zip(&spectrum.y) {
        writeln!(out, "{x},{y}").map_err(|e| write_err(path, e))?;
    }
    out.flush().map_err(|e| write_err(path, e))
}

/// Observed data, best fit, residual and each component, one row per sample.
pub fn write_components_csv(
    path: &Path,
    spectrum: &Spectrum,
    outcome: &FitOutcome,
) -> Result<(), AppError> {
    let mut out = create(path)?;

    let mut header = String::from("x,y,best_fit,residual");
    for (prefix, _) in &outcome.components {
        header.push(',');
        header.push_str(prefix.trim_end_matches('_'));
    }
    writeln!(out, "{header}").map_err(|e| write_err(path, e))?;

    for i in 0..spectrum.len() {
        write!(
            out,
            "{},{},{},{}",
            spectrum.x[i], spectrum.y[i], outcome.best_fit[i], outcome.residual[i]
        )
        .map_err(|e| write_err(path, e))?;
        for (_, values) in &outcome.components {
            write!(out, ",{}", values[i]).map_err(|e| write_err(path, e))?;
        }
        writeln!(out).map_err(|e| write_err(path, e))?;
    }

    out.flush().map_err(|e| write_err(path, e))
}
