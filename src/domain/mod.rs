//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - spectra and smoothing configuration (`Spectrum`, `SmoothingConfig`)
//! - bounded fit parameters (`Bounds`, `BoundedParam`, `ParamSet`)
//! - ruby fit configuration and session state (`FitConfig`, `PeakSeeds`, `FitSession`)

pub mod types;

pub use types::*;
