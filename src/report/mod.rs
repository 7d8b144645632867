//! Reporting utilities: formatted terminal output for smoothing, fits,
//! calibration readings and batch conversion.

pub mod format;

pub use format::*;
