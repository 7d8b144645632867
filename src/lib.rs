//! `specfit` library crate.
//!
//! The binary (`specfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the smoother and the peak fitter are usable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod calibration;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
