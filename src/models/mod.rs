//! Spectral line shapes and the composite model built from them.
//!
//! Line shapes are small, pure functions so that the fitting code can stay generic.

pub mod lineshape;
pub mod model;

pub use lineshape::*;
pub use model::*;
