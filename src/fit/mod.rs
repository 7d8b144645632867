//! Peak fitting.
//!
//! Responsibilities:
//!
//! - map bounded parameters to an unconstrained space (`bounds`)
//! - minimize residuals with Levenberg-Marquardt (`lm`)
//! - build, refine and summarise the ruby two-peak model (`ruby`)

pub mod bounds;
pub mod lm;
pub mod ruby;

pub use bounds::*;
pub use lm::*;
pub use ruby::*;
