//! Mathematical utilities: Savitzky-Golay kernels, the Faddeeva function,
//! linear least squares and descriptive statistics.

pub mod faddeeva;
pub mod ols;
pub mod savgol;
pub mod stats;

pub use faddeeva::*;
pub use ols::*;
pub use savgol::*;
pub use stats::*;
