//! Savitzky-Golay smoothing and differentiation.
//!
//! For a window of `2h + 1` samples we fit a polynomial of degree `p` by least
//! squares around every sample. The fit is linear in the samples, so the value
//! (or n-th derivative) of the local polynomial at the window center is a fixed
//! dot product with a kernel taken from the pseudo-inverse of the Vandermonde
//! design matrix:
//!
//! ```text
//! B[k, j] = k^j,  k ∈ [-h, h],  j ∈ [0, p]
//! kernel  = pinv(B)[n, ·] · rate^n · n!
//! ```
//!
//! Edges are handled by padding `h` samples on each side with a point
//! reflection about the first/last sample. Polynomials up to degree `p` pass
//! through unchanged in the interior (`h..n-h`); within `h` samples of either
//! end only straight lines are reproduced exactly, since the reflected padding
//! is not a continuation of higher-degree curves.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{SmoothingConfig, Spectrum};
use crate::error::AppError;

/// Singular values below this are treated as zero in the pseudo-inverse.
const PINV_EPS: f64 = 1e-12;

/// Compute the correlation kernel for `config`.
///
/// `kernel[j]` multiplies the sample at offset `j - half_window`.
pub fn savgol_coefficients(config: &SmoothingConfig) -> Result<Vec<f64>, AppError> {
    config.validate()?;

    let half = config.half_window() as f64;
    let cols = config.polynomial_order + 1;
    let design = DMatrix::<f64>::from_fn(config.window_size, cols, |r, c| {
        let k = r as f64 - half;
        k.powi(c as i32)
    });

    let pinv = design
        .pseudo_inverse(PINV_EPS)
        .map_err(|e| AppError::numerical(format!("Savitzky-Golay pseudo-inverse failed: {e}")))?;

    let deriv = config.derivative_order;
    let scale = config.sampling_rate.powi(deriv as i32) * factorial(deriv);
    let kernel: Vec<f64> = pinv.row(deriv).iter().map(|c| c * scale).collect();

    if kernel.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numerical(
            "Savitzky-Golay kernel contains non-finite coefficients.",
        ));
    }
    Ok(kernel)
}

/// Smooth (or differentiate) `signal`. The output has the same length as the input.
pub fn savitzky_golay(signal: &[f64], config: &SmoothingConfig) -> Result<Vec<f64>, AppError> {
    config.validate()?;
    if signal.len() < config.window_size {
        return Err(AppError::invalid_config(format!(
            "Signal has {} samples, fewer than window_size {}.",
            signal.len(),
            config.window_size
        )));
    }
    if signal.iter().any(|v| !v.is_finite()) {
        return Err(AppError::invalid_config("Signal contains non-finite samples."));
    }

    let kernel = savgol_coefficients(config)?;

    let padded = pad_point_reflect(signal, config.half_window());
    let w = kernel.len();

    let out: Vec<f64> = (0..signal.len())
        .into_par_iter()
        .map(|i| {
            kernel
                .iter()
                .zip(&padded[i..i + w])
                .map(|(k, v)| k * v)
                .sum::<f64>()
        })
        .collect();

    log::debug!(
        "savitzky-golay: n={} window={} order={} deriv={}",
        signal.len(),
        config.window_size,
        config.polynomial_order,
        config.derivative_order
    );
    Ok(out)
}

/// Smooth the y values of a spectrum, keeping its x axis and label.
pub fn smooth_spectrum(spectrum: &Spectrum, config: &SmoothingConfig) -> Result<Spectrum, AppError> {
    let y = savitzky_golay(&spectrum.y, config)?;
    Ok(Spectrum {
        x: spectrum.x.clone(),
        y,
        label: spectrum.label.clone(),
    })
}

/// Pad `half` samples on each end: `2·y[0] − y[k]` before, `2·y[n−1] − y[n−1−k]` after.
///
/// Requires `signal.len() > half`.
fn pad_point_reflect(signal: &[f64], half: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut padded = Vec::with_capacity(n + 2 * half);
    padded.extend((1..=half).rev().map(|k| 2.0 * first - signal[k]));
    padded.extend_from_slice(signal);
    padded.extend((1..=half).map(|k| 2.0 * last - signal[n - 1 - k]));
    padded
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|v| v as f64).product()
}
