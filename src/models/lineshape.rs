//! Peak line shapes.
//!
//! The Voigt profile is the convolution of a Gaussian (width `sigma`) and a
//! Lorentzian (half width `gamma`). In closed form:
//!
//! ```text
//! V(x) = A · Re w(z) / (σ √(2π)),   z = (x − c + iγ) / (σ √2)
//! ```
//!
//! `A` is the integrated area. The ruby model ties `γ = σ`.

use std::f64::consts::PI;

use nalgebra::Complex;

use crate::math::faddeeva;

/// Evaluate a Voigt profile at `x`.
pub fn voigt(x: f64, amplitude: f64, center: f64, sigma: f64, gamma: f64) -> f64 {
    let s2 = sigma * 2f64.sqrt();
    let z = Complex::new((x - center) / s2, gamma / s2);
    amplitude * faddeeva(z).re / (sigma * (2.0 * PI).sqrt())
}

/// Peak value of a Voigt profile (its value at the center).
pub fn voigt_height(amplitude: f64, sigma: f64, gamma: f64) -> f64 {
    voigt(0.0, amplitude, 0.0, sigma, gamma)
}

/// Olivero-Longbothum approximation of the Voigt FWHM.
pub fn voigt_fwhm(sigma: f64, gamma: f64) -> f64 {
    1.0692 * gamma + (0.8664 * gamma * gamma + 5.545083 * sigma * sigma).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(x: f64, amplitude: f64, center: f64, sigma: f64) -> f64 {
        let u = (x - center) / sigma;
        amplitude * (-0.5 * u * u).exp() / (sigma * (2.0 * PI).sqrt())
    }

    #[test]
    fn voigt_with_vanishing_gamma_is_gaussian() {
        for &x in &[693.8, 694.0, 694.2, 694.5, 694.9] {
            let v = voigt(x, 5000.0, 694.2, 0.3, 1e-12);
            let g = gaussian(x, 5000.0, 694.2, 0.3);
            assert!((v - g).abs() < 1e-6 * g.max(1.0), "x={x}: {v} vs {g}");
        }
    }

    #[test]
    fn voigt_is_symmetric_and_peaks_at_center() {
        let left = voigt(692.0, 4400.0, 692.5, 0.33, 0.33);
        let right = voigt(693.0, 4400.0, 692.5, 0.33, 0.33);
        let top = voigt(692.5, 4400.0, 692.5, 0.33, 0.33);
        assert!((left - right).abs() < 1e-6);
        assert!(top > left);
        assert!((top - voigt_height(4400.0, 0.33, 0.33)).abs() < 1e-9);
    }

    #[test]
    fn voigt_area_is_amplitude() {
        // Lorentzian tails converge slowly, so use a nearly Gaussian profile.
        let (amp, c, sigma, gamma) = (1000.0, 0.0, 1.0, 0.01);
        let dx = 0.01;
        let area: f64 = (-20_000..=20_000)
            .map(|i| voigt(i as f64 * dx, amp, c, sigma, gamma) * dx)
            .sum();
        assert!((area / amp - 1.0).abs() < 1e-3, "area={area}");
    }

    #[test]
    fn fwhm_limits() {
        // Pure Gaussian: 2√(2 ln 2) σ ≈ 2.3548 σ
        assert!((voigt_fwhm(1.0, 0.0) - 2.354_82).abs() < 1e-4);
        // Pure Lorentzian: 2γ (approximation is good to ~0.02%)
        assert!((voigt_fwhm(0.0, 1.0) - 2.0).abs() < 1e-3);
    }
}
