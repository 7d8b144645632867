//! Synthetic ruby spectra.
//!
//! Used by `specfit synth` to produce demo input and by the tests as a
//! ground-truth generator. Noise is Gaussian and fully determined by the seed.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{PeakSeeds, Spectrum};
use crate::error::AppError;
use crate::models::voigt;

#[derive(Debug, Clone)]
pub struct SynthOptions {
    /// First wavelength (nm).
    pub x_start: f64,
    /// Last wavelength (nm), inclusive.
    pub x_end: f64,
    /// Sample spacing (nm).
    pub step: f64,
    pub background: f64,
    pub peaks: PeakSeeds,
    /// Standard deviation of additive Gaussian noise; `0` for exact data.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            x_start: 688.0,
            x_end: 700.0,
            step: 0.1,
            background: 100.0,
            peaks: PeakSeeds::default(),
            noise_sigma: 10.0,
            seed: 42,
        }
    }
}

/// Background + two Voigt peaks (γ = σ) + optional noise.
pub fn synthetic_ruby_spectrum(opts: &SynthOptions) -> Result<Spectrum, AppError> {
    if !(opts.step.is_finite() && opts.step > 0.0) {
        return Err(AppError::invalid_config("Synthetic step must be > 0."));
    }
    if !(opts.x_start.is_finite() && opts.x_end.is_finite() && opts.x_end > opts.x_start) {
        return Err(AppError::invalid_config("Invalid synthetic wavelength range."));
    }
    if !(opts.noise_sigma.is_finite() && opts.noise_sigma >= 0.0) {
        return Err(AppError::invalid_config("Noise sigma must be >= 0."));
    }

    let n = ((opts.x_end - opts.x_start) / opts.step).round() as usize + 1;
    let x: Vec<f64> = (0..n).map(|i| opts.x_start + i as f64 * opts.step).collect();

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let normal = Normal::new(0.0, opts.noise_sigma.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::invalid_config(format!("Noise distribution error: {e}")))?;

    let (p1, p2) = (&opts.peaks.v1, &opts.peaks.v2);
    let y = x
        .iter()
        .map(|&xi| {
            let clean = opts.background
                + voigt(xi, p1.amplitude, p1.center, p1.sigma, p1.sigma)
                + voigt(xi, p2.amplitude, p2.center, p2.sigma, p2.sigma);
            if opts.noise_sigma > 0.0 {
                clean + normal.sample(&mut rng)
            } else {
                clean
            }
        })
        .collect();

    Ok(Spectrum::new(x, y)?.with_label(format!("synthetic-seed{}", opts.seed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_inclusive_and_uniform() {
        let s = synthetic_ruby_spectrum(&SynthOptions::default()).unwrap();
        assert_eq!(s.len(), 121);
        assert!((s.x[0] - 688.0).abs() < 1e-12);
        assert!((s.x[120] - 700.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_noise() {
        let a = synthetic_ruby_spectrum(&SynthOptions::default()).unwrap();
        let b = synthetic_ruby_spectrum(&SynthOptions::default()).unwrap();
        assert_eq!(a.y, b.y);

        let c = synthetic_ruby_spectrum(&SynthOptions {
            seed: 7,
            ..SynthOptions::default()
        })
        .unwrap();
        assert_ne!(a.y, c.y);
    }

    #[test]
    fn rejects_bad_ranges() {
        let bad = SynthOptions {
            step: 0.0,
            ..SynthOptions::default()
        };
        assert!(synthetic_ruby_spectrum(&bad).is_err());
    }
}
