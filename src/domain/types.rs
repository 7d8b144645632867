//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during smoothing and fitting
//! - loaded from JSON config / session files
//! - exported alongside fit results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A uniformly or non-uniformly sampled spectrum.
///
/// The smoother only looks at `y`; the model builder pairs each `y` with its `x`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Optional human label (usually the source file name).
    pub label: Option<String>,
}

impl Spectrum {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, AppError> {
        if x.len() != y.len() {
            return Err(AppError::invalid_config(format!(
                "Spectrum x/y length mismatch: {} vs {}.",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y, label: None })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// `(min, max)` of the x axis, ignoring non-finite values.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let mut it = self.x.iter().copied().filter(|v| v.is_finite());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Savitzky-Golay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Odd number of samples in the sliding window.
    pub window_size: usize,
    /// Degree of the local polynomial.
    pub polynomial_order: usize,
    /// 0 for smoothing, n for the n-th derivative.
    pub derivative_order: usize,
    /// Samples per unit of x; derivatives are scaled by `rate^deriv`.
    pub sampling_rate: f64,
}

impl SmoothingConfig {
    pub fn new(window_size: usize, polynomial_order: usize) -> Self {
        Self {
            window_size,
            polynomial_order,
            derivative_order: 0,
            sampling_rate: 1.0,
        }
    }

    pub fn with_derivative(mut self, derivative_order: usize, sampling_rate: f64) -> Self {
        self.derivative_order = derivative_order;
        self.sampling_rate = sampling_rate;
        self
    }

    /// Reject invalid window/order combinations before any computation.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.window_size == 0 || self.window_size % 2 != 1 {
            return Err(AppError::invalid_config(format!(
                "window_size must be a positive odd number, got {}.",
                self.window_size
            )));
        }
        if self.polynomial_order >= self.window_size.saturating_sub(1) {
            return Err(AppError::invalid_config(format!(
                "window_size {} is too small for polynomial order {}.",
                self.window_size, self.polynomial_order
            )));
        }
        if self.derivative_order > self.polynomial_order {
            return Err(AppError::invalid_config(format!(
                "derivative order {} exceeds polynomial order {}.",
                self.derivative_order, self.polynomial_order
            )));
        }
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(AppError::invalid_config(format!(
                "sampling_rate must be positive and finite, got {}.",
                self.sampling_rate
            )));
        }
        Ok(())
    }

    pub fn half_window(&self) -> usize {
        (self.window_size - 1) / 2
    }
}

/// Inclusive parameter bounds. Either end may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const UNBOUNDED: Bounds = Bounds {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn validate(&self, what: &str) -> Result<(), AppError> {
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(AppError::invalid_config(format!(
                "Invalid bounds for {what}: [{}, {}].",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// A mutable, bounded model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedParam {
    pub name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// Fixed parameters keep their value during refinement.
    pub vary: bool,
}

impl BoundedParam {
    pub fn new(name: impl Into<String>, value: f64, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            value,
            min: bounds.min,
            max: bounds.max,
            vary: true,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }
}

/// Ordered, name-addressable parameter collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamSet {
    params: Vec<BoundedParam>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter (by name).
    pub fn insert(&mut self, param: BoundedParam) {
        match self.params.iter_mut().find(|p| p.name == param.name) {
            Some(slot) => *slot = param,
            None => self.params.push(param),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BoundedParam> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BoundedParam> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    /// Value lookup that fails with a readable error when the name is unknown.
    pub fn value(&self, name: &str) -> Result<f64, AppError> {
        self.get(name)
            .map(|p| p.value)
            .ok_or_else(|| AppError::invalid_config(format!("Unknown parameter '{name}'.")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundedParam> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Seed values for one Voigt peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSeed {
    pub center: f64,
    pub amplitude: f64,
    pub sigma: f64,
}

/// Seeds for the two ruby peaks.
///
/// `v1` is the short-wavelength line (R2), `v2` the long-wavelength one (R1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSeeds {
    pub v1: PeakSeed,
    pub v2: PeakSeed,
}

impl Default for PeakSeeds {
    fn default() -> Self {
        Self {
            v1: PeakSeed {
                center: 692.5,
                amplitude: 4400.0,
                sigma: 0.33,
            },
            v2: PeakSeed {
                center: 694.5,
                amplitude: 7900.0,
                sigma: 0.38,
            },
        }
    }
}

/// Bounds applied to one Voigt peak's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakBounds {
    pub center: Bounds,
    pub amplitude: Bounds,
    pub sigma: Bounds,
}

impl PeakBounds {
    pub fn validate(&self, prefix: &str) -> Result<(), AppError> {
        self.center.validate(&format!("{prefix}center"))?;
        self.amplitude.validate(&format!("{prefix}amplitude"))?;
        self.sigma.validate(&format!("{prefix}sigma"))?;
        if self.sigma.min <= 0.0 {
            return Err(AppError::invalid_config(format!(
                "{prefix}sigma lower bound must be positive."
            )));
        }
        Ok(())
    }
}

/// Ruby-line calibration constants.
///
/// Defaults are the lab's reference line at ambient temperature, the
/// hydrostatic (Mao 1986) coefficients and the Ruby2020 coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubyCalibration {
    /// R1 line position at ambient conditions (nm).
    pub reference_wavelength_nm: f64,
    /// Temperature at which the reference line was acquired (K).
    pub ambient_temperature_k: f64,
    /// Linear R1 shift with temperature (nm/K).
    pub temperature_coefficient_nm_per_k: f64,
    pub hydrostatic_a_gpa: f64,
    pub hydrostatic_b: f64,
    pub ruby2020_a_gpa: f64,
    pub ruby2020_b: f64,
}

impl Default for RubyCalibration {
    fn default() -> Self {
        Self {
            reference_wavelength_nm: 694.19,
            ambient_temperature_k: 298.1,
            temperature_coefficient_nm_per_k: 0.00726,
            hydrostatic_a_gpa: 1904.0,
            hydrostatic_b: 7.715,
            ruby2020_a_gpa: 1870.0,
            ruby2020_b: 5.63,
        }
    }
}

/// Stopping criteria for the Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Maximum accepted + rejected LM steps.
    pub max_iterations: usize,
    /// Relative reduction of the cost below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Gradient infinity norm below which we stop.
    pub gtol: f64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }
}

/// Everything the ruby fit needs besides data and seeds.
///
/// Deserialization fills every missing field, including single bounds inside
/// a peak, from [`FitConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FitConfigFile")]
pub struct FitConfig {
    pub v1: PeakBounds,
    pub v2: PeakBounds,
    pub calibration: RubyCalibration,
    pub optimizer: OptimizerOptions,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            v1: PeakBounds {
                center: Bounds::new(688.0, 699.0),
                amplitude: Bounds::new(1000.0, 60000.0),
                sigma: Bounds::new(0.01, 2.0),
            },
            v2: PeakBounds {
                center: Bounds::new(688.0, 699.0),
                amplitude: Bounds::new(1000.0, 50000.0),
                sigma: Bounds::new(0.02, 2.0),
            },
            calibration: RubyCalibration::default(),
            optimizer: OptimizerOptions::default(),
        }
    }
}

/// Per-peak bounds as written in a config file; absent entries keep the defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct PeakBoundsFile {
    center: Option<Bounds>,
    amplitude: Option<Bounds>,
    sigma: Option<Bounds>,
}

impl PeakBoundsFile {
    fn merge_onto(self, base: PeakBounds) -> PeakBounds {
        PeakBounds {
            center: self.center.unwrap_or(base.center),
            amplitude: self.amplitude.unwrap_or(base.amplitude),
            sigma: self.sigma.unwrap_or(base.sigma),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct FitConfigFile {
    v1: PeakBoundsFile,
    v2: PeakBoundsFile,
    calibration: RubyCalibration,
    optimizer: OptimizerOptions,
}

impl From<FitConfigFile> for FitConfig {
    fn from(file: FitConfigFile) -> Self {
        let defaults = FitConfig::default();
        Self {
            v1: file.v1.merge_onto(defaults.v1),
            v2: file.v2.merge_onto(defaults.v2),
            calibration: file.calibration,
            optimizer: file.optimizer,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.v1.validate("v1_")?;
        self.v2.validate("v2_")?;
        if self.optimizer.max_iterations == 0 {
            return Err(AppError::invalid_config("optimizer.max_iterations must be > 0."));
        }
        Ok(())
    }
}

/// Last-used seeds, owned by the caller and passed explicitly between fits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitSession {
    pub seeds: PeakSeeds,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FitSession {
    /// Replace the cached seeds and stamp the update time.
    pub fn remember(&mut self, seeds: PeakSeeds) {
        self.seeds = seeds;
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn smoothing_config_rejects_even_and_small_windows() {
        let even = SmoothingConfig::new(6, 2).validate().unwrap_err();
        assert_eq!(even.kind(), ErrorKind::InvalidConfiguration);

        let small = SmoothingConfig::new(3, 2).validate().unwrap_err();
        assert_eq!(small.kind(), ErrorKind::InvalidConfiguration);

        let deriv = SmoothingConfig::new(7, 2).with_derivative(3, 1.0).validate();
        assert!(deriv.is_err());

        assert!(SmoothingConfig::new(5, 3).validate().is_ok());
    }

    #[test]
    fn huge_polynomial_order_is_rejected_not_overflowed() {
        let err = SmoothingConfig::new(5, usize::MAX).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let err = SmoothingConfig::new(usize::MAX, usize::MAX - 1).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn param_set_insert_replaces_by_name() {
        let mut set = ParamSet::new();
        set.insert(BoundedParam::new("a", 1.0, Bounds::UNBOUNDED));
        set.insert(BoundedParam::new("a", 2.0, Bounds::new(0.0, 5.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.value("a").unwrap(), 2.0);
        assert!(set.value("b").is_err());
    }

    #[test]
    fn fit_config_partial_json_uses_defaults() {
        let cfg: FitConfig =
            serde_json::from_str(r#"{"calibration": {"ambient_temperature_k": 300.0}}"#).unwrap();
        assert_eq!(cfg.calibration.ambient_temperature_k, 300.0);
        assert_eq!(cfg.calibration.reference_wavelength_nm, 694.19);
        assert_eq!(cfg.v1.center, Bounds::new(688.0, 699.0));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn fit_config_single_peak_bound_keeps_other_defaults() {
        let cfg: FitConfig =
            serde_json::from_str(r#"{"v1": {"center": {"min": 690, "max": 698}}}"#).unwrap();
        let defaults = FitConfig::default();
        assert_eq!(cfg.v1.center, Bounds::new(690.0, 698.0));
        assert_eq!(cfg.v1.amplitude, defaults.v1.amplitude);
        assert_eq!(cfg.v1.sigma, defaults.v1.sigma);
        assert_eq!(cfg.v2, defaults.v2);

        let cfg: FitConfig = serde_json::from_str(r#"{"v2": {"sigma": {"min": 0.05, "max": 1.5}}}"#).unwrap();
        assert_eq!(cfg.v2.sigma, Bounds::new(0.05, 1.5));
        assert_eq!(cfg.v2.amplitude, Bounds::new(1000.0, 50000.0));
        assert_eq!(cfg.v1, defaults.v1);
        assert!(cfg.validate().is_ok());
    }
}
