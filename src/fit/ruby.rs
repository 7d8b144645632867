//! Ruby fluorescence model: constant background + two Voigt peaks.
//!
//! Workflow:
//!
//! 1. [`build_ruby_model`] validates the seeds against the configured bounds,
//!    guesses the background and evaluates the initial-guess curve.
//! 2. [`fit_model`] refines every varying parameter with bounded
//!    Levenberg-Marquardt.
//! 3. [`summarize_fit`] derives centers, widths, R² and the R1 calibration.

use nalgebra::DVector;

use crate::calibration::{CalibrationReading, calibrate_line};
use crate::domain::{
    BoundedParam, Bounds, FitConfig, FitSession, OptimizerOptions, ParamSet, PeakBounds, PeakSeed, PeakSeeds,
    RubyCalibration, Spectrum,
};
use crate::error::AppError;
use crate::fit::bounds::{to_external, to_internal};
use crate::fit::lm::{LeastSquaresProblem, LevenbergMarquardt, Termination};
use crate::math::{percentile, r_squared};
use crate::models::{CompositeModel, Shape, voigt_fwhm, voigt_height};

pub const BACKGROUND_PREFIX: &str = "bkg_";
pub const V1_PREFIX: &str = "v1_";
pub const V2_PREFIX: &str = "v2_";

/// Percentile of the observed intensities used as the background guess.
const BACKGROUND_PERCENTILE: f64 = 10.0;

/// Model + parameters ready for refinement, plus the curve at the seeds.
#[derive(Debug, Clone)]
pub struct ModelBuild {
    pub model: CompositeModel,
    pub params: ParamSet,
    pub init: Vec<f64>,
}

/// Output of a refinement.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub params: ParamSet,
    pub best_fit: Vec<f64>,
    /// `model − data` at every sample.
    pub residual: Vec<f64>,
    /// Each component evaluated at every sample, keyed by prefix.
    pub components: Vec<(String, Vec<f64>)>,
    /// `Σ residual²`
    pub chi_square: f64,
    pub n_varying: usize,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

/// Refined values for one peak, plus derived shape quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSummary {
    pub prefix: String,
    pub center: f64,
    pub amplitude: f64,
    pub sigma: f64,
    pub fwhm: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub background: f64,
    pub v1: PeakSummary,
    pub v2: PeakSummary,
    pub r_squared: f64,
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    /// Calibration derived from the long-wavelength (R1) line.
    pub r1: CalibrationReading,
}

/// `bkg_ + v1_ + v2_`
pub fn ruby_model() -> CompositeModel {
    CompositeModel::new()
        .with(BACKGROUND_PREFIX, Shape::Constant)
        .with(V1_PREFIX, Shape::Voigt)
        .with(V2_PREFIX, Shape::Voigt)
}

/// Low-signal level of the data: the 10th percentile of `y`.
pub fn guess_background(y: &[f64]) -> Option<f64> {
    percentile(y, BACKGROUND_PERCENTILE)
}

/// Build the ruby model and its bounded parameter set.
///
/// Seeds outside their bounds are rejected, not clamped.
pub fn build_ruby_model(
    spectrum: &Spectrum,
    seeds: &PeakSeeds,
    config: &FitConfig,
) -> Result<ModelBuild, AppError> {
    config.validate()?;
    validate_spectrum(spectrum)?;

    let background = guess_background(&spectrum.y)
        .ok_or_else(|| AppError::invalid_config("Cannot guess background of an empty spectrum."))?;

    let mut params = ParamSet::new();
    params.insert(BoundedParam::new(
        format!("{BACKGROUND_PREFIX}c"),
        background,
        Bounds::UNBOUNDED,
    ));
    insert_peak(&mut params, V1_PREFIX, &seeds.v1, &config.v1)?;
    insert_peak(&mut params, V2_PREFIX, &seeds.v2, &config.v2)?;

    let model = ruby_model();
    let init = model.eval(&params, &spectrum.x)?;

    log::debug!(
        "ruby model: n={} background guess={background:.3} v1={:?} v2={:?}",
        spectrum.len(),
        seeds.v1,
        seeds.v2
    );

    Ok(ModelBuild {
        model,
        params,
        init,
    })
}

fn insert_peak(
    params: &mut ParamSet,
    prefix: &str,
    seed: &PeakSeed,
    bounds: &PeakBounds,
) -> Result<(), AppError> {
    for (name, value, b) in [
        ("center", seed.center, bounds.center),
        ("amplitude", seed.amplitude, bounds.amplitude),
        ("sigma", seed.sigma, bounds.sigma),
    ] {
        let full = format!("{prefix}{name}");
        check_seed(&full, value, b)?;
        params.insert(BoundedParam::new(full, value, b));
    }
    Ok(())
}

fn check_seed(name: &str, value: f64, bounds: Bounds) -> Result<(), AppError> {
    if !value.is_finite() || !bounds.contains(value) {
        return Err(AppError::invalid_seed(format!(
            "Seed {name} = {value} is outside [{}, {}].",
            bounds.min, bounds.max
        )));
    }
    Ok(())
}

fn validate_spectrum(spectrum: &Spectrum) -> Result<(), AppError> {
    if spectrum.x.len() != spectrum.y.len() {
        return Err(AppError::invalid_config("Spectrum x/y length mismatch."));
    }
    if spectrum.is_empty() {
        return Err(AppError::invalid_config("No data points to fit."));
    }
    if spectrum.x.iter().chain(&spectrum.y).any(|v| !v.is_finite()) {
        return Err(AppError::invalid_config("Spectrum contains non-finite values."));
    }
    Ok(())
}

/// Varying parameters mapped into the optimizer's unconstrained space.
struct BoundedProblem<'a> {
    model: &'a CompositeModel,
    template: &'a ParamSet,
    varying: Vec<(String, Bounds)>,
    spectrum: &'a Spectrum,
}

impl BoundedProblem<'_> {
    fn external(&self, internal: &DVector<f64>) -> ParamSet {
        let mut params = self.template.clone();
        for ((name, bounds), &int) in self.varying.iter().zip(internal.iter()) {
            if let Some(p) = params.get_mut(name) {
                p.value = to_external(int, *bounds);
            }
        }
        params
    }

    fn initial(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.varying.len(),
            self.varying.iter().map(|(name, bounds)| {
                let value = self.template.get(name).map(|p| p.value).unwrap_or(0.0);
                to_internal(value, *bounds)
            }),
        )
    }
}

impl LeastSquaresProblem for BoundedProblem<'_> {
    fn residuals(&self, internal: &DVector<f64>) -> Option<DVector<f64>> {
        let params = self.external(internal);
        let fit = self.model.eval(&params, &self.spectrum.x).ok()?;
        let r = DVector::from_iterator(
            fit.len(),
            fit.iter().zip(&self.spectrum.y).map(|(f, y)| f - y),
        );
        r.iter().all(|v| v.is_finite()).then_some(r)
    }
}

/// Refine `params` against the observed spectrum.
pub fn fit_model(
    model: &CompositeModel,
    params: &ParamSet,
    spectrum: &Spectrum,
    options: &OptimizerOptions,
) -> Result<FitOutcome, AppError> {
    validate_spectrum(spectrum)?;
    for p in params.iter() {
        check_seed(&p.name, p.value, p.bounds())?;
    }

    let varying: Vec<(String, Bounds)> = params
        .iter()
        .filter(|p| p.vary)
        .map(|p| (p.name.clone(), p.bounds()))
        .collect();
    let n_varying = varying.len();

    let problem = BoundedProblem {
        model,
        template: params,
        varying,
        spectrum,
    };

    let minimum = LevenbergMarquardt::new(*options).minimize(&problem, problem.initial())?;
    let refined = problem.external(&minimum.params);

    let best_fit = model.eval(&refined, &spectrum.x)?;
    let residual: Vec<f64> = best_fit.iter().zip(&spectrum.y).map(|(f, y)| f - y).collect();
    let components = model.eval_components(&refined, &spectrum.x)?;
    let chi_square = residual.iter().map(|r| r * r).sum();

    log::info!(
        "fit finished after {} iterations ({} evaluations): {}",
        minimum.iterations,
        minimum.evaluations,
        minimum.termination.description()
    );

    Ok(FitOutcome {
        params: refined,
        best_fit,
        residual,
        components,
        chi_square,
        n_varying,
        iterations: minimum.iterations,
        evaluations: minimum.evaluations,
        termination: minimum.termination,
    })
}

/// Derive reporting quantities from a finished fit.
pub fn summarize_fit(
    outcome: &FitOutcome,
    spectrum: &Spectrum,
    calibration: &RubyCalibration,
) -> Result<FitSummary, AppError> {
    let v1 = peak_summary(&outcome.params, V1_PREFIX)?;
    let v2 = peak_summary(&outcome.params, V2_PREFIX)?;
    let background = outcome.params.value(&format!("{BACKGROUND_PREFIX}c"))?;

    let r_squared = r_squared(&outcome.residual, &spectrum.y)
        .ok_or_else(|| AppError::numerical("Observed data has zero variance; R² is undefined."))?;

    let dof = spectrum.len().saturating_sub(outcome.n_varying).max(1);
    let r1_center = v1.center.max(v2.center);

    Ok(FitSummary {
        background,
        r_squared,
        chi_square: outcome.chi_square,
        reduced_chi_square: outcome.chi_square / dof as f64,
        r1: calibrate_line(r1_center, calibration)?,
        v1,
        v2,
    })
}

fn peak_summary(params: &ParamSet, prefix: &str) -> Result<PeakSummary, AppError> {
    let center = params.value(&format!("{prefix}center"))?;
    let amplitude = params.value(&format!("{prefix}amplitude"))?;
    let sigma = params.value(&format!("{prefix}sigma"))?;
    Ok(PeakSummary {
        prefix: prefix.to_string(),
        center,
        amplitude,
        sigma,
        fwhm: voigt_fwhm(sigma, sigma),
        height: voigt_height(amplitude, sigma, sigma),
    })
}

/// Read refined seeds back out of a parameter set.
pub fn seeds_from_params(params: &ParamSet) -> Result<PeakSeeds, AppError> {
    let peak = |prefix: &str| -> Result<PeakSeed, AppError> {
        Ok(PeakSeed {
            center: params.value(&format!("{prefix}center"))?,
            amplitude: params.value(&format!("{prefix}amplitude"))?,
            sigma: params.value(&format!("{prefix}sigma"))?,
        })
    };
    Ok(PeakSeeds {
        v1: peak(V1_PREFIX)?,
        v2: peak(V2_PREFIX)?,
    })
}

/// Everything produced by one session-backed refinement.
#[derive(Debug, Clone)]
pub struct Refit {
    pub build: ModelBuild,
    pub outcome: FitOutcome,
    pub summary: FitSummary,
}

/// Fit using the seeds stored in `session`, then store the refined seeds back.
///
/// The session is left untouched when any step fails.
pub fn refit_with_session(
    spectrum: &Spectrum,
    session: &mut FitSession,
    config: &FitConfig,
) -> Result<Refit, AppError> {
    let build = build_ruby_model(spectrum, &session.seeds, config)?;
    let outcome = fit_model(&build.model, &build.params, spectrum, &config.optimizer)?;
    let summary = summarize_fit(&outcome, spectrum, &config.calibration)?;
    session.remember(seeds_from_params(&outcome.params)?);
    Ok(Refit {
        build,
        outcome,
        summary,
    })
}
