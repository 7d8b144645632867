//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! seeds -> model build -> (optional) refinement -> summary -> session update

use crate::domain::{FitConfig, FitSession, Spectrum};
use crate::error::AppError;
use crate::fit::{ModelBuild, Refit, build_ruby_model, refit_with_session};

/// All computed outputs of a single `specfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Model evaluated at the starting seeds.
    pub build: ModelBuild,
    /// Absent for guess-only runs.
    pub refit: Option<Refit>,
}

/// Build the ruby model from the session seeds and, unless `guess_only`, refine it.
///
/// A successful refinement writes the refined seeds back into `session`.
pub fn run_fit(
    spectrum: &Spectrum,
    session: &mut FitSession,
    config: &FitConfig,
    guess_only: bool,
) -> Result<RunOutput, AppError> {
    if guess_only {
        let build = build_ruby_model(spectrum, &session.seeds, config)?;
        return Ok(RunOutput { build, refit: None });
    }

    let refit = refit_with_session(spectrum, session, config)?;
    Ok(RunOutput {
        build: refit.build.clone(),
        refit: Some(refit),
    })
}
