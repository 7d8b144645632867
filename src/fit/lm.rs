//! Levenberg-Marquardt nonlinear least squares.
//!
//! We minimize `½‖r(p)‖²` for a residual function `r: ℝⁿ → ℝᵐ`.
//!
//! Each step solves the damped linearized problem
//!
//! ```text
//! minimize ‖ J δ + r ‖² + λ ‖ D δ ‖²
//! ```
//!
//! with a forward-difference Jacobian `J` and Marquardt's scaling `D`
//! (running maximum of the Jacobian column norms). Successful steps shrink
//! `λ`, rejected steps grow it.

use nalgebra::{DMatrix, DVector};

use crate::domain::OptimizerOptions;
use crate::error::AppError;
use crate::math::solve_least_squares;

/// Initial damping factor.
const LAMBDA_INIT: f64 = 1e-3;
/// Damping above which no downhill step exists at working precision.
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_MIN: f64 = 1e-15;

/// A residual function the optimizer can drive.
pub trait LeastSquaresProblem {
    /// Residual vector at `params`; `None` when the model cannot be evaluated
    /// there (non-finite output, invalid parameters).
    fn residuals(&self, params: &DVector<f64>) -> Option<DVector<f64>>;
}

/// Why the optimizer stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Gradient infinity norm below `gtol`.
    Gradient,
    /// Relative cost reduction below `ftol`.
    CostReduction,
    /// Relative step size below `xtol`.
    StepSize,
    /// Residuals vanished.
    ZeroResidual,
    /// No downhill step exists at working precision.
    NoFurtherImprovement,
}

impl Termination {
    pub fn description(self) -> &'static str {
        match self {
            Termination::Gradient => "gradient below tolerance",
            Termination::CostReduction => "cost reduction below tolerance",
            Termination::StepSize => "step size below tolerance",
            Termination::ZeroResidual => "residuals vanished",
            Termination::NoFurtherImprovement => "no further improvement possible",
        }
    }
}

/// Result of a successful minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// `½‖r‖²`
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    options: OptimizerOptions,
}

impl LevenbergMarquardt {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Minimize starting from `initial`.
    ///
    /// Fails with `FitDidNotConverge` when the residuals are not finite at the
    /// start or the iteration budget runs out.
    pub fn minimize<P: LeastSquaresProblem>(
        &self,
        problem: &P,
        initial: DVector<f64>,
    ) -> Result<Minimum, AppError> {
        let n = initial.len();
        let mut params = initial;
        let mut residuals = problem
            .residuals(&params)
            .ok_or_else(|| AppError::not_converged("Model cannot be evaluated at the initial parameters."))?;
        let m = residuals.len();
        if m < n {
            return Err(AppError::invalid_config(format!(
                "Fewer data points ({m}) than free parameters ({n})."
            )));
        }

        let mut cost = 0.5 * residuals.norm_squared();
        let mut evaluations = 1usize;
        let mut lambda = LAMBDA_INIT;
        let mut scale = DVector::<f64>::zeros(n);
        let mut iterations = 0usize;

        if n == 0 {
            return Ok(Minimum {
                params,
                residuals,
                cost,
                iterations,
                evaluations,
                termination: Termination::Gradient,
            });
        }

        loop {
            if cost == 0.0 {
                return Ok(Minimum {
                    params,
                    residuals,
                    cost,
                    iterations,
                    evaluations,
                    termination: Termination::ZeroResidual,
                });
            }

            let jac = forward_jacobian(problem, &params, &residuals)?;
            evaluations += n;

            let gradient = jac.transpose() * &residuals;
            if gradient.amax() <= self.options.gtol {
                return Ok(Minimum {
                    params,
                    residuals,
                    cost,
                    iterations,
                    evaluations,
                    termination: Termination::Gradient,
                });
            }

            for (j, col) in jac.column_iter().enumerate() {
                scale[j] = scale[j].max(col.norm());
            }

            // Inner loop: raise λ until a step lowers the cost.
            loop {
                iterations += 1;
                if iterations > self.options.max_iterations {
                    return Err(AppError::not_converged(format!(
                        "Fit did not converge within {} iterations (cost {cost:.6e}).",
                        self.options.max_iterations
                    )));
                }

                let step = damped_step(&jac, &residuals, &scale, lambda);
                let Some(step) = step else {
                    lambda *= 10.0;
                    if lambda > LAMBDA_MAX {
                        return Err(AppError::numerical("Levenberg-Marquardt step could not be solved."));
                    }
                    continue;
                };

                let candidate = &params + &step;
                let trial = problem.residuals(&candidate);
                evaluations += 1;

                let trial_cost = trial.as_ref().map(|r| 0.5 * r.norm_squared());
                match (trial, trial_cost) {
                    (Some(r), Some(c)) if c.is_finite() && c < cost => {
                        let reduction = (cost - c) / cost;
                        let step_norm = step.norm();
                        params = candidate;
                        residuals = r;
                        cost = c;
                        lambda = (lambda / 10.0).max(LAMBDA_MIN);

                        log::trace!("lm: iter={iterations} cost={cost:.6e} lambda={lambda:.1e}");

                        let termination = if reduction <= self.options.ftol {
                            Some(Termination::CostReduction)
                        } else if step_norm <= self.options.xtol * (params.norm() + self.options.xtol) {
                            Some(Termination::StepSize)
                        } else {
                            None
                        };
                        if let Some(termination) = termination {
                            return Ok(Minimum {
                                params,
                                residuals,
                                cost,
                                iterations,
                                evaluations,
                                termination,
                            });
                        }
                        break;
                    }
                    _ => {
                        lambda *= 10.0;
                        if lambda > LAMBDA_MAX {
                            return Ok(Minimum {
                                params,
                                residuals,
                                cost,
                                iterations,
                                evaluations,
                                termination: Termination::NoFurtherImprovement,
                            });
                        }
                    }
                }
            }
        }
    }
}

fn forward_jacobian<P: LeastSquaresProblem>(
    problem: &P,
    params: &DVector<f64>,
    residuals: &DVector<f64>,
) -> Result<DMatrix<f64>, AppError> {
    let n = params.len();
    let m = residuals.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let base_step = f64::EPSILON.sqrt();

    for j in 0..n {
        let h = base_step * params[j].abs().max(1.0);
        let mut shifted = params.clone();
        shifted[j] += h;
        let r = problem
            .residuals(&shifted)
            .ok_or_else(|| AppError::numerical("Model cannot be evaluated while building the Jacobian."))?;
        jac.set_column(j, &((r - residuals) / h));
    }

    Ok(jac)
}

/// Solve `[J; √λ·D] δ ≈ [−r; 0]`.
fn damped_step(
    jac: &DMatrix<f64>,
    residuals: &DVector<f64>,
    scale: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, n) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(jac);
    let damping = lambda.sqrt();
    for j in 0..n {
        a[(m + j, j)] = damping * scale[j];
    }

    let mut b = DVector::<f64>::zeros(m + n);
    b.rows_mut(0, m).copy_from(&(-residuals));

    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exponential decay `y = a·exp(−k t)`.
    struct Decay {
        t: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Decay {
        fn residuals(&self, p: &DVector<f64>) -> Option<DVector<f64>> {
            Some(DVector::from_iterator(
                self.t.len(),
                self.t
                    .iter()
                    .zip(&self.y)
                    .map(|(t, y)| p[0] * (-p[1] * t).exp() - y),
            ))
        }
    }

    #[test]
    fn recovers_exponential_decay() {
        let t: Vec<f64> = (0..30).map(|i| i as f64 * 0.2).collect();
        let y = t.iter().map(|t| 3.0 * (-0.7 * t).exp()).collect();
        let problem = Decay { t, y };

        let lm = LevenbergMarquardt::new(OptimizerOptions::default());
        let min = lm
            .minimize(&problem, DVector::from_row_slice(&[1.0, 0.1]))
            .unwrap();
        assert!((min.params[0] - 3.0).abs() < 1e-6, "{:?}", min.params);
        assert!((min.params[1] - 0.7).abs() < 1e-6);
        assert!(min.cost < 1e-12);
    }

    #[test]
    fn exhausted_budget_is_reported() {
        let t: Vec<f64> = (0..30).map(|i| i as f64 * 0.2).collect();
        let y = t.iter().map(|t| 3.0 * (-0.7 * t).exp()).collect();
        let problem = Decay { t, y };

        let options = OptimizerOptions {
            max_iterations: 1,
            ..OptimizerOptions::default()
        };
        let err = LevenbergMarquardt::new(options)
            .minimize(&problem, DVector::from_row_slice(&[1.0, 0.1]))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FitDidNotConverge);
    }
}
