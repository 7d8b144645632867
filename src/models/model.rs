//! Composite spectral model.
//!
//! A model is an ordered list of prefixed components. Each component reads its
//! parameters from a shared `ParamSet` using the `<prefix><name>` convention,
//! e.g. `bkg_c`, `v1_center`, `v2_sigma`. The model value is the pointwise sum
//! of all components.

use serde::{Deserialize, Serialize};

use crate::domain::ParamSet;
use crate::error::AppError;
use crate::models::lineshape::voigt;

/// Line shape of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Constant offset, parameter `c`.
    Constant,
    /// Voigt peak with `γ = σ`; parameters `amplitude`, `center`, `sigma`.
    Voigt,
}

impl Shape {
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            Shape::Constant => &["c"],
            Shape::Voigt => &["amplitude", "center", "sigma"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub prefix: String,
    pub shape: Shape,
}

impl Component {
    pub fn param_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Evaluate this component alone at every `x`.
    pub fn eval(&self, params: &ParamSet, x: &[f64]) -> Result<Vec<f64>, AppError> {
        match self.shape {
            Shape::Constant => {
                let c = params.value(&self.param_name("c"))?;
                Ok(vec![c; x.len()])
            }
            Shape::Voigt => {
                let amplitude = params.value(&self.param_name("amplitude"))?;
                let center = params.value(&self.param_name("center"))?;
                let sigma = params.value(&self.param_name("sigma"))?;
                Ok(x.iter()
                    .map(|&xi| voigt(xi, amplitude, center, sigma, sigma))
                    .collect())
            }
        }
    }
}

/// Sum of components.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositeModel {
    components: Vec<Component>,
}

impl CompositeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component (builder style).
    pub fn with(mut self, prefix: impl Into<String>, shape: Shape) -> Self {
        self.components.push(Component {
            prefix: prefix.into(),
            shape,
        });
        self
    }

    /// All parameter names in component order.
    pub fn param_names(&self) -> Vec<String> {
        self.components
            .iter()
            .flat_map(|c| c.shape.param_names().iter().map(move |n| c.param_name(n)))
            .collect()
    }

    /// Evaluate the full model at every `x`.
    pub fn eval(&self, params: &ParamSet, x: &[f64]) -> Result<Vec<f64>, AppError> {
        let mut total = vec![0.0; x.len()];
        for component in &self.components {
            let part = component.eval(params, x)?;
            for (t, p) in total.iter_mut().zip(part) {
                *t += p;
            }
        }
        Ok(total)
    }

    /// Evaluate each component separately, keyed by prefix.
    pub fn eval_components(
        &self,
        params: &ParamSet,
        x: &[f64],
    ) -> Result<Vec<(String, Vec<f64>)>, AppError> {
        self.components
            .iter()
            .map(|c| Ok((c.prefix.clone(), c.eval(params, x)?)))
            .collect()
    }
}
