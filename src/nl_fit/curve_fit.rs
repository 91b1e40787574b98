use crate::nl_fit::cobyla::CobylaCurveFit;
use crate::nl_fit::data::Data;
use crate::nl_fit::lm::LmCurveFit;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Outcome of a single minimisation
#[derive(Clone, Debug)]
pub struct CurveFitResult<const NPARAMS: usize> {
    /// Best-fit parameters
    pub x: [f64; NPARAMS],
    /// Sum of squared residuals divided by the number of degrees of freedom
    pub reduced_chi2: f64,
    /// Convergence flag as reported by the algorithm
    pub success: bool,
}

#[enum_dispatch]
pub trait CurveFitTrait: Clone + Debug {
    /// Minimise the sum of squared residuals of `model` starting from `x0`
    ///
    /// `derivatives` fills the gradient of `model` over parameters, fitters which don't need it
    /// never call it.
    fn curve_fit<F, DF, const NPARAMS: usize>(
        &self,
        data: &Data,
        x0: &[f64; NPARAMS],
        model: F,
        derivatives: DF,
    ) -> CurveFitResult<NPARAMS>
    where
        F: Clone + Fn(f64, &[f64; NPARAMS]) -> f64,
        DF: Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]);
}

/// Optimization algorithm for non-linear least squares
///
/// All variants implement [CurveFitTrait]
#[enum_dispatch(CurveFitTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum CurveFitAlgorithm {
    Lm(LmCurveFit),
    Cobyla(CobylaCurveFit),
}

impl Default for CurveFitAlgorithm {
    fn default() -> Self {
        LmCurveFit::default().into()
    }
}
