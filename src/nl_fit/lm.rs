use crate::nl_fit::curve_fit::{CurveFitResult, CurveFitTrait};
use crate::nl_fit::data::Data;
use crate::nl_fit::linalg::solve;

use ndarray::Zip;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;
const MIN_LAMBDA: f64 = 1e-12;
const MAX_LAMBDA: f64 = 1e16;

/// Levenberg–Marquardt non-linear least-squares fitter
///
/// Each iteration solves the damped normal equations
/// $(J^T J + \lambda\,(\mathrm{diag}\,J^T J + I))\,\delta = J^T r$ and accepts the step if it
/// doesn't increase $\chi^2$. The identity term keeps the system solvable when the Jacobian is
/// rank-deficient, e.g. for degenerate model parameters or a vanishing amplitude.
///
/// The fit stops when the relative $\chi^2$ decrease is below `ftol`, the largest step is below
/// `xtol` (relative to the parameter scale), no downhill step can be found, or after
/// `niterations` iterations. Only the last case is reported as unsuccessful.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Lm")]
pub struct LmCurveFit {
    niterations: u32,
    ftol: f64,
    xtol: f64,
    initial_lambda: f64,
}

impl LmCurveFit {
    /// Create a new [LmCurveFit].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of accepted steps
    /// - `ftol`: relative tolerance on the sum of squared residuals
    /// - `xtol`: relative tolerance on the parameter step
    /// - `initial_lambda`: initial damping factor
    pub fn new(niterations: u32, ftol: f64, xtol: f64, initial_lambda: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(ftol >= 0.0 && ftol.is_finite(), "ftol must be non-negative");
        assert!(xtol >= 0.0 && xtol.is_finite(), "xtol must be non-negative");
        assert!(
            initial_lambda > 0.0 && initial_lambda.is_finite(),
            "initial_lambda must be positive"
        );
        Self {
            niterations,
            ftol,
            xtol,
            initial_lambda,
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        200
    }

    #[inline]
    pub fn default_ftol() -> f64 {
        1e-12
    }

    #[inline]
    pub fn default_xtol() -> f64 {
        1e-10
    }

    #[inline]
    pub fn default_initial_lambda() -> f64 {
        1e-3
    }

    pub fn niterations(&self) -> u32 {
        self.niterations
    }
}

impl Default for LmCurveFit {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_ftol(),
            Self::default_xtol(),
            Self::default_initial_lambda(),
        )
    }
}

/// $J^T J$ and $J^T r$ where $r = m - f$
fn normal_equations<F, DF, const NPARAMS: usize>(
    data: &Data,
    x: &[f64; NPARAMS],
    model: &F,
    derivatives: &DF,
) -> ([[f64; NPARAMS]; NPARAMS], [f64; NPARAMS])
where
    F: Fn(f64, &[f64; NPARAMS]) -> f64,
    DF: Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
{
    let mut jtj = [[0.0; NPARAMS]; NPARAMS];
    let mut jtr = [0.0; NPARAMS];
    let mut jac = [0.0; NPARAMS];
    Zip::from(&data.t).and(&data.m).for_each(|&t, &m| {
        let residual = m - model(t, x);
        derivatives(t, x, &mut jac);
        for i in 0..NPARAMS {
            jtr[i] += jac[i] * residual;
            for j in i..NPARAMS {
                jtj[i][j] += jac[i] * jac[j];
            }
        }
    });
    for i in 0..NPARAMS {
        for j in 0..i {
            jtj[i][j] = jtj[j][i];
        }
    }
    (jtj, jtr)
}

impl CurveFitTrait for LmCurveFit {
    fn curve_fit<F, DF, const NPARAMS: usize>(
        &self,
        data: &Data,
        x0: &[f64; NPARAMS],
        model: F,
        derivatives: DF,
    ) -> CurveFitResult<NPARAMS>
    where
        F: Clone + Fn(f64, &[f64; NPARAMS]) -> f64,
        DF: Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
    {
        let mut x = *x0;
        let mut chi2 = data.chi2(&model, &x);
        let mut lambda = self.initial_lambda;
        let mut converged = false;

        for _ in 0..self.niterations {
            let (jtj, jtr) = normal_equations(data, &x, &model, &derivatives);

            let mut step = None;
            while lambda <= MAX_LAMBDA {
                let mut damped = jtj;
                for (i, row) in damped.iter_mut().enumerate() {
                    row[i] += lambda * (jtj[i][i] + 1.0);
                }
                if let Some(delta) = solve(damped, jtr) {
                    let mut candidate = x;
                    for (c, d) in candidate.iter_mut().zip(delta.iter()) {
                        *c += d;
                    }
                    let candidate_chi2 = data.chi2(&model, &candidate);
                    if candidate_chi2 <= chi2 {
                        step = Some((candidate, candidate_chi2, delta));
                        break;
                    }
                }
                lambda *= LAMBDA_UP;
            }

            let Some((candidate, candidate_chi2, delta)) = step else {
                // Nothing downhill, we are at a stationary point
                converged = chi2.is_finite();
                break;
            };

            let relative_decrease = (chi2 - candidate_chi2) / chi2.max(f64::MIN_POSITIVE);
            let max_step = delta.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
            let scale = candidate.iter().fold(1.0_f64, |acc, c| acc.max(c.abs()));
            x = candidate;
            chi2 = candidate_chi2;
            lambda = (lambda * LAMBDA_DOWN).max(MIN_LAMBDA);
            if relative_decrease < self.ftol || max_step < self.xtol * scale {
                converged = true;
                break;
            }
        }

        CurveFitResult {
            x,
            reduced_chi2: data.reduce_chi2(chi2, NPARAMS),
            success: converged,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use rand::prelude::*;
    use rand_distr::StandardNormal;

    fn nonlinear_func(t: f64, param: &[f64; 3]) -> f64 {
        param[1] * f64::exp(-param[0] * t) * t.powi(2) + param[2]
    }

    fn nonlinear_func_derivatives(t: f64, param: &[f64; 3], derivatives: &mut [f64; 3]) {
        derivatives[0] = -param[1] * f64::exp(-param[0] * t) * t.powi(3);
        derivatives[1] = f64::exp(-param[0] * t) * t.powi(2);
        derivatives[2] = 1.0;
    }

    #[test]
    fn nonlinear() {
        const N: usize = 300;
        const NOISE: f64 = 0.5;

        let param_true = [0.75, 2.0, 0.5];
        let param_init = [1.0, 1.0, 1.0];

        let mut rng = StdRng::seed_from_u64(0);

        let t = Array1::linspace(0.0, 10.0, N);
        let y = t.mapv(|x| {
            let eps: f64 = rng.sample(StandardNormal);
            nonlinear_func(x, &param_true) + NOISE * eps
        });
        let data = Data::new(t, y);

        let fitter = LmCurveFit::default();
        let result = fitter.curve_fit(
            &data,
            &param_init,
            nonlinear_func,
            nonlinear_func_derivatives,
        );

        assert!(result.success);
        assert_abs_diff_eq!(
            &result.x[..],
            &param_true[..],
            epsilon = 0.4
        );
        // reduced chi2 is of order of unity in the units of noise variance
        assert!(result.reduced_chi2 < 2.0 * NOISE.powi(2));
    }

    #[test]
    fn exact_polynomial() {
        const N: usize = 50;

        let param_true = [1.0, 2.0, 0.5];
        let t = Array1::linspace(0.0, 5.0, N);
        let y = t.mapv(|x: f64| param_true[0] + param_true[1] * x + param_true[2] * x.powi(2));
        let data = Data::new(t, y);

        let quadratic_func = |t: f64, p: &[f64; 3]| p[0] + p[1] * t + p[2] * t.powi(2);
        let quadratic_derivatives = |t: f64, _p: &[f64; 3], d: &mut [f64; 3]| {
            d[0] = 1.0;
            d[1] = t;
            d[2] = t.powi(2);
        };

        let result = LmCurveFit::default().curve_fit(
            &data,
            &[0.0; 3],
            quadratic_func,
            quadratic_derivatives,
        );
        assert!(result.success);
        assert_abs_diff_eq!(&result.x[..], &param_true[..], epsilon = 1e-6);
        assert!(result.reduced_chi2 < 1e-12);
    }

    #[test]
    fn degenerate_parameters() {
        // p[1] and p[2] enter the model only as a sum
        const N: usize = 40;
        let t = Array1::linspace(-1.0, 1.0, N);
        let y = t.mapv(|x| 0.5 + 3.0 * x);
        let data = Data::new(t, y);

        let result = LmCurveFit::default().curve_fit(
            &data,
            &[0.0; 3],
            |t: f64, p: &[f64; 3]| p[0] + (p[1] + p[2]) * t,
            |t: f64, _p: &[f64; 3], d: &mut [f64; 3]| {
                d[0] = 1.0;
                d[1] = t;
                d[2] = t;
            },
        );
        assert!(result.success);
        assert_abs_diff_eq!(result.x[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.x[1] + result.x[2], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.x[1], result.x[2], epsilon = 1e-6);
    }

    #[test]
    fn iteration_limit() {
        let t = Array1::linspace(0.0, 10.0, 100);
        let y = t.mapv(|x| nonlinear_func(x, &[0.75, 2.0, 0.5]));
        let data = Data::new(t, y);
        let result = LmCurveFit::new(1, 0.0, 0.0, 1e-3).curve_fit(
            &data,
            &[1.0, 1.0, 1.0],
            nonlinear_func,
            nonlinear_func_derivatives,
        );
        assert!(!result.success);
    }
}
