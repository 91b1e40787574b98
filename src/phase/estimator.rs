use crate::error::GridScanError;
use crate::grid::Grid;
use crate::nl_fit::{CurveFitAlgorithm, CurveFitTrait, Data};
use crate::phase::model::{HarmonicModel, NPARAMS};

use conv::prelude::*;
use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Best fit of the [HarmonicModel] to a light curve
#[derive(Clone, Debug)]
pub struct HarmonicFit {
    /// Fitted parameters $A_0 \dots A_4$
    pub params: [f64; NPARAMS],
    /// Recovered phase $\pi \tanh A_4$
    pub phase: f64,
    /// Model evaluated at the input times
    pub fit: Array1<f64>,
    pub reduced_chi2: f64,
    /// Convergence flag reported by the fitter, it doesn't affect the phase
    pub success: bool,
}

/// Recovers the modulation phase by fitting the [HarmonicModel]
///
/// The fit starts from $A_0$ equal to the mean count and all other parameters zero. With
/// `n_starts > 1` additional fits start from phases evenly spread over $(-\pi, \pi)$ and the one
/// with the lowest $\chi^2$ is kept, the first one wins ties. Note that the model phase is
/// defined up to $\pi / 2$ for a pure second-harmonic signal, so different starts may converge
/// to different, equally good, phase branches.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PhaseEstimator {
    algorithm: CurveFitAlgorithm,
    n_starts: usize,
}

impl PhaseEstimator {
    /// Minimum light curve length: one degree of freedom over the number of parameters
    pub const MIN_LENGTH: usize = NPARAMS + 1;

    pub fn new(algorithm: CurveFitAlgorithm, n_starts: usize) -> Self {
        assert!(n_starts > 0, "n_starts must be positive");
        Self {
            algorithm,
            n_starts,
        }
    }

    #[inline]
    pub fn default_algorithm() -> CurveFitAlgorithm {
        CurveFitAlgorithm::default()
    }

    #[inline]
    pub fn default_n_starts() -> usize {
        1
    }

    pub fn algorithm(&self) -> &CurveFitAlgorithm {
        &self.algorithm
    }

    pub fn n_starts(&self) -> usize {
        self.n_starts
    }

    /// Phases of the initial guesses, zero first for a single start
    fn initial_phases(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.n_starts.approx_as::<f64>().unwrap_or(1.0);
        (0..self.n_starts).map(move |k| {
            let k = k.approx_as::<f64>().unwrap_or(0.0);
            PI * (2.0 * k - n + 1.0) / n
        })
    }

    /// Fit the harmonic model to counts `c` observed at times `t`
    pub fn fit(
        &self,
        t: ArrayView1<f64>,
        c: ArrayView1<f64>,
        grid: &Grid,
    ) -> Result<HarmonicFit, GridScanError> {
        if t.len() != c.len() {
            return Err(GridScanError::LengthMismatch {
                t: t.len(),
                counts: c.len(),
            });
        }
        if t.len() < Self::MIN_LENGTH {
            return Err(GridScanError::ShortTimeSeries {
                actual: t.len(),
                minimum: Self::MIN_LENGTH,
            });
        }

        let model = HarmonicModel::new(grid);
        let data = Data::new(t.mapv(|t| model.tic(t)), c.to_owned());
        let mean = c.sum() / c.len().approx_as::<f64>().unwrap_or(f64::NAN);

        let best = self
            .initial_phases()
            .map(|initial_phase| {
                let x0 = [
                    mean,
                    0.0,
                    0.0,
                    0.0,
                    HarmonicModel::internal_phase(initial_phase),
                ];
                let result = self.algorithm.curve_fit(
                    &data,
                    &x0,
                    HarmonicModel::model,
                    HarmonicModel::derivatives,
                );
                log::trace!(
                    "harmonic fit from phase {:.3}: phase {:.6}, reduced chi2 {:.3e}",
                    initial_phase,
                    HarmonicModel::phase(result.x[4]),
                    result.reduced_chi2,
                );
                result
            })
            .reduce(|best, result| {
                if result.reduced_chi2 < best.reduced_chi2 || best.reduced_chi2.is_nan() {
                    result
                } else {
                    best
                }
            })
            .ok_or_else(|| GridScanError::invalid("n_starts", 0.0, "positive"))?;

        if !best.success {
            log::warn!(
                "harmonic fit has not converged, reduced chi2 is {:.3e}",
                best.reduced_chi2
            );
        }

        let fit = data.t.mapv(|tic| HarmonicModel::model(tic, &best.x));
        Ok(HarmonicFit {
            params: best.x,
            phase: HarmonicModel::phase(best.x[4]),
            fit,
            reduced_chi2: best.reduced_chi2,
            success: best.success,
        })
    }

    /// Phase of the light curve
    pub fn calc_phase(
        &self,
        t: ArrayView1<f64>,
        c: ArrayView1<f64>,
        grid: &Grid,
    ) -> Result<f64, GridScanError> {
        Ok(self.fit(t, c, grid)?.phase)
    }

    /// Phase of the light curve and the best-fit curve at times `t`
    pub fn calc_phase_with_fit(
        &self,
        t: ArrayView1<f64>,
        c: ArrayView1<f64>,
        grid: &Grid,
    ) -> Result<(f64, Array1<f64>), GridScanError> {
        let HarmonicFit { phase, fit, .. } = self.fit(t, c, grid)?;
        Ok((phase, fit))
    }
}

impl Default for PhaseEstimator {
    fn default() -> Self {
        Self::new(Self::default_algorithm(), Self::default_n_starts())
    }
}

/// Phase of the light curve `c` using the default [PhaseEstimator]
pub fn calc_phase(
    t: ArrayView1<f64>,
    c: ArrayView1<f64>,
    grid: &Grid,
) -> Result<f64, GridScanError> {
    PhaseEstimator::default().calc_phase(t, c, grid)
}

/// Phase and best-fit curve of the light curve `c` using the default [PhaseEstimator]
pub fn calc_phase_with_fit(
    t: ArrayView1<f64>,
    c: ArrayView1<f64>,
    grid: &Grid,
) -> Result<(f64, Array1<f64>), GridScanError> {
    PhaseEstimator::default().calc_phase_with_fit(t, c, grid)
}
