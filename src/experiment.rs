use crate::error::GridScanError;
use crate::grid::Grid;
use crate::phase::{HarmonicFit, PhaseEstimator};
use crate::pixel::{Axis, PixelArray};

use conv::prelude::*;
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use std::f64::consts::PI;

/// Grid-scan experiment: a pixel array observing a scanning grid at given times
///
/// Simulation and fitting are done independently for every pixel, in parallel. All outputs
/// follow the [PixelArray] enumeration order.
#[derive(Clone, Debug)]
pub struct Experiment {
    pixel_array: PixelArray,
    grid: Grid,
    time: Array1<f64>,
    estimator: PhaseEstimator,
}

impl Experiment {
    /// Create a new [Experiment] with the default [PhaseEstimator]
    ///
    /// `time` (s) must be non-empty and strictly increasing.
    pub fn new(
        pixel_array: PixelArray,
        grid: Grid,
        time: impl Into<Array1<f64>>,
    ) -> Result<Self, GridScanError> {
        let time = time.into();
        if time.is_empty() || !time.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(GridScanError::UnsortedTime);
        }
        Ok(Self {
            pixel_array,
            grid,
            time,
            estimator: PhaseEstimator::default(),
        })
    }

    /// Replace the phase estimator
    pub fn with_estimator(self, estimator: PhaseEstimator) -> Self {
        Self { estimator, ..self }
    }

    pub fn pixel_array(&self) -> &PixelArray {
        &self.pixel_array
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub fn estimator(&self) -> &PhaseEstimator {
        &self.estimator
    }

    /// Simulated light curves of all pixels, one row per pixel
    ///
    /// `axis` is either [Axis] or its name, `"x"` or `"y"`.
    pub fn modulation<A>(&self, axis: A) -> Result<Array2<f64>, GridScanError>
    where
        A: TryInto<Axis>,
        GridScanError: From<A::Error>,
    {
        Ok(self.simulate(axis.try_into()?))
    }

    fn simulate(&self, axis: Axis) -> Array2<f64> {
        log::debug!(
            "simulating {} light curves of {} samples along {axis}",
            self.pixel_array.len(),
            self.time.len()
        );
        let curves: Vec<_> = self
            .pixel_array
            .pixels()
            .par_iter()
            .map(|pixel| pixel.evaluate(axis, self.time.view(), &self.grid))
            .collect();

        let mut modulation = Array2::zeros((curves.len(), self.time.len()));
        for (mut row, curve) in modulation.rows_mut().into_iter().zip(curves) {
            row.assign(&curve);
        }
        modulation
    }

    fn fit_all<A>(
        &self,
        axis: A,
        counts: Option<ArrayView2<f64>>,
    ) -> Result<Vec<HarmonicFit>, GridScanError>
    where
        A: TryInto<Axis>,
        GridScanError: From<A::Error>,
    {
        let axis = axis.try_into()?;
        match counts {
            Some(counts) => {
                let (pixels, samples) = (self.pixel_array.len(), self.time.len());
                if counts.dim() != (pixels, samples) {
                    return Err(GridScanError::ShapeMismatch {
                        actual: counts.dim(),
                        pixels,
                        samples,
                    });
                }
                self.fit_rows(axis, counts)
            }
            None => self.fit_rows(axis, self.simulate(axis).view()),
        }
    }

    fn fit_rows(
        &self,
        axis: Axis,
        counts: ArrayView2<'_, f64>,
    ) -> Result<Vec<HarmonicFit>, GridScanError> {
        log::debug!("fitting phases of {} light curves along {axis}", counts.nrows());
        let rows: Vec<_> = counts.outer_iter().collect();
        rows.into_par_iter()
            .map(|count| self.estimator.fit(self.time.view(), count, &self.grid))
            .collect()
    }

    /// Phase of every light curve
    ///
    /// If `counts` is `None` the light curves are simulated with [Experiment::modulation],
    /// otherwise it must have a row of `time.len()` samples for every pixel.
    pub fn estimate_phase<A>(
        &self,
        axis: A,
        counts: Option<ArrayView2<f64>>,
    ) -> Result<Array1<f64>, GridScanError>
    where
        A: TryInto<Axis>,
        GridScanError: From<A::Error>,
    {
        Ok(self
            .fit_all(axis, counts)?
            .into_iter()
            .map(|fit| fit.phase)
            .collect())
    }

    /// Phase and best-fit curve of every light curve, see [Experiment::estimate_phase]
    pub fn estimate_phase_with_fit<A>(
        &self,
        axis: A,
        counts: Option<ArrayView2<f64>>,
    ) -> Result<(Array1<f64>, Array2<f64>), GridScanError>
    where
        A: TryInto<Axis>,
        GridScanError: From<A::Error>,
    {
        let fits = self.fit_all(axis, counts)?;
        let phase = fits.iter().map(|fit| fit.phase).collect();
        let mut fit_curves = Array2::zeros((fits.len(), self.time.len()));
        for (mut row, fit) in fit_curves.rows_mut().into_iter().zip(fits) {
            row.assign(&fit.fit);
        }
        Ok((phase, fit_curves))
    }

    /// Nominal pixel positions rounded to the nearest half of the slit interval
    ///
    /// Returns `(y, x)` arrays in the enumeration order. Phase defines position only up to half
    /// of the slit interval, so these positions fix the integer part.
    pub fn reference_position(&self) -> (Array1<f64>, Array1<f64>) {
        let half_interval = 0.5 * self.grid.slit_interval();
        let ratio = self.pixel_array.scale() / half_interval;
        let size = self.pixel_array.size();
        let lattice: Vec<f64> = (0..size)
            .map(|i| {
                let i = i.approx_as::<f64>().unwrap_or(f64::NAN);
                (ratio * i).round_ties_even() * half_interval
            })
            .collect();
        let (y, x): (Vec<_>, Vec<_>) = itertools::iproduct!(lattice.iter(), lattice.iter())
            .map(|(&y, &x)| (y, x))
            .unzip();
        (y.into(), x.into())
    }

    /// Positions of all pixels relative to the first one, as `(y, x)` rows
    ///
    /// Position along each axis is the reference position plus $L/\pi$ times the phase
    /// difference to the first pixel, where $L$ is the slit interval.
    pub fn estimate_position(&self) -> Result<Array2<f64>, GridScanError> {
        let (ref_y, ref_x) = self.reference_position();
        let phase_x = self.estimate_phase(Axis::X, None)?;
        let phase_y = self.estimate_phase(Axis::Y, None)?;
        let factor = self.grid.slit_interval() / PI;

        let mut position = Array2::zeros((self.pixel_array.len(), 2));
        for (k, mut row) in position.rows_mut().into_iter().enumerate() {
            row[0] = ref_y[k] + factor * (phase_y[k] - phase_y[0]);
            row[1] = ref_x[k] + factor * (phase_x[k] - phase_x[0]);
        }
        Ok(position)
    }
}
