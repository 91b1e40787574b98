use crate::error::{GridScanError, ensure_positive};

use ndarray::Array2;
use schemars::JsonSchema;
use serde::Serialize;

/// Finite stand-in for infinity bounding the outermost transparent windows (µm)
pub const SENTINEL_ABSCISSA: f64 = 1e8;

/// Scanning slit mask
///
/// Transparent slits of `transparent_width` alternate with opaque lines of `opaque_width`, the
/// pattern repeats every `slit_interval`. The mask is moved with constant `velocity`. Beyond the
/// `slit_number` slits the mask is transparent on both sides, see [Grid::abscissa].
#[derive(Clone, Debug, Serialize, JsonSchema, PartialEq)]
pub struct Grid {
    transparent_width: f64,
    opaque_width: f64,
    slit_number: usize,
    velocity: f64,
    slit_interval: f64,
}

impl Grid {
    /// Create a new [Grid]
    ///
    /// # Arguments
    /// - `transparent_width`: width of a transparent slit (µm), positive
    /// - `opaque_width`: width of an opaque grid line (µm), positive
    /// - `slit_number`: total number of slits, positive
    /// - `velocity`: scanning speed (µm/s), finite, may be zero or negative
    pub fn new(
        transparent_width: f64,
        opaque_width: f64,
        slit_number: usize,
        velocity: f64,
    ) -> Result<Self, GridScanError> {
        let transparent_width = ensure_positive("transparent_width", transparent_width)?;
        let opaque_width = ensure_positive("opaque_width", opaque_width)?;
        if slit_number == 0 {
            return Err(GridScanError::invalid(
                "slit_number",
                slit_number as f64,
                "positive",
            ));
        }
        if !velocity.is_finite() {
            return Err(GridScanError::invalid("velocity", velocity, "finite"));
        }
        Ok(Self {
            transparent_width,
            opaque_width,
            slit_number,
            velocity,
            slit_interval: transparent_width + opaque_width,
        })
    }

    #[inline]
    pub fn default_transparent_width() -> f64 {
        6.0
    }

    #[inline]
    pub fn default_opaque_width() -> f64 {
        15.0
    }

    #[inline]
    pub fn default_slit_number() -> usize {
        100
    }

    #[inline]
    pub fn default_velocity() -> f64 {
        1.0
    }

    pub fn transparent_width(&self) -> f64 {
        self.transparent_width
    }

    pub fn opaque_width(&self) -> f64 {
        self.opaque_width
    }

    pub fn slit_number(&self) -> usize {
        self.slit_number
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Spatial period of the mask pattern, `transparent_width + opaque_width`
    pub fn slit_interval(&self) -> f64 {
        self.slit_interval
    }

    /// Bounds `[start, end]` of the transparent window of slit `k` in the mask frame
    ///
    /// Slit zero is centred at the origin and slits go toward $-\infty$ with growing `k`.
    /// Negative `k` gives the transparent region before the first slit, `k >= slit_number` the
    /// region after the last one; both are bounded by [SENTINEL_ABSCISSA].
    pub fn abscissa(&self, k: isize) -> [f64; 2] {
        let half = 0.5 * self.transparent_width;
        if k < 0 {
            return [half + self.opaque_width, SENTINEL_ABSCISSA];
        }
        if k as usize >= self.slit_number {
            return [
                -SENTINEL_ABSCISSA,
                -(self.slit_number as f64) * self.slit_interval + half,
            ];
        }
        let x0 = -(k as f64) * self.slit_interval + half;
        [x0 - self.transparent_width, x0]
    }

    /// All transparent windows for `k` from `-1` to `slit_number` inclusive
    ///
    /// Rows are `[start, end]` pairs, `slit_number + 2` rows in total.
    pub fn abscissa_list(&self) -> Array2<f64> {
        let n = self.slit_number as isize;
        let mut list = Array2::zeros((self.slit_number + 2, 2));
        for (mut row, k) in list.rows_mut().into_iter().zip(-1..=n) {
            let [start, end] = self.abscissa(k);
            row[0] = start;
            row[1] = end;
        }
        list
    }
}

impl Default for Grid {
    fn default() -> Self {
        let transparent_width = Self::default_transparent_width();
        let opaque_width = Self::default_opaque_width();
        Self {
            transparent_width,
            opaque_width,
            slit_number: Self::default_slit_number(),
            velocity: Self::default_velocity(),
            slit_interval: transparent_width + opaque_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn slit_interval() {
        let grid = Grid::new(6.0, 15.0, 100, 1.0).unwrap();
        assert_eq!(grid.slit_interval(), 21.0);
        assert_eq!(grid, Grid::default());
    }

    #[test]
    fn inner_windows() {
        let grid = Grid::new(6.0, 15.0, 100, 1.0).unwrap();
        assert_eq!(grid.abscissa(0), [-3.0, 3.0]);
        assert_eq!(grid.abscissa(1), [-24.0, -18.0]);
        for k in 0..100 {
            let [start, end] = grid.abscissa(k);
            assert_abs_diff_eq!(end - start, 6.0, epsilon = 1e-9);
            assert_abs_diff_eq!(end, -(k as f64) * 21.0 + 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn sentinel_windows() {
        let grid = Grid::new(6.0, 15.0, 100, 1.0).unwrap();
        assert_eq!(grid.abscissa(-1), [18.0, 1e8]);
        assert_eq!(grid.abscissa(-7), [18.0, 1e8]);
        assert_eq!(grid.abscissa(100), [-1e8, -2097.0]);
        assert_eq!(grid.abscissa(1000), [-1e8, -2097.0]);
    }

    #[test]
    fn abscissa_list_order() {
        let grid = Grid::new(2.0, 3.0, 4, 0.5).unwrap();
        let list = grid.abscissa_list();
        assert_eq!(list.shape(), &[6, 2]);
        assert_eq!(list.row(0).to_vec(), vec![4.0, 1e8]);
        assert_eq!(list.row(1).to_vec(), vec![-1.0, 1.0]);
        assert_eq!(list.row(4).to_vec(), vec![-16.0, -14.0]);
        assert_eq!(list.row(5).to_vec(), vec![-1e8, -19.0]);
        // windows are disjoint and ordered toward -inf
        for k in 1..6 {
            assert!(list[[k, 1]] < list[[k - 1, 0]]);
        }
    }

    #[test]
    fn invalid_parameters() {
        assert!(Grid::new(0.0, 15.0, 100, 1.0).is_err());
        assert!(Grid::new(6.0, -1.0, 100, 1.0).is_err());
        assert!(Grid::new(6.0, 15.0, 0, 1.0).is_err());
        assert!(Grid::new(6.0, 15.0, 100, f64::NAN).is_err());
        assert!(Grid::new(6.0, 15.0, 100, 0.0).is_ok());
        assert!(Grid::new(6.0, 15.0, 100, -2.0).is_ok());
    }
}
