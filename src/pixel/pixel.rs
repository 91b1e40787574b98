use crate::grid::Grid;
use crate::pixel::Axis;
use crate::response::{Response, ResponseFunction};

use ndarray::{Array1, ArrayView1, Zip};
use schemars::JsonSchema;
use serde::Serialize;

/// Individual detector pixel
///
/// `x` and `y` are coordinates of the pixel centre (µm), `response` is the integrated
/// one-dimensional pixel response used for both axes.
#[derive(Clone, Debug, Serialize, JsonSchema, PartialEq)]
pub struct Pixel {
    x: f64,
    y: f64,
    response: Response,
}

impl Pixel {
    pub fn new(x: f64, y: f64, response: impl Into<Response>) -> Self {
        Self {
            x,
            y,
            response: response.into(),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    #[inline]
    pub fn coordinate(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Light curve of the pixel while `grid` is scanned along `axis`
    ///
    /// For every time sample the coverage of the pixel by all transparent windows of the grid is
    /// summed up. Values are nominally within $[0, 1]$, but soft response edges may push them
    /// slightly outside.
    pub fn evaluate(&self, axis: Axis, t: ArrayView1<f64>, grid: &Grid) -> Array1<f64> {
        let coordinate = self.coordinate(axis);
        let offset = t.mapv(|t| t * grid.velocity() - coordinate);
        let mut counts = Array1::zeros(t.len());
        for window in grid.abscissa_list().rows() {
            let (start, end) = (window[0], window[1]);
            Zip::from(&mut counts).and(&offset).for_each(|c, &x0| {
                *c += self.response.response(x0 + end) - self.response.response(x0 + start);
            });
        }
        counts
    }

    pub fn evaluate_x(&self, t: ArrayView1<f64>, grid: &Grid) -> Array1<f64> {
        self.evaluate(Axis::X, t, grid)
    }

    pub fn evaluate_y(&self, t: ArrayView1<f64>, grid: &Grid) -> Array1<f64> {
        self.evaluate(Axis::Y, t, grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{SuperGaussianResponse, TopHatResponse};

    use approx::assert_abs_diff_eq;

    #[test]
    fn static_grid_gives_constant_counts() {
        let grid = Grid::new(6.0, 15.0, 100, 0.0).unwrap();
        let pixel = Pixel::new(1.0, 1.0, SuperGaussianResponse::default());
        let t = Array1::linspace(0.0, 300.0, 50);
        let counts = pixel.evaluate_x(t.view(), &grid);
        let at_zero = pixel.evaluate_x(Array1::from(vec![0.0]).view(), &grid)[0];
        for &c in counts.iter() {
            assert_eq!(c, at_zero);
        }
    }

    #[test]
    fn top_hat_coverage() {
        // 4 µm pixel fully inside the 6 µm slit zero, then fully behind the opaque line
        let grid = Grid::new(6.0, 15.0, 100, 1.0).unwrap();
        let pixel = Pixel::new(0.0, 0.0, TopHatResponse::new(4.0).unwrap());
        let t = Array1::from(vec![0.0, 10.5, 21.0, 3.0]);
        let counts = pixel.evaluate_x(t.view(), &grid);
        assert_abs_diff_eq!(counts[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(counts[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(counts[2], 1.0, epsilon = 1e-12);
        // window [0, 6] covers half of [-2, 2]
        assert_abs_diff_eq!(counts[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn light_curve_is_periodic() {
        let grid = Grid::default();
        let pixel = Pixel::new(1.0, 1.0, SuperGaussianResponse::default());
        let t = Array1::linspace(0.0, 100.0, 101);
        let shifted = t.mapv(|t| t + grid.slit_interval() / grid.velocity());
        assert_abs_diff_eq!(
            pixel.evaluate_x(t.view(), &grid),
            pixel.evaluate_x(shifted.view(), &grid),
            epsilon = 1e-9
        );
    }

    #[test]
    fn counts_are_nearly_bounded() {
        let grid = Grid::default();
        let pixel = Pixel::new(1.0, -2.0, SuperGaussianResponse::default());
        let t = Array1::linspace(0.0, 300.0, 1000);
        let counts = pixel.evaluate_y(t.view(), &grid);
        assert!(counts.iter().all(|&c| (-1e-6..=1.0 + 1e-6).contains(&c)));
        let max = counts.fold(f64::NEG_INFINITY, |acc, &c| acc.max(c));
        let min = counts.fold(f64::INFINITY, |acc, &c| acc.min(c));
        assert!(max > 0.5);
        assert!(min < 0.1);
    }

    #[test]
    fn axes_use_own_coordinate() {
        let grid = Grid::default();
        let response = SuperGaussianResponse::default();
        let t = Array1::linspace(0.0, 50.0, 64);
        let a = Pixel::new(2.0, 7.0, response);
        let b = Pixel::new(7.0, 2.0, response);
        assert_eq!(a.evaluate_x(t.view(), &grid), b.evaluate_y(t.view(), &grid));
        assert_eq!(a.evaluate(Axis::Y, t.view(), &grid), b.evaluate_x(t.view(), &grid));
    }

    #[test]
    fn getters() {
        let pixel = Pixel::new(2.0, 7.0, TopHatResponse::new(4.0).unwrap());
        assert_eq!(pixel.x(), 2.0);
        assert_eq!(pixel.y(), 7.0);
        assert_eq!(pixel.coordinate(Axis::X), pixel.x());
        assert_eq!(pixel.coordinate(Axis::Y), pixel.y());
        assert_eq!(pixel.response(), &Response::from(TopHatResponse::new(4.0).unwrap()));
    }
}
