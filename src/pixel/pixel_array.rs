use crate::error::{GridScanError, ensure_positive};
use crate::pixel::Pixel;
use crate::response::Response;

use conv::prelude::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::Normal;

/// Square `size × size` lattice of pixels with jittered positions
///
/// Nominal pixel centres are `scale * (j, i)` for column `j` and row `i`. Every coordinate is
/// independently perturbed by a normal offset with standard deviation `scatter`, drawn from a
/// generator seeded with `seed`, so the same parameters always give the same array. Pixels are
/// enumerated row by row, all coordinate accessors follow this order.
#[derive(Clone, Debug)]
pub struct PixelArray {
    size: usize,
    scale: f64,
    scatter: f64,
    seed: u64,
    pixels: Vec<Pixel>,
}

impl PixelArray {
    pub fn new(
        size: usize,
        scale: f64,
        response: impl Into<Response>,
        scatter: f64,
        seed: u64,
    ) -> Result<Self, GridScanError> {
        if size == 0 {
            return Err(GridScanError::invalid("size", 0.0, "positive"));
        }
        let scale = ensure_positive("scale", scale)?;
        let invalid_scatter = || GridScanError::invalid("scatter", scatter, "non-negative and finite");
        if !(scatter.is_finite() && scatter >= 0.0) {
            return Err(invalid_scatter());
        }
        let normal = Normal::new(0.0, scatter).map_err(|_| invalid_scatter())?;
        let response = response.into();

        let mut rng = StdRng::seed_from_u64(seed);
        let n = size * size;
        let dx: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();
        let dy: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();

        let nominal = Self::nominal_lattice(size, scale);
        let pixels = nominal
            .iter()
            .zip(dx.iter().zip(dy.iter()))
            .map(|(&(x, y), (&dx, &dy))| Pixel::new(x + dx, y + dy, response.clone()))
            .collect();

        log::debug!("created {size}x{size} pixel array, scale {scale}, scatter {scatter}, seed {seed}");
        Ok(Self {
            size,
            scale,
            scatter,
            seed,
            pixels,
        })
    }

    #[inline]
    pub fn default_size() -> usize {
        4
    }

    #[inline]
    pub fn default_scale() -> f64 {
        10.0
    }

    #[inline]
    pub fn default_scatter() -> f64 {
        1.0
    }

    #[inline]
    pub fn default_seed() -> u64 {
        42
    }

    /// Jitter-free `(x, y)` pixel centres, row-major
    fn nominal_lattice(size: usize, scale: f64) -> Vec<(f64, f64)> {
        let coords: Vec<f64> = (0..size)
            .map(|i| scale * i.approx_as::<f64>().unwrap_or(f64::NAN))
            .collect();
        itertools::iproduct!(coords.iter(), coords.iter())
            .map(|(&y, &x)| (x, y))
            .collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn scatter(&self) -> f64 {
        self.scatter
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn x(&self) -> Array1<f64> {
        self.pixels.iter().map(|p| p.x()).collect()
    }

    pub fn y(&self) -> Array1<f64> {
        self.pixels.iter().map(|p| p.y()).collect()
    }

    /// Pixel centres as `(y, x)` rows
    pub fn position(&self) -> Array2<f64> {
        let mut position = Array2::zeros((self.len(), 2));
        for (mut row, pixel) in position.rows_mut().into_iter().zip(self.pixels.iter()) {
            row[0] = pixel.y();
            row[1] = pixel.x();
        }
        position
    }

    pub fn nominal_x(&self) -> Array1<f64> {
        Self::nominal_lattice(self.size, self.scale)
            .into_iter()
            .map(|(x, _)| x)
            .collect()
    }

    pub fn nominal_y(&self) -> Array1<f64> {
        Self::nominal_lattice(self.size, self.scale)
            .into_iter()
            .map(|(_, y)| y)
            .collect()
    }
}
