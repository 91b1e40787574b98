use ndarray::{Array1, ArrayView1, Zip};
use rand::prelude::*;
use rand_distr::Normal;

/// Two pixels displaced by [TWO_PIXEL_DISPLACEMENT] along x, observed over 300 s
pub struct TwoPixelSetup {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
    pub t: Array1<f64>,
}

pub const TWO_PIXEL_DISPLACEMENT: f64 = 3.0;

impl Default for TwoPixelSetup {
    fn default() -> Self {
        Self {
            x1: 1.0,
            x2: 1.0 + TWO_PIXEL_DISPLACEMENT,
            y: 1.0,
            t: Array1::linspace(0.0, 300.0, 1000),
        }
    }
}

/// Time samples of the multi-pixel experiment, `n` points over $[100, 300]$ s
pub fn experiment_time(n: usize) -> Array1<f64> {
    Array1::linspace(100.0, 300.0, n)
}

/// Reproducible white Gaussian noise
pub fn gaussian_noise(n: usize, sigma: f64, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).expect("sigma must be non-negative and finite");
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

pub fn add_noise(c: ArrayView1<f64>, sigma: f64, seed: u64) -> Array1<f64> {
    &c + &gaussian_noise(c.len(), sigma, seed)
}

pub fn rms_difference(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    assert_eq!(a.len(), b.len(), "arrays must have the same length");
    let sum = Zip::from(a).and(b).fold(0.0, |acc, &a, &b| acc + (a - b).powi(2));
    (sum / a.len() as f64).sqrt()
}
