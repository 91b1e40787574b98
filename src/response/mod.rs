//! Pixel response functions
//!
//! A response function is the integrated one-dimensional spatial sensitivity of a pixel: a
//! CDF-like map from an offset (µm) to the fraction of the pixel covered by the half-line
//! $(-\infty, x]$. Coverage of an interval $[a, b]$ is `response(b) - response(a)`.

use enum_dispatch::enum_dispatch;
use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::Serialize;
use std::fmt::Debug;

mod top_hat;
pub use top_hat::TopHatResponse;

mod super_gaussian;
pub use super_gaussian::SuperGaussianResponse;

/// Integrated pixel response
///
/// Implementations must be non-decreasing, go from zero at $-\infty$ to unity at $+\infty$ and
/// satisfy `response(-x) == 1 - response(x)`.
#[enum_dispatch]
pub trait ResponseFunction: Send + Sync + Clone + Debug {
    fn response(&self, x: f64) -> f64;

    fn response_array(&self, x: ArrayView1<f64>) -> Array1<f64> {
        x.mapv(|x| self.response(x))
    }

    /// Pixel sensitivity integrated over bins given by their edges
    ///
    /// Output length is one less than the number of edges.
    fn profile(&self, edges: ArrayView1<f64>) -> Array1<f64> {
        let cdf = self.response_array(edges);
        if cdf.len() < 2 {
            return Array1::zeros(0);
        }
        &cdf.slice(ndarray::s![1..]) - &cdf.slice(ndarray::s![..-1])
    }
}

/// All response functions are available as variants of this enum
#[enum_dispatch(ResponseFunction)]
#[derive(Clone, Debug, Serialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum Response {
    SuperGaussian(SuperGaussianResponse),
    TopHat(TopHatResponse),
}

impl Default for Response {
    fn default() -> Self {
        SuperGaussianResponse::default().into()
    }
}
