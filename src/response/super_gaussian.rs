use crate::error::{GridScanError, ensure_positive};
use crate::response::ResponseFunction;

use schemars::JsonSchema;
use serde::Serialize;
use statrs::function::gamma::gamma_lr;

/// Super-Gaussian pixel response
///
/// Cumulative distribution of the generalized normal profile
/// $\propto \exp\left(-|2x/w|^n\right)$:
///
/// $$
/// R(x) = \frac{1}{2}\left(1 + \mathrm{sign}(x)\,P\left(\frac{1}{n}, \left|\frac{2x}{w}\right|^n\right)\right),
/// $$
///
/// where $P$ is the regularized lower incomplete gamma function, $w$ is `width` and $n$ is
/// `order`. Larger order makes the pixel edge sharper, the infinite order limit is
/// [TopHatResponse](crate::TopHatResponse).
#[derive(Clone, Copy, Debug, Serialize, JsonSchema, PartialEq)]
pub struct SuperGaussianResponse {
    width: f64,
    order: f64,
}

impl SuperGaussianResponse {
    /// Create a new [SuperGaussianResponse]
    ///
    /// Both `width` (µm) and `order` must be positive and finite.
    pub fn new(width: f64, order: f64) -> Result<Self, GridScanError> {
        Ok(Self {
            width: ensure_positive("width", width)?,
            order: ensure_positive("order", order)?,
        })
    }

    #[inline]
    pub fn default_width() -> f64 {
        8.0
    }

    #[inline]
    pub fn default_order() -> f64 {
        8.0
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn order(&self) -> f64 {
        self.order
    }
}

impl Default for SuperGaussianResponse {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            order: Self::default_order(),
        }
    }
}

/// Regularized lower incomplete gamma function $P(a, z)$, saturated at the domain edges
fn lower_gamma_regularized(a: f64, z: f64) -> f64 {
    if z.is_nan() || !(a.is_finite() && a > 0.0) {
        f64::NAN
    } else if z <= 0.0 {
        0.0
    } else if z.is_infinite() {
        1.0
    } else {
        gamma_lr(a, z)
    }
}

impl ResponseFunction for SuperGaussianResponse {
    fn response(&self, x: f64) -> f64 {
        let z = (x / (0.5 * self.width)).abs().powf(self.order);
        0.5 * (1.0 + x.signum() * lower_gamma_regularized(self.order.recip(), z))
    }
}
