use crate::error::{GridScanError, ensure_positive};
use crate::response::ResponseFunction;

use schemars::JsonSchema;
use serde::Serialize;

/// Ideal top-hat pixel of the given `width`
///
/// The integrated response is a linear ramp from $-w/2$ to $w/2$. It is the infinite order limit
/// of [SuperGaussianResponse](crate::SuperGaussianResponse).
#[derive(Clone, Copy, Debug, Serialize, JsonSchema, PartialEq)]
pub struct TopHatResponse {
    width: f64,
}

impl TopHatResponse {
    pub fn new(width: f64) -> Result<Self, GridScanError> {
        Ok(Self {
            width: ensure_positive("width", width)?,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }
}

impl ResponseFunction for TopHatResponse {
    fn response(&self, x: f64) -> f64 {
        (x / self.width + 0.5).clamp(0.0, 1.0)
    }
}
