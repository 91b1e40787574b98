/// Error returned from grid-scan constructors and estimators
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GridScanError {
    #[error("wrong axis \"{0}\" specified (\"x\" or \"y\")")]
    InvalidAxis(String),

    #[error("parameter {name} = {value} is invalid, it must be {requirement}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        requirement: &'static str,
    },

    #[error("time array length {t} differs from counts length {counts}")]
    LengthMismatch { t: usize, counts: usize },

    #[error("counts matrix has shape {actual:?}, but ({pixels}, {samples}) is expected")]
    ShapeMismatch {
        actual: (usize, usize),
        pixels: usize,
        samples: usize,
    },

    #[error("time-series' length {actual} is smaller than the minimum required length {minimum}")]
    ShortTimeSeries { actual: usize, minimum: usize },

    #[error("time array must be non-empty and strictly increasing")]
    UnsortedTime,

    #[error("configuration error: {0}")]
    Config(String),
}

impl GridScanError {
    pub(crate) fn invalid(name: &'static str, value: f64, requirement: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            requirement,
        }
    }
}

impl From<std::convert::Infallible> for GridScanError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl From<serde_json::Error> for GridScanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Check that `value` is finite and strictly positive
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64, GridScanError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GridScanError::invalid(name, value, "positive and finite"))
    }
}
