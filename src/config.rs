//! JSON-serializable description of a complete [Experiment]

use crate::error::GridScanError;
use crate::experiment::Experiment;
use crate::grid::Grid;
use crate::phase::PhaseEstimator;
use crate::pixel::PixelArray;
use crate::response::{Response, SuperGaussianResponse, TopHatResponse};

use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scanning mask parameters, see [Grid::new]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub transparent_width: f64,
    pub opaque_width: f64,
    pub slit_number: usize,
    pub velocity: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            transparent_width: Grid::default_transparent_width(),
            opaque_width: Grid::default_opaque_width(),
            slit_number: Grid::default_slit_number(),
            velocity: Grid::default_velocity(),
        }
    }
}

impl GridConfig {
    pub fn build(&self) -> Result<Grid, GridScanError> {
        Grid::new(
            self.transparent_width,
            self.opaque_width,
            self.slit_number,
            self.velocity,
        )
    }
}

/// Pixel response, tagged by `"kind"`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ResponseConfig {
    SuperGaussian { width: f64, order: f64 },
    TopHat { width: f64 },
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self::SuperGaussian {
            width: SuperGaussianResponse::default_width(),
            order: SuperGaussianResponse::default_order(),
        }
    }
}

impl ResponseConfig {
    pub fn build(&self) -> Result<Response, GridScanError> {
        Ok(match *self {
            Self::SuperGaussian { width, order } => SuperGaussianResponse::new(width, order)?.into(),
            Self::TopHat { width } => TopHatResponse::new(width)?.into(),
        })
    }
}

/// Pixel array parameters, see [PixelArray::new]
///
/// Defaults describe the reference multi-pixel experiment, a 6×6 array with 0.5 µm scatter,
/// rather than [PixelArray] defaults.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PixelArrayConfig {
    pub size: usize,
    pub scale: f64,
    pub scatter: f64,
    pub seed: u64,
    pub response: ResponseConfig,
}

impl Default for PixelArrayConfig {
    fn default() -> Self {
        Self {
            size: 6,
            scale: PixelArray::default_scale(),
            scatter: 0.5,
            seed: PixelArray::default_seed(),
            response: ResponseConfig::default(),
        }
    }
}

impl PixelArrayConfig {
    pub fn build(&self) -> Result<PixelArray, GridScanError> {
        PixelArray::new(
            self.size,
            self.scale,
            self.response.build()?,
            self.scatter,
            self.seed,
        )
    }
}

/// Evenly spaced observation times from `start` to `end` inclusive (s)
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    pub start: f64,
    pub end: f64,
    pub num: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start: 100.0,
            end: 300.0,
            num: 1100,
        }
    }
}

impl TimeConfig {
    pub fn build(&self) -> Array1<f64> {
        Array1::linspace(self.start, self.end, self.num)
    }
}

/// Complete experiment setup
///
/// Every field is optional in JSON and falls back to its default:
///
/// ```
/// use grid_scan::ExperimentConfig;
///
/// let config = ExperimentConfig::from_json(r#"{"pixel_array": {"size": 3, "scatter": 0.0}}"#).unwrap();
/// assert_eq!(config.pixel_array.size, 3);
/// assert_eq!(config.time.num, 1100);
/// let experiment = config.build().unwrap();
/// assert_eq!(experiment.pixel_array().len(), 9);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub grid: GridConfig,
    pub pixel_array: PixelArrayConfig,
    pub time: TimeConfig,
    pub estimator: PhaseEstimator,
}

impl ExperimentConfig {
    pub fn from_json(s: &str) -> Result<Self, GridScanError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, GridScanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Self)
    }

    /// Validate all parameters and construct the [Experiment]
    pub fn build(&self) -> Result<Experiment, GridScanError> {
        let experiment = Experiment::new(
            self.pixel_array.build()?,
            self.grid.build()?,
            self.time.build(),
        )?;
        log::debug!(
            "built experiment: {} pixels, {} time samples",
            experiment.pixel_array().len(),
            experiment.time().len()
        );
        Ok(experiment.with_estimator(self.estimator.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nl_fit::{CobylaCurveFit, CurveFitAlgorithm};

    #[test]
    fn defaults() {
        let config = ExperimentConfig::from_json("{}").unwrap();
        assert_eq!(config, ExperimentConfig::default());

        let experiment = config.build().unwrap();
        assert_eq!(experiment.pixel_array().len(), 36);
        assert_eq!(experiment.pixel_array().scale(), 10.0);
        assert_eq!(experiment.pixel_array().scatter(), 0.5);
        assert_eq!(experiment.pixel_array().seed(), 42);
        assert_eq!(experiment.grid(), &Grid::default());
        assert_eq!(experiment.time().len(), 1100);
        assert_eq!(experiment.time()[0], 100.0);
        assert_eq!(experiment.time()[1099], 300.0);
        assert_eq!(experiment.estimator(), &PhaseEstimator::default());
        assert_eq!(
            experiment.pixel_array().pixels()[0].response(),
            &Response::default()
        );
    }

    #[test]
    fn json_round_trip() {
        let config = ExperimentConfig {
            pixel_array: PixelArrayConfig {
                size: 2,
                response: ResponseConfig::TopHat { width: 4.0 },
                ..Default::default()
            },
            estimator: PhaseEstimator::new(CobylaCurveFit::default().into(), 3),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(ExperimentConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn tagged_response() {
        let config = ExperimentConfig::from_json(
            r#"{"pixel_array": {"response": {"kind": "super_gaussian", "width": 4.0, "order": 2.0}}}"#,
        )
        .unwrap();
        assert_eq!(
            config.pixel_array.response,
            ResponseConfig::SuperGaussian {
                width: 4.0,
                order: 2.0
            }
        );
        assert_eq!(
            config.estimator.algorithm(),
            &CurveFitAlgorithm::default()
        );
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            ExperimentConfig::from_json(r#"{"grid": {"slit_width": 1.0}}"#),
            Err(GridScanError::Config(_))
        ));
        assert!(matches!(
            ExperimentConfig::from_json("[1, 2]"),
            Err(GridScanError::Config(_))
        ));

        let mut config = ExperimentConfig::default();
        config.grid.opaque_width = -1.0;
        assert!(matches!(
            config.build(),
            Err(GridScanError::InvalidParameter {
                name: "opaque_width",
                ..
            })
        ));

        let mut config = ExperimentConfig::default();
        config.time.end = 0.0;
        assert_eq!(config.build().unwrap_err(), GridScanError::UnsortedTime);
    }

    #[test]
    fn schema_lists_sections() {
        let schema = serde_json::to_value(ExperimentConfig::json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for key in ["grid", "pixel_array", "time", "estimator"] {
            assert!(properties.contains_key(key), "{key} is missing");
        }
    }
}
