#![doc = include_str!("../README.md")]


mod config;
pub use config::{ExperimentConfig, GridConfig, PixelArrayConfig, ResponseConfig, TimeConfig};

mod error;
pub use error::GridScanError;

mod experiment;
pub use experiment::Experiment;

mod grid;
pub use grid::{Grid, SENTINEL_ABSCISSA};

pub mod nl_fit;
pub use nl_fit::{CobylaCurveFit, CurveFitAlgorithm, LmCurveFit};

pub mod phase;
pub use phase::{HarmonicFit, PhaseEstimator, calc_phase, calc_phase_with_fit};

pub mod pixel;
pub use pixel::{Axis, Pixel, PixelArray};

pub mod prelude;

pub mod response;
pub use response::{Response, ResponseFunction, SuperGaussianResponse, TopHatResponse};

pub use ndarray;
