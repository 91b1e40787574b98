//! Phase of the grid-scan modulation

mod estimator;
pub use estimator::{HarmonicFit, PhaseEstimator, calc_phase, calc_phase_with_fit};

mod model;
pub use model::{HarmonicModel, NPARAMS};
