//! Non-linear least-squares curve fitting
//!
//! Fitters minimise $\sum_i \left(m_i - f(t_i; \vec{A})\right)^2$ over an unconstrained
//! parameter vector $\vec{A}$ of a compile-time known size. The model $f$ and, for
//! derivative-based methods, its Jacobian $\partial f / \partial \vec{A}$ are passed as closures.
//! Models with bounded physical parameters are expected to be reparameterised (e.g. through
//! `tanh`) so every fitter may search the whole real space.
//!
//! # Curve Fit Algorithms
//!
//! - [`LmCurveFit`]: Levenberg–Marquardt. Uses derivatives. Default.
//! - [`CobylaCurveFit`]: COBYLA. Derivative-free, optionally followed by a fine-tuning fitter.
//!
//! All fitters perform a single minimisation from the given initial guess and report
//! [`CurveFitResult::success`] as given by the algorithm, a converged fit is not guaranteed to
//! be the global minimum.

pub mod cobyla;
pub use cobyla::CobylaCurveFit;

pub mod curve_fit;
pub use curve_fit::{CurveFitAlgorithm, CurveFitResult, CurveFitTrait};

pub mod data;
pub use data::Data;

mod linalg;

pub mod lm;
pub use lm::LmCurveFit;
