pub use crate::nl_fit::CurveFitTrait;
pub use crate::response::ResponseFunction;
