pub mod phase_correlation;
pub mod resample;
pub mod shift;
pub mod spline;

pub use phase_correlation::residual_shift;
pub use resample::{resample, EdgeMode};
pub use shift::estimate_shift;
