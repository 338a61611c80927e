mod mapper;
pub mod projection;

pub use mapper::{CoordinateMapper, LinearTransform};
pub use projection::{normalize_ra, Projection};
