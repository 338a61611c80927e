pub mod extract;
pub mod header;

pub use extract::{extract, StampBounds};
pub use header::{synthesize, StampHeader};
