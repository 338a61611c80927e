pub mod consts;
pub mod error;
pub mod frame;
pub mod io;
pub mod wcs;
pub mod align;
pub mod stamp;
pub mod pipeline;
