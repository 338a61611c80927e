pub mod config;
pub mod info;
pub mod shift;
pub mod stamp;
