pub mod fits;
pub mod fits_header;
pub mod fits_writer;
