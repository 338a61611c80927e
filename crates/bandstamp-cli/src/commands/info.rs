use std::path::PathBuf;

use anyhow::{Context, Result};
use bandstamp_core::io::fits::FitsReader;
use bandstamp_core::wcs::CoordinateMapper;
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Input FITS frame
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = FitsReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let (cols, rows) = reader.dimensions();

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", cols, rows);
    println!("BITPIX:      {}", reader.bitpix().value());
    println!("Cards:       {}", reader.header.len());

    match CoordinateMapper::from_header(&reader.header) {
        Ok(mapper) => {
            let (col, row) = mapper.reference_pixel();
            let (ra, dec) = mapper.reference_sky();
            println!("Projection:  {}", mapper.projection());
            println!("Ref pixel:   ({:.3}, {:.3}) zero-based", col, row);
            println!("Ref sky:     ({:.6}, {:.6}) deg", ra, dec);
            println!("Scale:       {:.4} arcsec/px", mapper.pixel_scale() * 3600.0);
        }
        Err(e) => println!("WCS:         unavailable ({e})"),
    }

    Ok(())
}
