use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bandstamp_core::align::estimate_shift;
use bandstamp_core::consts::DEFAULT_REFERENCE_BAND;
use bandstamp_core::frame::TargetPosition;
use bandstamp_core::pipeline::{DirectoryFrameSource, FrameSource};
use clap::Args;

#[derive(Args)]
pub struct ShiftArgs {
    /// Object directory holding frame-<band>.fits
    #[arg(long)]
    pub dir: PathBuf,

    /// Comma-separated band list
    #[arg(long, value_delimiter = ',', default_value = "u,g,r,i,z")]
    pub bands: Vec<String>,

    /// Band whose pixel grid the others are registered onto
    #[arg(long, default_value = DEFAULT_REFERENCE_BAND)]
    pub reference: String,

    /// Target right ascension (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub ra: f64,

    /// Target declination (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub dec: f64,
}

pub fn run(args: &ShiftArgs) -> Result<()> {
    if !args.bands.contains(&args.reference) {
        bail!("Reference band '{}' is not in {:?}", args.reference, args.bands);
    }
    let target = TargetPosition::new(args.ra, args.dec)?;
    let source = DirectoryFrameSource::new(&args.dir);

    let reference = source
        .coordinate_mapper(&args.reference)
        .with_context(|| format!("Failed to read {}", source.frame_path(&args.reference).display()))?;

    println!("Shifts onto '{}' at ({:.6}, {:.6})", args.reference, target.ra, target.dec);
    for band in &args.bands {
        let mapper = source
            .coordinate_mapper(band)
            .with_context(|| format!("Failed to read {}", source.frame_path(band).display()))?;
        let shift = estimate_shift(&mapper, &reference, &target)?;
        println!(
            "  {:<6} dcol {:+9.4}  drow {:+9.4}  |d| {:.4}",
            band,
            shift.dcol,
            shift.drow,
            shift.magnitude()
        );
    }

    Ok(())
}
