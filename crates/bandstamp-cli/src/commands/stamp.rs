use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bandstamp_core::align::EdgeMode;
use bandstamp_core::consts::{DEFAULT_REFERENCE_BAND, DEFAULT_STAMP_SIZE};
use bandstamp_core::pipeline::config::StampConfig;
use bandstamp_core::pipeline::{
    align_and_stamp_from_source_reported, check_registration, DirectoryFrameSource,
    PipelineStage, ProgressReporter, StampWriter,
};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::summary::{print_band_results, print_registration, print_stamp_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum EdgeArg {
    Constant,
    Nearest,
}

#[derive(Args)]
pub struct StampArgs {
    /// Stamp config file (TOML). Other options are ignored when given.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Object directory holding frame-<band>.fits
    #[arg(long, required_unless_present = "config")]
    pub dir: Option<PathBuf>,

    /// Output directory (defaults to --dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated band list
    #[arg(long, value_delimiter = ',', default_value = "u,g,r,i,z")]
    pub bands: Vec<String>,

    /// Reference band
    #[arg(long, default_value = DEFAULT_REFERENCE_BAND)]
    pub reference: String,

    /// Target right ascension (degrees)
    #[arg(long, allow_hyphen_values = true, required_unless_present = "config")]
    pub ra: Option<f64>,

    /// Target declination (degrees)
    #[arg(long, allow_hyphen_values = true, required_unless_present = "config")]
    pub dec: Option<f64>,

    /// Stamp width in pixels
    #[arg(long, default_value_t = DEFAULT_STAMP_SIZE)]
    pub width: usize,

    /// Stamp height in pixels
    #[arg(long, default_value_t = DEFAULT_STAMP_SIZE)]
    pub height: usize,

    /// Pixel center in the reference band as COL,ROW
    #[arg(long, value_delimiter = ',')]
    pub center: Option<Vec<f64>>,

    /// Set negative stamp pixels to zero
    #[arg(long)]
    pub clip_negative: bool,

    /// Keep existing stamp files
    #[arg(long)]
    pub no_overwrite: bool,

    /// Fill policy for pixels shifted in from outside the frame
    #[arg(long, value_enum, default_value = "constant")]
    pub edge: EdgeArg,

    /// Fill value for --edge constant
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub fill: f32,

    /// Report residual offsets against the reference stamp
    #[arg(long)]
    pub check: bool,
}

pub fn run(args: &StampArgs) -> Result<()> {
    let config: StampConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        info!(path = %config_path.display(), "Loaded stamp config");
        toml::from_str(&contents).context("Invalid stamp config")?
    } else {
        build_config_from_args(args)?
    };
    config.validate().context("Invalid stamp config")?;

    print_stamp_summary(&config);

    let source = DirectoryFrameSource::new(&config.input_dir);
    let reporter = Arc::new(BarReporter::new()?);
    let output = align_and_stamp_from_source_reported(&source, &config, reporter.clone())
        .with_context(|| format!("Failed to stamp {}", config.input_dir.display()))?;

    let writer = StampWriter::new(config.output_dir(), config.overwrite);
    let outcomes = writer
        .write_all_reported(&output, reporter.as_ref())
        .with_context(|| format!("Failed to write stamps to {}", config.output_dir().display()))?;
    print_band_results(&output, &outcomes);

    if args.check {
        reporter.begin_stage(PipelineStage::Checking, None);
        let residuals = check_registration(&output)?;
        reporter.finish_stage();
        print_registration(&residuals);
    }

    Ok(())
}

fn build_config_from_args(args: &StampArgs) -> Result<StampConfig> {
    let (Some(dir), Some(ra), Some(dec)) = (&args.dir, args.ra, args.dec) else {
        bail!("--dir, --ra and --dec are required without --config");
    };
    let center = match args.center.as_deref() {
        None => None,
        Some([col, row]) => Some([*col, *row]),
        Some(other) => bail!("--center expects COL,ROW, got {} values", other.len()),
    };
    let edge = match args.edge {
        EdgeArg::Constant => EdgeMode::Constant(args.fill),
        EdgeArg::Nearest => EdgeMode::Nearest,
    };

    Ok(StampConfig {
        input_dir: dir.clone(),
        output_dir: args.output.clone(),
        bands: args.bands.clone(),
        reference_band: args.reference.clone(),
        width: args.width,
        height: args.height,
        ra,
        dec,
        center,
        clip_negative: args.clip_negative,
        overwrite: !args.no_overwrite,
        edge,
    })
}

/// Drives an indicatif bar from pipeline progress.
struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { pb })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.pb.reset();
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        self.pb.set_position(self.pb.length().unwrap_or(0));
        self.pb.finish_with_message("Done");
    }
}
