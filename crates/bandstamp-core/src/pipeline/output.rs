use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::STAMP_FILE_PREFIX;
use crate::error::Result;
use crate::io::fits_writer::write_image;

use super::types::{AlignmentOutput, BandStamp, NoOpReporter, PipelineStage, ProgressReporter};

/// What happened to one stamp file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The file already existed and overwriting was disabled.
    Skipped(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(p) | Self::Skipped(p) => p,
        }
    }
}

/// Writes `stamp-<band>.fits` files into one directory.
#[derive(Clone, Debug)]
pub struct StampWriter {
    dir: PathBuf,
    overwrite: bool,
}

impl StampWriter {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }

    pub fn stamp_path(&self, band: &str) -> PathBuf {
        self.dir.join(format!("{STAMP_FILE_PREFIX}{band}.fits"))
    }

    pub fn write(&self, stamp: &BandStamp) -> Result<WriteOutcome> {
        let path = self.stamp_path(&stamp.band);
        if !self.overwrite && path.exists() {
            debug!(path = %path.display(), "Stamp exists, skipping");
            return Ok(WriteOutcome::Skipped(path));
        }
        std::fs::create_dir_all(&self.dir)?;
        write_image(&path, &stamp.stamp, &stamp.header.cards)?;
        Ok(WriteOutcome::Written(path))
    }

    pub fn write_all(&self, output: &AlignmentOutput) -> Result<Vec<WriteOutcome>> {
        self.write_all_reported(output, &NoOpReporter)
    }

    /// Write every band's stamp, reporting the `Writing` stage per band.
    pub fn write_all_reported(
        &self,
        output: &AlignmentOutput,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<WriteOutcome>> {
        reporter.begin_stage(PipelineStage::Writing, Some(output.bands.len()));
        let mut outcomes = Vec::with_capacity(output.bands.len());
        for (i, band) in output.bands.iter().enumerate() {
            outcomes.push(self.write(band)?);
            reporter.advance(i + 1);
        }
        reporter.finish_stage();

        let written = outcomes
            .iter()
            .filter(|o| matches!(o, WriteOutcome::Written(_)))
            .count();
        info!(
            dir = %self.dir.display(),
            written,
            skipped = outcomes.len() - written,
            "Stamps saved"
        );
        Ok(outcomes)
    }
}
