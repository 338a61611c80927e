use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::align::EdgeMode;
use crate::consts::{DEFAULT_BANDS, DEFAULT_REFERENCE_BAND, DEFAULT_STAMP_SIZE};
use crate::error::Result;
use crate::frame::TargetPosition;

use super::orchestrator::validate_request;
use super::types::StampOptions;

/// Everything needed to stamp one object directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StampConfig {
    /// Directory holding `frame-<band>.fits`.
    pub input_dir: PathBuf,
    /// Where stamps are written. Defaults to `input_dir`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_bands")]
    pub bands: Vec<String>,
    #[serde(default = "default_reference_band")]
    pub reference_band: String,
    #[serde(default = "default_stamp_size")]
    pub width: usize,
    #[serde(default = "default_stamp_size")]
    pub height: usize,
    pub ra: f64,
    pub dec: f64,
    /// Pixel center in the reference band. Derived from `ra`/`dec` when absent.
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default)]
    pub clip_negative: bool,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    #[serde(default)]
    pub edge: EdgeMode,
}

fn default_bands() -> Vec<String> {
    DEFAULT_BANDS.iter().map(|b| b.to_string()).collect()
}

fn default_reference_band() -> String {
    DEFAULT_REFERENCE_BAND.to_string()
}

fn default_stamp_size() -> usize {
    DEFAULT_STAMP_SIZE
}

fn default_overwrite() -> bool {
    true
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            bands: default_bands(),
            reference_band: default_reference_band(),
            width: DEFAULT_STAMP_SIZE,
            height: DEFAULT_STAMP_SIZE,
            ra: 0.0,
            dec: 0.0,
            center: None,
            clip_negative: false,
            overwrite: true,
            edge: EdgeMode::default(),
        }
    }
}

impl StampConfig {
    /// Reject configurations that could only fail later, before any frame is
    /// read.
    pub fn validate(&self) -> Result<()> {
        validate_request(&self.bands, &self.reference_band, self.width, self.height)?;
        self.target()?;
        Ok(())
    }

    pub fn target(&self) -> Result<TargetPosition> {
        TargetPosition::new(self.ra, self.dec)
    }

    pub fn center(&self) -> Option<(f64, f64)> {
        self.center.map(|[c, r]| (c, r))
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(self.input_dir.as_path())
    }

    pub fn options(&self) -> StampOptions {
        StampOptions {
            clip_negative: self.clip_negative,
            edge: self.edge,
        }
    }
}
