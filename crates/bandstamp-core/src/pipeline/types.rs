use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::align::EdgeMode;
use crate::frame::PixelShift;
use crate::stamp::StampHeader;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum PipelineStage {
    Aligning,
    Writing,
    Checking,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aligning => write!(f, "Aligning bands"),
            Self::Writing => write!(f, "Writing stamps"),
            Self::Checking => write!(f, "Checking registration"),
        }
    }
}

/// Per-run knobs that do not change the stamp geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StampOptions {
    /// Replace negative stamp pixels with zero.
    #[serde(default)]
    pub clip_negative: bool,
    #[serde(default)]
    pub edge: EdgeMode,
}

/// One band's aligned stamp.
#[derive(Clone, Debug)]
pub struct BandStamp {
    pub band: String,
    /// Stamp pixels, shape `(width, height)`.
    pub stamp: Array2<f32>,
    pub header: StampHeader,
    /// Shift applied to the full frame before extraction. Zero for the
    /// reference band.
    pub shift: PixelShift,
}

/// Result of aligning and stamping every band of one object.
#[derive(Clone, Debug)]
pub struct AlignmentOutput {
    /// Stamps in the order the bands were requested.
    pub bands: Vec<BandStamp>,
    pub reference_band: String,
    /// Pixel center in the reference grid shared by every stamp.
    pub center: (f64, f64),
    pub width: usize,
    pub height: usize,
}

impl AlignmentOutput {
    pub fn band(&self, name: &str) -> Option<&BandStamp> {
        self.bands.iter().find(|b| b.band == name)
    }

    pub fn reference(&self) -> Option<&BandStamp> {
        self.band(&self.reference_band)
    }

    /// All stamps stacked into a `(num_bands, width, height)` array.
    pub fn stacked(&self) -> Array3<f32> {
        let mut out = Array3::<f32>::zeros((self.bands.len(), self.width, self.height));
        for (mut plane, band) in out.axis_iter_mut(Axis(0)).zip(&self.bands) {
            plane.assign(&band.stamp);
        }
        out
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started over `total_items` bands, if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` bands of the current stage are finished.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Residual offset of one band's stamp against the reference stamp.
#[derive(Clone, Debug)]
pub struct RegistrationResidual {
    pub band: String,
    pub residual: PixelShift,
}
