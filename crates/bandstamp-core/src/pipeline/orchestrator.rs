use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::align::{estimate_shift, resample, residual_shift};
use crate::consts::REGISTRATION_WARN_PIXELS;
use crate::error::{Result, StampError};
use crate::frame::{FrameImage, PixelShift, TargetPosition};
use crate::stamp::{extract, synthesize, StampBounds};
use crate::wcs::CoordinateMapper;

use super::config::StampConfig;
use super::source::FrameSource;
use super::types::{
    AlignmentOutput, BandStamp, NoOpReporter, PipelineStage, ProgressReporter,
    RegistrationResidual, StampOptions,
};

/// Checks that need nothing but the request itself: stamp size, band list
/// and reference membership.
pub(crate) fn validate_request<S: AsRef<str>>(
    bands: &[S],
    reference_band: &str,
    width: usize,
    height: usize,
) -> Result<()> {
    if width % 2 != height % 2 {
        return Err(StampError::ParityMismatch { width, height });
    }
    if width == 0 || height == 0 {
        return Err(StampError::InvalidConfig(format!(
            "stamp size must be non-zero, got {width}x{height}"
        )));
    }
    if bands.is_empty() {
        return Err(StampError::EmptyBandSet);
    }

    let mut seen = HashSet::new();
    for band in bands {
        if !seen.insert(band.as_ref()) {
            return Err(StampError::DuplicateBand(band.as_ref().to_string()));
        }
    }
    if !seen.contains(reference_band) {
        return Err(StampError::UnknownBand(reference_band.to_string()));
    }
    Ok(())
}

/// Geometry shared by every band of one run.
struct StampPlan<'a> {
    reference_band: &'a str,
    reference_mapper: CoordinateMapper,
    target: TargetPosition,
    center: (f64, f64),
    bounds: StampBounds,
    width: usize,
    height: usize,
    options: StampOptions,
}

impl<'a> StampPlan<'a> {
    fn new(
        reference_band: &'a str,
        reference_mapper: CoordinateMapper,
        target: TargetPosition,
        center: Option<(f64, f64)>,
        width: usize,
        height: usize,
        options: StampOptions,
    ) -> Result<Self> {
        let center = match center {
            Some(c) => c,
            None => {
                let (col, row) = reference_mapper.sky_to_pixel(target.ra, target.dec)?;
                (col.round(), row.round())
            }
        };
        let bounds = StampBounds::compute(center.0, center.1, width, height)?;

        info!(
            reference = reference_band,
            ra = target.ra,
            dec = target.dec,
            center_col = center.0,
            center_row = center.1,
            width,
            height,
            "Stamp plan ready"
        );

        Ok(Self {
            reference_band,
            reference_mapper,
            target,
            center,
            bounds,
            width,
            height,
            options,
        })
    }

    fn stamp_band(&self, frame: &FrameImage) -> Result<BandStamp> {
        self.bounds.check_within(frame.cols(), frame.rows())?;

        let shift;
        let resampled;
        let aligned = if frame.band == self.reference_band {
            shift = PixelShift::zero();
            &frame.data
        } else {
            shift = estimate_shift(&frame.mapper, &self.reference_mapper, &self.target)?;
            resampled = resample(&frame.data, &shift, self.options.edge);
            &resampled
        };
        debug!(
            band = frame.band.as_str(),
            dcol = shift.dcol,
            drow = shift.drow,
            "Band aligned"
        );

        let (cx, cy) = self.center;
        let mut stamp = extract(aligned, cx, cy, self.width, self.height)?;
        if self.options.clip_negative {
            stamp.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v });
        }
        let header = synthesize(
            &frame.header,
            &self.reference_mapper,
            cx,
            cy,
            self.width,
            self.height,
        )?;

        Ok(BandStamp {
            band: frame.band.clone(),
            stamp,
            header,
            shift,
        })
    }

    fn into_output(self, bands: Vec<BandStamp>) -> AlignmentOutput {
        AlignmentOutput {
            bands,
            reference_band: self.reference_band.to_string(),
            center: self.center,
            width: self.width,
            height: self.height,
        }
    }
}

/// Register every frame onto the reference band's grid and cut a stamp of
/// `width x height` pixels from each.
///
/// `center` is the target's pixel position in the reference band; when
/// `None` it is derived from `target` and rounded to the nearest pixel.
/// All request-level checks run before any band is touched. The first
/// per-band failure aborts the run.
pub fn align_and_stamp(
    frames: &[FrameImage],
    reference_band: &str,
    target: &TargetPosition,
    center: Option<(f64, f64)>,
    width: usize,
    height: usize,
    options: &StampOptions,
) -> Result<AlignmentOutput> {
    let bands: Vec<&str> = frames.iter().map(|f| f.band.as_str()).collect();
    validate_request(&bands, reference_band, width, height)?;

    let reference_mapper = frames
        .iter()
        .find(|f| f.band == reference_band)
        .map(|f| f.mapper)
        .ok_or_else(|| StampError::UnknownBand(reference_band.to_string()))?;

    let plan = StampPlan::new(
        reference_band,
        reference_mapper,
        *target,
        center,
        width,
        height,
        *options,
    )?;

    let stamps = frames
        .iter()
        .map(|frame| plan.stamp_band(frame))
        .collect::<Result<Vec<_>>>()?;
    Ok(plan.into_output(stamps))
}

/// Run the pipeline for a configured object, pulling frames from `source`.
pub fn align_and_stamp_from_source(
    source: &dyn FrameSource,
    config: &StampConfig,
) -> Result<AlignmentOutput> {
    align_and_stamp_from_source_reported(source, config, Arc::new(NoOpReporter))
}

/// Same as [`align_and_stamp_from_source`], reporting per-band progress.
///
/// Frames are loaded one at a time and dropped once their stamp is cut.
pub fn align_and_stamp_from_source_reported(
    source: &dyn FrameSource,
    config: &StampConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<AlignmentOutput> {
    config.validate()?;
    let target = config.target()?;
    let reference_mapper = source.coordinate_mapper(&config.reference_band)?;

    let plan = StampPlan::new(
        &config.reference_band,
        reference_mapper,
        target,
        config.center(),
        config.width,
        config.height,
        config.options(),
    )?;

    reporter.begin_stage(PipelineStage::Aligning, Some(config.bands.len()));
    let mut stamps = Vec::with_capacity(config.bands.len());
    for (i, band) in config.bands.iter().enumerate() {
        let frame = source.fetch_frame(band)?;
        stamps.push(plan.stamp_band(&frame)?);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    info!(bands = stamps.len(), "All bands stamped");
    Ok(plan.into_output(stamps))
}

/// Measure how well each stamp lines up with the reference stamp.
///
/// The residuals are diagnostics only. Bands off by more than
/// `REGISTRATION_WARN_PIXELS` are logged as warnings.
pub fn check_registration(output: &AlignmentOutput) -> Result<Vec<RegistrationResidual>> {
    let reference = output
        .reference()
        .ok_or_else(|| StampError::UnknownBand(output.reference_band.clone()))?;

    let mut residuals = Vec::new();
    for band in output.bands.iter().filter(|b| b.band != reference.band) {
        let residual = residual_shift(&reference.stamp, &band.stamp)?;
        if residual.magnitude() > REGISTRATION_WARN_PIXELS {
            warn!(
                band = band.band.as_str(),
                dcol = residual.dcol,
                drow = residual.drow,
                "Stamp is not registered with the reference"
            );
        }
        residuals.push(RegistrationResidual {
            band: band.band.clone(),
            residual,
        });
    }
    Ok(residuals)
}
