use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::FRAME_FILE_PREFIX;
use crate::error::Result;
use crate::frame::FrameImage;
use crate::io::fits::FitsReader;
use crate::wcs::CoordinateMapper;

/// Where per-band frames come from.
pub trait FrameSource {
    /// Load the full frame of `band`.
    fn fetch_frame(&self, band: &str) -> Result<FrameImage>;

    /// Coordinate mapper of `band` without necessarily decoding its pixels.
    fn coordinate_mapper(&self, band: &str) -> Result<CoordinateMapper>;
}

/// Frames stored as `frame-<band>.fits` in one directory.
#[derive(Clone, Debug)]
pub struct DirectoryFrameSource {
    dir: PathBuf,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, band: &str) -> PathBuf {
        self.dir.join(format!("{FRAME_FILE_PREFIX}{band}.fits"))
    }
}

impl FrameSource for DirectoryFrameSource {
    fn fetch_frame(&self, band: &str) -> Result<FrameImage> {
        let path = self.frame_path(band);
        debug!(band, path = %path.display(), "Loading frame");
        FrameImage::from_fits(band, &path)
    }

    fn coordinate_mapper(&self, band: &str) -> Result<CoordinateMapper> {
        // The header is parsed on open; pixel data stays mapped but undecoded.
        let reader = FitsReader::open(&self.frame_path(band))?;
        CoordinateMapper::from_header(&reader.header)
    }
}
