mod common;

use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use bandstamp_core::error::StampError;
use bandstamp_core::frame::{FrameImage, TargetPosition};
use bandstamp_core::io::fits::FitsReader;
use bandstamp_core::pipeline::config::StampConfig;
use bandstamp_core::pipeline::{
    align_and_stamp, align_and_stamp_from_source, align_and_stamp_from_source_reported,
    DirectoryFrameSource, FrameSource, PipelineStage, ProgressReporter, StampOptions,
    StampWriter, WriteOutcome,
};
use bandstamp_core::stamp::extract;
use tempfile::TempDir;

use common::{peak_position, point_source_frame, write_frame, TARGET_DEC, TARGET_RA};

fn target() -> TargetPosition {
    TargetPosition::new(TARGET_RA, TARGET_DEC).unwrap()
}

/// g is offset from r by (3.2, -1.7) pixels at the target.
fn small_frames() -> Vec<FrameImage> {
    vec![
        point_source_frame("g", 256, (131.2, 126.3)),
        point_source_frame("r", 256, (128.0, 128.0)),
    ]
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn test_translated_band_is_registered_onto_reference() {
    let frames = vec![
        point_source_frame("g", 1024, (515.2, 510.3)),
        point_source_frame("r", 1024, (512.0, 512.0)),
    ];
    let output = align_and_stamp(
        &frames,
        "r",
        &target(),
        Some((512.0, 512.0)),
        64,
        64,
        &StampOptions::default(),
    )
    .unwrap();

    let g = output.band("g").unwrap();
    let r = output.band("r").unwrap();
    assert_abs_diff_eq!(g.shift.dcol, 3.2, epsilon = 1e-6);
    assert_abs_diff_eq!(g.shift.drow, -1.7, epsilon = 1e-6);
    assert!(r.shift.is_zero());

    assert_eq!(g.stamp.dim(), (64, 64));
    assert_eq!(r.stamp.dim(), (64, 64));
    assert_eq!(peak_position(&g.stamp), peak_position(&r.stamp));
    assert_eq!(peak_position(&r.stamp), (32, 32));

    for (a, b) in g.stamp.iter().zip(r.stamp.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 20.0);
    }
}

#[test]
fn test_output_order_and_stacking() {
    let frames = small_frames();
    let output = align_and_stamp(&frames, "r", &target(), None, 32, 32, &StampOptions::default())
        .unwrap();

    let names: Vec<&str> = output.bands.iter().map(|b| b.band.as_str()).collect();
    assert_eq!(names, ["g", "r"]);
    assert_eq!(output.reference().unwrap().band, "r");

    let cube = output.stacked();
    assert_eq!(cube.dim(), (2, 32, 32));
    assert_eq!(cube.index_axis(ndarray::Axis(0), 0), output.bands[0].stamp);
    assert_eq!(cube.index_axis(ndarray::Axis(0), 1), output.bands[1].stamp);
}

#[test]
fn test_center_derived_from_target_is_rounded() {
    let frames = small_frames();
    let output = align_and_stamp(&frames, "r", &target(), None, 33, 33, &StampOptions::default())
        .unwrap();
    assert_eq!(output.center, (128.0, 128.0));
}

#[test]
fn test_reference_band_is_not_resampled() {
    let frames = small_frames();
    let output = align_and_stamp(
        &frames,
        "r",
        &target(),
        Some((128.0, 128.0)),
        16,
        16,
        &StampOptions::default(),
    )
    .unwrap();
    let expected = extract(&frames[1].data, 128.0, 128.0, 16, 16).unwrap();
    assert_eq!(output.band("r").unwrap().stamp, expected);
}

#[test]
fn test_self_alignment_is_identity() {
    let frame = point_source_frame("r", 128, (64.0, 64.0));
    let mut twin = frame.clone();
    twin.band = "i".into();

    let output = align_and_stamp(
        &[frame, twin],
        "r",
        &target(),
        None,
        20,
        20,
        &StampOptions::default(),
    )
    .unwrap();
    let i = output.band("i").unwrap();
    assert!(i.shift.is_zero());
    for (a, b) in i.stamp.iter().zip(output.band("r").unwrap().stamp.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-3);
    }
}

#[test]
fn test_headers_share_reference_anchor() {
    let frames = small_frames();
    let output = align_and_stamp(&frames, "r", &target(), None, 32, 32, &StampOptions::default())
        .unwrap();
    let expected = frames[1].mapper.pixel_to_sky(128.0, 128.0).unwrap();
    for band in &output.bands {
        assert_eq!(band.header.reference_sky, expected);
        assert_eq!(band.header.reference_pixel, (15.5, 15.5));
    }
    assert_eq!(output.band("g").unwrap().header.cards.get_str("FILTER"), Some("g"));
}

#[test]
fn test_clip_negative() {
    let mut frames = small_frames();
    for f in &mut frames {
        f.data.mapv_inplace(|v| v - 5.0);
    }

    let plain = align_and_stamp(&frames, "r", &target(), None, 32, 32, &StampOptions::default())
        .unwrap();
    assert!(plain.bands.iter().any(|b| b.stamp.iter().any(|&v| v < 0.0)));

    let options = StampOptions {
        clip_negative: true,
        ..Default::default()
    };
    let clipped = align_and_stamp(&frames, "r", &target(), None, 32, 32, &options).unwrap();
    for band in &clipped.bands {
        assert!(band.stamp.iter().all(|&v| v >= 0.0));
    }
    let peak = peak_position(&clipped.bands[1].stamp);
    assert_eq!(clipped.bands[1].stamp[peak], plain.bands[1].stamp[peak]);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_request_errors() {
    let frames = small_frames();
    let opts = StampOptions::default();
    let t = target();

    assert!(matches!(
        align_and_stamp(&frames, "z", &t, None, 32, 32, &opts),
        Err(StampError::UnknownBand(b)) if b == "z"
    ));
    assert!(matches!(
        align_and_stamp(&frames, "r", &t, None, 32, 33, &opts),
        Err(StampError::ParityMismatch { width: 32, height: 33 })
    ));
    assert!(matches!(
        align_and_stamp(&[], "r", &t, None, 32, 32, &opts),
        Err(StampError::EmptyBandSet)
    ));

    let mut dup = small_frames();
    dup.push(point_source_frame("g", 64, (32.0, 32.0)));
    assert!(matches!(
        align_and_stamp(&dup, "r", &t, None, 32, 32, &opts),
        Err(StampError::DuplicateBand(b)) if b == "g"
    ));
}

#[test]
fn test_geometry_errors() {
    let frames = small_frames();
    let opts = StampOptions::default();
    let t = target();

    assert!(matches!(
        align_and_stamp(&frames, "r", &t, Some((10.0, 10.0)), 64, 64, &opts),
        Err(StampError::OutOfBounds { .. })
    ));
    assert!(matches!(
        align_and_stamp(&frames, "r", &t, Some((128.3, 128.3)), 65, 65, &opts),
        Err(StampError::NonIntegerBoundary { .. })
    ));
}

#[test]
fn test_small_band_fails_fast() {
    let frames = vec![
        point_source_frame("r", 256, (128.0, 128.0)),
        point_source_frame("u", 64, (32.0, 32.0)),
    ];
    let result = align_and_stamp(&frames, "r", &target(), None, 80, 80, &StampOptions::default());
    assert!(matches!(result, Err(StampError::OutOfBounds { cols: 64, .. })));
}

// ---------------------------------------------------------------------------
// Directory source and writer
// ---------------------------------------------------------------------------

fn write_small_frames(dir: &std::path::Path) {
    for frame in small_frames() {
        write_frame(dir, &frame);
    }
}

fn config_for(dir: &std::path::Path) -> StampConfig {
    StampConfig {
        input_dir: dir.to_path_buf(),
        bands: vec!["g".into(), "r".into()],
        reference_band: "r".into(),
        width: 32,
        height: 32,
        ra: TARGET_RA,
        dec: TARGET_DEC,
        ..Default::default()
    }
}

#[test]
fn test_directory_source_loads_frames() {
    let dir = TempDir::new().unwrap();
    write_small_frames(dir.path());

    let source = DirectoryFrameSource::new(dir.path());
    assert_eq!(source.frame_path("g"), dir.path().join("frame-g.fits"));

    let frame = source.fetch_frame("g").unwrap();
    assert_eq!(frame.band, "g");
    assert_eq!(frame.data, small_frames()[0].data);
    assert_eq!(source.coordinate_mapper("g").unwrap(), frame.mapper);

    assert!(matches!(source.fetch_frame("z"), Err(StampError::Io(_))));
}

#[test]
fn test_source_pipeline_matches_in_memory() {
    let dir = TempDir::new().unwrap();
    write_small_frames(dir.path());
    let source = DirectoryFrameSource::new(dir.path());

    let from_disk = align_and_stamp_from_source(&source, &config_for(dir.path())).unwrap();
    let in_memory = align_and_stamp(
        &small_frames(),
        "r",
        &target(),
        None,
        32,
        32,
        &StampOptions::default(),
    )
    .unwrap();

    assert_eq!(from_disk.center, in_memory.center);
    for (a, b) in from_disk.bands.iter().zip(&in_memory.bands) {
        assert_eq!(a.band, b.band);
        assert_eq!(a.stamp, b.stamp);
    }
}

#[test]
fn test_source_pipeline_validates_before_reading() {
    let dir = TempDir::new().unwrap();
    let source = DirectoryFrameSource::new(dir.path());
    let mut config = config_for(dir.path());
    config.reference_band = "z".into();
    // No frames exist, so only up-front validation can produce this error.
    assert!(matches!(
        align_and_stamp_from_source(&source, &config),
        Err(StampError::UnknownBand(_))
    ));
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("begin {stage} {total_items:?}"));
    }

    fn advance(&self, items_done: usize) {
        self.events.lock().unwrap().push(format!("advance {items_done}"));
    }

    fn finish_stage(&self) {
        self.events.lock().unwrap().push("finish".into());
    }
}

#[test]
fn test_progress_is_reported_per_band() {
    let dir = TempDir::new().unwrap();
    write_small_frames(dir.path());
    let source = DirectoryFrameSource::new(dir.path());
    let reporter = Arc::new(RecordingReporter::default());

    align_and_stamp_from_source_reported(&source, &config_for(dir.path()), reporter.clone())
        .unwrap();

    let events = reporter.events.lock().unwrap().clone();
    assert_eq!(
        events,
        ["begin Aligning bands Some(2)", "advance 1", "advance 2", "finish"]
    );
}

#[test]
fn test_writing_is_reported_per_band() {
    let dir = TempDir::new().unwrap();
    write_small_frames(dir.path());
    let source = DirectoryFrameSource::new(dir.path());
    let output = align_and_stamp_from_source(&source, &config_for(dir.path())).unwrap();
    let reporter = RecordingReporter::default();

    let outcomes = StampWriter::new(dir.path().join("stamps"), true)
        .write_all_reported(&output, &reporter)
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    let events = reporter.events.lock().unwrap().clone();
    assert_eq!(
        events,
        ["begin Writing stamps Some(2)", "advance 1", "advance 2", "finish"]
    );
}

#[test]
fn test_writer_respects_overwrite_flag() {
    let dir = TempDir::new().unwrap();
    write_small_frames(dir.path());
    let source = DirectoryFrameSource::new(dir.path());
    let output = align_and_stamp_from_source(&source, &config_for(dir.path())).unwrap();

    let out_dir = dir.path().join("stamps");
    let writer = StampWriter::new(&out_dir, false);
    let first = writer.write_all(&output).unwrap();
    assert!(first.iter().all(|o| matches!(o, WriteOutcome::Written(_))));
    assert_eq!(first[0].path(), out_dir.join("stamp-g.fits"));

    let second = writer.write_all(&output).unwrap();
    assert!(second.iter().all(|o| matches!(o, WriteOutcome::Skipped(_))));

    let forced = StampWriter::new(&out_dir, true).write_all(&output).unwrap();
    assert!(forced.iter().all(|o| matches!(o, WriteOutcome::Written(_))));
}

#[test]
fn test_written_stamp_carries_header() {
    let dir = TempDir::new().unwrap();
    write_small_frames(dir.path());
    let source = DirectoryFrameSource::new(dir.path());
    let output = align_and_stamp_from_source(&source, &config_for(dir.path())).unwrap();
    StampWriter::new(dir.path(), true).write_all(&output).unwrap();

    let mut reader = FitsReader::open(&dir.path().join("stamp-g.fits")).unwrap();
    assert_eq!(reader.dimensions(), (32, 32));
    let g = output.band("g").unwrap();
    assert_eq!(reader.header.get_f64("CRVAL1"), Some(g.header.reference_sky.0));
    assert_eq!(reader.header.get_f64("CRPIX1"), Some(16.5));
    assert_eq!(reader.header.get_str("FILTER"), Some("g"));
    assert_eq!(reader.read_image().unwrap(), g.stamp);
}
