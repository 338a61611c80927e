mod common;

use approx::assert_abs_diff_eq;
use bandstamp_core::stamp::synthesize;
use bandstamp_core::wcs::CoordinateMapper;

use common::{band_header, tan_header};

#[test]
fn test_reference_pixel_is_stamp_center() {
    let header = band_header(1024, 1024, (512.0, 512.0), "r");
    let mapper = CoordinateMapper::from_header(&header).unwrap();

    for (w, h) in [(64, 64), (65, 65), (1, 1), (10, 20), (33, 7)] {
        let stamp = synthesize(&header, &mapper, 512.0, 512.0, w, h).unwrap();
        assert_eq!(stamp.width, w);
        assert_eq!(stamp.height, h);
        assert_eq!(
            stamp.reference_pixel,
            ((w as f64 - 1.0) / 2.0, (h as f64 - 1.0) / 2.0)
        );
    }
}

#[test]
fn test_reference_sky_comes_from_reference_mapper() {
    let reference_header = band_header(1024, 1024, (512.0, 512.0), "r");
    let reference = CoordinateMapper::from_header(&reference_header).unwrap();
    // A band with a different grid and reference point.
    let g_header = tan_header(1100, 900, (20.0, 30.0), (150.05, 2.03));

    let (cx, cy) = (500.0, 520.0);
    let stamp = synthesize(&g_header, &reference, cx, cy, 64, 64).unwrap();
    let expected = reference.pixel_to_sky(cx, cy).unwrap();

    assert_eq!(stamp.reference_sky, expected);
    assert_eq!(stamp.cards.get_f64("CRVAL1"), Some(expected.0));
    assert_eq!(stamp.cards.get_f64("CRVAL2"), Some(expected.1));
}

#[test]
fn test_cards_are_overwritten_and_passed_through() {
    let header = band_header(1024, 1024, (512.0, 512.0), "g");
    let mapper = CoordinateMapper::from_header(&header).unwrap();
    let stamp = synthesize(&header, &mapper, 512.0, 512.0, 65, 31).unwrap();

    assert_eq!(stamp.cards.get_i64("NAXIS1"), Some(65));
    assert_eq!(stamp.cards.get_i64("NAXIS2"), Some(31));
    assert_eq!(stamp.cards.get_f64("CRPIX1"), Some(33.0));
    assert_eq!(stamp.cards.get_f64("CRPIX2"), Some(16.0));
    assert_eq!(stamp.cards.get_str("FILTER"), Some("g"));
    assert_eq!(stamp.cards.get_f64("EXPTIME"), Some(53.9));
    assert_eq!(stamp.cards.get_str("CTYPE1"), Some("RA---TAN"));
    // Overwritten in place, not appended.
    assert_eq!(stamp.cards.len(), header.len());
}

#[test]
fn test_stamp_cards_describe_the_stamp_grid() {
    let header = band_header(1024, 1024, (512.0, 512.0), "r");
    let mapper = CoordinateMapper::from_header(&header).unwrap();
    let stamp = synthesize(&header, &mapper, 512.0, 512.0, 65, 65).unwrap();

    let stamp_mapper = CoordinateMapper::from_header(&stamp.cards).unwrap();
    assert_eq!(stamp_mapper.reference_pixel(), (32.0, 32.0));

    // Odd stamps put the center pixel at index (w - 1) / 2, so pixel (32, 32)
    // of the stamp is pixel (512, 512) of the frame.
    let (ra, dec) = stamp_mapper.pixel_to_sky(32.0, 32.0).unwrap();
    let (ra_frame, dec_frame) = mapper.pixel_to_sky(512.0, 512.0).unwrap();
    assert_abs_diff_eq!(ra, ra_frame, epsilon = 1e-10);
    assert_abs_diff_eq!(dec, dec_frame, epsilon = 1e-10);
}
