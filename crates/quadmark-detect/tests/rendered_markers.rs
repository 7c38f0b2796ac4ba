use nalgebra::Point2;
use quadmark_code::{render_marker, BitMatrix, Orientation};
use quadmark_core::GrayImage;
use quadmark_detect::{DetectError, DetectorParams, MarkerDetector, RejectReason};
use quadmark_pose::CameraIntrinsics;

const CELL: usize = 30;
const QUIET: usize = 2;
const OFFSET: (usize, usize) = (170, 90);

/// Marker patch rotated clockwise `turns` times, pasted on a white 640x480 canvas.
fn frame_with(pattern: &BitMatrix, turns: u8) -> GrayImage {
    let mut patch = render_marker(pattern, CELL, QUIET);
    for _ in 0..turns {
        let s = patch.width;
        let src = patch.clone();
        patch = GrayImage::from_fn(s, s, |x, y| src.get(y, s - 1 - x));
    }
    let mut frame = GrayImage::filled(640, 480, 255);
    for y in 0..patch.height {
        for x in 0..patch.width {
            frame.set(x + OFFSET.0, y + OFFSET.1, patch.get(x, y));
        }
    }
    frame
}

/// Where the marker's own top-left corner lands after `turns` rotations.
fn expected_origin_corner(turns: u8) -> Point2<f64> {
    let s = ((BitMatrix::reference().size() + 2 + 2 * QUIET) * CELL) as f64;
    let edge = (QUIET * CELL) as f64 - 0.5;
    let mut p = Point2::new(edge, edge);
    for _ in 0..turns {
        p = Point2::new(s - 1.0 - p.y, p.x);
    }
    Point2::new(p.x + OFFSET.0 as f64, p.y + OFFSET.1 as f64)
}

#[test]
fn every_rotation_resolves_and_anchors_the_same_corner() {
    let det = MarkerDetector::new(DetectorParams::default()).expect("params");
    let camera = CameraIntrinsics::default_uncalibrated();

    for turns in 0..4u8 {
        let frame = frame_with(&BitMatrix::reference(), turns);
        let res = det.detect_gray(&frame.view(), &camera);
        assert_eq!(res.markers.len(), 1, "turns={turns}: {:?}", res.rejected);

        let m = res.primary().expect("primary marker");
        assert_eq!(m.orientation, Orientation::from_quarter_turns(turns));
        assert_eq!(m.hamming, 0);
        assert_eq!(m.bits, BitMatrix::reference().rotated(turns));

        let expected = expected_origin_corner(turns);
        let got = m.corners.tl();
        assert!(
            (got - expected).norm() < 2.0,
            "turns={turns}: corner[0]={got:?}, expected {expected:?}"
        );
        assert!(res.pose().valid);
        assert!(m.pose.tvec.z > 0.0);
    }
}

#[test]
fn fronto_parallel_marker_depth_matches_scale() {
    let det = MarkerDetector::new(DetectorParams::default()).expect("params");
    let camera = CameraIntrinsics::default_uncalibrated();
    let frame = frame_with(&BitMatrix::reference(), 0);
    let pose = det.detect_gray(&frame.view(), &camera).pose();
    assert!(pose.valid);
    // 180 px wide unit square at f = 800
    let expected_z = 800.0 / 180.0;
    assert!((pose.tvec.z - expected_z).abs() < 0.05, "z = {}", pose.tvec.z);
    assert!(pose.rvec.norm() < 0.05, "rvec = {:?}", pose.rvec);
}

#[test]
fn flipped_bit_is_unresolved_under_strict_matching() {
    let corrupted = BitMatrix::reference().with_flipped(1, 1);
    let frame = frame_with(&corrupted, 0);
    let camera = CameraIntrinsics::default_uncalibrated();

    let strict = MarkerDetector::new(DetectorParams::default()).expect("params");
    let res = strict.detect_gray(&frame.view(), &camera);
    assert!(res.markers.is_empty());
    assert!(!res.pose().valid);
    assert_eq!(res.error(), Some(DetectError::OrientationUnresolved));
    assert!(res
        .rejected
        .iter()
        .any(|r| matches!(r.reason, RejectReason::Orientation { bits } if bits == corrupted)));

    let tolerant = MarkerDetector::new(DetectorParams {
        max_hamming: 1,
        ..DetectorParams::default()
    })
    .expect("params");
    let res = tolerant.detect_gray(&frame.view(), &camera);
    let m = res.primary().expect("accepted with tolerance");
    assert_eq!(m.hamming, 1);
    assert_eq!(m.orientation, Orientation::Deg0);
}

#[test]
fn plain_black_square_is_border_checked_not_decoded() {
    let mut frame = GrayImage::filled(320, 240, 255);
    for y in 60..180 {
        for x in 100..220 {
            frame.set(x, y, 0);
        }
    }
    let det = MarkerDetector::new(DetectorParams::default()).expect("params");
    let res = det.detect_gray(&frame.view(), &CameraIntrinsics::default_uncalibrated());
    assert!(res.markers.is_empty());
    // an all-black payload decodes to all ones and matches no rotation
    assert_eq!(res.error(), Some(DetectError::OrientationUnresolved));
}
