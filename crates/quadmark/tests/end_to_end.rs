//! Render-then-detect scenarios on 640x480 frames through an f = 800 camera.

use nalgebra::{Rotation3, Vector3};
use quadmark::synth::{render_view, SyntheticScene};
use quadmark::{
    BitMatrix, CameraIntrinsics, DetectError, DetectorParams, MarkerDetector, Orientation, Pose,
    SelectionPolicy,
};
use quadmark_core::RgbImage;

const W: usize = 640;
const H: usize = 480;
const T_TOL: f64 = 0.1;
const R_TOL: f64 = 0.05;

fn camera() -> CameraIntrinsics {
    CameraIntrinsics::default_uncalibrated()
}

fn detector(params: DetectorParams) -> MarkerDetector {
    MarkerDetector::new(params).expect("valid params")
}

fn reference_pose() -> Pose {
    Pose::new(Vector3::zeros(), Vector3::new(-0.5, -0.5, 4.0))
}

fn assert_pose_close(got: &Pose, expected: &Pose, t_tol: f64, r_tol: f64) {
    assert!(got.valid, "pose not valid");
    let dt = (got.tvec - expected.tvec).norm();
    assert!(dt < t_tol, "tvec {:?} vs {:?}", got.tvec, expected.tvec);
    let dr = got.rotation_distance(expected);
    assert!(dr < r_tol, "rotation off by {dr} rad ({:?})", got.rvec);
}

#[test]
fn empty_frame_yields_no_candidate() {
    let det = detector(DetectorParams::default());
    for fill in [[255, 255, 255], [0, 0, 0], [128, 128, 128]] {
        let frame = RgbImage::filled(W, H, fill);
        let res = det.detect(&frame.view(), &camera());
        assert!(!res.is_valid());
        assert_eq!(res.error(), Some(DetectError::NoCandidate));
        assert!(res.markers.is_empty());
    }
}

#[test]
fn upright_marker_recovers_known_pose() {
    let truth = reference_pose();
    let frame = render_view(&BitMatrix::reference(), &truth, &camera(), W, H);
    let res = detector(DetectorParams::default()).detect(&frame.view(), &camera());

    let m = res.primary().expect("marker decoded");
    assert_eq!(m.orientation, Orientation::Deg0);
    assert_eq!(m.hamming, 0);
    assert!(m.reprojection_rms < 2.0, "rms {}", m.reprojection_rms);
    assert_eq!(res.error(), None);
    assert_pose_close(&res.pose(), &truth, T_TOL, R_TOL);
}

#[test]
fn half_turned_pattern_resolves_to_the_same_physical_marker() {
    let upright = reference_pose();
    let frame = render_view(&BitMatrix::reference().rotated(2), &upright, &camera(), W, H);
    let res = detector(DetectorParams::default()).detect(&frame.view(), &camera());

    let m = res.primary().expect("marker decoded");
    assert_eq!(m.orientation, Orientation::Deg180);
    // the marker's own origin is now the far corner of the printed square
    let r = upright.rotation();
    let half = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI);
    let expected = Pose::from_rotation(&(r * half), upright.tvec + r * Vector3::new(1.0, 1.0, 0.0));
    assert_pose_close(&res.pose(), &expected, T_TOL, R_TOL);
    // both frames place the marker centre at the same point
    let centre = nalgebra::Point3::new(0.5, 0.5, 0.0);
    let d = (res.pose().transform_point(&centre) - upright.transform_point(&centre)).norm();
    assert!(d < T_TOL, "centre moved by {d}");
}

#[test]
fn single_flipped_bit_is_rejected_by_default() {
    let corrupted = BitMatrix::reference().with_flipped(2, 3);
    let frame = render_view(&corrupted, &reference_pose(), &camera(), W, H);

    let res = detector(DetectorParams::default()).detect(&frame.view(), &camera());
    assert!(!res.pose().valid);
    assert_eq!(res.error(), Some(DetectError::OrientationUnresolved));
    assert_eq!(
        res.clone().into_result().unwrap_err(),
        DetectError::OrientationUnresolved
    );

    let tolerant = detector(DetectorParams {
        max_hamming: 1,
        ..DetectorParams::default()
    });
    let res = tolerant.detect(&frame.view(), &camera());
    let m = res.primary().expect("accepted within tolerance");
    assert_eq!(m.hamming, 1);
    assert_pose_close(&m.pose, &reference_pose(), T_TOL, R_TOL);
}

#[test]
fn tilted_marker_pose() {
    let truth = Pose::new(Vector3::new(0.35, -0.2, 0.1), Vector3::new(-0.5, -0.4, 4.0));
    let frame = render_view(&BitMatrix::reference(), &truth, &camera(), W, H);
    let res = detector(DetectorParams::default()).detect(&frame.view(), &camera());
    let m = res.primary().expect("marker decoded");
    assert_eq!(m.orientation, Orientation::Deg0);
    // blur rounds the acute corners, so corner error is larger than fronto-parallel
    assert_pose_close(&m.pose, &truth, 0.2, 0.15);
}

#[test]
fn largest_marker_provides_the_frame_pose() {
    let far = Pose::new(Vector3::zeros(), Vector3::new(-1.6, -0.5, 5.0));
    let near = Pose::new(Vector3::zeros(), Vector3::new(0.4, -0.5, 4.0));
    let frame = SyntheticScene::new(W, H, camera())
        .with_marker(BitMatrix::reference(), far)
        .with_marker(BitMatrix::reference(), near)
        .render();

    let res = detector(DetectorParams::default()).detect(&frame.view(), &camera());
    assert_eq!(res.markers.len(), 2, "{:?}", res.rejected);
    assert_pose_close(&res.pose(), &near, T_TOL, R_TOL);

    // the other policies still pick one of the two decoded markers
    for selection in [SelectionPolicy::First, SelectionPolicy::Last] {
        let res = detector(DetectorParams {
            selection,
            ..DetectorParams::default()
        })
        .detect(&frame.view(), &camera());
        let tz = res.pose().tvec.z;
        assert!((tz - 4.0).abs() < T_TOL || (tz - 5.0).abs() < T_TOL, "tz = {tz}");
    }
}

#[test]
fn detection_leaves_the_frame_untouched() {
    let frame = render_view(&BitMatrix::reference(), &reference_pose(), &camera(), W, H);
    let before = frame.clone();
    let _ = detector(DetectorParams::default()).detect(&frame.view(), &camera());
    assert_eq!(frame, before);
}
