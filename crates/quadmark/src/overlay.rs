//! Debug drawing on RGB frames: pose axes and detected outlines.

use nalgebra::{Point2, Point3};
use quadmark_core::RgbImage;
use quadmark_detect::{FrameDetection, OrderedCorners};
use quadmark_pose::{project_points, CameraIntrinsics, Pose};

pub const AXIS_X: [u8; 3] = [255, 0, 0];
pub const AXIS_Y: [u8; 3] = [0, 255, 0];
pub const AXIS_Z: [u8; 3] = [0, 0, 255];
pub const OUTLINE: [u8; 3] = [255, 255, 0];

/// Origin and axis tips in marker units; Z points out of the marker
/// towards the camera.
pub fn axis_points() -> [Point3<f64>; 4] {
    [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.5, 0.0, 0.0),
        Point3::new(0.0, 0.5, 0.0),
        Point3::new(0.0, 0.0, -0.5),
    ]
}

// lines with an endpoint this far outside the frame are skipped
const MAX_COORD: f64 = 1.0e5;

/// Bresenham line between pixel positions; off-frame pixels are clipped.
pub fn draw_line(frame: &mut RgbImage, a: Point2<f64>, b: Point2<f64>, rgb: [u8; 3]) {
    let ok = |p: &Point2<f64>| p.x.abs() < MAX_COORD && p.y.abs() < MAX_COORD;
    if !ok(&a) || !ok(&b) {
        return;
    }
    let (mut x, mut y) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        frame.put(x, y, rgb);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Closed outline through the four corners.
pub fn draw_quad(frame: &mut RgbImage, corners: &OrderedCorners, rgb: [u8; 3]) {
    let c = corners.as_array();
    for i in 0..4 {
        draw_line(frame, c[i], c[(i + 1) % 4], rgb);
    }
}

/// Draw X (red), Y (green) and Z (blue) axes of `pose`.
///
/// Returns `false` without drawing when the pose is invalid or any axis
/// point projects behind the camera.
pub fn draw_axes(frame: &mut RgbImage, pose: &Pose, camera: &CameraIntrinsics) -> bool {
    if !pose.valid {
        return false;
    }
    let projected: Option<Vec<Point2<f64>>> =
        project_points(&axis_points(), pose, camera).into_iter().collect();
    let Some(p) = projected else {
        return false;
    };
    draw_line(frame, p[0], p[1], AXIS_X);
    draw_line(frame, p[0], p[2], AXIS_Y);
    draw_line(frame, p[0], p[3], AXIS_Z);
    true
}

/// Outline every decoded marker and draw the axes of the primary pose.
pub fn draw_detection(frame: &mut RgbImage, detection: &FrameDetection, camera: &CameraIntrinsics) {
    for m in &detection.markers {
        draw_quad(frame, &m.corners, OUTLINE);
    }
    draw_axes(frame, &detection.pose(), camera);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const WHITE: [u8; 3] = [255, 255, 255];

    #[test]
    fn line_covers_both_endpoints() {
        let mut img = RgbImage::filled(20, 20, WHITE);
        draw_line(&mut img, Point2::new(2.0, 3.0), Point2::new(15.0, 9.0), AXIS_X);
        assert_eq!(img.get(2, 3), AXIS_X);
        assert_eq!(img.get(15, 9), AXIS_X);
        assert_eq!(img.get(0, 19), WHITE);
    }

    #[test]
    fn line_is_clipped_to_frame() {
        let mut img = RgbImage::filled(10, 10, WHITE);
        draw_line(&mut img, Point2::new(-5.0, 5.0), Point2::new(20.0, 5.0), AXIS_Y);
        assert!((0..10).all(|x| img.get(x, 5) == AXIS_Y));
        draw_line(&mut img, Point2::new(f64::NAN, 0.0), Point2::new(3.0, 3.0), AXIS_Z);
        assert_eq!(img.get(3, 3), WHITE);
    }

    #[test]
    fn axes_of_fronto_parallel_pose() {
        let camera = CameraIntrinsics::default_uncalibrated();
        let pose = Pose::new(Vector3::zeros(), Vector3::new(-0.5, -0.5, 4.0));
        let mut img = RgbImage::filled(640, 480, WHITE);
        assert!(draw_axes(&mut img, &pose, &camera));
        // origin projects to (220, 140); X tip to (320, 140), Y tip to (220, 240)
        assert_eq!(img.get(270, 140), AXIS_X);
        assert_eq!(img.get(320, 140), AXIS_X);
        assert_eq!(img.get(220, 190), AXIS_Y);
        // Z points at the camera and is drawn last over the origin
        assert_eq!(img.get(220, 140), AXIS_Z);
    }

    #[test]
    fn invalid_pose_draws_nothing() {
        let camera = CameraIntrinsics::default_uncalibrated();
        let mut img = RgbImage::filled(64, 48, WHITE);
        assert!(!draw_axes(&mut img, &Pose::invalid(), &camera));
        assert!(img.data.iter().all(|&v| v == 255));
    }
}
