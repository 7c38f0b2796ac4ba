//! Synthetic camera views of unit-square markers.
//!
//! Each output pixel centre is undistorted through the camera, cast as a ray
//! and intersected with every marker plane; the nearest hit in front of the
//! camera picks the cell colour. No anti-aliasing: a pixel is black or white
//! by the cell containing its centre.

use nalgebra::{Matrix3, Point2, Vector3};
use quadmark_code::BitMatrix;
use quadmark_core::RgbImage;
use quadmark_pose::{CameraIntrinsics, Pose};

const BLACK: [u8; 3] = [0, 0, 0];
const WHITE: [u8; 3] = [255, 255, 255];

/// One marker placed in the scene.
#[derive(Clone, Debug)]
pub struct SyntheticMarker {
    pub pattern: BitMatrix,
    /// Marker-to-camera pose; the marker spans `[0, 1]²` on its `z = 0` plane.
    pub pose: Pose,
}

impl SyntheticMarker {
    pub fn new(pattern: BitMatrix, pose: Pose) -> Self {
        Self { pattern, pose }
    }

    /// Colour of the marker at plane coordinates `(u, v)`, or `None` outside it.
    fn colour_at(&self, u: f64, v: f64) -> Option<[u8; 3]> {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let total = self.pattern.size() + 2;
        let col = ((u * total as f64) as usize).min(total - 1);
        let row = ((v * total as f64) as usize).min(total - 1);
        if row == 0 || col == 0 || row + 1 == total || col + 1 == total {
            return Some(BLACK);
        }
        Some(if self.pattern.get(row - 1, col - 1) {
            BLACK
        } else {
            WHITE
        })
    }
}

/// Inverse of the plane-to-normalized-image homography `[r1 r2 t]`.
fn plane_from_ray(pose: &Pose) -> Option<Matrix3<f64>> {
    let r = pose.rotation_matrix();
    let h = Matrix3::from_columns(&[r.column(0).into_owned(), r.column(1).into_owned(), pose.tvec]);
    h.try_inverse()
}

/// A frame to render: size, camera and the markers in it.
#[derive(Clone, Debug)]
pub struct SyntheticScene {
    pub width: usize,
    pub height: usize,
    pub camera: CameraIntrinsics,
    pub background: [u8; 3],
    pub markers: Vec<SyntheticMarker>,
}

impl SyntheticScene {
    /// Empty white scene.
    pub fn new(width: usize, height: usize, camera: CameraIntrinsics) -> Self {
        Self {
            width,
            height,
            camera,
            background: WHITE,
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, pattern: BitMatrix, pose: Pose) -> Self {
        self.markers.push(SyntheticMarker::new(pattern, pose));
        self
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn render(&self) -> RgbImage {
        let mut out = RgbImage::filled(self.width, self.height, self.background);
        let planes: Vec<_> = self
            .markers
            .iter()
            .filter_map(|m| plane_from_ray(&m.pose).map(|inv| (m, inv)))
            .collect();
        if planes.is_empty() {
            return out;
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let Some([xn, yn]) = self.camera.normalize(&Point2::new(x as f64, y as f64)) else {
                    continue;
                };
                let ray = Vector3::new(xn, yn, 1.0);
                let mut best: Option<(f64, [u8; 3])> = None;
                for (marker, inv) in &planes {
                    let q = inv * ray;
                    // depth along the ray is 1 / q.z
                    if q.z <= 0.0 || !q.z.is_finite() {
                        continue;
                    }
                    let depth = 1.0 / q.z;
                    if best.is_some_and(|(d, _)| d <= depth) {
                        continue;
                    }
                    if let Some(rgb) = marker.colour_at(q.x / q.z, q.y / q.z) {
                        best = Some((depth, rgb));
                    }
                }
                if let Some((_, rgb)) = best {
                    out.put(x as i64, y as i64, rgb);
                }
            }
        }
        out
    }
}

/// Render one reference-coded marker at `pose`.
pub fn render_view(
    pattern: &BitMatrix,
    pose: &Pose,
    camera: &CameraIntrinsics,
    width: usize,
    height: usize,
) -> RgbImage {
    SyntheticScene::new(width, height, *camera)
        .with_marker(*pattern, *pose)
        .render()
}
