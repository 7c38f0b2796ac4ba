//! Vision-frame pose to render-frame matrices.
//!
//! The vision frame is right-handed with X right, Y down, Z forward (into
//! the scene). The render frame is right-handed with X right, Y up and
//! Z backward, so the view matrix is `diag(1, -1, -1, 1) * [R | t]`.
//!
//! All `[f32; 16]` outputs are column-major, ready for a GL-style uniform.

use crate::{CameraIntrinsics, Pose};
use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3, Vector4};

/// Diagonal of the vision-to-render axis flip.
pub const VISION_TO_RENDER_DIAGONAL: [f64; 4] = [1.0, -1.0, -1.0, 1.0];

pub fn vision_to_render_flip() -> Matrix4<f64> {
    Matrix4::from_diagonal(&Vector4::from(VISION_TO_RENDER_DIAGONAL))
}

/// Rotation matrix of a rotation vector (Rodrigues' formula).
///
/// Same conversion as [`Pose::rotation`].
pub fn rodrigues(rvec: &Vector3<f64>) -> Matrix3<f64> {
    Rotation3::from_scaled_axis(*rvec).into_inner()
}

/// Homogeneous `[R | t]` mapping marker coordinates into the vision frame.
pub fn pose_to_transform(pose: &Pose) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&rodrigues(&pose.rvec));
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&pose.tvec);
    m
}

pub fn to_column_major_f32(m: &Matrix4<f64>) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for c in 0..4 {
        for r in 0..4 {
            out[c * 4 + r] = m[(r, c)] as f32;
        }
    }
    out
}

/// Render-frame view matrix for `pose`.
pub fn view_matrix(pose: &Pose) -> [f32; 16] {
    to_column_major_f32(&(vision_to_render_flip() * pose_to_transform(pose)))
}

/// Raw `[R | t]` without the axis flip.
pub fn model_view_matrix(pose: &Pose) -> [f32; 16] {
    to_column_major_f32(&pose_to_transform(pose))
}

/// Perspective projection matching [`view_matrix`] for a `width × height`
/// frame seen through `camera`.
pub fn gl_projection_from_intrinsics(
    camera: &CameraIntrinsics,
    width: u32,
    height: u32,
    near: f32,
    far: f32,
) -> [f32; 16] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let mut p = [0.0f32; 16];
    p[0] = 2.0 * camera.fx as f32 / w;
    p[5] = 2.0 * camera.fy as f32 / h;
    p[8] = 2.0 * (camera.cx as f32 / w) - 1.0;
    p[9] = 2.0 * (camera.cy as f32 / h) - 1.0;
    p[10] = -(far + near) / (far - near);
    p[11] = -1.0;
    p[14] = -2.0 * far * near / (far - near);
    p
}
