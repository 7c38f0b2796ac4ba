use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Marker pose in the camera (vision) frame: `X_cam = R(rvec) * X_marker + tvec`.
///
/// `valid == false` means the frame produced no usable pose; the vectors are
/// then zero and must not be rendered.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Rotation vector (axis × angle, radians).
    pub rvec: Vector3<f64>,
    pub tvec: Vector3<f64>,
    pub valid: bool,
}

impl Default for Pose {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Pose {
    pub fn new(rvec: Vector3<f64>, tvec: Vector3<f64>) -> Self {
        Self {
            rvec,
            tvec,
            valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            rvec: Vector3::zeros(),
            tvec: Vector3::zeros(),
            valid: false,
        }
    }

    pub fn from_rotation(rotation: &Rotation3<f64>, tvec: Vector3<f64>) -> Self {
        Self::new(rotation.scaled_axis(), tvec)
    }

    #[inline]
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_scaled_axis(self.rvec)
    }

    #[inline]
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation().into_inner()
    }

    /// Marker-frame point to camera frame.
    #[inline]
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation() * p + self.tvec
    }

    /// Angle (radians) of the relative rotation between two poses.
    pub fn rotation_distance(&self, other: &Pose) -> f64 {
        self.rotation().angle_to(&other.rotation())
    }
}
