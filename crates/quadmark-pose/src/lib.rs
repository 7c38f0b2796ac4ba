//! Camera model and pose recovery for square fiducial markers.
//!
//! - [`CameraIntrinsics`] / [`Distortion`]: pinhole + Brown–Conrady (with the
//!   optional rational terms) projection and its iterative inverse.
//! - [`CameraProfile`]: the `cameraMatrix` / `distCoeffs` calibration document.
//! - [`solve_pnp_planar`] / [`solve_marker_pose`]: homography initialisation
//!   followed by Levenberg–Marquardt refinement on pixel reprojection error.
//! - [`bridge`]: conversion of a vision-frame [`Pose`] into render-frame
//!   column-major matrices.

pub mod bridge;
mod camera;
mod pnp;
mod pose;

pub use bridge::{
    gl_projection_from_intrinsics, model_view_matrix, pose_to_transform, rodrigues,
    to_column_major_f32, view_matrix, vision_to_render_flip, VISION_TO_RENDER_DIAGONAL,
};
pub use camera::{CalibrationError, CameraIntrinsics, CameraProfile, Distortion, MatrixRepr};
pub use pnp::{
    project_points, reprojection_rms, solve_marker_pose, solve_pnp_planar, unit_square_model,
    PnpError, PnpSolution,
};
pub use pose::Pose;
