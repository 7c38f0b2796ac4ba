//! Planar perspective-n-point.
//!
//! Initialisation decomposes the plane-to-normalized-image homography
//! (`H ~ [r1 r2 t]`); the estimate is then refined by Levenberg–Marquardt on
//! pixel reprojection error through the full distortion model.

use crate::{CameraIntrinsics, Pose};
use nalgebra::{DMatrix, DVector, Matrix3, Point2, Point3, Rotation3, Vector3};
use quadmark_core::estimate_homography;
use serde::{Deserialize, Serialize};

const MAX_LM_ITERS: usize = 50;
const PLANAR_EPS: f64 = 1e-9;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PnpError {
    #[error("need at least 4 correspondences, got {0}")]
    TooFewPoints(usize),
    #[error("{object} object points vs {image} image points")]
    LengthMismatch { object: usize, image: usize },
    #[error("object point {0} is off the z = 0 plane")]
    NonPlanar(usize),
    #[error("image point {0} could not be undistorted")]
    Undistort(usize),
    #[error("degenerate correspondence geometry")]
    Degenerate,
    #[error("solution is not finite")]
    NonFinite,
    #[error("solution places the model behind the camera (tz = {0})")]
    BehindCamera(f64),
}

/// Result of a successful solve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PnpSolution {
    pub pose: Pose,
    /// RMS pixel distance between observed and reprojected points.
    pub reprojection_rms: f64,
    pub iterations: usize,
}

/// Marker-local corners of the unit square in `(TL, TR, BR, BL)` order.
pub fn unit_square_model() -> [Point3<f64>; 4] {
    [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ]
}

/// Pose of the unit-square marker from its four ordered image corners.
pub fn solve_marker_pose(
    corners: &[Point2<f64>; 4],
    camera: &CameraIntrinsics,
) -> Result<PnpSolution, PnpError> {
    solve_pnp_planar(&unit_square_model(), corners, camera)
}

/// Solve for the pose of a planar (`z = 0`) model.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(n = object.len()))
)]
pub fn solve_pnp_planar(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
) -> Result<PnpSolution, PnpError> {
    if object.len() != image.len() {
        return Err(PnpError::LengthMismatch {
            object: object.len(),
            image: image.len(),
        });
    }
    if object.len() < 4 {
        return Err(PnpError::TooFewPoints(object.len()));
    }
    if let Some(i) = object.iter().position(|p| p.z.abs() > PLANAR_EPS) {
        return Err(PnpError::NonPlanar(i));
    }

    let plane: Vec<Point2<f64>> = object.iter().map(|p| Point2::new(p.x, p.y)).collect();
    let normalized = image
        .iter()
        .enumerate()
        .map(|(i, px)| {
            camera
                .normalize(px)
                .map(|[x, y]| Point2::new(x, y))
                .ok_or(PnpError::Undistort(i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let h = estimate_homography(&plane, &normalized).ok_or(PnpError::Degenerate)?;
    let init = decompose_plane_homography(&h.h).ok_or(PnpError::Degenerate)?;
    log::trace!(
        "pnp init rvec={:?} tvec={:?}",
        init.rvec.as_slice(),
        init.tvec.as_slice()
    );

    let (pose, iterations) = refine_lm(object, image, camera, init);
    if !pose.rvec.iter().chain(pose.tvec.iter()).all(|v| v.is_finite()) {
        return Err(PnpError::NonFinite);
    }
    if pose.tvec.z <= 0.0 {
        return Err(PnpError::BehindCamera(pose.tvec.z));
    }
    let reprojection_rms =
        reprojection_rms(object, image, &pose, camera).ok_or(PnpError::BehindCamera(pose.tvec.z))?;

    Ok(PnpSolution {
        pose,
        reprojection_rms,
        iterations,
    })
}

/// `H ~ [r1 r2 t]` in normalized camera coordinates.
fn decompose_plane_homography(h: &Matrix3<f64>) -> Option<Pose> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let denom = (h1.norm() * h2.norm()).sqrt();
    if !(denom > 1e-12) {
        return None;
    }
    let mut lambda = 1.0 / denom;
    if h3.z * lambda < 0.0 {
        lambda = -lambda;
    }

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let r3 = r1.cross(&r2);
    let t = h3 * lambda;

    let approx = Matrix3::from_columns(&[r1, r2, r3]);
    let r = nearest_rotation(&approx)?;
    let pose = Pose::from_rotation(&Rotation3::from_matrix_unchecked(r), t);
    pose.rvec
        .iter()
        .chain(pose.tvec.iter())
        .all(|v| v.is_finite())
        .then_some(pose)
}

/// Closest orthonormal matrix with `det = +1` (polar decomposition via SVD).
fn nearest_rotation(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let mut u = svd.u?;
    let v_t = svd.v_t?;
    if (u * v_t).determinant() < 0.0 {
        let mut c = u.column_mut(2);
        c *= -1.0;
    }
    Some(u * v_t)
}

fn params_to_pose(x: &DVector<f64>) -> Pose {
    Pose::new(Vector3::new(x[0], x[1], x[2]), Vector3::new(x[3], x[4], x[5]))
}

/// Stacked `(u - u_obs, v - v_obs)` residuals; `None` if any point falls
/// behind the camera.
fn residuals(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    pose: &Pose,
) -> Option<DVector<f64>> {
    let mut r = DVector::zeros(2 * object.len());
    for (i, (p, obs)) in object.iter().zip(image).enumerate() {
        let px = camera.project(&pose.transform_point(p))?;
        r[2 * i] = px.x - obs.x;
        r[2 * i + 1] = px.y - obs.y;
    }
    Some(r)
}

fn refine_lm(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    init: Pose,
) -> (Pose, usize) {
    let mut x = DVector::from_column_slice(&[
        init.rvec.x,
        init.rvec.y,
        init.rvec.z,
        init.tvec.x,
        init.tvec.y,
        init.tvec.z,
    ]);
    let Some(mut r) = residuals(object, image, camera, &init) else {
        return (init, 0);
    };
    let mut cost = r.norm_squared();
    let mut mu = 1e-3;
    let mut iters = 0;

    while iters < MAX_LM_ITERS && cost > 1e-20 {
        iters += 1;
        let Some(j) = jacobian(object, image, camera, &x) else {
            break;
        };
        let jt = j.transpose();
        let jtj = &jt * &j;
        let g = &jt * &r;

        let mut improved = false;
        while mu < 1e12 {
            let mut a = jtj.clone();
            for k in 0..6 {
                a[(k, k)] += mu * jtj[(k, k)].max(1e-9);
            }
            let Some(step) = a.lu().solve(&(-&g)) else {
                mu *= 10.0;
                continue;
            };
            let candidate = &x + &step;
            match residuals(object, image, camera, &params_to_pose(&candidate)) {
                Some(rc) if rc.norm_squared() < cost => {
                    let new_cost = rc.norm_squared();
                    let converged = step.norm() < 1e-12 || cost - new_cost < 1e-14 * cost;
                    x = candidate;
                    r = rc;
                    cost = new_cost;
                    mu = (mu * 0.1).max(1e-12);
                    improved = true;
                    if converged {
                        return (params_to_pose(&x), iters);
                    }
                    break;
                }
                _ => mu *= 10.0,
            }
        }
        if !improved {
            break;
        }
    }
    (params_to_pose(&x), iters)
}

/// Central-difference Jacobian of the residual vector w.r.t. `(rvec, tvec)`.
fn jacobian(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    x: &DVector<f64>,
) -> Option<DMatrix<f64>> {
    const STEP: f64 = 1e-6;
    let mut j = DMatrix::zeros(2 * object.len(), 6);
    for k in 0..6 {
        let mut xp = x.clone();
        let mut xm = x.clone();
        xp[k] += STEP;
        xm[k] -= STEP;
        let rp = residuals(object, image, camera, &params_to_pose(&xp))?;
        let rm = residuals(object, image, camera, &params_to_pose(&xm))?;
        j.set_column(k, &((rp - rm) / (2.0 * STEP)));
    }
    Some(j)
}

/// Project marker-frame points through `pose` and `camera`; points behind
/// the camera yield `None`.
pub fn project_points(
    points: &[Point3<f64>],
    pose: &Pose,
    camera: &CameraIntrinsics,
) -> Vec<Option<Point2<f64>>> {
    points
        .iter()
        .map(|p| camera.project(&pose.transform_point(p)))
        .collect()
}

/// Root-mean-square reprojection distance in pixels.
pub fn reprojection_rms(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    pose: &Pose,
    camera: &CameraIntrinsics,
) -> Option<f64> {
    if object.is_empty() || object.len() != image.len() {
        return None;
    }
    let r = residuals(object, image, camera, pose)?;
    Some((r.norm_squared() / object.len() as f64).sqrt())
}
