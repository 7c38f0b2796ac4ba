//! Pinhole intrinsics, lens distortion and the calibration document.
//!
//! Distortion follows the OpenCV coefficient order
//! `(k1, k2, p1, p2[, k3[, k4, k5, k6]])`; the rational terms `k4..k6`
//! divide the radial polynomial.

use nalgebra::{Matrix3, Point2, Point3};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("failed to read calibration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse calibration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{name}: expected a 3x3 matrix, got {rows}x{cols}")]
    CameraMatrixShape {
        name: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("{name}: rows have different lengths")]
    RaggedMatrix { name: &'static str },
    #[error("{name}: {rows}x{cols} matrix with {got} values")]
    DataLength {
        name: &'static str,
        rows: usize,
        cols: usize,
        got: usize,
    },
    #[error("distCoeffs must be a vector, got {rows}x{cols}")]
    DistortionShape { rows: usize, cols: usize },
    #[error("unsupported distortion length {0} (expected 0, 4, 5 or 8)")]
    DistortionLength(usize),
    #[error("camera matrix contains non-finite values")]
    NonFinite,
    #[error("focal lengths must be positive (fx={fx}, fy={fy})")]
    NonPositiveFocal { fx: f64, fy: f64 },
    #[error("camera matrix last row must be [0, 0, 1]")]
    LastRow,
}

/// Lens distortion coefficients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
    pub k4: f64,
    pub k5: f64,
    pub k6: f64,
}

impl Distortion {
    /// Parse an OpenCV-ordered coefficient vector of length 0, 4, 5 or 8.
    pub fn from_coeffs(c: &[f64]) -> Result<Self, CalibrationError> {
        if !matches!(c.len(), 0 | 4 | 5 | 8) {
            return Err(CalibrationError::DistortionLength(c.len()));
        }
        if c.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite);
        }
        let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
        Ok(Self {
            k1: at(0),
            k2: at(1),
            p1: at(2),
            p2: at(3),
            k3: at(4),
            k4: at(5),
            k5: at(6),
            k6: at(7),
        })
    }

    /// Shortest OpenCV coefficient vector carrying every non-zero term.
    pub fn coeffs(&self) -> Vec<f64> {
        if self.is_zero() {
            return Vec::new();
        }
        let all = [
            self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6,
        ];
        let len = if self.k4 != 0.0 || self.k5 != 0.0 || self.k6 != 0.0 {
            8
        } else {
            5
        };
        all[..len].to_vec()
    }

    pub fn is_zero(&self) -> bool {
        [
            self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6,
        ]
        .iter()
        .all(|&v| v == 0.0)
    }

    #[inline]
    fn radial(&self, r2: f64) -> f64 {
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let num = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;
        let den = 1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6;
        num / den
    }

    #[inline]
    fn tangential(&self, x: f64, y: f64, r2: f64) -> [f64; 2] {
        [
            2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x),
            self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y,
        ]
    }

    /// Apply distortion to normalized coordinates.
    pub fn distort(&self, xy: [f64; 2]) -> [f64; 2] {
        let [x, y] = xy;
        let r2 = x * x + y * y;
        let radial = self.radial(r2);
        let [tx, ty] = self.tangential(x, y, r2);
        [x * radial + tx, y * radial + ty]
    }

    /// Invert [`Distortion::distort`] by fixed-point iteration.
    pub fn undistort(&self, xd: [f64; 2]) -> Option<[f64; 2]> {
        const MAX_ITERS: usize = 30;
        const EPS: f64 = 1e-14;

        if self.is_zero() {
            return Some(xd);
        }
        let [mut x, mut y] = xd;
        for _ in 0..MAX_ITERS {
            let r2 = x * x + y * y;
            let radial = self.radial(r2);
            if !radial.is_finite() || radial.abs() < 1e-12 {
                return None;
            }
            let [tx, ty] = self.tangential(x, y, r2);
            let xn = (xd[0] - tx) / radial;
            let yn = (xd[1] - ty) / radial;
            if !xn.is_finite() || !yn.is_finite() {
                return None;
            }
            let step = (xn - x).hypot(yn - y);
            x = xn;
            y = yn;
            if step <= EPS {
                break;
            }
        }
        Some([x, y])
    }
}

/// Pinhole intrinsics plus distortion; read-only for the pipeline lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub skew: f64,
    #[serde(default)]
    pub distortion: Distortion,
}

impl CameraIntrinsics {
    /// Profile used when no calibration is available: `f = 800`, principal
    /// point at the centre of a 640×480 frame, no distortion.
    pub fn default_uncalibrated() -> Self {
        Self {
            fx: 800.0,
            fy: 800.0,
            cx: 320.0,
            cy: 240.0,
            skew: 0.0,
            distortion: Distortion::default(),
        }
    }

    /// Build from a row-major 3×3 camera matrix and a distortion vector.
    pub fn from_matrix(k: &Matrix3<f64>, dist: &[f64]) -> Result<Self, CalibrationError> {
        let out = Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
            skew: k[(0, 1)],
            distortion: Distortion::from_coeffs(dist)?,
        };
        if k.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite);
        }
        if k[(1, 0)] != 0.0 || k[(2, 0)] != 0.0 || k[(2, 1)] != 0.0 || k[(2, 2)] != 1.0 {
            return Err(CalibrationError::LastRow);
        }
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        let vals = [self.fx, self.fy, self.cx, self.cy, self.skew];
        if vals.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite);
        }
        if self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(CalibrationError::NonPositiveFocal {
                fx: self.fx,
                fy: self.fy,
            });
        }
        Ok(())
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, self.skew, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// Normalized (undistorted) coordinates to pixels, applying distortion.
    pub fn normalized_to_pixel(&self, xy: [f64; 2]) -> Point2<f64> {
        let [x, y] = self.distortion.distort(xy);
        Point2::new(self.fx * x + self.skew * y + self.cx, self.fy * y + self.cy)
    }

    /// Project a camera-frame point; `None` when it is not in front of the camera.
    pub fn project(&self, p: &Point3<f64>) -> Option<Point2<f64>> {
        if !(p.z > 1e-12) {
            return None;
        }
        let px = self.normalized_to_pixel([p.x / p.z, p.y / p.z]);
        (px.x.is_finite() && px.y.is_finite()).then_some(px)
    }

    /// Pixel to undistorted normalized coordinates.
    pub fn normalize(&self, px: &Point2<f64>) -> Option<[f64; 2]> {
        let yd = (px.y - self.cy) / self.fy;
        let xd = (px.x - self.cx - self.skew * yd) / self.fx;
        if !xd.is_finite() || !yd.is_finite() {
            return None;
        }
        self.distortion.undistort([xd, yd])
    }

    /// Remove lens distortion from a pixel, staying in pixel units.
    pub fn undistort_point(&self, px: &Point2<f64>) -> Option<Point2<f64>> {
        let [x, y] = self.normalize(px)?;
        Some(Point2::new(
            self.fx * x + self.skew * y + self.cx,
            self.fy * y + self.cy,
        ))
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::default_uncalibrated()
    }
}

/// A matrix as written in a calibration document.
///
/// Nested rows (`[[..], [..]]`), a flat list (column vector), or the
/// OpenCV storage layout `{ "rows": r, "cols": c, "data": [...] }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixRepr {
    OpenCv {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    },
    Rows(Vec<Vec<f64>>),
    Flat(Vec<f64>),
}

impl Default for MatrixRepr {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl MatrixRepr {
    /// Dense `(rows, cols, row-major data)`.
    fn dense(&self, name: &'static str) -> Result<(usize, usize, Vec<f64>), CalibrationError> {
        match self {
            Self::OpenCv { rows, cols, data } => {
                if rows * cols != data.len() {
                    return Err(CalibrationError::DataLength {
                        name,
                        rows: *rows,
                        cols: *cols,
                        got: data.len(),
                    });
                }
                Ok((*rows, *cols, data.clone()))
            }
            Self::Rows(rows) => {
                let cols = rows.first().map_or(0, Vec::len);
                if rows.iter().any(|r| r.len() != cols) {
                    return Err(CalibrationError::RaggedMatrix { name });
                }
                Ok((rows.len(), cols, rows.concat()))
            }
            Self::Flat(data) => Ok((data.len(), 1, data.clone())),
        }
    }
}

/// On-disk calibration: the intrinsic matrix and the distortion vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraProfile {
    #[serde(rename = "cameraMatrix")]
    pub camera_matrix: MatrixRepr,
    #[serde(rename = "distCoeffs", default)]
    pub dist_coeffs: MatrixRepr,
}

impl CameraProfile {
    pub fn from_json_str(s: &str) -> Result<Self, CalibrationError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn from_intrinsics(camera: &CameraIntrinsics) -> Self {
        let k = camera.matrix();
        Self {
            camera_matrix: MatrixRepr::Rows(
                (0..3).map(|r| (0..3).map(|c| k[(r, c)]).collect()).collect(),
            ),
            dist_coeffs: MatrixRepr::Flat(camera.distortion.coeffs()),
        }
    }

    /// Validate shapes and values; malformed calibration is fatal to the caller.
    pub fn to_intrinsics(&self) -> Result<CameraIntrinsics, CalibrationError> {
        let (rows, cols, k) = self.camera_matrix.dense("cameraMatrix")?;
        if rows != 3 || cols != 3 {
            return Err(CalibrationError::CameraMatrixShape {
                name: "cameraMatrix",
                rows,
                cols,
            });
        }
        let (drows, dcols, dist) = self.dist_coeffs.dense("distCoeffs")?;
        if drows != 1 && dcols != 1 && !dist.is_empty() {
            return Err(CalibrationError::DistortionShape {
                rows: drows,
                cols: dcols,
            });
        }
        CameraIntrinsics::from_matrix(&Matrix3::from_row_slice(&k), &dist)
    }
}
