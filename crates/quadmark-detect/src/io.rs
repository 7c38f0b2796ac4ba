//! JSON job description and report for marker detection runs.

use crate::{
    CandidateRejection, DetectError, DetectorParams, FrameDetection, MarkerDetection,
    MarkerDetector, ParamsError,
};
use quadmark_pose::{view_matrix, CalibrationError, CameraIntrinsics, CameraProfile, Pose};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum DetectIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for one detection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectConfig {
    pub image_path: String,
    /// `cameraMatrix` / `distCoeffs` JSON; the uncalibrated default profile
    /// is used when absent.
    #[serde(default)]
    pub calibration_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    /// Where to write the frame with the pose axes drawn on it.
    #[serde(default)]
    pub overlay_path: Option<String>,
    #[serde(default)]
    pub params: Option<DetectorParams>,
}

impl DetectConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("quadmark_report.json"))
    }

    /// Load the camera profile, or fall back to the uncalibrated default.
    pub fn load_camera(&self) -> Result<CameraIntrinsics, CalibrationError> {
        match &self.calibration_path {
            Some(path) => CameraProfile::load_json(path)?.to_intrinsics(),
            None => Ok(CameraIntrinsics::default_uncalibrated()),
        }
    }

    pub fn build_params(&self) -> DetectorParams {
        self.params.clone().unwrap_or_default()
    }

    pub fn build_detector(&self) -> Result<MarkerDetector, ParamsError> {
        MarkerDetector::new(self.build_params())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    pub camera: CameraIntrinsics,
    pub pose: Pose,
    /// Column-major render-frame view matrix of `pose`, when valid.
    #[serde(default)]
    pub view_matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub error: Option<DetectError>,
    pub frame_threshold: u8,
    #[serde(default)]
    pub primary: Option<usize>,
    pub markers: Vec<MarkerDetection>,
    pub rejected: Vec<CandidateRejection>,
}

impl DetectReport {
    pub fn new(
        image_path: impl Into<String>,
        width: usize,
        height: usize,
        camera: CameraIntrinsics,
        frame: FrameDetection,
    ) -> Self {
        let pose = frame.pose();
        Self {
            image_path: image_path.into(),
            width,
            height,
            camera,
            pose,
            view_matrix: pose.valid.then(|| view_matrix(&pose)),
            error: frame.error(),
            frame_threshold: frame.frame_threshold,
            primary: frame.primary,
            markers: frame.markers,
            rejected: frame.rejected,
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: DetectConfig = serde_json::from_str(r#"{ "image_path": "frame.png" }"#).expect("json");
        assert_eq!(cfg.output_path(), PathBuf::from("quadmark_report.json"));
        assert_eq!(cfg.build_params(), DetectorParams::default());
        assert_eq!(
            cfg.load_camera().expect("default camera"),
            CameraIntrinsics::default_uncalibrated()
        );
    }

    #[test]
    fn missing_calibration_file_is_an_error() {
        let cfg = DetectConfig {
            image_path: "frame.png".into(),
            calibration_path: Some("/nonexistent/calib.json".into()),
            ..DetectConfig::default()
        };
        assert!(matches!(cfg.load_camera(), Err(CalibrationError::Io(_))));
    }

    #[test]
    fn report_roundtrip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        let report = DetectReport::new(
            "frame.png",
            640,
            480,
            CameraIntrinsics::default_uncalibrated(),
            FrameDetection::default(),
        );
        assert_eq!(report.error, Some(DetectError::NoCandidate));
        assert!(report.view_matrix.is_none());
        report.write_json(&path).expect("write");
        let back = DetectReport::load_json(&path).expect("load");
        assert_eq!(back.error, Some(DetectError::NoCandidate));
        assert!(!back.pose.valid);
        assert_eq!(back.width, 640);
    }
}
