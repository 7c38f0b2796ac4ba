use super::DetectError;
use crate::OrderedCorners;
use nalgebra::Point2;
use quadmark_code::{BitMatrix, Orientation};
use quadmark_pose::Pose;
use serde::{Deserialize, Serialize};

/// A candidate that decoded as the reference marker and produced a pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    /// Image corners re-rotated so index 0 is the marker's own top-left
    /// corner (model point `(0, 0, 0)`), then clockwise on the marker.
    pub corners: OrderedCorners,
    pub orientation: Orientation,
    pub hamming: u32,
    /// Payload as read from the canonical image, before rotation matching.
    pub bits: BitMatrix,
    pub area: f64,
    /// Otsu threshold used on the canonical patch.
    pub canonical_threshold: u8,
    pub pose: Pose,
    pub reprojection_rms: f64,
}

/// Why a quad candidate was discarded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// The quad could not be rectified.
    Degenerate,
    Border { row: usize, col: usize, white_fraction: f32 },
    Orientation { bits: BitMatrix },
    PoseSolve { message: String },
}

impl RejectReason {
    /// Pipeline stage this rejection belongs to.
    pub fn stage(&self) -> DetectError {
        match self {
            RejectReason::Degenerate | RejectReason::Border { .. } => DetectError::BorderRejected,
            RejectReason::Orientation { .. } => DetectError::OrientationUnresolved,
            RejectReason::PoseSolve { .. } => DetectError::PoseSolveFailed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateRejection {
    /// Quad vertices in contour order.
    pub corners: [Point2<f64>; 4],
    pub area: f64,
    pub reason: RejectReason,
}

/// Everything one frame produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetection {
    /// Decoded markers in contour scan order.
    pub markers: Vec<MarkerDetection>,
    /// Index into `markers` picked by the selection policy.
    pub primary: Option<usize>,
    pub rejected: Vec<CandidateRejection>,
    /// Otsu threshold of the blurred frame.
    pub frame_threshold: u8,
}

impl FrameDetection {
    pub fn primary(&self) -> Option<&MarkerDetection> {
        self.primary.and_then(|i| self.markers.get(i))
    }

    /// The frame's pose; invalid when nothing decoded.
    pub fn pose(&self) -> Pose {
        self.primary().map_or_else(Pose::invalid, |m| m.pose)
    }

    pub fn is_valid(&self) -> bool {
        self.pose().valid
    }

    /// `None` on success, otherwise the furthest stage any candidate reached.
    pub fn error(&self) -> Option<DetectError> {
        if !self.markers.is_empty() {
            return None;
        }
        Some(
            self.rejected
                .iter()
                .map(|r| r.reason.stage())
                .max()
                .unwrap_or(DetectError::NoCandidate),
        )
    }

    /// `Ok(primary)` or the frame error.
    pub fn into_result(mut self) -> Result<MarkerDetection, DetectError> {
        let err = self.error();
        match self.primary {
            Some(i) if i < self.markers.len() => Ok(self.markers.swap_remove(i)),
            _ => Err(err.unwrap_or(DetectError::NoCandidate)),
        }
    }
}
