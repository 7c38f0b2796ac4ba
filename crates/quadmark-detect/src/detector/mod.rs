//! Per-frame detection pipeline.
//!
//! blur + Otsu → contours → convex quads → corner order → canonical warp →
//! border check → bit decode → orientation → corner re-rotation → PnP.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::DetectError;
pub use params::{DetectorParams, ParamsError, SelectionPolicy};
pub use pipeline::MarkerDetector;
pub use result::{CandidateRejection, FrameDetection, MarkerDetection, RejectReason};
