//! High-level facade crate for the `quadmark-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates (`core`, `code`, `pose`, `detect`)
//! - [`synth`]: rendering a marker at a known pose through a known camera,
//!   used for render-then-detect tests, the benchmark and `quadmark synth`
//! - [`overlay`]: drawing the pose axes and detected outlines on a frame
//! - (feature `image`) [`detect`]: end-to-end helpers from `image::RgbImage`
//!   and the JSON job runner behind `quadmark detect`
//!
//! ## Quickstart
//!
//! ```no_run
//! use quadmark::detect;
//! use quadmark::{CameraIntrinsics, DetectorParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame.png")?.to_rgb8();
//! let camera = CameraIntrinsics::default_uncalibrated();
//!
//! let frame = detect::detect_marker(&img, &camera, DetectorParams::default())?;
//! println!("pose valid: {}", frame.pose().valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `quadmark::core`: image buffers, blur, Otsu, homographies, logger.
//! - `quadmark::code`: bit matrices, orientation, border/bit decoding.
//! - `quadmark::pose`: camera model, planar PnP, render-frame bridge.
//! - `quadmark::detect_stage`: contours, quads and the per-frame detector.

pub use quadmark_code as code;
pub use quadmark_core as core;
pub use quadmark_detect as detect_stage;
pub use quadmark_pose as pose;

pub use quadmark_code::{BitMatrix, Orientation};
pub use quadmark_detect::{
    DetectConfig, DetectError, DetectReport, DetectorParams, FrameDetection, MarkerDetection,
    MarkerDetector, SelectionPolicy,
};
pub use quadmark_pose::{CameraIntrinsics, CameraProfile, Pose};

pub mod overlay;
pub mod synth;

#[cfg(feature = "image")]
pub mod detect;
