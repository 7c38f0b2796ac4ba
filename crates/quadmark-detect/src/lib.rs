//! Square fiducial marker detection and pose estimation.
//!
//! [`MarkerDetector`] runs the whole per-frame pipeline on a borrowed frame
//! and a borrowed [`CameraIntrinsics`](quadmark_pose::CameraIntrinsics),
//! returning a [`FrameDetection`] with every decoded marker, every rejected
//! candidate and the primary pose. No state is carried between frames.
//!
//! The lower-level stages are public for reuse and testing:
//! [`find_contours`], [`approx_poly_dp`], [`find_quad_candidates`],
//! [`order_corners`] and [`rectify_marker`].

mod canonical;
mod contours;
mod detector;
mod io;
mod polygon;
mod quad;

pub use canonical::{canonical_square, rectify_marker, CanonicalView};
pub use contours::{find_contours, Contour};
pub use detector::{
    CandidateRejection, DetectError, DetectorParams, FrameDetection, MarkerDetection,
    MarkerDetector, ParamsError, RejectReason, SelectionPolicy,
};
pub use io::{DetectConfig, DetectIoError, DetectReport};
pub use polygon::{approx_poly_dp, arc_length, is_convex, polygon_area};
pub use quad::{find_quad_candidates, order_corners, OrderedCorners, QuadCandidate};
