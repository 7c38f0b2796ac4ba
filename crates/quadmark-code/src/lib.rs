//! Marker code handling for square bit-grid fiducials.
//!
//! This crate focuses on:
//! - the [`BitMatrix`] payload type and the built-in reference pattern,
//! - resolving a decoded matrix against the reference under 90° rotations,
//! - validating the black border and decoding the inner bits of a
//!   binarized canonical (rectified) marker image,
//! - rendering the canonical marker for printing or synthetic tests.
//!
//! It does **not** find quads or warp frames; see `quadmark-detect`.

mod grid;
mod orientation;
mod pattern;
mod render;

pub use grid::{decode_bits, validate_border, BorderViolation, GridLayout, LayoutError};
pub use orientation::{resolve_orientation, Orientation, OrientationMatch};
pub use pattern::{rotate_code, BitMatrix, PatternError, MAX_MATRIX_SIZE};
pub use render::{render_canonical, render_marker};
