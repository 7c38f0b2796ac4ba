//! Core types and utilities for square fiducial detection.
//!
//! This crate is intentionally small and purely raster/geometric. It knows
//! nothing about marker codes or camera models; those live in
//! `quadmark-code` and `quadmark-pose`.

mod filter;
mod homography;
mod image;
mod logger;
mod threshold;

pub use filter::{gaussian_blur, gaussian_kernel};
pub use homography::{
    estimate_homography, homography_from_4pt, warp_perspective_gray, Homography,
};
pub use image::{
    sample_bilinear, sample_bilinear_u8, to_gray, GrayImage, GrayImageView, ImageError, RgbImage,
    RgbImageView,
};
pub use threshold::{binarize, otsu_binarize, otsu_threshold};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
