//! Perspective normalisation of a quad into the canonical marker square.

use crate::OrderedCorners;
use nalgebra::Point2;
use quadmark_core::{homography_from_4pt, otsu_binarize, warp_perspective_gray, GrayImage, GrayImageView};

/// Rectified candidate: the warped gray patch and its Otsu binarisation.
#[derive(Clone, Debug)]
pub struct CanonicalView {
    pub gray: GrayImage,
    pub binary: GrayImage,
    pub threshold: u8,
}

/// Canonical corners of a `size × size` square in `(TL, TR, BR, BL)` order.
pub fn canonical_square(size: usize) -> [Point2<f64>; 4] {
    let m = size.saturating_sub(1) as f64;
    [
        Point2::new(0.0, 0.0),
        Point2::new(m, 0.0),
        Point2::new(m, m),
        Point2::new(0.0, m),
    ]
}

/// Warp the quad bounded by `corners` into a `size × size` patch and
/// binarise it with Otsu (no blur). `None` for degenerate quads.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip(gray, corners))
)]
pub fn rectify_marker(
    gray: &GrayImageView<'_>,
    corners: &OrderedCorners,
    size: usize,
) -> Option<CanonicalView> {
    let h_img_from_canon = homography_from_4pt(&canonical_square(size), corners.as_array())?;
    let warped = warp_perspective_gray(gray, &h_img_from_canon, size, size);
    let (binary, threshold) = otsu_binarize(&warped.view());
    Some(CanonicalView {
        gray: warped,
        binary,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_corners;
    use quadmark_code::{decode_bits, render_marker, validate_border, BitMatrix, GridLayout};

    #[test]
    fn rectifies_axis_aligned_marker() {
        // 6 cells of 30 px plus one quiet cell each side
        let marker = render_marker(&BitMatrix::reference(), 30, 1);
        let corners = order_corners(&[
            Point2::new(30.0, 30.0),
            Point2::new(209.0, 30.0),
            Point2::new(209.0, 209.0),
            Point2::new(30.0, 209.0),
        ]);
        let layout = GridLayout::default();
        let canon = rectify_marker(&marker.view(), &corners, layout.warp_size).expect("warp");
        assert_eq!((canon.binary.width, canon.binary.height), (200, 200));
        assert_eq!(validate_border(&canon.binary.view(), &layout, 0.2), Ok(()));
        assert_eq!(
            decode_bits(&canon.binary.view(), &layout, 0.5),
            Ok(BitMatrix::reference())
        );
    }

    #[test]
    fn degenerate_quad_is_rejected() {
        let img = GrayImage::filled(50, 50, 128);
        let corners = OrderedCorners([
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 20.0),
            Point2::new(0.0, 30.0),
        ]);
        assert!(rectify_marker(&img.view(), &corners, 200).is_none());
    }
}
