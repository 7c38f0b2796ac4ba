//! Quadrilateral candidates and canonical corner order.

use crate::contours::find_contours;
use crate::polygon::{approx_poly_dp, arc_length, is_convex, polygon_area};
use nalgebra::Point2;
use quadmark_core::GrayImageView;
use serde::{Deserialize, Serialize};

/// A convex 4-vertex polygon found in the binary mask.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadCandidate {
    /// Vertices in contour traversal order.
    pub corners: [Point2<f64>; 4],
    pub area: f64,
    /// Whether the quad came from a hole border (dark region on light).
    pub hole: bool,
}

/// Corners in `(TL, TR, BR, BL)` order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderedCorners(pub [Point2<f64>; 4]);

impl OrderedCorners {
    #[inline]
    pub fn tl(&self) -> Point2<f64> {
        self.0[0]
    }

    #[inline]
    pub fn tr(&self) -> Point2<f64> {
        self.0[1]
    }

    #[inline]
    pub fn br(&self) -> Point2<f64> {
        self.0[2]
    }

    #[inline]
    pub fn bl(&self) -> Point2<f64> {
        self.0[3]
    }

    #[inline]
    pub fn as_array(&self) -> &[Point2<f64>; 4] {
        &self.0
    }

    /// Cyclic left rotation by `steps` positions: `out[i] = self[i + steps]`.
    pub fn rotated_left(&self, steps: u8) -> Self {
        let mut out = self.0;
        out.rotate_left((steps & 3) as usize);
        Self(out)
    }
}

/// Order four points as `(TL, TR, BR, BL)`.
///
/// TL has the smallest `x + y`, BR the largest; of the remaining two, TR has
/// the smaller `y - x`. Ties on `x + y` are broken by `y - x` and ties on
/// `y - x` by `x + y`, so a square turned by exactly 45° still comes out as
/// a cycle and the result never depends on the input order.
pub fn order_corners(pts: &[Point2<f64>; 4]) -> OrderedCorners {
    let sum = |p: &Point2<f64>| p.x + p.y;
    let diff = |p: &Point2<f64>| p.y - p.x;

    let mut by_sum = *pts;
    by_sum.sort_by(|a, b| {
        sum(a)
            .total_cmp(&sum(b))
            .then_with(|| diff(a).total_cmp(&diff(b)))
    });
    let [tl, mut tr, br, mut bl] = by_sum;
    if diff(&tr)
        .total_cmp(&diff(&bl))
        .then_with(|| sum(&tr).total_cmp(&sum(&bl)))
        .is_gt()
    {
        std::mem::swap(&mut tr, &mut bl);
    }

    OrderedCorners([tl, tr, br, bl])
}

/// Find convex quadrilaterals in a binary mask.
///
/// Each traced border is simplified with Douglas–Peucker at
/// `epsilon_frac × perimeter`; survivors have exactly four vertices, are
/// convex and enclose more than `min_area` square pixels.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(mask), fields(w = mask.width, h = mask.height))
)]
pub fn find_quad_candidates(
    mask: &GrayImageView<'_>,
    epsilon_frac: f64,
    min_area: f64,
) -> Vec<QuadCandidate> {
    let contours = find_contours(mask);
    let total = contours.len();
    let mut out = Vec::new();

    for contour in contours {
        if contour.points.len() < 4 {
            continue;
        }
        let eps = epsilon_frac * arc_length(&contour.points);
        let poly = approx_poly_dp(&contour.points, eps);
        if poly.len() != 4 || !is_convex(&poly) {
            continue;
        }
        let corners = [0, 1, 2, 3].map(|i| poly[i].cast::<f64>());
        let area = polygon_area(&corners);
        if area <= min_area {
            continue;
        }
        out.push(QuadCandidate {
            corners,
            area,
            hole: contour.hole,
        });
    }

    log::trace!("{} contours -> {} quad candidates", total, out.len());
    out
}
