//! Closed-polygon helpers on integer contours.

use nalgebra::Point2;

#[inline]
fn sub(a: Point2<i32>, b: Point2<i32>) -> (f64, f64) {
    ((a.x - b.x) as f64, (a.y - b.y) as f64)
}

/// Perimeter of the closed polygon (last vertex joins the first).
pub fn arc_length(poly: &[Point2<i32>]) -> f64 {
    if poly.len() < 2 {
        return 0.0;
    }
    let mut prev = poly[poly.len() - 1];
    let mut len = 0.0;
    for &p in poly {
        let (dx, dy) = sub(p, prev);
        len += dx.hypot(dy);
        prev = p;
    }
    len
}

/// Unsigned shoelace area.
pub fn polygon_area(poly: &[Point2<f64>]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    0.5 * twice.abs()
}

/// `true` when every turn has the same non-zero orientation.
pub fn is_convex(poly: &[Point2<i32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let c = poly[(i + 2) % n];
        let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64 - (b.y - a.y) as i64 * (c.x - b.x) as i64;
        if cross == 0 {
            return false;
        }
        let s = cross.signum();
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    true
}

fn farthest_from(contour: &[Point2<i32>], from: usize) -> usize {
    let origin = contour[from];
    let mut best = (from, 0.0);
    for (i, &p) in contour.iter().enumerate() {
        let (dx, dy) = sub(p, origin);
        let d = dx * dx + dy * dy;
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Douglas–Peucker simplification of a closed contour.
///
/// The contour is split at two mutually distant points and each half is
/// simplified so that no dropped point lies farther than `epsilon` from the
/// chord replacing it. Vertices keep the contour's traversal order.
pub fn approx_poly_dp(contour: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = contour.len();
    if n < 3 {
        return contour.to_vec();
    }

    let a = farthest_from(contour, farthest_from(contour, 0));
    let b = farthest_from(contour, a);
    if a == b {
        return vec![contour[a]];
    }
    let (a, b) = if a < b { (a, b) } else { (b, a) };

    let eps2 = epsilon * epsilon;
    let at = |i: usize| contour[i % n];
    let mut keep = Vec::new();
    // spans are in unwrapped indices; [b, a + n] wraps past the end
    let mut stack = vec![(b, a + n), (a, b)];

    while let Some((s, e)) = stack.pop() {
        let (p0, p1) = (at(s), at(e));
        let (dx, dy) = sub(p1, p0);
        let chord2 = dx * dx + dy * dy;

        let mut split = None;
        let mut max_d = 0.0;
        for i in s + 1..e {
            let (px, py) = sub(at(i), p0);
            // squared distance to the chord line, scaled by |chord|^2
            let d = if chord2 > 0.0 {
                let c = px * dy - py * dx;
                c * c
            } else {
                px * px + py * py
            };
            if d > max_d {
                max_d = d;
                split = Some(i);
            }
        }

        let tolerance = if chord2 > 0.0 { eps2 * chord2 } else { eps2 };
        match split {
            Some(i) if max_d > tolerance => {
                stack.push((i, e));
                stack.push((s, i));
            }
            _ => keep.push(p0),
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(i32, i32)]) -> Vec<Point2<i32>> {
        v.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn square_measures() {
        let sq = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert!((arc_length(&sq) - 40.0).abs() < 1e-12);
        let sqf: Vec<Point2<f64>> = sq.iter().map(|p| p.cast::<f64>()).collect();
        assert!((polygon_area(&sqf) - 100.0).abs() < 1e-12);
        assert!(is_convex(&sq));
    }

    #[test]
    fn concave_and_degenerate_are_not_convex() {
        let arrow = pts(&[(0, 0), (2, 0), (2, 1), (1, 1), (1, 2), (0, 2)]);
        assert!(!is_convex(&arrow));
        let collinear = pts(&[(0, 0), (1, 0), (2, 0), (2, 2)]);
        assert!(!is_convex(&collinear));
    }

    #[test]
    fn winding_does_not_change_convexity() {
        let mut sq = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        sq.reverse();
        assert!(is_convex(&sq));
    }

    #[test]
    fn dp_reduces_dense_square_to_corners() {
        let mut contour = Vec::new();
        for x in 0..20 {
            contour.push(Point2::new(x, 0));
        }
        for y in 0..20 {
            contour.push(Point2::new(20, y));
        }
        for x in (1..=20).rev() {
            contour.push(Point2::new(x, 20));
        }
        for y in (1..=20).rev() {
            contour.push(Point2::new(0, y));
        }
        let eps = 0.05 * arc_length(&contour);
        let poly = approx_poly_dp(&contour, eps);
        assert_eq!(poly.len(), 4);
        for c in [(0, 0), (20, 0), (20, 20), (0, 20)] {
            assert!(poly.contains(&Point2::new(c.0, c.1)), "{c:?} in {poly:?}");
        }
        assert!(is_convex(&poly));
    }

    #[test]
    fn dp_keeps_traversal_order() {
        let contour = pts(&[(0, 0), (5, 0), (10, 0), (10, 5), (10, 10), (5, 10), (0, 10), (0, 5)]);
        let poly = approx_poly_dp(&contour, 1.0);
        assert_eq!(poly.len(), 4);
        // consecutive output vertices are adjacent square corners
        for i in 0..4 {
            let (dx, dy) = sub(poly[(i + 1) % 4], poly[i]);
            assert_eq!(dx.abs() + dy.abs(), 10.0);
        }
    }

    #[test]
    fn dp_on_tiny_contours() {
        assert!(approx_poly_dp(&[], 1.0).is_empty());
        let single = pts(&[(3, 4)]);
        assert_eq!(approx_poly_dp(&single, 1.0), single);
    }
}
