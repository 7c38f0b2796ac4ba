//! Border following (Suzuki & Abe, 1985) over a binary mask.
//!
//! Non-zero pixels are foreground, 8-connected. Every border is returned
//! (list retrieval): outer borders of foreground components and hole
//! borders of background regions enclosed by foreground.

use nalgebra::Point2;
use quadmark_core::GrayImageView;

/// One traced border, in image pixel coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
    /// `true` for the border around a background hole.
    pub hole: bool,
}

/// Neighbour offsets, counter-clockwise on screen (y down) starting east.
const DIRS: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const EAST: usize = 0;
const WEST: usize = 4;

/// Zero-padded label plane: `1` foreground, `0` background, then border
/// labels (`±nbd`) as tracing proceeds.
struct Labels {
    stride: usize,
    data: Vec<i32>,
    deltas: [isize; 8],
}

impl Labels {
    fn from_mask(mask: &GrayImageView<'_>) -> Self {
        let stride = mask.width + 2;
        let mut data = vec![0i32; stride * (mask.height + 2)];
        for y in 0..mask.height {
            let row = &mask.data[y * mask.width..(y + 1) * mask.width];
            let dst = &mut data[(y + 1) * stride + 1..(y + 1) * stride + 1 + mask.width];
            for (d, &v) in dst.iter_mut().zip(row) {
                *d = i32::from(v != 0);
            }
        }
        let deltas = DIRS.map(|(dx, dy)| dx as isize + dy as isize * stride as isize);
        Self {
            stride,
            data,
            deltas,
        }
    }

    #[inline]
    fn neighbour(&self, pos: usize, dir: usize) -> usize {
        (pos as isize + self.deltas[dir & 7]) as usize
    }

    #[inline]
    fn point(&self, pos: usize) -> Point2<i32> {
        Point2::new(
            (pos % self.stride) as i32 - 1,
            (pos / self.stride) as i32 - 1,
        )
    }

    /// Follow one border starting at `start`, whose known background
    /// neighbour lies in direction `from`.
    fn follow(&mut self, start: usize, from: usize, nbd: i32) -> Vec<Point2<i32>> {
        // clockwise search for the first foreground neighbour
        let first = (0..8)
            .map(|k| (from + 8 - k) & 7)
            .find(|&d| self.data[self.neighbour(start, d)] != 0);
        let Some(first_dir) = first else {
            self.data[start] = -nbd;
            return vec![self.point(start)];
        };

        let first_pos = self.neighbour(start, first_dir);
        let mut points = Vec::new();
        let mut cur = start;
        // direction from `cur` to the previously visited pixel
        let mut back = first_dir;

        loop {
            let mut east_is_background = false;
            let mut next_dir = back;
            for k in 1..=8 {
                let d = (back + k) & 7;
                if self.data[self.neighbour(cur, d)] != 0 {
                    next_dir = d;
                    break;
                }
                if d == EAST {
                    east_is_background = true;
                }
            }

            if east_is_background {
                self.data[cur] = -nbd;
            } else if self.data[cur] == 1 {
                self.data[cur] = nbd;
            }
            points.push(self.point(cur));

            let next = self.neighbour(cur, next_dir);
            if next == start && cur == first_pos {
                break;
            }
            back = (next_dir + 4) & 7;
            cur = next;
        }
        points
    }
}

/// Trace all borders of the non-zero regions of `mask`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(mask), fields(w = mask.width, h = mask.height))
)]
pub fn find_contours(mask: &GrayImageView<'_>) -> Vec<Contour> {
    if mask.is_empty() {
        return Vec::new();
    }
    let mut labels = Labels::from_mask(mask);
    let stride = labels.stride;
    let mut contours = Vec::new();
    let mut nbd = 1;

    for y in 1..=mask.height {
        for x in 1..=mask.width {
            let pos = y * stride + x;
            let v = labels.data[pos];
            if v == 0 {
                continue;
            }
            let start = if v == 1 && labels.data[pos - 1] == 0 {
                Some((WEST, false))
            } else if v >= 1 && labels.data[pos + 1] == 0 {
                Some((EAST, true))
            } else {
                None
            };
            if let Some((from, hole)) = start {
                nbd += 1;
                let points = labels.follow(pos, from, nbd);
                contours.push(Contour { points, hole });
            }
        }
    }

    contours
}
