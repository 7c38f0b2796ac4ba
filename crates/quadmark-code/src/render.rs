//! Raster rendering of the marker pattern.

use crate::{BitMatrix, GridLayout};
use quadmark_core::GrayImage;

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Render a printable marker: black border ring, inner bits (`1` = black),
/// surrounded by a white quiet zone `quiet_cells` cells wide.
///
/// The output is `(size + 2 + 2 * quiet_cells) * cell_px` pixels square.
pub fn render_marker(pattern: &BitMatrix, cell_px: usize, quiet_cells: usize) -> GrayImage {
    let total = pattern.size() + 2;
    let cells = total + 2 * quiet_cells;
    let side = cells * cell_px;
    GrayImage::from_fn(side, side, |x, y| {
        let cx = x / cell_px.max(1);
        let cy = y / cell_px.max(1);
        if cx < quiet_cells || cy < quiet_cells {
            return WHITE;
        }
        cell_value(pattern, total, cy - quiet_cells, cx - quiet_cells)
    })
}

/// Render the marker as the rectifier would ideally see it: exactly
/// `warp_size` pixels, no quiet zone.
pub fn render_canonical(pattern: &BitMatrix, layout: &GridLayout) -> GrayImage {
    let total = layout.total_grid.max(1);
    let side = layout.warp_size;
    GrayImage::from_fn(side, side, |x, y| {
        let cx = x * total / side;
        let cy = y * total / side;
        cell_value(pattern, total, cy, cx)
    })
}

fn cell_value(pattern: &BitMatrix, total: usize, row: usize, col: usize) -> u8 {
    if row >= total || col >= total {
        return WHITE;
    }
    if row == 0 || col == 0 || row + 1 == total || col + 1 == total {
        return BLACK;
    }
    let (r, c) = (row - 1, col - 1);
    if r < pattern.size() && c < pattern.size() && pattern.get(r, c) {
        BLACK
    } else {
        WHITE
    }
}
