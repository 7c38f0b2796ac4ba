//! Cell sampling on a binarized canonical marker image.
//!
//! The canonical image is a `warp_size × warp_size` square split into a
//! `total_grid × total_grid` cell grid: a one-cell black border ring around
//! an `internal_grid × internal_grid` payload.

use crate::{BitMatrix, MAX_MATRIX_SIZE};
use quadmark_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("internal grid {internal} must be total grid {total} minus the two border cells")]
    GridMismatch { total: usize, internal: usize },
    #[error("internal grid {0} outside 1..={MAX_MATRIX_SIZE}")]
    InternalSize(usize),
    #[error("warp size {warp} gives empty cells for a {total}-cell grid")]
    WarpTooSmall { warp: usize, total: usize },
}

/// Geometry of the canonical grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub warp_size: usize,
    pub total_grid: usize,
    pub internal_grid: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            warp_size: 200,
            total_grid: 6,
            internal_grid: 4,
        }
    }
}

impl GridLayout {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.internal_grid == 0 || self.internal_grid > MAX_MATRIX_SIZE {
            return Err(LayoutError::InternalSize(self.internal_grid));
        }
        if self.internal_grid + 2 != self.total_grid {
            return Err(LayoutError::GridMismatch {
                total: self.total_grid,
                internal: self.internal_grid,
            });
        }
        if self.cell_size() == 0 {
            return Err(LayoutError::WarpTooSmall {
                warp: self.warp_size,
                total: self.total_grid,
            });
        }
        Ok(())
    }

    /// Integer cell side in pixels; the remainder columns/rows are ignored.
    #[inline]
    pub fn cell_size(&self) -> usize {
        self.warp_size / self.total_grid.max(1)
    }

    /// Fraction of non-zero (white) pixels in grid cell `(row, col)`.
    pub fn white_fraction(&self, bin: &GrayImageView<'_>, row: usize, col: usize) -> f32 {
        let cs = self.cell_size();
        if cs == 0 {
            return 0.0;
        }
        let white = bin.count_nonzero(col * cs, row * cs, cs, cs);
        white as f32 / (cs * cs) as f32
    }
}

/// First border cell found too bright.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderViolation {
    pub row: usize,
    pub col: usize,
    pub white_fraction: f32,
}

/// Check that every outer-ring cell is predominantly dark.
///
/// A cell whose white fraction exceeds `max_white` rejects the candidate.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip(bin, layout), fields(grid = layout.total_grid))
)]
pub fn validate_border(
    bin: &GrayImageView<'_>,
    layout: &GridLayout,
    max_white: f32,
) -> Result<(), BorderViolation> {
    let n = layout.total_grid;
    for row in 0..n {
        for col in 0..n {
            let on_ring = row == 0 || col == 0 || row + 1 == n || col + 1 == n;
            if !on_ring {
                continue;
            }
            let white_fraction = layout.white_fraction(bin, row, col);
            if white_fraction > max_white {
                log::trace!("border cell ({row}, {col}) is {white_fraction:.2} white");
                return Err(BorderViolation {
                    row,
                    col,
                    white_fraction,
                });
            }
        }
    }
    Ok(())
}

/// Decode the inner grid: a cell is `1` when its white fraction is below
/// `white_threshold` (dark cells carry ones).
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip(bin, layout), fields(grid = layout.internal_grid))
)]
pub fn decode_bits(
    bin: &GrayImageView<'_>,
    layout: &GridLayout,
    white_threshold: f32,
) -> Result<BitMatrix, LayoutError> {
    let n = layout.internal_grid;
    let mut bits = BitMatrix::zeros(n).map_err(|_| LayoutError::InternalSize(n))?;
    for i in 0..n {
        for j in 0..n {
            let white = layout.white_fraction(bin, i + 1, j + 1);
            bits.set(i, j, white < white_threshold);
        }
    }
    log::trace!("decoded payload {bits}");
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_canonical;
    use quadmark_core::GrayImage;

    #[test]
    fn default_layout_is_consistent() {
        let layout = GridLayout::default();
        assert_eq!(layout.validate(), Ok(()));
        assert_eq!(layout.cell_size(), 33);
    }

    #[test]
    fn layout_validation_errors() {
        let bad = GridLayout {
            warp_size: 200,
            total_grid: 7,
            internal_grid: 4,
        };
        assert_eq!(
            bad.validate(),
            Err(LayoutError::GridMismatch {
                total: 7,
                internal: 4
            })
        );
        let tiny = GridLayout {
            warp_size: 5,
            total_grid: 6,
            internal_grid: 4,
        };
        assert!(matches!(tiny.validate(), Err(LayoutError::WarpTooSmall { .. })));
    }

    #[test]
    fn decodes_reference_from_canonical_render() {
        let layout = GridLayout::default();
        let canonical = render_canonical(&BitMatrix::reference(), &layout);
        let view = canonical.view();
        assert_eq!(validate_border(&view, &layout, 0.2), Ok(()));
        assert_eq!(decode_bits(&view, &layout, 0.5), Ok(BitMatrix::reference()));
    }

    #[test]
    fn black_border_with_white_interior_is_accepted() {
        let layout = GridLayout::default();
        let cs = layout.cell_size();
        let img = GrayImage::from_fn(200, 200, |x, y| {
            let ring = x < cs || y < cs || x >= 5 * cs || y >= 5 * cs;
            if ring {
                0
            } else {
                255
            }
        });
        assert_eq!(validate_border(&img.view(), &layout, 0.2), Ok(()));
        let bits = decode_bits(&img.view(), &layout, 0.5).expect("decode");
        assert_eq!(bits.code(), 0);
    }

    #[test]
    fn bright_border_cell_is_rejected() {
        let layout = GridLayout::default();
        let mut img = render_canonical(&BitMatrix::reference(), &layout);
        // paint 30% of cell (0, 3) white
        let cs = layout.cell_size();
        for y in 0..(cs * 3 / 10 + 1) {
            for x in 3 * cs..4 * cs {
                img.set(x, y, 255);
            }
        }
        let err = validate_border(&img.view(), &layout, 0.2).unwrap_err();
        assert_eq!((err.row, err.col), (0, 3));
        assert!(err.white_fraction > 0.2);
    }

    #[test]
    fn all_white_canonical_fails_on_first_cell() {
        let layout = GridLayout::default();
        let img = GrayImage::filled(200, 200, 255);
        let err = validate_border(&img.view(), &layout, 0.2).unwrap_err();
        assert_eq!((err.row, err.col), (0, 0));
        assert_eq!(err.white_fraction, 1.0);
    }
}
