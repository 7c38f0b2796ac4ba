//! Packed square bit matrices.

use serde::{Deserialize, Serialize};

/// Largest supported side length (`size * size` bits must fit in a `u64`).
pub const MAX_MATRIX_SIZE: usize = 8;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("matrix size {0} outside 1..={MAX_MATRIX_SIZE}")]
    Size(usize),
    #[error("row {row} has {len} entries, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("entry ({row}, {col}) = {value} is not 0 or 1")]
    NotBinary { row: usize, col: usize, value: u8 },
}

/// Square 0/1 matrix stored row-major in a `u64`: bit `row * size + col`.
///
/// `1` means a dark cell. Equality is exact bitwise equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct BitMatrix {
    size: usize,
    bits: u64,
}

impl BitMatrix {
    /// All-zero matrix.
    pub fn zeros(size: usize) -> Result<Self, PatternError> {
        if size == 0 || size > MAX_MATRIX_SIZE {
            return Err(PatternError::Size(size));
        }
        Ok(Self { size, bits: 0 })
    }

    /// Build from raw packed bits; bits beyond `size * size` are cleared.
    pub fn from_code(size: usize, code: u64) -> Result<Self, PatternError> {
        let mut m = Self::zeros(size)?;
        m.bits = code & m.mask();
        Ok(m)
    }

    /// Build from nested rows of 0/1 values.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, PatternError> {
        let size = rows.len();
        let mut m = Self::zeros(size)?;
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != size {
                return Err(PatternError::RaggedRow {
                    row,
                    len: r.len(),
                    expected: size,
                });
            }
            for (col, &value) in r.iter().enumerate() {
                match value {
                    0 => {}
                    1 => m.set(row, col, true),
                    _ => return Err(PatternError::NotBinary { row, col, value }),
                }
            }
        }
        Ok(m)
    }

    /// The built-in 4×4 reference pattern of the supported marker.
    pub fn reference() -> Self {
        // 0 1 0 0
        // 1 0 1 0
        // 1 1 0 0
        // 1 1 0 1
        Self {
            size: 4,
            bits: 0b1011_0011_0101_0010,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Packed row-major bits.
    #[inline]
    pub fn code(&self) -> u64 {
        self.bits
    }

    #[inline]
    fn mask(&self) -> u64 {
        let n = self.size * self.size;
        if n >= 64 {
            u64::MAX
        } else {
            (1u64 << n) - 1
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.size && col < self.size);
        (self.bits >> (row * self.size + col)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        debug_assert!(row < self.size && col < self.size);
        let bit = 1u64 << (row * self.size + col);
        if value {
            self.bits |= bit;
        } else {
            self.bits &= !bit;
        }
    }

    /// Copy with one cell flipped.
    pub fn with_flipped(mut self, row: usize, col: usize) -> Self {
        let v = self.get(row, col);
        self.set(row, col, !v);
        self
    }

    /// Rotate 90° clockwise: `rot[j][n-1-i] = self[i][j]`.
    pub fn rotate_cw(&self) -> Self {
        self.rotated(1)
    }

    /// Rotate clockwise by `quarter_turns * 90°`.
    pub fn rotated(&self, quarter_turns: u8) -> Self {
        Self {
            size: self.size,
            bits: rotate_code(self.bits, self.size, quarter_turns),
        }
    }

    /// Number of differing cells; `None` when the sizes differ.
    pub fn hamming(&self, other: &Self) -> Option<u32> {
        (self.size == other.size).then(|| (self.bits ^ other.bits).count_ones())
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.size)
            .map(|r| (0..self.size).map(|c| self.get(r, c) as u8).collect())
            .collect()
    }
}

impl TryFrom<Vec<Vec<u8>>> for BitMatrix {
    type Error = PatternError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<BitMatrix> for Vec<Vec<u8>> {
    fn from(m: BitMatrix) -> Self {
        m.to_rows()
    }
}

impl std::fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in 0..self.size {
            if r > 0 {
                f.write_str("/")?;
            }
            for c in 0..self.size {
                f.write_str(if self.get(r, c) { "1" } else { "0" })?;
            }
        }
        Ok(())
    }
}

/// Rotate an `n × n` row-major code (bit `row * n + col`) clockwise by
/// `quarter_turns * 90°`.
pub fn rotate_code(code: u64, n: usize, quarter_turns: u8) -> u64 {
    (0..quarter_turns & 3).fold(code, |c, _| quarter_turn_cw(c, n))
}

/// `rot[j][n-1-i] = m[i][j]`
fn quarter_turn_cw(code: u64, n: usize) -> u64 {
    let mut out = 0u64;
    for i in 0..n {
        for j in 0..n {
            if (code >> (i * n + j)) & 1 == 1 {
                out |= 1 << (j * n + (n - 1 - i));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_matches_documented_rows() {
        let expected = BitMatrix::from_rows(&[
            [0u8, 1, 0, 0],
            [1, 0, 1, 0],
            [1, 1, 0, 0],
            [1, 1, 0, 1],
        ])
        .expect("rows");
        assert_eq!(BitMatrix::reference(), expected);
        assert_eq!(BitMatrix::reference().to_string(), "0100/1010/1100/1101");
    }

    #[test]
    fn clockwise_rotation_follows_index_rule() {
        let m = BitMatrix::reference();
        let r = m.rotate_cw();
        let n = m.size();
        for i in 0..n {
            for j in 0..n {
                assert_eq!(r.get(j, n - 1 - i), m.get(i, j));
            }
        }
        assert_eq!(r.to_string(), "1110/1101/0010/1000");
    }

    #[test]
    fn four_rotations_are_identity() {
        let m = BitMatrix::from_code(8, 0x0123_4567_89ab_cdef).expect("8x8");
        assert_eq!(m.rotated(1).rotated(1).rotated(1).rotated(1), m);
        assert_eq!(m.rotated(2), m.rotate_cw().rotate_cw());
        assert_eq!(m.rotated(4), m);
    }

    #[test]
    fn hamming_counts_flipped_cells() {
        let m = BitMatrix::reference();
        assert_eq!(m.hamming(&m), Some(0));
        assert_eq!(m.hamming(&m.with_flipped(1, 1)), Some(1));
        assert_eq!(m.hamming(&BitMatrix::zeros(5).expect("5x5")), None);
    }

    #[test]
    fn rejects_malformed_rows() {
        assert_eq!(
            BitMatrix::from_rows(&[vec![0u8, 1], vec![1]]),
            Err(PatternError::RaggedRow {
                row: 1,
                len: 1,
                expected: 2
            })
        );
        assert_eq!(
            BitMatrix::from_rows(&[vec![0u8, 2], vec![1, 0]]),
            Err(PatternError::NotBinary {
                row: 0,
                col: 1,
                value: 2
            })
        );
        assert_eq!(BitMatrix::zeros(9), Err(PatternError::Size(9)));
    }

    #[test]
    fn serde_uses_nested_rows() {
        let json = serde_json::to_string(&BitMatrix::reference()).expect("serialize");
        assert_eq!(json, "[[0,1,0,0],[1,0,1,0],[1,1,0,0],[1,1,0,1]]");
        let back: BitMatrix = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, BitMatrix::reference());
    }
}
