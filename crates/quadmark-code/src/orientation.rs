//! Rotation matching of a decoded matrix against the reference pattern.

use crate::BitMatrix;
use serde::{Deserialize, Serialize};

/// In-plane rotation of the observed pattern relative to the reference,
/// clockwise in image space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    #[inline]
    pub fn quarter_turns(self) -> u8 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 1,
            Orientation::Deg180 => 2,
            Orientation::Deg270 => 3,
        }
    }

    #[inline]
    pub fn from_quarter_turns(turns: u8) -> Self {
        Self::ALL[(turns & 3) as usize]
    }

    #[inline]
    pub fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }
}

/// Result of [`resolve_orientation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationMatch {
    /// `observed == reference.rotated(orientation.quarter_turns())` up to `hamming` cells.
    pub orientation: Orientation,
    pub hamming: u32,
}

/// Find the rotation of `reference` that matches `observed`.
///
/// Rotations are tried in order 0°, 90°, 180°, 270°. With `max_hamming == 0`
/// only an exact match is accepted and the first one wins. A positive
/// tolerance accepts the rotation with the fewest differing cells (ties go
/// to the earlier rotation) as long as it stays within `max_hamming`.
///
/// Returns `None` when no rotation is close enough or the sizes differ.
pub fn resolve_orientation(
    observed: &BitMatrix,
    reference: &BitMatrix,
    max_hamming: u32,
) -> Option<OrientationMatch> {
    let mut best: Option<OrientationMatch> = None;
    let mut candidate = *reference;

    for orientation in Orientation::ALL {
        let hamming = observed.hamming(&candidate)?;
        if hamming == 0 {
            return Some(OrientationMatch {
                orientation,
                hamming,
            });
        }
        if hamming <= max_hamming && best.map_or(true, |b| hamming < b.hamming) {
            best = Some(OrientationMatch {
                orientation,
                hamming,
            });
        }
        candidate = candidate.rotate_cw();
    }

    best
}
