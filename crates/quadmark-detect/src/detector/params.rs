use quadmark_code::{BitMatrix, GridLayout, LayoutError};
use serde::{Deserialize, Serialize};

/// Which decoded marker provides the frame's primary pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Largest image-space quad area.
    #[default]
    LargestArea,
    /// First decoded in contour scan order.
    First,
    /// Last decoded in contour scan order.
    Last,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("reference pattern is {got}x{got}, layout expects {expected}x{expected}")]
    PatternSize { expected: usize, got: usize },
    #[error("blur kernel must be odd and positive, got {0}")]
    BlurKernel(usize),
    #[error("blur sigma must be finite and non-negative, got {0}")]
    BlurSigma(f64),
    #[error("{name} = {value} is outside [0, 1]")]
    Ratio { name: &'static str, value: f64 },
    #[error("min_quad_area must be finite and non-negative, got {0}")]
    MinArea(f64),
}

/// Detector configuration: grid geometry, thresholds and the reference
/// pattern. Built once and passed to [`MarkerDetector::new`](super::MarkerDetector::new).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Side of the canonical (rectified) marker image in pixels.
    pub warp_size: usize,
    /// Cells per side including the black border ring.
    pub total_grid: usize,
    /// Payload cells per side.
    pub internal_grid: usize,
    /// Gaussian kernel size applied before the frame threshold.
    pub blur_kernel: usize,
    pub blur_sigma: f64,
    /// Douglas–Peucker epsilon as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Quads must enclose strictly more than this many square pixels.
    pub min_quad_area: f64,
    /// A border cell brighter than this white fraction rejects the quad.
    pub max_border_white: f32,
    /// A payload cell with a white fraction below this reads as `1`.
    pub bit_white_threshold: f32,
    /// Accepted Hamming distance to the reference; `0` is exact matching.
    pub max_hamming: u32,
    pub selection: SelectionPolicy,
    pub reference: BitMatrix,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            warp_size: 200,
            total_grid: 6,
            internal_grid: 4,
            blur_kernel: 5,
            blur_sigma: 1.5,
            approx_epsilon_frac: 0.05,
            min_quad_area: 1000.0,
            max_border_white: 0.2,
            bit_white_threshold: 0.5,
            max_hamming: 0,
            selection: SelectionPolicy::default(),
            reference: BitMatrix::reference(),
        }
    }
}

impl DetectorParams {
    pub fn layout(&self) -> GridLayout {
        GridLayout {
            warp_size: self.warp_size,
            total_grid: self.total_grid,
            internal_grid: self.internal_grid,
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        self.layout().validate()?;
        if self.reference.size() != self.internal_grid {
            return Err(ParamsError::PatternSize {
                expected: self.internal_grid,
                got: self.reference.size(),
            });
        }
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(ParamsError::BlurKernel(self.blur_kernel));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(ParamsError::BlurSigma(self.blur_sigma));
        }
        let ratios = [
            ("approx_epsilon_frac", self.approx_epsilon_frac),
            ("max_border_white", self.max_border_white as f64),
            ("bit_white_threshold", self.bit_white_threshold as f64),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamsError::Ratio { name, value });
            }
        }
        if !self.min_quad_area.is_finite() || self.min_quad_area < 0.0 {
            return Err(ParamsError::MinArea(self.min_quad_area));
        }
        Ok(())
    }
}
