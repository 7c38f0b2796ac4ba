use super::result::{CandidateRejection, RejectReason};
use super::{DetectorParams, FrameDetection, MarkerDetection, ParamsError, SelectionPolicy};
use crate::{find_quad_candidates, order_corners, rectify_marker, QuadCandidate};
use quadmark_code::{decode_bits, resolve_orientation, validate_border, GridLayout};
use quadmark_core::{gaussian_blur, otsu_binarize, to_gray, GrayImageView, RgbImageView};
use quadmark_pose::{solve_marker_pose, CameraIntrinsics};

/// Stateless per-frame marker detector.
///
/// Holds only validated configuration; every call to [`detect`](Self::detect)
/// is independent of previous frames.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    params: DetectorParams,
    layout: GridLayout,
}

impl MarkerDetector {
    pub fn new(params: DetectorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let layout = params.layout();
        Ok(Self { params, layout })
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Detect markers in a colour frame.
    pub fn detect(&self, frame: &RgbImageView<'_>, camera: &CameraIntrinsics) -> FrameDetection {
        if frame.is_empty() {
            return FrameDetection::default();
        }
        let gray = to_gray(frame);
        self.detect_gray(&gray.view(), camera)
    }

    /// Detect markers in an already grayscale frame.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(w = gray.width, h = gray.height))
    )]
    pub fn detect_gray(&self, gray: &GrayImageView<'_>, camera: &CameraIntrinsics) -> FrameDetection {
        let mut out = FrameDetection::default();
        if gray.is_empty() {
            return out;
        }

        let p = &self.params;
        let blurred = gaussian_blur(gray, p.blur_kernel, p.blur_sigma);
        let (mask, threshold) = otsu_binarize(&blurred.view());
        out.frame_threshold = threshold;

        let quads = find_quad_candidates(&mask.view(), p.approx_epsilon_frac, p.min_quad_area);
        if quads.is_empty() {
            log::debug!("frame: no quad candidates (threshold {threshold})");
            return out;
        }

        for quad in &quads {
            match self.decode_candidate(gray, camera, quad) {
                Ok(marker) => out.markers.push(marker),
                Err(reason) => {
                    log::debug!(
                        "candidate area={:.0} rejected: {:?}",
                        quad.area,
                        reason
                    );
                    out.rejected.push(CandidateRejection {
                        corners: quad.corners,
                        area: quad.area,
                        reason,
                    });
                }
            }
        }

        out.primary = select_primary(&out.markers, p.selection);
        match out.primary() {
            Some(m) => log::info!(
                "marker {:?} hamming={} tvec=[{:.3}, {:.3}, {:.3}] rms={:.3}px ({} decoded)",
                m.orientation,
                m.hamming,
                m.pose.tvec.x,
                m.pose.tvec.y,
                m.pose.tvec.z,
                m.reprojection_rms,
                out.markers.len()
            ),
            None => log::debug!(
                "frame: {} candidates, none decoded ({:?})",
                quads.len(),
                out.error()
            ),
        }
        out
    }

    fn decode_candidate(
        &self,
        gray: &GrayImageView<'_>,
        camera: &CameraIntrinsics,
        quad: &QuadCandidate,
    ) -> Result<MarkerDetection, RejectReason> {
        let p = &self.params;
        let ordered = order_corners(&quad.corners);

        let canon =
            rectify_marker(gray, &ordered, self.layout.warp_size).ok_or(RejectReason::Degenerate)?;
        let bin = canon.binary.view();

        validate_border(&bin, &self.layout, p.max_border_white).map_err(|v| {
            RejectReason::Border {
                row: v.row,
                col: v.col,
                white_fraction: v.white_fraction,
            }
        })?;

        let bits = decode_bits(&bin, &self.layout, p.bit_white_threshold)
            .map_err(|_| RejectReason::Degenerate)?;
        log::trace!("decoded bits {bits}");

        let matched = resolve_orientation(&bits, &p.reference, p.max_hamming)
            .ok_or(RejectReason::Orientation { bits })?;

        let corners = ordered.rotated_left(matched.orientation.quarter_turns());
        let solution = solve_marker_pose(corners.as_array(), camera).map_err(|e| {
            RejectReason::PoseSolve {
                message: e.to_string(),
            }
        })?;

        Ok(MarkerDetection {
            corners,
            orientation: matched.orientation,
            hamming: matched.hamming,
            bits,
            area: quad.area,
            canonical_threshold: canon.threshold,
            pose: solution.pose,
            reprojection_rms: solution.reprojection_rms,
        })
    }
}

fn select_primary(markers: &[MarkerDetection], policy: SelectionPolicy) -> Option<usize> {
    if markers.is_empty() {
        return None;
    }
    match policy {
        SelectionPolicy::First => Some(0),
        SelectionPolicy::Last => Some(markers.len() - 1),
        SelectionPolicy::LargestArea => markers
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.area.total_cmp(&b.1.area))
            .map(|(i, _)| i),
    }
}
