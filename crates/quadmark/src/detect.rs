use crate::overlay::draw_detection;
use quadmark_core::{GrayImageView, RgbImage, RgbImageView};
use quadmark_detect::{
    DetectConfig, DetectIoError, DetectReport, DetectorParams, FrameDetection, MarkerDetector,
    ParamsError,
};
use quadmark_pose::{CalibrationError, CameraIntrinsics};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum FacadeError {
    #[error("invalid RGB image buffer length (expected {expected} bytes, got {got})")]
    InvalidRgbBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    DetectIo(#[from] DetectIoError),
}

/// Borrow an `image::RgbImage` as the lightweight core view type.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

fn dims(width: usize, height: usize) -> Result<(u32, u32), FacadeError> {
    let w = u32::try_from(width).ok();
    let h = u32::try_from(height).ok();
    w.zip(h).ok_or(FacadeError::InvalidDimensions {
        width: width.min(u32::MAX as usize) as u32,
        height: height.min(u32::MAX as usize) as u32,
    })
}

/// Copy a core RGB image into an `image::RgbImage` (for saving).
pub fn to_image_rgb(img: &RgbImage) -> Result<::image::RgbImage, FacadeError> {
    let (w, h) = dims(img.width, img.height)?;
    ::image::RgbImage::from_raw(w, h, img.data.clone())
        .ok_or(FacadeError::InvalidDimensions { width: w, height: h })
}

pub fn to_image_gray(img: &quadmark_core::GrayImage) -> Result<::image::GrayImage, FacadeError> {
    let (w, h) = dims(img.width, img.height)?;
    ::image::GrayImage::from_raw(w, h, img.data.clone())
        .ok_or(FacadeError::InvalidDimensions { width: w, height: h })
}

pub fn from_image_rgb(img: &::image::RgbImage) -> RgbImage {
    RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Build an `image::RgbImage` from a raw interleaved RGB buffer.
pub fn rgb_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::RgbImage, FacadeError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or(FacadeError::InvalidDimensions { width, height })?;
    if pixels.len() != expected {
        return Err(FacadeError::InvalidRgbBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or(FacadeError::InvalidDimensions { width, height })
}

/// Run the marker detector end-to-end on one RGB frame.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, camera, params),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn detect_marker(
    img: &::image::RgbImage,
    camera: &CameraIntrinsics,
    params: DetectorParams,
) -> Result<FrameDetection, FacadeError> {
    camera.validate()?;
    let detector = MarkerDetector::new(params)?;
    Ok(detector.detect(&rgb_view(img), camera))
}

/// Convenience overload using `DetectorParams::default()`.
pub fn detect_marker_default(
    img: &::image::RgbImage,
    camera: &CameraIntrinsics,
) -> Result<FrameDetection, FacadeError> {
    detect_marker(img, camera, DetectorParams::default())
}

pub fn detect_marker_from_rgb_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    camera: &CameraIntrinsics,
    params: DetectorParams,
) -> Result<FrameDetection, FacadeError> {
    let img = rgb_image_from_slice(width, height, pixels)?;
    detect_marker(&img, camera, params)
}

/// Load an image from disk as RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<::image::RgbImage, FacadeError> {
    Ok(::image::open(path)?.to_rgb8())
}

pub fn save_rgb(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), FacadeError> {
    to_image_rgb(img)?.save(path)?;
    Ok(())
}

/// Execute one [`DetectConfig`] job: load the frame and the camera, detect,
/// write the JSON report and, if requested, the overlay image.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(cfg), fields(image = %cfg.image_path)))]
pub fn run_config(cfg: &DetectConfig) -> Result<DetectReport, FacadeError> {
    let camera = cfg.load_camera()?;
    let detector = cfg.build_detector()?;
    let img = load_rgb(&cfg.image_path)?;
    log::info!(
        "loaded {} ({}x{})",
        cfg.image_path,
        img.width(),
        img.height()
    );

    let frame = detector.detect(&rgb_view(&img), &camera);
    match frame.primary() {
        Some(m) => log::info!(
            "{} marker(s); primary at {:?} orientation {}°, rms {:.3}px",
            frame.markers.len(),
            m.pose.tvec.as_slice(),
            m.orientation.degrees(),
            m.reprojection_rms
        ),
        None => log::info!("no marker: {:?}", frame.error()),
    }

    if let Some(path) = &cfg.overlay_path {
        let mut canvas = from_image_rgb(&img);
        draw_detection(&mut canvas, &frame, &camera);
        save_rgb(&canvas, path)?;
        log::info!("overlay written to {path}");
    }

    let report = DetectReport::new(
        cfg.image_path.clone(),
        img.width() as usize,
        img.height() as usize,
        camera,
        frame,
    );
    let out = cfg.output_path();
    report.write_json(&out)?;
    log::info!("report written to {}", out.display());
    Ok(report)
}
