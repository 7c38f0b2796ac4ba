//! Global (Otsu) thresholding.

use crate::{GrayImage, GrayImageView};

/// Compute the Otsu threshold of a set of intensities.
///
/// Degenerate inputs short-circuit: an empty slice yields 127, a constant
/// slice yields its value, and a two-level slice yields the midpoint.
/// Otherwise the lowest level maximising the between-class variance wins.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    let mut hist = [0u64; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    let levels: Vec<usize> = (0..256).filter(|&v| hist[v] > 0).collect();
    match levels[..] {
        [] => return 127,
        [only] => return only as u8,
        [lo, hi] => return ((lo + hi) / 2) as u8,
        _ => {}
    }

    let n = samples.len() as f64;
    let mean = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum::<f64>()
        / n;

    // sigma_b^2 ~ (mean * w - sum)^2 / (w * (n - w)) over the dark class
    let mut w = 0f64;
    let mut sum = 0f64;
    let mut best = (0u8, f64::NEG_INFINITY);
    for (t, &c) in hist.iter().enumerate() {
        w += c as f64;
        sum += (t as u64 * c) as f64;
        if w == 0.0 {
            continue;
        }
        if w == n {
            break;
        }
        let d = mean * w - sum;
        let sigma = d * d / (w * (n - w));
        if sigma > best.1 {
            best = (t as u8, sigma);
        }
    }
    best.0
}

/// Binary threshold: pixels strictly above `thr` become 255, the rest 0.
pub fn binarize(src: &GrayImageView<'_>, thr: u8) -> GrayImage {
    let n = src.width * src.height;
    GrayImage {
        width: src.width,
        height: src.height,
        data: src.data[..n]
            .iter()
            .map(|&v| if v > thr { 255 } else { 0 })
            .collect(),
    }
}

/// Otsu threshold followed by [`binarize`]. Returns the mask and the threshold.
pub fn otsu_binarize(src: &GrayImageView<'_>) -> (GrayImage, u8) {
    let n = src.width * src.height;
    let thr = otsu_threshold(&src.data[..n]);
    (binarize(src, thr), thr)
}
