//! Separable Gaussian smoothing.

use crate::{GrayImage, GrayImageView};

/// Normalized 1D Gaussian kernel of odd length `ksize`.
///
/// A non-positive `sigma` is derived from the kernel size the same way
/// OpenCV does: `0.3 * ((ksize - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(ksize: usize, sigma: f64) -> Vec<f32> {
    let ksize = ksize.max(1) | 1;
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (ksize as f64 - 1.0) * 0.5;
    let mut k: Vec<f64> = (0..ksize)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = k.iter().sum();
    for v in &mut k {
        *v /= sum;
    }
    k.into_iter().map(|v| v as f32).collect()
}

/// Reflect-101 border handling (`gfedcb|abcdefgh|gfedcba`).
#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}

/// Blur with a `ksize × ksize` Gaussian (separable, reflect-101 borders).
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip(src), fields(w = src.width, h = src.height))
)]
pub fn gaussian_blur(src: &GrayImageView<'_>, ksize: usize, sigma: f64) -> GrayImage {
    let (w, h) = (src.width, src.height);
    if ksize <= 1 || w == 0 || h == 0 {
        return GrayImage {
            width: w,
            height: h,
            data: src.data[..w * h].to_vec(),
        };
    }

    let kernel = gaussian_kernel(ksize, sigma);
    let r = (kernel.len() / 2) as isize;

    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = reflect101(x as isize + k as isize - r, w);
                acc += kv * row[sx] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sy = reflect101(y as isize + k as isize - r, h);
                acc += kv * tmp[sy * w + x];
            }
            out[y * w + x] = (acc + 0.5).clamp(0.0, 255.0) as u8;
        }
    }

    GrayImage {
        width: w,
        height: h,
        data: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(5, 1.5);
        assert_eq!(k.len(), 5);
        assert_abs_diff_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(k[0], k[4], epsilon = 1e-7);
        assert_abs_diff_eq!(k[1], k[3], epsilon = 1e-7);
        assert!(k[2] > k[1] && k[1] > k[0]);
    }

    #[test]
    fn reflect101_mirrors_without_repeating_edge() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 1), 0);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let img = GrayImage::filled(7, 5, 93);
        let out = gaussian_blur(&img.view(), 5, 1.5);
        assert!(out.data.iter().all(|&v| v == 93));
    }

    #[test]
    fn step_edge_is_smoothed_monotonically() {
        let img = GrayImage::from_fn(12, 3, |x, _| if x < 6 { 0 } else { 255 });
        let out = gaussian_blur(&img.view(), 5, 1.5);
        let row: Vec<u8> = (0..12).map(|x| out.get(x, 1)).collect();
        assert!(row.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(row[0], 0);
        assert_eq!(row[11], 255);
        assert!(row[5] > 0 && row[6] < 255);
    }
}
