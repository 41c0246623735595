//! Channel extraction and binarization
//!
//! Every cleanup stage works on a derived single-channel buffer, never on the
//! color image directly. Two derivations are provided:
//!
//! - **Grayscale** - BT.601 luma, used by the ROI cropper and the blob remover
//! - **Lightness** - CIE L* scaled to 0-255, used by the dot-cluster remover
//!   to isolate bright markers independent of hue

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;

/// Foreground value written into binary masks
pub const FOREGROUND: u8 = 255;

/// Background value written into binary masks
pub const BACKGROUND: u8 = 0;

/// CIE L* linear-segment cutoff (cube of 6/29)
const LAB_EPSILON: f64 = 0.008856;

/// CIE L* linear-segment slope
const LAB_KAPPA: f64 = 903.3;

/// Convert an image to BT.601 grayscale
///
/// Single-channel input is returned as-is (cloned).
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => {
            let rgb = other.to_rgb8();
            let (width, height) = rgb.dimensions();
            let mut gray = GrayImage::new(width, height);
            for (x, y, pixel) in rgb.enumerate_pixels() {
                gray.put_pixel(x, y, Luma([luminance(pixel.0[0], pixel.0[1], pixel.0[2])]));
            }
            gray
        }
    }
}

/// Extract the perceptual lightness channel
///
/// Values follow the 8-bit Lab convention: L* in [0, 100] is stretched to
/// [0, 255]. Grayscale input is treated as an RGB pixel with equal channels.
pub fn to_lightness(image: &DynamicImage) -> GrayImage {
    let linear = srgb_linear_table();

    match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::new(gray.width(), gray.height());
            for (x, y, pixel) in gray.enumerate_pixels() {
                let v = pixel.0[0];
                out.put_pixel(x, y, Luma([lightness_from_linear(&linear, v, v, v)]));
            }
            out
        }
        other => {
            let rgb = other.to_rgb8();
            let mut out = GrayImage::new(rgb.width(), rgb.height());
            for (x, y, pixel) in rgb.enumerate_pixels() {
                let [r, g, b] = pixel.0;
                out.put_pixel(x, y, Luma([lightness_from_linear(&linear, r, g, b)]));
            }
            out
        }
    }
}

/// Binarize with an automatically selected global threshold
///
/// The threshold maximizes between-class variance of the histogram (Otsu).
/// Pixels strictly above it become [`FOREGROUND`]. Returns the mask together
/// with the threshold that was chosen.
pub fn otsu_binarize(gray: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(gray);
    (threshold_above(gray, level), level)
}

/// Binarize with a fixed threshold (strictly above becomes foreground)
pub fn threshold_above(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel.0[0] > threshold {
            FOREGROUND
        } else {
            BACKGROUND
        };
        binary.put_pixel(x, y, Luma([value]));
    }
    binary
}

/// BT.601 luminance
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8
}

/// sRGB gamma expansion for every 8-bit code value
fn srgb_linear_table() -> [f64; 256] {
    let mut table = [0.0; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let c = i as f64 / 255.0;
        *slot = if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    table
}

fn lightness_from_linear(linear: &[f64; 256], r: u8, g: u8, b: u8) -> u8 {
    // D65 relative luminance; Yn = 1.0
    let y = 0.212671 * linear[r as usize]
        + 0.715160 * linear[g as usize]
        + 0.072169 * linear[b as usize];

    let l_star = if y > LAB_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        LAB_KAPPA * y
    };

    (l_star * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_luminance() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
        let gray = luminance(128, 128, 128);
        assert!((gray as i32 - 128).abs() < 2);
    }

    #[test]
    fn test_to_grayscale_keeps_luma_input() {
        let gray = GrayImage::from_pixel(4, 3, Luma([77]));
        let out = to_grayscale(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(out, gray);
    }

    #[test]
    fn test_to_grayscale_rgb() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let out = to_grayscale(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(out.get_pixel(0, 0).0[0], 76);
    }

    #[test]
    fn test_lightness_extremes() {
        let white = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let black = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]));
        assert_eq!(to_lightness(&DynamicImage::ImageRgb8(white)).get_pixel(0, 0).0[0], 255);
        assert_eq!(to_lightness(&DynamicImage::ImageRgb8(black)).get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_lightness_mid_gray() {
        // sRGB 119 is close to L* = 50
        let gray = RgbImage::from_pixel(1, 1, Rgb([119, 119, 119]));
        let l = to_lightness(&DynamicImage::ImageRgb8(gray)).get_pixel(0, 0).0[0];
        assert!((l as i32 - 128).abs() <= 2, "lightness was {l}");
    }

    #[test]
    fn test_lightness_luma_matches_rgb() {
        let luma = GrayImage::from_pixel(1, 1, Luma([210]));
        let rgb = RgbImage::from_pixel(1, 1, Rgb([210, 210, 210]));
        assert_eq!(
            to_lightness(&DynamicImage::ImageLuma8(luma)),
            to_lightness(&DynamicImage::ImageRgb8(rgb))
        );
    }

    #[test]
    fn test_threshold_above_is_strict() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([199]));
        gray.put_pixel(1, 0, Luma([200]));
        gray.put_pixel(2, 0, Luma([201]));

        let binary = threshold_above(&gray, 200);
        assert_eq!(binary.get_pixel(0, 0).0[0], BACKGROUND);
        assert_eq!(binary.get_pixel(1, 0).0[0], BACKGROUND);
        assert_eq!(binary.get_pixel(2, 0).0[0], FOREGROUND);
    }

    #[test]
    fn test_otsu_separates_bimodal() {
        let mut gray = GrayImage::from_pixel(20, 20, Luma([10]));
        for y in 5..15 {
            for x in 5..15 {
                gray.put_pixel(x, y, Luma([240]));
            }
        }

        let (binary, level) = otsu_binarize(&gray);
        assert!((10..240).contains(&level));
        assert_eq!(binary.get_pixel(10, 10).0[0], FOREGROUND);
        assert_eq!(binary.get_pixel(0, 0).0[0], BACKGROUND);
    }

    #[test]
    fn test_otsu_uniform_does_not_panic() {
        let gray = GrayImage::from_pixel(10, 10, Luma([128]));
        let (binary, _) = otsu_binarize(&gray);
        let first = binary.get_pixel(0, 0).0[0];
        assert!(binary.pixels().all(|p| p.0[0] == first));
    }
}
