//! Rectangular structuring elements and the morphological operators built on them
//!
//! Rectangles are separable, so every operator runs as a horizontal sweep
//! followed by a vertical sweep. Neighbours outside the image are ignored.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Rectangular structuring element
///
/// The anchor sits at `(width / 2, height / 2)`, so odd sizes are centred and
/// even sizes lean one pixel toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuringElement {
    pub width: u32,
    pub height: u32,
}

impl StructuringElement {
    /// Rectangle of the given size (each side at least 1)
    pub fn rect(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Square of side `size`
    pub fn square(size: u32) -> Self {
        Self::rect(size, size)
    }

    fn anchor(&self) -> (i64, i64) {
        ((self.width / 2) as i64, (self.height / 2) as i64)
    }

    /// Offsets covered by the element along x and y, relative to the anchor
    fn reach(&self) -> ((i64, i64), (i64, i64)) {
        let (ax, ay) = self.anchor();
        (
            (-ax, self.width as i64 - 1 - ax),
            (-ay, self.height as i64 - 1 - ay),
        )
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Dilate (local maximum over the element)
pub fn dilate(image: &GrayImage, element: StructuringElement) -> GrayImage {
    let ((x_lo, x_hi), (y_lo, y_hi)) = element.reach();
    let pass = sweep(image, Axis::Horizontal, x_lo, x_hi, u8::MIN, u8::max);
    sweep(&pass, Axis::Vertical, y_lo, y_hi, u8::MIN, u8::max)
}

/// Erode (local minimum over the reflected element)
///
/// Reflection makes erosion the adjoint of [`dilate`], so `close` never
/// shifts a shape even for even-sized elements.
pub fn erode(image: &GrayImage, element: StructuringElement) -> GrayImage {
    let ((x_lo, x_hi), (y_lo, y_hi)) = element.reach();
    let pass = sweep(image, Axis::Horizontal, -x_hi, -x_lo, u8::MAX, u8::min);
    sweep(&pass, Axis::Vertical, -y_hi, -y_lo, u8::MAX, u8::min)
}

/// Morphological closing: one dilation followed by one erosion
pub fn close(image: &GrayImage, element: StructuringElement) -> GrayImage {
    erode(&dilate(image, element), element)
}

/// Close with one element, then dilate with another
///
/// This is the consolidation step every stage runs before component
/// extraction: closing bridges gaps inside a fragment, dilation merges
/// fragments that sit close together.
pub fn close_then_dilate(
    image: &GrayImage,
    close_element: StructuringElement,
    dilate_element: StructuringElement,
) -> GrayImage {
    dilate(&close(image, close_element), dilate_element)
}

/// One-dimensional running reduction over `[lo, hi]` offsets along `axis`
fn sweep(
    image: &GrayImage,
    axis: Axis,
    lo: i64,
    hi: i64,
    identity: u8,
    reduce: fn(u8, u8) -> u8,
) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut acc = identity;
            for offset in lo..=hi {
                let (nx, ny) = match axis {
                    Axis::Horizontal => (x as i64 + offset, y as i64),
                    Axis::Vertical => (x as i64, y as i64 + offset),
                };
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                acc = reduce(acc, image.get_pixel(nx as u32, ny as u32).0[0]);
            }
            out.put_pixel(x, y, Luma([acc]));
        }
    }

    out
}
