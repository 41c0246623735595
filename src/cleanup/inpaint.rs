//! Smooth infill of masked regions
//!
//! Fast-marching inpainting after Telea (2004). Masked pixels are filled in
//! order of their distance from the mask boundary; each one becomes a
//! weighted average of already-known pixels inside a small disc. Weights
//! favour close neighbours, neighbours on the same distance level, and
//! neighbours along the marching direction.
//!
//! Only the zeroth-order estimate is used: the first-order correction along
//! each neighbour's image gradient is left out. Fills are therefore always a
//! convex combination of known pixels and never overshoot their range, at
//! the cost of slightly softer edges than OpenCV's `INPAINT_TELEA`.
//!
//! # Algorithm
//!
//! 1. Flag masked pixels INSIDE, their known 4-neighbours BAND
//! 2. Pop the BAND pixel with the smallest arrival time and freeze it
//! 3. For each INSIDE 4-neighbour: solve the eikonal arrival time, fill its
//!    color from the known disc, move it to BAND
//! 4. Repeat until the band is empty

use image::{DynamicImage, GrayImage};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::{CleanupError, Result};

// ============================================================
// Constants
// ============================================================

/// Arrival time of pixels the front has not reached
const UNREACHED: f32 = 1.0e6;

/// Upper bound on the neighbourhood radius
const MAX_RADIUS: u32 = 100;

/// Directional weights below this magnitude are replaced by [`DIR_FLOOR`]
const DIR_EPSILON: f32 = 0.01;
const DIR_FLOOR: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Known,
    Band,
    Inside,
}

/// Narrow-band heap entry, ordered so `BinaryHeap` pops the smallest time
#[derive(Debug, Clone, Copy)]
struct BandEntry {
    time: f32,
    seq: u64,
    idx: usize,
}

impl PartialEq for BandEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BandEntry {}

impl PartialOrd for BandEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BandEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ============================================================
// Public API
// ============================================================

/// Inpaint every non-zero mask pixel of `image` in place
///
/// `radius` is the neighbourhood radius in pixels (clamped to 1..=100).
/// Returns the number of pixels that were filled. Pixels outside the mask are
/// never modified.
pub fn inpaint_telea(image: &mut DynamicImage, mask: &GrayImage, radius: u32) -> Result<usize> {
    let (width, height) = (image.width(), image.height());
    if mask.dimensions() != (width, height) {
        return Err(CleanupError::InvalidMask {
            mask_width: mask.width(),
            mask_height: mask.height(),
            width,
            height,
        });
    }

    let radius = radius.clamp(1, MAX_RADIUS);
    match image {
        DynamicImage::ImageLuma8(buf) => Ok(march(&mut **buf, width, height, 1, mask, radius)),
        DynamicImage::ImageRgb8(buf) => Ok(march(&mut **buf, width, height, 3, mask, radius)),
        other => Err(CleanupError::InvalidImageShape {
            width,
            height,
            channels: other.color().channel_count(),
        }),
    }
}

// ============================================================
// Fast marching
// ============================================================

struct Field {
    width: usize,
    height: usize,
    flags: Vec<Flag>,
    time: Vec<f32>,
}

impl Field {
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    /// Flag and time at (x, y); out-of-image reads as unreached
    fn at(&self, x: i64, y: i64) -> (Flag, f32) {
        match self.index(x, y) {
            Some(i) => (self.flags[i], self.time[i]),
            None => (Flag::Inside, UNREACHED),
        }
    }

    fn usable(&self, x: i64, y: i64) -> bool {
        self.at(x, y).0 != Flag::Inside
    }

    /// First-order eikonal update from two orthogonal neighbours
    fn solve(&self, a: (i64, i64), b: (i64, i64)) -> f32 {
        let (fa, ta) = self.at(a.0, a.1);
        let (fb, tb) = self.at(b.0, b.1);
        let a_ok = fa != Flag::Inside;
        let b_ok = fb != Flag::Inside;

        match (a_ok, b_ok) {
            (true, true) => {
                let diff = ta - tb;
                if diff.abs() >= 1.0 {
                    1.0 + ta.min(tb)
                } else {
                    (ta + tb + (2.0 - diff * diff).sqrt()) * 0.5
                }
            }
            (true, false) => 1.0 + ta,
            (false, true) => 1.0 + tb,
            (false, false) => 1.0 + ta.min(tb),
        }
    }

    fn arrival_time(&self, x: i64, y: i64) -> f32 {
        let candidates = [
            self.solve((x, y - 1), (x - 1, y)),
            self.solve((x, y + 1), (x - 1, y)),
            self.solve((x, y - 1), (x + 1, y)),
            self.solve((x, y + 1), (x + 1, y)),
        ];
        candidates.into_iter().fold(UNREACHED, f32::min)
    }

    /// Gradient of the arrival time at (x, y), one-sided where needed
    fn time_gradient(&self, x: i64, y: i64) -> (f32, f32) {
        let t = self.at(x, y).1;
        let axis = |prev: (i64, i64), next: (i64, i64)| -> f32 {
            match (self.usable(prev.0, prev.1), self.usable(next.0, next.1)) {
                (true, true) => (self.at(next.0, next.1).1 - self.at(prev.0, prev.1).1) * 0.5,
                (false, true) => self.at(next.0, next.1).1 - t,
                (true, false) => t - self.at(prev.0, prev.1).1,
                (false, false) => 0.0,
            }
        };
        (axis((x - 1, y), (x + 1, y)), axis((x, y - 1), (x, y + 1)))
    }
}

fn march(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    channels: usize,
    mask: &GrayImage,
    radius: u32,
) -> usize {
    let (w, h) = (width as usize, height as usize);
    let mut field = Field {
        width: w,
        height: h,
        flags: vec![Flag::Known; w * h],
        time: vec![0.0; w * h],
    };

    let mut filled = 0;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] > 0 {
            let i = y as usize * w + x as usize;
            field.flags[i] = Flag::Inside;
            field.time[i] = UNREACHED;
            filled += 1;
        }
    }
    if filled == 0 {
        return 0;
    }

    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let Some(i) = field.index(x, y) else {
                continue;
            };
            if field.flags[i] != Flag::Known {
                continue;
            }
            let borders_mask = [(0, -1), (-1, 0), (1, 0), (0, 1)].iter().any(|(dx, dy)| {
                field
                    .index(x + dx, y + dy)
                    .is_some_and(|j| field.flags[j] == Flag::Inside)
            });
            if borders_mask {
                field.flags[i] = Flag::Band;
                heap.push(BandEntry { time: 0.0, seq, idx: i });
                seq += 1;
            }
        }
    }

    let mut color = vec![0.0f32; channels];
    while let Some(entry) = heap.pop() {
        field.flags[entry.idx] = Flag::Known;
        let (cx, cy) = ((entry.idx % w) as i64, (entry.idx / w) as i64);

        for (dx, dy) in [(0, -1), (-1, 0), (1, 0), (0, 1)] {
            let (x, y) = (cx + dx, cy + dy);
            let Some(i) = field.index(x, y) else {
                continue;
            };
            if field.flags[i] != Flag::Inside {
                continue;
            }

            let time = field.arrival_time(x, y);
            field.time[i] = time;

            if let Some(weight_sum) = blend(&field, pixels, channels, x, y, radius, &mut color) {
                for (c, value) in color.iter().enumerate() {
                    pixels[i * channels + c] = (value / weight_sum + 0.5).clamp(0.0, 255.0) as u8;
                }
            }

            field.flags[i] = Flag::Band;
            heap.push(BandEntry { time, seq, idx: i });
            seq += 1;
        }
    }

    filled
}

/// Accumulate the weighted color of the known disc around (x, y)
///
/// Returns the total weight, or `None` when no known pixel is in reach.
fn blend(
    field: &Field,
    pixels: &[u8],
    channels: usize,
    x: i64,
    y: i64,
    radius: u32,
    color: &mut [f32],
) -> Option<f32> {
    let r = radius as i64;
    let (grad_x, grad_y) = field.time_gradient(x, y);
    let time = field.at(x, y).1;

    color.iter_mut().for_each(|c| *c = 0.0);
    let mut weight_sum = 0.0f32;

    for ny in y - r..=y + r {
        for nx in x - r..=x + r {
            let Some(j) = field.index(nx, ny) else {
                continue;
            };
            if field.flags[j] == Flag::Inside {
                continue;
            }
            let (rx, ry) = ((x - nx) as f32, (y - ny) as f32);
            let dist_sq = rx * rx + ry * ry;
            if dist_sq > (r * r) as f32 {
                continue;
            }

            let distance = 1.0 / (dist_sq * dist_sq.sqrt());
            let level = 1.0 / (1.0 + (field.time[j] - time).abs());
            let mut direction = rx * grad_x + ry * grad_y;
            if direction.abs() <= DIR_EPSILON {
                direction = DIR_FLOOR;
            }
            let weight = (distance * level * direction).abs();

            for (c, acc) in color.iter_mut().enumerate() {
                *acc += weight * pixels[j * channels + c] as f32;
            }
            weight_sum += weight;
        }
    }

    (weight_sum > 0.0).then_some(weight_sum)
}
