//! External connected-component extraction
//!
//! Foreground is 8-connected, background 4-connected. A component is
//! *external* when it is not enclosed by another component, i.e. when it
//! touches the image border or the background that is reachable from the
//! border. Components sitting inside a hole of a larger shape are dropped,
//! which matches outer-boundary-only contour retrieval.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use image::GrayImage;

/// 8-connected neighbourhood for foreground labeling
const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// 4-connected neighbourhood for background reachability
const NEIGHBORS_4: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Box area in pixels (not the component's pixel count)
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// One connected component: pixel count and bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Number of foreground pixels in the component
    pub area: u32,
    pub bbox: BoundingBox,
}

/// Running extent of a component while it is being flood-filled
#[derive(Debug, Clone, Copy)]
struct ComponentExtent {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixel_count: u32,
}

impl ComponentExtent {
    fn new(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 1,
        }
    }

    fn expand(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }

    fn into_record(self) -> ComponentRecord {
        ComponentRecord {
            area: self.pixel_count,
            bbox: BoundingBox::new(
                self.min_x,
                self.min_y,
                self.max_x - self.min_x + 1,
                self.max_y - self.min_y + 1,
            ),
        }
    }
}

/// Find the external connected components of a binary image
///
/// Any non-zero pixel counts as foreground. Components are returned in raster
/// order of their first (top-most, then left-most) pixel.
pub fn find_external_components(binary: &GrayImage) -> Vec<ComponentRecord> {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let (labels, extents) = label_foreground(binary);
    let outside = reachable_background(binary);

    let mut external = vec![false; extents.len()];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let Some(label) = labels[idx] else {
                continue;
            };
            if external[label] {
                continue;
            }
            let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            if on_border || touches(&outside, x, y, width, height) {
                external[label] = true;
            }
        }
    }

    extents
        .into_iter()
        .zip(external)
        .filter_map(|(extent, is_external)| is_external.then(|| extent.into_record()))
        .collect()
}

/// Label 8-connected foreground components with a flood fill
fn label_foreground(binary: &GrayImage) -> (Vec<Option<usize>>, Vec<ComponentExtent>) {
    let (width, height) = binary.dimensions();
    let mut labels: Vec<Option<usize>> = vec![None; (width * height) as usize];
    let mut extents = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if labels[idx].is_some() || binary.get_pixel(x, y).0[0] == 0 {
                continue;
            }

            let label = extents.len();
            let mut extent = ComponentExtent::new(x, y);
            labels[idx] = Some(label);
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                for (dx, dy) in &NEIGHBORS_8 {
                    let Some((nx, ny)) = offset(cx, cy, *dx, *dy, width, height) else {
                        continue;
                    };
                    let nidx = (ny * width + nx) as usize;
                    if labels[nidx].is_none() && binary.get_pixel(nx, ny).0[0] > 0 {
                        labels[nidx] = Some(label);
                        extent.expand(nx, ny);
                        queue.push_back((nx, ny));
                    }
                }
            }

            extents.push(extent);
        }
    }

    (labels, extents)
}

/// Mark background pixels 4-connected to the image border
fn reachable_background(binary: &GrayImage) -> Vec<bool> {
    let (width, height) = binary.dimensions();
    let mut outside = vec![false; (width * height) as usize];
    let mut queue = VecDeque::new();

    let seed = |x: u32, y: u32, outside: &mut [bool], queue: &mut VecDeque<(u32, u32)>| {
        let idx = (y * width + x) as usize;
        if !outside[idx] && binary.get_pixel(x, y).0[0] == 0 {
            outside[idx] = true;
            queue.push_back((x, y));
        }
    };

    for x in 0..width {
        seed(x, 0, &mut outside, &mut queue);
        seed(x, height - 1, &mut outside, &mut queue);
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut queue);
        seed(width - 1, y, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in &NEIGHBORS_4 {
            let Some((nx, ny)) = offset(x, y, *dx, *dy, width, height) else {
                continue;
            };
            let nidx = (ny * width + nx) as usize;
            if !outside[nidx] && binary.get_pixel(nx, ny).0[0] == 0 {
                outside[nidx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    outside
}

fn touches(outside: &[bool], x: u32, y: u32, width: u32, height: u32) -> bool {
    NEIGHBORS_4.iter().any(|(dx, dy)| {
        offset(x, y, *dx, *dy, width, height)
            .map(|(nx, ny)| outside[(ny * width + nx) as usize])
            .unwrap_or(false)
    })
}

fn offset(x: u32, y: u32, dx: i32, dy: i32, width: u32, height: u32) -> Option<(u32, u32)> {
    let nx = x as i64 + dx as i64;
    let ny = y as i64 + dy as i64;
    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
        None
    } else {
        Some((nx as u32, ny as u32))
    }
}
