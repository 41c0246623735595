//! OCR-guided text-overlay removal
//!
//! Frames carry burned-in annotations (depth, gain, transducer labels). An external
//! text detector locates them; each detection is turned into a thick stroke
//! along its horizontal centerline and the accumulated strokes are inpainted.
//!
//! # Algorithm
//!
//! 1. Run the detector on the image
//! 2. For each quadrilateral (TL, TR, BR, BL):
//!    - centerline from mid(TR, BR) to mid(TL, BL), truncated to pixels
//!    - stroke thickness from one edge length (top edge by default)
//!    - draw the stroke into one shared mask at 255
//! 3. Inpaint the image against the mask with radius 2
//!
//! Quads with non-finite corners are rejected as a detection failure. Finite
//! corners far outside the frame are clamped before rasterizing, and the
//! stroke thickness is capped, so drawing cost stays bounded by image size.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use super::inpaint::inpaint_telea;
use super::types::{validate_image, CleanupError, Result};
use crate::detector::{TextDetection, TextDetector};
use crate::morphology::FOREGROUND;

/// Default inpainting radius for text strokes
const DEFAULT_TEXT_INPAINT_RADIUS: u32 = 2;

/// Quad corners are clamped to this many image extents around the origin
const COORD_LIMIT_FACTOR: f32 = 4.0;

/// Stroke thickness is capped at this many image extents
const THICKNESS_LIMIT_FACTOR: u32 = 2;

/// Which quadrilateral edge sets the stroke thickness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeWidth {
    /// Top-left to top-right length
    #[default]
    TopEdge,

    /// Top-right to bottom-right length (glyph height)
    SideEdge,
}

impl StrokeWidth {
    /// Stroke thickness in whole pixels (at least 1)
    pub fn thickness(&self, detection: &TextDetection) -> u32 {
        let length = match self {
            StrokeWidth::TopEdge => detection.top_left().distance(&detection.top_right()),
            StrokeWidth::SideEdge => detection.top_right().distance(&detection.bottom_right()),
        };
        (length as u32).max(1)
    }
}

/// Options for text-overlay removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlayOptions {
    /// Inpainting radius in pixels
    pub inpaint_radius: u32,

    /// Edge used for stroke thickness
    pub stroke: StrokeWidth,
}

impl Default for TextOverlayOptions {
    fn default() -> Self {
        Self {
            inpaint_radius: DEFAULT_TEXT_INPAINT_RADIUS,
            stroke: StrokeWidth::TopEdge,
        }
    }
}

/// Outcome of text-overlay removal
#[derive(Debug, Clone, PartialEq)]
pub struct TextRemovalResult {
    /// Detections returned by the detector
    pub detections: Vec<TextDetection>,

    /// Pixels covered by the stroke mask
    pub masked_pixels: usize,
}

impl TextRemovalResult {
    pub fn has_text(&self) -> bool {
        !self.detections.is_empty()
    }
}

/// Text-overlay remover
pub struct TextOverlayRemover;

impl TextOverlayRemover {
    /// Remove detected text, returning a new image
    pub fn remove<D: TextDetector + ?Sized>(
        image: &DynamicImage,
        detector: &D,
        options: &TextOverlayOptions,
    ) -> Result<DynamicImage> {
        let mut output = image.clone();
        Self::remove_in_place(&mut output, detector, options)?;
        Ok(output)
    }

    /// Remove detected text in place
    pub fn remove_in_place<D: TextDetector + ?Sized>(
        image: &mut DynamicImage,
        detector: &D,
        options: &TextOverlayOptions,
    ) -> Result<TextRemovalResult> {
        validate_image(image)?;

        let detections = detector
            .detect(image)
            .map_err(|e| CleanupError::DetectionFailed(format!("{e:#}")))?;

        tracing::debug!(
            stage = "text_overlay",
            detections = detections.len(),
            "text detector returned"
        );

        if let Some(index) = detections.iter().position(|d| !d.is_finite()) {
            return Err(CleanupError::DetectionFailed(format!(
                "non-finite quad corner in detection {index}: {:?}",
                detections[index].quad
            )));
        }

        if detections.is_empty() {
            return Ok(TextRemovalResult {
                detections,
                masked_pixels: 0,
            });
        }

        let mask = Self::build_mask(image.width(), image.height(), &detections, options.stroke);
        let masked_pixels = inpaint_telea(image, &mask, options.inpaint_radius)?;

        Ok(TextRemovalResult {
            detections,
            masked_pixels,
        })
    }

    /// Rasterize the centerline strokes of all detections into one mask
    ///
    /// Detections with non-finite corners are skipped.
    pub fn build_mask(
        width: u32,
        height: u32,
        detections: &[TextDetection],
        stroke: StrokeWidth,
    ) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        let extent = width.max(height).max(1);
        let limit = COORD_LIMIT_FACTOR * extent as f32;
        let max_thickness = THICKNESS_LIMIT_FACTOR.saturating_mul(extent);

        for detection in detections {
            if !detection.is_finite() {
                tracing::warn!(quad = ?detection.quad, "skipping non-finite text quad");
                continue;
            }
            let detection = detection.clamped(limit);
            let start = detection.top_right().pixel_midpoint(&detection.bottom_right());
            let end = detection.top_left().pixel_midpoint(&detection.bottom_left());
            let thickness = stroke.thickness(&detection).min(max_thickness);
            draw_thick_line(&mut mask, start, end, thickness);
        }
        mask
    }
}

/// Draw a segment of the given thickness with round caps
fn draw_thick_line(mask: &mut GrayImage, start: (i32, i32), end: (i32, i32), thickness: u32) {
    let color = Luma([FOREGROUND]);
    let half = thickness as f32 / 2.0;
    let radius = half as i32;

    let (dx, dy) = ((end.0 - start.0) as f32, (end.1 - start.1) as f32);
    let length = (dx * dx + dy * dy).sqrt();

    if length >= 1.0 {
        let (nx, ny) = (-dy / length * half, dx / length * half);
        let corner = |p: (i32, i32), sign: f32| {
            Point::new(
                (p.0 as f32 + sign * nx).round() as i32,
                (p.1 as f32 + sign * ny).round() as i32,
            )
        };
        let polygon = [
            corner(start, 1.0),
            corner(end, 1.0),
            corner(end, -1.0),
            corner(start, -1.0),
        ];

        if polygon[0] == polygon[3] {
            // Too thin to form a polygon
            draw_line_segment_mut(
                mask,
                (start.0 as f32, start.1 as f32),
                (end.0 as f32, end.1 as f32),
                color,
            );
        } else {
            draw_polygon_mut(mask, &polygon, color);
        }
    }

    draw_filled_circle_mut(mask, start, radius, color);
    draw_filled_circle_mut(mask, end, radius, color);
}
