//! Dot-cluster artifact removal
//!
//! Some scanners burn a column of small bright dots (depth markers) into the
//! frame. Individually they look like any bright speckle; what gives them away
//! is that many of them share one horizontal position.
//!
//! # Algorithm
//!
//! 1. Lightness channel, keep pixels strictly brighter than the threshold
//! 2. Close 5x5, dilate 8x8 so each dot becomes one solid blob
//! 3. Extract external components
//! 4. Bucket each component's left edge: `floor(x / width) * width`
//! 5. Take the most frequent bucket (first seen wins ties)
//! 6. If more than `min_cluster_size` components share it, inpaint their
//!    bounding boxes; otherwise leave the image untouched
//!
//! The bucket width, lightness threshold and cluster size encode assumptions
//! about one capture device and are exposed as options.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use super::inpaint::inpaint_telea;
use super::types::{validate_image, Result};
use crate::morphology::{
    close_then_dilate, find_external_components, threshold_above, to_lightness, ComponentRecord,
    StructuringElement, FOREGROUND,
};

// ============================================================
// Constants
// ============================================================

/// Lightness (0-255 scale) a pixel must exceed to count as a dot
const DEFAULT_LIGHTNESS_THRESHOLD: u8 = 200;

/// Closing element size
const DEFAULT_CLOSE_KERNEL: u32 = 5;

/// Dilation element size
const DEFAULT_DILATE_KERNEL: u32 = 8;

/// Horizontal bucket width in pixels
const DEFAULT_BUCKET_WIDTH: u32 = 10;

/// A cluster needs strictly more members than this
const DEFAULT_MIN_CLUSTER_SIZE: usize = 8;

/// Inpainting neighbourhood radius
const DEFAULT_INPAINT_RADIUS: u32 = 4;

// ============================================================
// Types
// ============================================================

/// Options for dot-cluster removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotClusterOptions {
    /// Lightness threshold (strictly above is bright)
    pub lightness_threshold: u8,

    /// Closing element size
    pub close_kernel: u32,

    /// Dilation element size
    pub dilate_kernel: u32,

    /// Width of the x-coordinate buckets
    pub bucket_width: u32,

    /// Matching components must outnumber this to trigger removal
    pub min_cluster_size: usize,

    /// Inpainting radius in pixels
    pub inpaint_radius: u32,
}

impl Default for DotClusterOptions {
    fn default() -> Self {
        Self {
            lightness_threshold: DEFAULT_LIGHTNESS_THRESHOLD,
            close_kernel: DEFAULT_CLOSE_KERNEL,
            dilate_kernel: DEFAULT_DILATE_KERNEL,
            bucket_width: DEFAULT_BUCKET_WIDTH,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            inpaint_radius: DEFAULT_INPAINT_RADIUS,
        }
    }
}

impl DotClusterOptions {
    /// Create a builder
    pub fn builder() -> DotClusterOptionsBuilder {
        DotClusterOptionsBuilder::default()
    }

    /// Bucket an x coordinate
    pub fn bucket(&self, x: u32) -> u32 {
        let width = self.bucket_width.max(1);
        (x / width) * width
    }
}

/// Builder for DotClusterOptions
#[derive(Debug, Default)]
pub struct DotClusterOptionsBuilder {
    options: DotClusterOptions,
}

impl DotClusterOptionsBuilder {
    /// Set lightness threshold
    #[must_use]
    pub fn lightness_threshold(mut self, threshold: u8) -> Self {
        self.options.lightness_threshold = threshold;
        self
    }

    /// Set closing and dilation element sizes
    #[must_use]
    pub fn kernels(mut self, close: u32, dilate: u32) -> Self {
        self.options.close_kernel = close;
        self.options.dilate_kernel = dilate;
        self
    }

    /// Set bucket width (at least 1)
    #[must_use]
    pub fn bucket_width(mut self, width: u32) -> Self {
        self.options.bucket_width = width.max(1);
        self
    }

    /// Set cluster size threshold
    #[must_use]
    pub fn min_cluster_size(mut self, size: usize) -> Self {
        self.options.min_cluster_size = size;
        self
    }

    /// Set inpainting radius
    #[must_use]
    pub fn inpaint_radius(mut self, radius: u32) -> Self {
        self.options.inpaint_radius = radius;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DotClusterOptions {
        self.options
    }
}

/// Dot-cluster detection result
#[derive(Debug, Clone, PartialEq)]
pub struct DotClusterDetection {
    /// All bright components found
    pub components: Vec<ComponentRecord>,

    /// Most frequent bucket, if any component was found
    pub dominant_bucket: Option<u32>,

    /// Components in the dominant bucket
    pub matched: Vec<ComponentRecord>,

    /// Whether `matched` is large enough to count as a dot row
    pub is_artifact_row: bool,
}

impl DotClusterDetection {
    /// Number of components in the dominant bucket
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }
}

// ============================================================
// Dot-Cluster Remover
// ============================================================

/// Dot-cluster artifact remover
pub struct DotClusterRemover;

impl DotClusterRemover {
    /// Detect a dot row without modifying the image
    pub fn detect(
        image: &DynamicImage,
        options: &DotClusterOptions,
    ) -> Result<DotClusterDetection> {
        validate_image(image)?;

        let lightness = to_lightness(image);
        let bright = threshold_above(&lightness, options.lightness_threshold);
        let consolidated = close_then_dilate(
            &bright,
            StructuringElement::square(options.close_kernel),
            StructuringElement::square(options.dilate_kernel),
        );
        let components = find_external_components(&consolidated);

        let dominant_bucket = Self::dominant_bucket(&components, options);
        let matched: Vec<ComponentRecord> = match dominant_bucket {
            Some(bucket) => components
                .iter()
                .filter(|c| options.bucket(c.bbox.x) == bucket)
                .copied()
                .collect(),
            None => Vec::new(),
        };
        let is_artifact_row = matched.len() > options.min_cluster_size;

        tracing::debug!(
            stage = "dot_cluster",
            components = components.len(),
            bucket = ?dominant_bucket,
            matched = matched.len(),
            is_artifact_row,
            "scanned for dot cluster"
        );

        Ok(DotClusterDetection {
            components,
            dominant_bucket,
            matched,
            is_artifact_row,
        })
    }

    /// Remove a dot row, returning a new image
    pub fn remove(image: &DynamicImage, options: &DotClusterOptions) -> Result<DynamicImage> {
        let mut output = image.clone();
        Self::remove_in_place(&mut output, options)?;
        Ok(output)
    }

    /// Remove a dot row in place
    ///
    /// The image is left byte-identical unless a row is detected.
    pub fn remove_in_place(
        image: &mut DynamicImage,
        options: &DotClusterOptions,
    ) -> Result<DotClusterDetection> {
        let detection = Self::detect(image, options)?;
        if !detection.is_artifact_row {
            return Ok(detection);
        }

        let mask = Self::build_mask(image.width(), image.height(), &detection.matched);
        let filled = inpaint_telea(image, &mask, options.inpaint_radius)?;
        tracing::debug!(stage = "dot_cluster", filled, "inpainted dot row");

        Ok(detection)
    }

    /// Most frequent bucket among the components' left edges
    ///
    /// Ties go to the bucket that appears first in component order.
    fn dominant_bucket(components: &[ComponentRecord], options: &DotClusterOptions) -> Option<u32> {
        let mut counts: Vec<(u32, usize)> = Vec::new();
        for component in components {
            let bucket = options.bucket(component.bbox.x);
            match counts.iter_mut().find(|(b, _)| *b == bucket) {
                Some((_, count)) => *count += 1,
                None => counts.push((bucket, 1)),
            }
        }

        counts
            .into_iter()
            .fold(None, |best: Option<(u32, usize)>, (bucket, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((bucket, count)),
            })
            .map(|(bucket, _)| bucket)
    }

    fn build_mask(width: u32, height: u32, components: &[ComponentRecord]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for component in components {
            let b = component.bbox;
            draw_filled_rect_mut(
                &mut mask,
                Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height),
                Luma([FOREGROUND]),
            );
        }
        mask
    }
}

// ============================================================
// Tests
// ============================================================
