//! Small-blob artifact removal
//!
//! Some capture devices stamp a letter-shaped marker onto every frame. Its
//! stamped size is nearly constant across the dataset, so a narrow band on
//! component area picks it out without a learned model.
//!
//! # Algorithm
//!
//! 1. Grayscale, Otsu binarize
//! 2. Close then dilate with a 5x5 element
//! 3. Extract external components
//! 4. Every component with `min_area < area < max_area` has its bounding box
//!    overwritten with black
//!
//! The erase is a hard black fill, not an inpaint: the marker is assumed to
//! sit on background. The area bounds are raw pixel counts tuned to the
//! source resolution and are not rescaled.

use image::{DynamicImage, Luma, Rgb};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use super::types::{validate_image, Result};
use crate::morphology::{
    close_then_dilate, find_external_components, otsu_binarize, to_grayscale, ComponentRecord,
    StructuringElement,
};

// ============================================================
// Constants
// ============================================================

/// Structuring element size for blob consolidation
const DEFAULT_BLOB_KERNEL: u32 = 5;

/// Exclusive lower bound of the artifact area band (pixels)
const DEFAULT_MIN_AREA: u32 = 800;

/// Exclusive upper bound of the artifact area band (pixels)
const DEFAULT_MAX_AREA: u32 = 900;

// ============================================================
// Types
// ============================================================

/// Options for small-blob removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmallBlobOptions {
    /// Closing element size
    pub close_kernel: u32,

    /// Dilation element size
    pub dilate_kernel: u32,

    /// Components must be strictly larger than this
    pub min_area: u32,

    /// Components must be strictly smaller than this
    pub max_area: u32,
}

impl Default for SmallBlobOptions {
    fn default() -> Self {
        Self {
            close_kernel: DEFAULT_BLOB_KERNEL,
            dilate_kernel: DEFAULT_BLOB_KERNEL,
            min_area: DEFAULT_MIN_AREA,
            max_area: DEFAULT_MAX_AREA,
        }
    }
}

impl SmallBlobOptions {
    /// Create a builder
    pub fn builder() -> SmallBlobOptionsBuilder {
        SmallBlobOptionsBuilder::default()
    }

    /// Whether a component area falls inside the open band
    pub fn in_band(&self, area: u32) -> bool {
        self.min_area < area && area < self.max_area
    }
}

/// Builder for SmallBlobOptions
#[derive(Debug, Default)]
pub struct SmallBlobOptionsBuilder {
    options: SmallBlobOptions,
}

impl SmallBlobOptionsBuilder {
    /// Set both structuring element sizes
    #[must_use]
    pub fn kernel(mut self, size: u32) -> Self {
        self.options.close_kernel = size;
        self.options.dilate_kernel = size;
        self
    }

    /// Set the area band (both bounds exclusive)
    #[must_use]
    pub fn area_band(mut self, min_area: u32, max_area: u32) -> Self {
        self.options.min_area = min_area.min(max_area);
        self.options.max_area = max_area.max(min_area);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> SmallBlobOptions {
        self.options
    }
}

/// Outcome of small-blob removal
#[derive(Debug, Clone, PartialEq)]
pub struct BlobRemovalResult {
    /// Components whose bounding boxes were blacked out
    pub erased: Vec<ComponentRecord>,

    /// External components examined
    pub total_components: usize,

    /// Otsu threshold used for binarization
    pub threshold: u8,
}

impl BlobRemovalResult {
    /// Check if anything was erased
    pub fn has_removals(&self) -> bool {
        !self.erased.is_empty()
    }
}

// ============================================================
// Small-Blob Remover
// ============================================================

/// Small-blob artifact remover
pub struct SmallBlobRemover;

impl SmallBlobRemover {
    /// Find in-band components without touching the image
    pub fn detect(image: &DynamicImage, options: &SmallBlobOptions) -> Result<BlobRemovalResult> {
        validate_image(image)?;

        let gray = to_grayscale(image);
        let (binary, threshold) = otsu_binarize(&gray);
        let consolidated = close_then_dilate(
            &binary,
            StructuringElement::square(options.close_kernel),
            StructuringElement::square(options.dilate_kernel),
        );
        let components = find_external_components(&consolidated);
        let total_components = components.len();

        let erased: Vec<ComponentRecord> = components
            .into_iter()
            .filter(|c| options.in_band(c.area))
            .collect();

        tracing::debug!(
            stage = "small_blob",
            threshold,
            components = total_components,
            matched = erased.len(),
            "scanned for small blobs"
        );

        Ok(BlobRemovalResult {
            erased,
            total_components,
            threshold,
        })
    }

    /// Remove small blobs, returning a new image
    pub fn remove(image: &DynamicImage, options: &SmallBlobOptions) -> Result<DynamicImage> {
        let mut output = image.clone();
        Self::remove_in_place(&mut output, options)?;
        Ok(output)
    }

    /// Remove small blobs from an image in place
    pub fn remove_in_place(
        image: &mut DynamicImage,
        options: &SmallBlobOptions,
    ) -> Result<BlobRemovalResult> {
        let result = Self::detect(image, options)?;

        for component in &result.erased {
            let bbox = component.bbox;
            tracing::trace!(
                x = bbox.x,
                y = bbox.y,
                width = bbox.width,
                height = bbox.height,
                area = component.area,
                "erasing blob"
            );
            let rect = Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height);
            match image {
                DynamicImage::ImageLuma8(buf) => draw_filled_rect_mut(buf, rect, Luma([0])),
                DynamicImage::ImageRgb8(buf) => draw_filled_rect_mut(buf, rect, Rgb([0, 0, 0])),
                // validate_image already rejected everything else
                _ => {}
            }
        }

        Ok(result)
    }
}

// ============================================================
// Tests
// ============================================================
