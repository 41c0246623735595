//! Pipeline orchestrator
//!
//! Chains the cleanup stages in their fixed order:
//!
//! 1. ROI crop - shrinks the area every later stage has to scan
//! 2. Small-blob removal
//! 3. Dot-cluster removal
//! 4. Text-overlay removal - runs last so the detector sees a frame without
//!    morphological artifacts
//!
//! # Example
//!
//! ```rust
//! use image::{DynamicImage, Rgb, RgbImage};
//! use lus_preprocess::{ImageCleaner, TextDetection, TextDetector};
//!
//! struct NoText;
//!
//! impl TextDetector for NoText {
//!     fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let mut frame = RgbImage::new(64, 48);
//! for y in 8..40 {
//!     for x in 16..48 {
//!         frame.put_pixel(x, y, Rgb([180, 180, 180]));
//!     }
//! }
//!
//! let cleaner = ImageCleaner::new(NoText);
//! let cleaned = cleaner.clean(&DynamicImage::ImageRgb8(frame)).unwrap();
//! assert!(cleaned.width() < 64);
//! ```

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cleanup::{
    validate_image, BlobRemovalResult, DotClusterDetection, DotClusterOptions, DotClusterRemover,
    Result, RoiCropOptions, RoiCropper, RoiDetection, SmallBlobOptions, SmallBlobRemover,
    TextOverlayOptions, TextOverlayRemover, TextRemovalResult,
};
use crate::detector::TextDetector;

// ============================================================
// Options
// ============================================================

/// Options for every stage of the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    pub roi: RoiCropOptions,
    pub small_blob: SmallBlobOptions,
    pub dot_cluster: DotClusterOptions,
    pub text_overlay: TextOverlayOptions,
}

impl CleanOptions {
    /// Create a builder
    pub fn builder() -> CleanOptionsBuilder {
        CleanOptionsBuilder::default()
    }
}

/// Builder for CleanOptions
#[derive(Debug, Default)]
pub struct CleanOptionsBuilder {
    options: CleanOptions,
}

impl CleanOptionsBuilder {
    /// Set ROI crop options
    #[must_use]
    pub fn roi(mut self, options: RoiCropOptions) -> Self {
        self.options.roi = options;
        self
    }

    /// Set small-blob options
    #[must_use]
    pub fn small_blob(mut self, options: SmallBlobOptions) -> Self {
        self.options.small_blob = options;
        self
    }

    /// Set dot-cluster options
    #[must_use]
    pub fn dot_cluster(mut self, options: DotClusterOptions) -> Self {
        self.options.dot_cluster = options;
        self
    }

    /// Set text-overlay options
    #[must_use]
    pub fn text_overlay(mut self, options: TextOverlayOptions) -> Self {
        self.options.text_overlay = options;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> CleanOptions {
        self.options
    }
}

// ============================================================
// Report
// ============================================================

/// What each stage did to one image
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    /// Input dimensions
    pub input_size: (u32, u32),

    /// Output dimensions (the ROI size)
    pub output_size: (u32, u32),

    pub roi: RoiDetection,
    pub blobs: BlobRemovalResult,
    pub dots: DotClusterDetection,
    pub text: TextRemovalResult,
}

/// Cleaned image plus its report
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub image: DynamicImage,
    pub report: CleanReport,
}

// ============================================================
// Image Cleaner
// ============================================================

/// Four-stage cleaning pipeline
///
/// Owns the text detector for its whole lifetime. Build one cleaner and reuse
/// it for every image; drop it (or call [`ImageCleaner::into_detector`]) to
/// release the model. The cleaner holds no per-image state, so it is `Sync`
/// whenever the detector is.
pub struct ImageCleaner<D: TextDetector> {
    detector: D,
    options: CleanOptions,
}

impl<D: TextDetector> ImageCleaner<D> {
    /// Create a cleaner with default options
    pub fn new(detector: D) -> Self {
        Self::with_options(detector, CleanOptions::default())
    }

    /// Create a cleaner with custom options
    pub fn with_options(detector: D, options: CleanOptions) -> Self {
        Self { detector, options }
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Release the detector
    pub fn into_detector(self) -> D {
        self.detector
    }

    /// Clean one image
    ///
    /// Either the fully cleaned image is returned or the first stage error;
    /// there are no partial results.
    pub fn clean(&self, image: &DynamicImage) -> Result<DynamicImage> {
        self.clean_with_report(image).map(|outcome| outcome.image)
    }

    /// Clean one image and report what each stage did
    pub fn clean_with_report(&self, image: &DynamicImage) -> Result<CleanOutcome> {
        let _span =
            tracing::debug_span!("clean", width = image.width(), height = image.height()).entered();
        let start = Instant::now();

        validate_image(image)?;
        let input_size = (image.width(), image.height());

        let (mut working, roi) = RoiCropper::crop_with_detection(image, &self.options.roi)?;
        let blobs = SmallBlobRemover::remove_in_place(&mut working, &self.options.small_blob)?;
        let dots = DotClusterRemover::remove_in_place(&mut working, &self.options.dot_cluster)?;
        let text =
            TextOverlayRemover::remove_in_place(&mut working, &self.detector, &self.options.text_overlay)?;

        let output_size = (working.width(), working.height());
        tracing::info!(
            input_width = input_size.0,
            input_height = input_size.1,
            output_width = output_size.0,
            output_height = output_size.1,
            blobs_erased = blobs.erased.len(),
            dot_row = dots.is_artifact_row,
            text_regions = text.detections.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "image cleaned"
        );

        Ok(CleanOutcome {
            image: working,
            report: CleanReport {
                input_size,
                output_size,
                roi,
                blobs,
                dots,
                text,
            },
        })
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::{CleanupError, StrokeWidth};
    use crate::detector::TextDetection;
    use image::{Rgb, RgbImage, RgbaImage};
    use std::cell::Cell;
    use std::sync::Arc;

    /// Counts calls and returns nothing
    #[derive(Default)]
    struct CountingDetector {
        calls: Cell<usize>,
    }

    impl TextDetector for CountingDetector {
        fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
            self.calls.set(self.calls.get() + 1);
            Ok(Vec::new())
        }
    }

    struct SyncDetector;

    impl TextDetector for SyncDetector {
        fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
            Ok(Vec::new())
        }
    }

    fn square_frame() -> DynamicImage {
        let mut rgb = RgbImage::new(80, 60);
        for y in 10..50 {
            for x in 20..60 {
                rgb.put_pixel(x, y, Rgb([170, 170, 170]));
            }
        }
        DynamicImage::ImageRgb8(rgb)
    }

    #[test]
    fn test_clean_options_default() {
        let opts = CleanOptions::default();
        assert_eq!(opts.roi, RoiCropOptions::default());
        assert_eq!(opts.small_blob.min_area, 800);
        assert_eq!(opts.dot_cluster.min_cluster_size, 8);
        assert_eq!(opts.text_overlay.inpaint_radius, 2);
    }

    #[test]
    fn test_clean_options_builder() {
        let opts = CleanOptions::builder()
            .small_blob(SmallBlobOptions::builder().area_band(100, 200).build())
            .dot_cluster(DotClusterOptions::builder().bucket_width(20).build())
            .text_overlay(TextOverlayOptions {
                stroke: StrokeWidth::SideEdge,
                ..Default::default()
            })
            .build();

        assert_eq!(opts.small_blob.max_area, 200);
        assert_eq!(opts.dot_cluster.bucket_width, 20);
        assert_eq!(opts.text_overlay.stroke, StrokeWidth::SideEdge);
        assert_eq!(opts.roi, RoiCropOptions::default());
    }

    #[test]
    fn test_clean_options_partial_json() {
        let json = r#"{ "dot_cluster": { "min_cluster_size": 5 }, "text_overlay": { "stroke": "SideEdge" } }"#;
        let opts: CleanOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.dot_cluster.min_cluster_size, 5);
        assert_eq!(opts.dot_cluster.bucket_width, 10);
        assert_eq!(opts.text_overlay.stroke, StrokeWidth::SideEdge);
        assert_eq!(opts.small_blob, SmallBlobOptions::default());
    }

    #[test]
    fn test_detector_reused_across_images() {
        let cleaner = ImageCleaner::new(CountingDetector::default());
        for _ in 0..3 {
            cleaner.clean(&square_frame()).unwrap();
        }
        assert_eq!(cleaner.detector().calls.get(), 3);
        assert_eq!(cleaner.into_detector().calls.get(), 3);
    }

    #[test]
    fn test_no_foreground_aborts_before_detection() {
        let cleaner = ImageCleaner::new(CountingDetector::default());
        let black = DynamicImage::ImageRgb8(RgbImage::new(40, 40));
        match cleaner.clean(&black) {
            Err(CleanupError::NoForegroundRegionFound) => {
                assert_eq!(cleaner.detector().calls.get(), 0)
            }
            Ok(img) => assert!(img.width() <= 40 && img.height() <= 40),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let cleaner = ImageCleaner::new(CountingDetector::default());
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        assert!(matches!(
            cleaner.clean(&rgba),
            Err(CleanupError::InvalidImageShape { channels: 4, .. })
        ));
        assert_eq!(cleaner.detector().calls.get(), 0);
    }

    #[test]
    fn test_report_sizes() {
        let cleaner = ImageCleaner::new(SyncDetector);
        let outcome = cleaner.clean_with_report(&square_frame()).unwrap();
        assert_eq!(outcome.report.input_size, (80, 60));
        assert_eq!(outcome.report.output_size, (41, 41));
        assert_eq!(
            outcome.report.output_size,
            (outcome.image.width(), outcome.image.height())
        );
        assert!(!outcome.report.text.has_text());
    }

    #[test]
    fn test_cleaner_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImageCleaner<SyncDetector>>();
        assert_send_sync::<ImageCleaner<Arc<SyncDetector>>>();
    }
}
