//! # lus-preprocess
//!
//! Artifact removal and region-of-interest cropping for lung ultrasound and
//! chest X-ray frames.
//!
//! Frames exported from clinical devices carry burned-in clutter that a
//! downstream classifier would otherwise learn from: a black border around
//! the scan cone, stamped letter markers, a column of depth-scale dots, and
//! text annotations. [`ImageCleaner`] removes them in four stages:
//!
//! 1. [`RoiCropper`] - crop to the largest foreground region
//! 2. [`SmallBlobRemover`] - black out marker-sized blobs
//! 3. [`DotClusterRemover`] - inpaint a vertical column of bright dots
//! 4. [`TextOverlayRemover`] - inpaint regions found by a [`TextDetector`]
//!
//! Text detection is an injected dependency: implement [`TextDetector`] for
//! whatever OCR model is available and hand it to the cleaner once.
//!
//! ## Quick Start
//!
//! ```rust
//! use image::DynamicImage;
//! use lus_preprocess::{CleanOptions, ImageCleaner, TextDetection, TextDetector};
//!
//! struct NoText;
//!
//! impl TextDetector for NoText {
//!     fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let cleaner = ImageCleaner::with_options(NoText, CleanOptions::default());
//! # let _ = cleaner;
//! ```

pub mod cleanup;
pub mod detector;
pub mod morphology;
pub mod pipeline;

// Re-exports for convenience
pub use cleanup::{
    inpaint_telea, BlobRemovalResult, CleanupError, DotClusterDetection, DotClusterOptions,
    DotClusterOptionsBuilder, DotClusterRemover, Result, RoiCropOptions, RoiCropper,
    RoiDetection, SmallBlobOptions, SmallBlobOptionsBuilder, SmallBlobRemover, StrokeWidth,
    TextOverlayOptions, TextOverlayRemover, TextRemovalResult,
};
pub use detector::{QuadPoint, TextDetection, TextDetector};
pub use morphology::{BoundingBox, ComponentRecord, StructuringElement};
pub use pipeline::{CleanOptions, CleanOptionsBuilder, CleanOutcome, CleanReport, ImageCleaner};
