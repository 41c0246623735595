//! Cleanup stages for ultrasound / X-ray frames
//!
//! # Features
//!
//! - **ROI Crop** ([`roi_crop`]) - Crop to the largest foreground region
//! - **Small Blobs** ([`small_blob`]) - Black out stamped letter markers
//! - **Dot Cluster** ([`dot_cluster`]) - Inpaint a column of bright depth dots
//! - **Text Overlay** ([`text_overlay`]) - Inpaint OCR-detected annotations
//! - **Inpaint** ([`inpaint`]) - Fast-marching smooth infill shared by the above
//!
//! Each stage can run on its own; [`crate::ImageCleaner`] chains them.

pub mod dot_cluster;
pub mod inpaint;
pub mod roi_crop;
pub mod small_blob;
pub mod text_overlay;
mod types;

// Re-export public API
pub use dot_cluster::{
    DotClusterDetection, DotClusterOptions, DotClusterOptionsBuilder, DotClusterRemover,
};
pub use inpaint::inpaint_telea;
pub use roi_crop::{RoiCropOptions, RoiCropper, RoiDetection};
pub use small_blob::{
    BlobRemovalResult, SmallBlobOptions, SmallBlobOptionsBuilder, SmallBlobRemover,
};
pub use text_overlay::{StrokeWidth, TextOverlayOptions, TextOverlayRemover, TextRemovalResult};

pub use types::{validate_image, CleanupError, Result};
