//! Morphology toolkit shared by every cleanup stage
//!
//! # Features
//!
//! - **Channel extraction** ([`threshold`]) - grayscale, perceptual lightness
//! - **Binarization** ([`threshold`]) - Otsu and fixed thresholds
//! - **Structuring elements** ([`kernel`]) - rectangular dilate / erode / close
//! - **Components** ([`components`]) - external connected components with
//!   bounding boxes and pixel areas
//!
//! All operations are deterministic functions of pixel content.

pub mod components;
pub mod kernel;
pub mod threshold;

pub use components::{find_external_components, BoundingBox, ComponentRecord};
pub use kernel::{close, close_then_dilate, dilate, erode, StructuringElement};
pub use threshold::{
    otsu_binarize, threshold_above, to_grayscale, to_lightness, BACKGROUND, FOREGROUND,
};
