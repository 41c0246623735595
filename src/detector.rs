//! Text detector interface
//!
//! The OCR model that finds text overlays lives outside this crate. The
//! cleanup pipeline only needs the quadrilateral around each text instance,
//! so the seam is a single `detect` call.
//!
//! # Example
//!
//! ```rust
//! use image::DynamicImage;
//! use lus_preprocess::{QuadPoint, TextDetection, TextDetector};
//!
//! struct FixedDetector(Vec<TextDetection>);
//!
//! impl TextDetector for FixedDetector {
//!     fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! let detector = FixedDetector(vec![TextDetection::from_rect("L1", 10.0, 10.0, 50.0, 20.0)]);
//! let found = detector.detect(&DynamicImage::new_rgb8(64, 64)).unwrap();
//! assert_eq!(found[0].quad[2], QuadPoint::new(50.0, 20.0));
//! ```

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A corner of a detected text quadrilateral
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadPoint {
    pub x: f32,
    pub y: f32,
}

impl QuadPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &QuadPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Midpoint with both coordinates truncated to whole pixels
    pub fn pixel_midpoint(&self, other: &QuadPoint) -> (i32, i32) {
        (
            ((self.x + other.x) / 2.0) as i32,
            ((self.y + other.y) / 2.0) as i32,
        )
    }
}

/// One detected text instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDetection {
    /// Recognized string (not used by the cleanup stages)
    pub text: String,

    /// Corners, conventionally top-left, top-right, bottom-right, bottom-left
    pub quad: [QuadPoint; 4],
}

impl TextDetection {
    pub fn new(text: impl Into<String>, quad: [QuadPoint; 4]) -> Self {
        Self {
            text: text.into(),
            quad,
        }
    }

    /// Axis-aligned detection spanning `(x1, y1)` to `(x2, y2)`
    pub fn from_rect(text: impl Into<String>, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(
            text,
            [
                QuadPoint::new(x1, y1),
                QuadPoint::new(x2, y1),
                QuadPoint::new(x2, y2),
                QuadPoint::new(x1, y2),
            ],
        )
    }

    pub fn top_left(&self) -> QuadPoint {
        self.quad[0]
    }

    pub fn top_right(&self) -> QuadPoint {
        self.quad[1]
    }

    pub fn bottom_right(&self) -> QuadPoint {
        self.quad[2]
    }

    pub fn bottom_left(&self) -> QuadPoint {
        self.quad[3]
    }

    /// Whether every corner coordinate is a finite number
    pub fn is_finite(&self) -> bool {
        self.quad.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Copy with every corner coordinate clamped to `[-limit, limit]`
    pub fn clamped(&self, limit: f32) -> Self {
        let mut quad = self.quad;
        for p in &mut quad {
            p.x = p.x.clamp(-limit, limit);
            p.y = p.y.clamp(-limit, limit);
        }
        Self {
            text: self.text.clone(),
            quad,
        }
    }
}

/// Text detection and recognition capability
///
/// Implementations may resize or normalize internally. Any error is reported
/// to the pipeline as [`CleanupError::DetectionFailed`](crate::CleanupError).
pub trait TextDetector {
    /// Detect text instances in `image` (possibly none)
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>>;
}

impl<T: TextDetector + ?Sized> TextDetector for &T {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
        (**self).detect(image)
    }
}

impl<T: TextDetector + ?Sized> TextDetector for Box<T> {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
        (**self).detect(image)
    }
}

impl<T: TextDetector + ?Sized> TextDetector for Arc<T> {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
        (**self).detect(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl TextDetector for Failing {
        fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
            anyhow::bail!("unsupported input shape")
        }
    }

    #[test]
    fn test_from_rect_corner_order() {
        let det = TextDetection::from_rect("12 cm", 1.0, 2.0, 41.0, 12.0);
        assert_eq!(det.top_left(), QuadPoint::new(1.0, 2.0));
        assert_eq!(det.top_right(), QuadPoint::new(41.0, 2.0));
        assert_eq!(det.bottom_right(), QuadPoint::new(41.0, 12.0));
        assert_eq!(det.bottom_left(), QuadPoint::new(1.0, 12.0));
    }

    #[test]
    fn test_distance() {
        let a = QuadPoint::new(0.0, 0.0);
        let b = QuadPoint::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_midpoint_truncates() {
        let a = QuadPoint::new(10.0, 3.0);
        let b = QuadPoint::new(15.0, 8.0);
        assert_eq!(a.pixel_midpoint(&b), (12, 5));
    }

    #[test]
    fn test_is_finite() {
        assert!(TextDetection::from_rect("", 0.0, 0.0, 4.0, 2.0).is_finite());
        assert!(!TextDetection::from_rect("", f32::NAN, 0.0, 4.0, 2.0).is_finite());
        assert!(!TextDetection::from_rect("", 0.0, 0.0, f32::INFINITY, 2.0).is_finite());
    }

    #[test]
    fn test_clamped_limits_every_corner() {
        let det = TextDetection::from_rect("far", -3.0e9, 5.0, 20.0, 2.2e9);
        let clamped = det.clamped(240.0);
        assert_eq!(clamped.top_left(), QuadPoint::new(-240.0, 5.0));
        assert_eq!(clamped.bottom_right(), QuadPoint::new(20.0, 240.0));
        assert_eq!(clamped.text, "far");
    }

    #[test]
    fn test_boxed_and_shared_detectors_delegate() {
        let image = DynamicImage::new_luma8(4, 4);

        let boxed: Box<dyn TextDetector> = Box::new(Failing);
        assert!(boxed.detect(&image).is_err());

        let shared = Arc::new(Failing);
        assert!(shared.detect(&image).is_err());
    }
}
