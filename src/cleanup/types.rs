//! Common types for the cleanup module

use image::DynamicImage;
use thiserror::Error;

/// Cleanup error types
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("No foreground region found")]
    NoForegroundRegionFound,

    #[error("Text detection failed: {0}")]
    DetectionFailed(String),

    #[error("Invalid image shape: {width}x{height} with {channels} channel(s)")]
    InvalidImageShape {
        width: u32,
        height: u32,
        channels: u8,
    },

    #[error("Mask is {mask_width}x{mask_height} but image is {width}x{height}")]
    InvalidMask {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
}

pub type Result<T> = std::result::Result<T, CleanupError>;

/// Reject images every stage would choke on
///
/// Accepted: non-empty 8-bit grayscale (1 channel) or 8-bit RGB (3 channels).
pub fn validate_image(image: &DynamicImage) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    let channels = image.color().channel_count();
    let supported = matches!(
        image,
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)
    );

    if width == 0 || height == 0 || !supported {
        return Err(CleanupError::InvalidImageShape {
            width,
            height,
            channels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage, RgbaImage};

    #[test]
    fn test_validate_accepts_luma_and_rgb() {
        assert!(validate_image(&DynamicImage::ImageLuma8(GrayImage::new(3, 2))).is_ok());
        assert!(validate_image(&DynamicImage::ImageRgb8(RgbImage::new(3, 2))).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_area() {
        let result = validate_image(&DynamicImage::ImageRgb8(RgbImage::new(0, 5)));
        assert!(matches!(
            result,
            Err(CleanupError::InvalidImageShape {
                width: 0,
                height: 5,
                channels: 3
            })
        ));
    }

    #[test]
    fn test_validate_rejects_four_channels() {
        let result = validate_image(&DynamicImage::ImageRgba8(RgbaImage::new(4, 4)));
        assert!(matches!(
            result,
            Err(CleanupError::InvalidImageShape { channels: 4, .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CleanupError::NoForegroundRegionFound.to_string(),
            "No foreground region found"
        );
        assert_eq!(
            CleanupError::DetectionFailed("model offline".into()).to_string(),
            "Text detection failed: model offline"
        );
    }
}
