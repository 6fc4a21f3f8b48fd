//! Image acceptance policy.
//!
//! Every image is checked against this policy before it enters the local
//! cache or the shared repository: format allow-list, byte ceiling and
//! minimum dimensions. Violations surface synchronously, before any store
//! is touched.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::{CardvaultError, Result};

/// Default payload ceiling (10 MB).
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Default minimum dimensions in pixels.
pub const DEFAULT_MIN_WIDTH: u32 = 200;
pub const DEFAULT_MIN_HEIGHT: u32 = 200;

/// Formats accepted by default. GIF decodes fine but is not a useful card
/// scan format, so it stays off the list.
pub const DEFAULT_FORMATS: &[ImageFormat] =
    &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Acceptance policy for incoming card images.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    /// Maximum encoded payload size in bytes.
    pub max_bytes: usize,
    /// Minimum pixel width.
    pub min_width: u32,
    /// Minimum pixel height.
    pub min_height: u32,
    /// Allowed encoded formats.
    pub allowed_formats: Vec<ImageFormat>,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            allowed_formats: DEFAULT_FORMATS.to_vec(),
        }
    }
}

/// Facts about an accepted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub size: usize,
}

impl ImagePolicy {
    /// Check an encoded payload against the policy.
    ///
    /// Checks run cheapest-first: byte ceiling, then format sniffing from
    /// the payload header, then dimensions (read from the header without a
    /// full pixel decode).
    pub fn validate(&self, bytes: &[u8]) -> Result<ImageInfo> {
        if bytes.len() > self.max_bytes {
            return Err(CardvaultError::ImageTooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let format = image::guess_format(bytes).map_err(|_| {
            CardvaultError::UnsupportedFormat("unrecognized image data".to_string())
        })?;

        if !self.allowed_formats.contains(&format) {
            return Err(CardvaultError::UnsupportedFormat(format!(
                "{format:?} is not an accepted format"
            )));
        }

        let reader = ImageReader::with_format(Cursor::new(bytes), format);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CardvaultError::ImageDecode(e.to_string()))?;

        if width < self.min_width || height < self.min_height {
            return Err(CardvaultError::ImageTooSmall {
                width,
                height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }

        Ok(ImageInfo {
            format,
            width,
            height,
            size: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([120, 60, 30]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, format)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_accepts_valid_png() {
        let bytes = encode(320, 440, ImageFormat::Png);
        let info = ImagePolicy::default().validate(&bytes).unwrap();

        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!((info.width, info.height), (320, 440));
        assert_eq!(info.size, bytes.len());
    }

    #[test]
    fn test_rejects_format_off_the_allow_list() {
        let bytes = encode(320, 440, ImageFormat::Gif);
        let err = ImagePolicy::default().validate(&bytes).unwrap_err();
        assert!(matches!(err, CardvaultError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_unrecognized_data() {
        let err = ImagePolicy::default()
            .validate(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, CardvaultError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_payload_over_byte_ceiling() {
        let bytes = encode(320, 440, ImageFormat::Png);
        let policy = ImagePolicy {
            max_bytes: bytes.len() - 1,
            ..ImagePolicy::default()
        };

        let err = policy.validate(&bytes).unwrap_err();
        assert!(matches!(err, CardvaultError::ImageTooLarge { .. }));
    }

    #[test]
    fn test_rejects_undersized_dimensions() {
        let bytes = encode(150, 440, ImageFormat::Png);
        let err = ImagePolicy::default().validate(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CardvaultError::ImageTooSmall {
                width: 150,
                height: 440,
                ..
            }
        ));
    }

    #[test]
    fn test_exact_minimums_pass() {
        let bytes = encode(DEFAULT_MIN_WIDTH, DEFAULT_MIN_HEIGHT, ImageFormat::Png);
        assert!(ImagePolicy::default().validate(&bytes).is_ok());
    }
}
