//! Thumbnail derivation.
//!
//! Produces a bounded-dimension, re-encoded copy of a card image for list
//! views. Downscale only: an image already inside the bounds is re-encoded
//! at its native size, never stretched up.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::{CardvaultError, Result};

/// Logical pixel bounds for thumbnails.
pub const MAX_THUMB_WIDTH: u32 = 360;
pub const MAX_THUMB_HEIGHT: u32 = 480;

/// JPEG quality for re-encoded thumbnails.
const THUMBNAIL_QUALITY: u8 = 80;

/// Derive a thumbnail with the default bounds.
pub fn generate(image_bytes: &[u8]) -> Result<Vec<u8>> {
    generate_bounded(image_bytes, MAX_THUMB_WIDTH, MAX_THUMB_HEIGHT)
}

/// Derive a thumbnail fitting within `max_width` x `max_height`.
///
/// Aspect ratio is preserved; the image is scaled by the tighter of the two
/// bounds. Output is always JPEG regardless of the input format.
pub fn generate_bounded(image_bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| CardvaultError::ImageDecode(e.to_string()))?;

    let img = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = img.to_rgb8();
    let mut bytes = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut bytes, THUMBNAIL_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CardvaultError::ThumbnailEncode(e.to_string()))?;

    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([200, 180, 40]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_downscales_to_bounds() {
        let thumb = generate(&encode_png(720, 960)).unwrap();
        assert_eq!(dimensions(&thumb), (360, 480));
    }

    #[test]
    fn test_preserves_aspect_ratio() {
        // Wide image: width bound binds first, height scales with it.
        let thumb = generate(&encode_png(1000, 500)).unwrap();
        assert_eq!(dimensions(&thumb), (360, 180));
    }

    #[test]
    fn test_never_upscales() {
        let thumb = generate(&encode_png(120, 160)).unwrap();
        assert_eq!(dimensions(&thumb), (120, 160));
    }

    #[test]
    fn test_reencodes_as_jpeg() {
        let thumb = generate(&encode_png(400, 560)).unwrap();
        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_rejects_undecodable_input() {
        let err = generate(b"not an image").unwrap_err();
        assert!(matches!(err, CardvaultError::ImageDecode(_)));
    }
}
