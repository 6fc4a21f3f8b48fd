use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardvaultError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Image too large: {size} bytes exceeds maximum of {max} bytes")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Image too small: {width}x{height} is below minimum of {min_width}x{min_height}")]
    ImageTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    #[error("Thumbnail encode error: {0}")]
    ThumbnailEncode(String),

    #[error("Fingerprint is empty: no card attributes provided")]
    EmptyFingerprint,
}

pub type Result<T> = std::result::Result<T, CardvaultError>;
