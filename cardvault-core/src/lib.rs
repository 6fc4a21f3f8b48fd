//! Cardvault Core - card image identity, caching and moderation primitives
//!
//! This crate provides the client-side building blocks for attaching
//! photographic evidence to catalog cards:
//!
//! - Deterministic card fingerprints used as the dedup/moderation join key
//! - A quota-bounded local image cache with largest-first eviction
//! - Image acceptance policy (format allow-list, byte ceiling, minimum
//!   dimensions) enforced before anything is stored
//! - Thumbnail derivation (aspect-preserving, downscale only)
//! - Shared-image and moderation record types, including the single
//!   hide-decision function every rendering surface must use
//!
//! # Example
//!
//! ```
//! use cardvault_core::{CardAttributes, Fingerprint, ImageCache, OwnerKey};
//!
//! let fingerprint = Fingerprint::build(&CardAttributes {
//!     year: "1989".into(),
//!     set_name: "Upper Deck".into(),
//!     card_number: "1".into(),
//!     player: "Ken Griffey Jr.".into(),
//!     ..CardAttributes::default()
//! });
//! assert!(!fingerprint.is_empty());
//!
//! let mut cache = ImageCache::in_memory(64 * 1024);
//! let key = OwnerKey::new("collector-7", "card-42");
//! assert!(cache.put(&key, b"encoded image bytes"));
//! assert!(cache.get(&key).is_some());
//! ```

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod moderation;
pub mod policy;
pub mod shared;
pub mod thumbnail;

// Re-export main types for convenience
pub use cache::{BlobStore, ImageCache, MemoryBlobStore, OwnerKey, QuotaExceeded, ThumbnailWrite};
pub use error::{CardvaultError, Result};
pub use fingerprint::{CardAttributes, Fingerprint};
pub use moderation::{
    is_hidden, ModerationRecord, ModerationStatus, ReportOutcome, ReportReason,
    DEFAULT_HIDE_THRESHOLD,
};
pub use policy::{ImageInfo, ImagePolicy};
pub use shared::{Orientation, PublishOutcome, SharedImageInput, SharedImageRecord};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([60, 110, 20]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    /// Owner-side workflow: validate an upload, cache it, derive and cache
    /// a thumbnail, then drop the card.
    #[test]
    fn test_full_owner_image_workflow() {
        let image = sample_png(640, 880);

        let info = ImagePolicy::default().validate(&image).expect("policy");
        assert_eq!(info.format, ImageFormat::Png);

        let mut cache = ImageCache::in_memory(2 * 1024 * 1024);
        let key = OwnerKey::new("collector-7", "card-42");

        assert!(cache.put(&key, &image));
        let write = cache.put_thumbnail(&key, &image).expect("thumbnail");
        assert!(write.stored);

        assert_eq!(cache.get(&key).unwrap(), image);
        assert_eq!(cache.get_thumbnail(&key).unwrap(), write.bytes);

        cache.remove(&key);
        assert!(cache.get(&key).is_none());
        assert!(cache.get_thumbnail(&key).is_none());
    }

    /// The fingerprint ties the whole pipeline together: identical cards
    /// from different collectors converge on one identity and one storage
    /// key.
    #[test]
    fn test_identical_cards_converge_on_one_identity() {
        let a = Fingerprint::build(&CardAttributes {
            year: "1952".into(),
            set_name: "Topps".into(),
            card_number: "311".into(),
            player: "Mickey Mantle".into(),
            team: "Yankees".into(),
            ..CardAttributes::default()
        });
        let b = Fingerprint::build(&CardAttributes {
            year: " 1952 ".into(),
            set_name: "TOPPS".into(),
            card_number: "311".into(),
            player: "mickey mantle".into(),
            team: "YANKEES ".into(),
            ..CardAttributes::default()
        });

        assert_eq!(a, b);
        assert_eq!(a.storage_key(), b.storage_key());
    }
}
