//! Quota-bounded local image cache.
//!
//! Per-owner card photos and their thumbnails, stored in a size-limited
//! local blob store. When a write does not fit, the cache evicts existing
//! entries largest-first, retrying after each eviction: a handful of
//! oversized images are normally responsible for quota exhaustion, and
//! evicting many small entries to make room for one large one gives poor
//! user-perceived value.
//!
//! Full images and thumbnails live in separate namespaces; evicting from
//! one never touches the other. Capacity exhaustion is not an error, it is
//! reported through the return value so callers can degrade gracefully.

mod store;

pub use store::{BlobStore, MemoryBlobStore, QuotaExceeded};

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::thumbnail;

/// Identity of a single card belonging to a single collector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerKey {
    owner: String,
    card: String,
}

impl OwnerKey {
    pub fn new(owner: impl Into<String>, card: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            card: card.into(),
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.card)
    }
}

/// Result of deriving and storing a thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailWrite {
    /// The derived thumbnail payload, returned even when it was not stored.
    pub bytes: Vec<u8>,
    /// Whether the thumbnail made it into the cache.
    pub stored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Images,
    Thumbnails,
}

impl Namespace {
    fn prefix(self) -> &'static str {
        match self {
            Self::Images => "img",
            Self::Thumbnails => "thumb",
        }
    }
}

/// Local image cache over a quota-bounded blob store.
///
/// Alongside the blobs it keeps a small ordered index of key sizes per
/// namespace, so finding the largest entry to evict is an index lookup
/// rather than a store rescan.
pub struct ImageCache<S: BlobStore> {
    store: S,
    images: SizeIndex,
    thumbnails: SizeIndex,
    thumb_max_width: u32,
    thumb_max_height: u32,
}

/// Ordered key-size index for one namespace.
#[derive(Default)]
struct SizeIndex {
    by_size: BTreeSet<(usize, String)>,
    sizes: HashMap<String, usize>,
    total_bytes: usize,
}

impl SizeIndex {
    fn insert(&mut self, key: String, size: usize) {
        self.by_size.insert((size, key.clone()));
        self.sizes.insert(key, size);
        self.total_bytes += size;
    }

    fn remove(&mut self, key: &str) -> Option<usize> {
        let size = self.sizes.remove(key)?;
        self.by_size.remove(&(size, key.to_string()));
        self.total_bytes -= size;
        Some(size)
    }

    fn largest(&self) -> Option<(usize, String)> {
        self.by_size.iter().next_back().cloned()
    }

    fn clear(&mut self) {
        self.by_size.clear();
        self.sizes.clear();
        self.total_bytes = 0;
    }

    fn len(&self) -> usize {
        self.by_size.len()
    }
}

impl<S: BlobStore> ImageCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            images: SizeIndex::default(),
            thumbnails: SizeIndex::default(),
            thumb_max_width: thumbnail::MAX_THUMB_WIDTH,
            thumb_max_height: thumbnail::MAX_THUMB_HEIGHT,
        }
    }

    pub fn with_thumbnail_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.thumb_max_width = max_width;
        self.thumb_max_height = max_height;
        self
    }

    /// Store a card photo, replacing any existing entry for the key.
    ///
    /// Returns `true` when the payload was stored. Returns `false`, leaving
    /// the cache unchanged, when the payload could not fit even with every
    /// other image entry evicted.
    pub fn put(&mut self, key: &OwnerKey, image: &[u8]) -> bool {
        self.write(Namespace::Images, key, image)
    }

    /// Derive a thumbnail from `image` and store it under the same key.
    ///
    /// Thumbnail derivation failures (undecodable payload) are errors;
    /// capacity exhaustion is reported through [`ThumbnailWrite::stored`].
    pub fn put_thumbnail(&mut self, key: &OwnerKey, image: &[u8]) -> Result<ThumbnailWrite> {
        let bytes =
            thumbnail::generate_bounded(image, self.thumb_max_width, self.thumb_max_height)?;
        let stored = self.write(Namespace::Thumbnails, key, &bytes);
        Ok(ThumbnailWrite { bytes, stored })
    }

    pub fn get(&self, key: &OwnerKey) -> Option<Vec<u8>> {
        self.store.get(&blob_key(Namespace::Images, key))
    }

    pub fn get_thumbnail(&self, key: &OwnerKey) -> Option<Vec<u8>> {
        self.store.get(&blob_key(Namespace::Thumbnails, key))
    }

    /// Delete the image and thumbnail entries for a key. Idempotent.
    pub fn remove(&mut self, key: &OwnerKey) {
        self.remove_entry(Namespace::Images, key);
        self.remove_entry(Namespace::Thumbnails, key);
    }

    /// Bulk-replace the entire store with `next` (backup restore).
    ///
    /// The incoming entries are subject to the same largest-first overflow
    /// policy: when they exceed capacity, the largest incoming payloads are
    /// the ones dropped. Thumbnails are cleared rather than carried over,
    /// since restored payloads invalidate previously derived ones; callers
    /// regenerate them on demand.
    ///
    /// Returns `false` when any incoming entry had to be dropped, so the
    /// caller can warn the user.
    pub fn replace_all<I>(&mut self, next: I) -> bool
    where
        I: IntoIterator<Item = (OwnerKey, Vec<u8>)>,
    {
        self.store.clear();
        self.images.clear();
        self.thumbnails.clear();

        let mut entries: Vec<(OwnerKey, Vec<u8>)> = next.into_iter().collect();
        entries.sort_by(|a, b| (a.1.len(), &a.0).cmp(&(b.1.len(), &b.0)));

        let mut all_stored = true;
        for (key, image) in entries {
            if !self.insert_indexed(Namespace::Images, &key, &image) {
                tracing::debug!(key = %key, size = image.len(), "dropped entry during bulk restore");
                all_stored = false;
            }
        }
        all_stored
    }

    pub fn used_bytes(&self) -> usize {
        self.store.used_bytes()
    }

    pub fn capacity_bytes(&self) -> usize {
        self.store.capacity_bytes()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    fn index(&mut self, ns: Namespace) -> &mut SizeIndex {
        match ns {
            Namespace::Images => &mut self.images,
            Namespace::Thumbnails => &mut self.thumbnails,
        }
    }

    fn namespace_bytes(&self, ns: Namespace) -> usize {
        match ns {
            Namespace::Images => self.images.total_bytes,
            Namespace::Thumbnails => self.thumbnails.total_bytes,
        }
    }

    /// Evict-and-retry write into one namespace.
    fn write(&mut self, ns: Namespace, key: &OwnerKey, bytes: &[u8]) -> bool {
        // Everything outside this namespace is off-limits to eviction, so
        // the payload can only ever fit if it fits beside it. Checking up
        // front keeps a doomed write from evicting anything.
        let untouchable = self.store.used_bytes() - self.namespace_bytes(ns);
        if bytes.len() + untouchable > self.store.capacity_bytes() {
            tracing::warn!(
                key = %key,
                size = bytes.len(),
                capacity = self.store.capacity_bytes(),
                "write abandoned: payload cannot fit even after full eviction"
            );
            return false;
        }

        self.remove_entry(ns, key);

        let full_key = blob_key(ns, key);
        loop {
            match self.store.try_put(&full_key, bytes) {
                Ok(()) => {
                    self.index(ns).insert(key.to_string(), bytes.len());
                    return true;
                }
                Err(QuotaExceeded) => {
                    let Some((size, victim)) = self.index(ns).largest() else {
                        // Unreachable given the precheck; abandon rather
                        // than spin.
                        tracing::warn!(key = %key, "write abandoned: no entries left to evict");
                        return false;
                    };
                    self.index(ns).remove(&victim);
                    self.store.remove(&format!("{}/{}", ns.prefix(), victim));
                    tracing::debug!(
                        namespace = ns.prefix(),
                        key = %victim,
                        size,
                        "evicted largest entry to free quota"
                    );
                }
            }
        }
    }

    /// Plain indexed insert with no eviction (bulk restore path).
    fn insert_indexed(&mut self, ns: Namespace, key: &OwnerKey, bytes: &[u8]) -> bool {
        self.remove_entry(ns, key);
        match self.store.try_put(&blob_key(ns, key), bytes) {
            Ok(()) => {
                self.index(ns).insert(key.to_string(), bytes.len());
                true
            }
            Err(QuotaExceeded) => false,
        }
    }

    fn remove_entry(&mut self, ns: Namespace, key: &OwnerKey) {
        if self.index(ns).remove(&key.to_string()).is_some() {
            self.store.remove(&blob_key(ns, key));
        }
    }
}

impl ImageCache<MemoryBlobStore> {
    /// Convenience constructor over the in-memory store.
    pub fn in_memory(capacity_bytes: usize) -> Self {
        Self::new(MemoryBlobStore::new(capacity_bytes))
    }
}

fn blob_key(ns: Namespace, key: &OwnerKey) -> String {
    format!("{}/{}", ns.prefix(), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn key(card: &str) -> OwnerKey {
        OwnerKey::new("collector-1", card)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([10, 90, 170]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_put_get_roundtrip() {
        let mut cache = ImageCache::in_memory(100);
        assert!(cache.put(&key("a"), b"payload"));
        assert_eq!(cache.get(&key("a")).as_deref(), Some(b"payload".as_slice()));
        assert!(cache.get(&key("b")).is_none());
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let mut cache = ImageCache::in_memory(100);
        assert!(cache.put(&key("a"), &[1u8; 40]));
        assert!(cache.put(&key("a"), &[2u8; 60]));

        assert_eq!(cache.get(&key("a")).as_deref(), Some([2u8; 60].as_slice()));
        assert_eq!(cache.used_bytes(), 60);
        assert_eq!(cache.image_count(), 1);
    }

    #[test]
    fn test_evicts_largest_entry_first() {
        let mut cache = ImageCache::in_memory(18);
        assert!(cache.put(&key("big"), &[0u8; 10]));
        assert!(cache.put(&key("mid"), &[0u8; 5]));
        assert!(cache.put(&key("small"), &[0u8; 3]));

        // At capacity; a 6-byte write must evict only the 10-byte entry.
        assert!(cache.put(&key("new"), &[0u8; 6]));

        assert!(cache.get(&key("big")).is_none());
        assert!(cache.get(&key("mid")).is_some());
        assert!(cache.get(&key("small")).is_some());
        assert!(cache.get(&key("new")).is_some());
    }

    #[test]
    fn test_evicts_repeatedly_until_write_fits() {
        let mut cache = ImageCache::in_memory(12);
        assert!(cache.put(&key("a"), &[0u8; 6]));
        assert!(cache.put(&key("b"), &[0u8; 5]));

        assert!(cache.put(&key("c"), &[0u8; 11]));

        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn test_oversized_write_leaves_cache_unchanged() {
        let mut cache = ImageCache::in_memory(10);
        assert!(cache.put(&key("a"), &[0u8; 4]));
        assert!(cache.put(&key("b"), &[0u8; 4]));

        assert!(!cache.put(&key("huge"), &[0u8; 12]));

        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("huge")).is_none());
        assert_eq!(cache.used_bytes(), 8);
    }

    #[test]
    fn test_remove_deletes_image_and_thumbnail_and_is_idempotent() {
        let mut cache = ImageCache::in_memory(200_000);
        let image = png(400, 560);
        assert!(cache.put(&key("a"), &image));
        cache.put_thumbnail(&key("a"), &image).unwrap();

        cache.remove(&key("a"));
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get_thumbnail(&key("a")).is_none());
        assert_eq!(cache.used_bytes(), 0);

        cache.remove(&key("a"));
    }

    #[test]
    fn test_thumbnail_roundtrip() {
        let mut cache = ImageCache::in_memory(500_000);
        let image = png(720, 960);

        let write = cache.put_thumbnail(&key("a"), &image).unwrap();
        assert!(write.stored);
        assert_eq!(cache.get_thumbnail(&key("a")).unwrap(), write.bytes);

        let thumb = image::load_from_memory(&write.bytes).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (360, 480));
    }

    #[test]
    fn test_thumbnail_overflow_never_evicts_images() {
        let image = png(720, 960);
        let thumb_size = crate::thumbnail::generate(&image).unwrap().len();

        // Room for the image plus half a thumbnail: the thumbnail write
        // must fail without touching the image namespace.
        let mut cache = ImageCache::in_memory(image.len() + thumb_size / 2);
        assert!(cache.put(&key("a"), &image));

        let write = cache.put_thumbnail(&key("a"), &image).unwrap();
        assert!(!write.stored);
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get_thumbnail(&key("a")).is_none());
    }

    #[test]
    fn test_undecodable_thumbnail_input_is_an_error() {
        let mut cache = ImageCache::in_memory(1000);
        assert!(cache.put_thumbnail(&key("a"), b"junk").is_err());
    }

    #[test]
    fn test_replace_all_within_capacity() {
        let mut cache = ImageCache::in_memory(100);
        assert!(cache.put(&key("old"), &[0u8; 50]));

        let ok = cache.replace_all(vec![
            (key("a"), vec![1u8; 20]),
            (key("b"), vec![2u8; 30]),
        ]);

        assert!(ok);
        assert!(cache.get(&key("old")).is_none());
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_some());
    }

    #[test]
    fn test_replace_all_drops_largest_on_overflow() {
        let mut cache = ImageCache::in_memory(10);

        let ok = cache.replace_all(vec![
            (key("small"), vec![0u8; 3]),
            (key("mid"), vec![0u8; 5]),
            (key("big"), vec![0u8; 8]),
        ]);

        assert!(!ok);
        assert!(cache.get(&key("small")).is_some());
        assert!(cache.get(&key("mid")).is_some());
        assert!(cache.get(&key("big")).is_none());
    }

    #[test]
    fn test_replace_all_clears_thumbnails() {
        let mut cache = ImageCache::in_memory(500_000);
        let image = png(400, 560);
        assert!(cache.put(&key("a"), &image));
        cache.put_thumbnail(&key("a"), &image).unwrap();

        assert!(cache.replace_all(vec![(key("a"), image)]));
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get_thumbnail(&key("a")).is_none());
    }
}
