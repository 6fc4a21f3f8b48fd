//! Blob storage underneath the local image cache.
//!
//! The cache drives eviction; the store only has to enforce its byte quota
//! and signal capacity exhaustion on writes.

use std::collections::HashMap;

/// Capacity signal returned by a store write that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExceeded;

/// A local, size-quota-limited key-value store.
///
/// Writes replace any existing value under the key. A write that would push
/// the store past its quota must leave the store unchanged and return
/// [`QuotaExceeded`]; lookups and removals never fail.
pub trait BlobStore {
    fn try_put(&mut self, key: &str, bytes: &[u8]) -> Result<(), QuotaExceeded>;
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn remove(&mut self, key: &str);
    fn clear(&mut self);
    fn used_bytes(&self) -> usize;
    fn capacity_bytes(&self) -> usize;
}

/// In-memory quota-bounded store.
pub struct MemoryBlobStore {
    capacity: usize,
    used: usize,
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            entries: HashMap::new(),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn try_put(&mut self, key: &str, bytes: &[u8]) -> Result<(), QuotaExceeded> {
        let existing = self.entries.get(key).map(|v| v.len()).unwrap_or(0);
        let used_without = self.used - existing;

        if used_without + bytes.len() > self.capacity {
            return Err(QuotaExceeded);
        }

        self.entries.insert(key.to_string(), bytes.to_vec());
        self.used = used_without + bytes.len();
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn remove(&mut self, key: &str) {
        if let Some(value) = self.entries.remove(key) {
            self.used -= value.len();
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.used = 0;
    }

    fn used_bytes(&self) -> usize {
        self.used
    }

    fn capacity_bytes(&self) -> usize {
        self.capacity
    }
}
