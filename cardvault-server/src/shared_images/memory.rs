//! In-memory shared image store (development fallback and tests).

use std::collections::HashMap;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use cardvault_core::{PublishOutcome, SharedImageInput, SharedImageRecord};

/// In-memory map of fingerprint -> record.
///
/// Uniqueness comes from the map's entry API: the vacant/occupied decision
/// and the insert happen under the shard lock, so racing publishers cannot
/// both create a record.
pub struct MemorySharedImages {
    records: DashMap<String, SharedImageRecord>,
}

impl MemorySharedImages {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn publish(&self, input: SharedImageInput) -> PublishOutcome {
        match self.records.entry(input.fingerprint.clone()) {
            Entry::Occupied(_) => PublishOutcome::AlreadyExists,
            Entry::Vacant(slot) => {
                slot.insert(SharedImageRecord {
                    id: Uuid::new_v4(),
                    fingerprint: input.fingerprint,
                    storage_key: input.storage_key,
                    image: input.image,
                    orientation: input.orientation,
                    slabbed: input.slabbed,
                    owner_id: input.owner_id,
                    created_at: Utc::now(),
                });
                PublishOutcome::Created
            }
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<SharedImageRecord> {
        self.records.get(fingerprint).map(|r| r.value().clone())
    }

    pub fn get_many(&self, fingerprints: &[String]) -> HashMap<String, SharedImageRecord> {
        fingerprints
            .iter()
            .filter_map(|fp| self.get(fp).map(|record| (fp.clone(), record)))
            .collect()
    }

    pub fn count(&self) -> i64 {
        self.records.len() as i64
    }
}

impl Default for MemorySharedImages {
    fn default() -> Self {
        Self::new()
    }
}
