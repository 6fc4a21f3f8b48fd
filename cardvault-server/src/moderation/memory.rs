//! In-memory moderation store (development fallback and tests).

use std::collections::HashMap;

use chrono::Utc;
use dashmap::DashMap;

use cardvault_core::{ModerationRecord, ModerationStatus, ReportReason};

/// In-memory map of fingerprint -> moderation record.
///
/// Mutations go through the map's entry API, so each increment is a
/// read-modify-write under the shard lock and concurrent reports are both
/// counted.
pub struct MemoryModerationStore {
    records: DashMap<String, ModerationRecord>,
}

impl MemoryModerationStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn report(&self, fingerprint: &str, reason: ReportReason) -> ModerationRecord {
        let now = Utc::now();
        let mut entry = self
            .records
            .entry(fingerprint.to_string())
            .or_insert_with(|| ModerationRecord::new(fingerprint, now));

        entry.report_count += 1;
        *entry.reasons.entry(reason.label().to_string()).or_insert(0) += 1;
        entry.updated_at = now;
        entry.clone()
    }

    pub fn transition(
        &self,
        fingerprint: &str,
        status: ModerationStatus,
        reset_counts: bool,
    ) -> ModerationRecord {
        let now = Utc::now();
        let mut entry = self
            .records
            .entry(fingerprint.to_string())
            .or_insert_with(|| ModerationRecord::new(fingerprint, now));

        entry.status = status;
        if reset_counts {
            entry.report_count = 0;
            entry.reasons.clear();
        }
        entry.updated_at = now;
        entry.clone()
    }

    pub fn get(&self, fingerprint: &str) -> Option<ModerationRecord> {
        self.records.get(fingerprint).map(|r| r.value().clone())
    }

    pub fn get_many(&self, fingerprints: &[String]) -> HashMap<String, ModerationRecord> {
        fingerprints
            .iter()
            .filter_map(|fp| self.get(fp).map(|record| (fp.clone(), record)))
            .collect()
    }

    pub fn list(&self) -> Vec<ModerationRecord> {
        let mut records: Vec<ModerationRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records
    }
}

impl Default for MemoryModerationStore {
    fn default() -> Self {
        Self::new()
    }
}
