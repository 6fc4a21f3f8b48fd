//! Moderation ledger.
//!
//! Accumulates viewer reports against shared-image fingerprints and holds
//! the administrator state machine (`active` / `blocked` / `approved`).
//! Reports only ever increment; status changes come from explicit admin
//! actions. Visibility is always computed with
//! [`cardvault_core::is_hidden`] and the ledger's configured threshold.
//!
//! The ledger is a global multi-writer resource: every mutation is an
//! atomic increment or upsert against the persisted record, never a
//! client-computed absolute value, so near-simultaneous reports from
//! independent clients are both reflected.

mod memory;
mod postgres;

pub use memory::MemoryModerationStore;
pub use postgres::PostgresModerationStore;

use std::collections::HashMap;

use sqlx::PgPool;

use cardvault_core::{is_hidden, ModerationRecord, ModerationStatus, ReportOutcome, ReportReason};

use crate::db::StoreError;

enum ModerationBackend {
    Postgres(PostgresModerationStore),
    Memory(MemoryModerationStore),
}

/// Report ledger with the configured hide threshold.
pub struct ModerationLedger {
    backend: ModerationBackend,
    hide_threshold: u32,
}

impl ModerationLedger {
    pub fn with_postgres(pool: PgPool, hide_threshold: u32) -> Self {
        Self {
            backend: ModerationBackend::Postgres(PostgresModerationStore::new(pool)),
            hide_threshold,
        }
    }

    pub fn in_memory(hide_threshold: u32) -> Self {
        Self {
            backend: ModerationBackend::Memory(MemoryModerationStore::new()),
            hide_threshold,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, ModerationBackend::Postgres(_))
    }

    /// The report count at which an `active` image hides. Identical for
    /// every surface that consults this ledger.
    pub fn hide_threshold(&self) -> u32 {
        self.hide_threshold
    }

    /// Record one report against a fingerprint.
    ///
    /// Creates the record lazily on first report. Increments the count and
    /// the reason's histogram bucket; never changes status. Returns the
    /// post-report count, status and hidden flag.
    pub async fn report(
        &self,
        fingerprint: &str,
        reason: ReportReason,
    ) -> Result<ReportOutcome, StoreError> {
        if fingerprint.is_empty() {
            return Err(StoreError::InvalidInput(
                "cannot report an empty fingerprint".to_string(),
            ));
        }

        let record = match &self.backend {
            ModerationBackend::Postgres(pg) => pg.report(fingerprint, reason).await?,
            ModerationBackend::Memory(mem) => mem.report(fingerprint, reason),
        };

        tracing::info!(
            fingerprint = %fingerprint,
            reason = reason.label(),
            report_count = record.report_count,
            "Report recorded"
        );

        Ok(ReportOutcome {
            report_count: record.report_count,
            status: record.status,
            hidden: record.hidden(self.hide_threshold),
        })
    }

    /// Approve: visible regardless of count; count and histogram reset.
    /// Future reports accumulate again but cannot hide an approved image —
    /// only a block can.
    pub async fn approve(&self, fingerprint: &str) -> Result<ModerationRecord, StoreError> {
        self.transition(fingerprint, ModerationStatus::Approved, true)
            .await
    }

    /// Block: hidden unconditionally, count untouched.
    pub async fn block(&self, fingerprint: &str) -> Result<ModerationRecord, StoreError> {
        self.transition(fingerprint, ModerationStatus::Blocked, false)
            .await
    }

    /// Clear: back to `active` with a zeroed count and histogram, so the
    /// image is visible again and reports re-accumulate normally.
    pub async fn clear(&self, fingerprint: &str) -> Result<ModerationRecord, StoreError> {
        self.transition(fingerprint, ModerationStatus::Active, true)
            .await
    }

    async fn transition(
        &self,
        fingerprint: &str,
        status: ModerationStatus,
        reset_counts: bool,
    ) -> Result<ModerationRecord, StoreError> {
        if fingerprint.is_empty() {
            return Err(StoreError::InvalidInput(
                "cannot moderate an empty fingerprint".to_string(),
            ));
        }

        let record = match &self.backend {
            ModerationBackend::Postgres(pg) => {
                pg.transition(fingerprint, status, reset_counts).await?
            }
            ModerationBackend::Memory(mem) => mem.transition(fingerprint, status, reset_counts),
        };

        tracing::info!(fingerprint = %fingerprint, status = %status, "Moderation transition");

        Ok(record)
    }

    /// Whether the shared image for a fingerprint is currently hidden.
    /// Unreported fingerprints are visible.
    pub async fn is_hidden(&self, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self
            .get(fingerprint)
            .await?
            .map(|record| record.hidden(self.hide_threshold))
            .unwrap_or(false))
    }

    /// Hidden flags for a batch of fingerprints in one round trip.
    pub async fn hidden_many(
        &self,
        fingerprints: &[String],
    ) -> Result<HashMap<String, bool>, StoreError> {
        let records = match &self.backend {
            ModerationBackend::Postgres(pg) => pg.get_many(fingerprints).await?,
            ModerationBackend::Memory(mem) => mem.get_many(fingerprints),
        };

        Ok(fingerprints
            .iter()
            .filter(|fp| !fp.is_empty())
            .map(|fp| {
                let hidden = records
                    .get(fp)
                    .map(|r| is_hidden(r.status, r.report_count, self.hide_threshold))
                    .unwrap_or(false);
                (fp.clone(), hidden)
            })
            .collect())
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<ModerationRecord>, StoreError> {
        if fingerprint.is_empty() {
            return Ok(None);
        }
        match &self.backend {
            ModerationBackend::Postgres(pg) => pg.get(fingerprint).await,
            ModerationBackend::Memory(mem) => Ok(mem.get(fingerprint)),
        }
    }

    /// All records, most recently updated first (admin review surface).
    pub async fn list(&self) -> Result<Vec<ModerationRecord>, StoreError> {
        match &self.backend {
            ModerationBackend::Postgres(pg) => pg.list().await,
            ModerationBackend::Memory(mem) => Ok(mem.list()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ModerationLedger {
        ModerationLedger::in_memory(3)
    }

    #[tokio::test]
    async fn test_reports_accumulate_and_hide_at_threshold() {
        let ledger = ledger();

        let first = ledger.report("fp", ReportReason::NotACardPhoto).await.unwrap();
        assert_eq!(first.report_count, 1);
        assert!(!first.hidden);

        let second = ledger.report("fp", ReportReason::NotACardPhoto).await.unwrap();
        assert_eq!(second.report_count, 2);
        assert!(!second.hidden);

        let third = ledger.report("fp", ReportReason::Inappropriate).await.unwrap();
        assert_eq!(third.report_count, 3);
        assert_eq!(third.status, ModerationStatus::Active);
        assert!(third.hidden);

        assert!(ledger.is_hidden("fp").await.unwrap());
    }

    #[tokio::test]
    async fn test_reason_histogram_accumulates() {
        let ledger = ledger();
        ledger.report("fp", ReportReason::Miscategorized).await.unwrap();
        ledger.report("fp", ReportReason::Other).await.unwrap();
        ledger.report("fp", ReportReason::Miscategorized).await.unwrap();

        let record = ledger.get("fp").await.unwrap().unwrap();
        assert_eq!(record.report_count, 3);
        assert_eq!(record.reasons.get("Miscategorized"), Some(&2));
        assert_eq!(record.reasons.get("Other"), Some(&1));
    }

    #[tokio::test]
    async fn test_approve_resets_and_shows() {
        let ledger = ledger();
        for _ in 0..5 {
            ledger.report("fp", ReportReason::Other).await.unwrap();
        }
        assert!(ledger.is_hidden("fp").await.unwrap());

        let record = ledger.approve("fp").await.unwrap();
        assert_eq!(record.status, ModerationStatus::Approved);
        assert_eq!(record.report_count, 0);
        assert!(record.reasons.is_empty());
        assert!(!ledger.is_hidden("fp").await.unwrap());
    }

    #[tokio::test]
    async fn test_reports_do_not_hide_an_approved_image() {
        let ledger = ledger();
        ledger.approve("fp").await.unwrap();

        for _ in 0..10 {
            let outcome = ledger.report("fp", ReportReason::Other).await.unwrap();
            assert_eq!(outcome.status, ModerationStatus::Approved);
            assert!(!outcome.hidden);
        }
        assert!(!ledger.is_hidden("fp").await.unwrap());

        // Only a block hides it again.
        ledger.block("fp").await.unwrap();
        assert!(ledger.is_hidden("fp").await.unwrap());
    }

    #[tokio::test]
    async fn test_block_hides_at_count_zero_and_preserves_count() {
        let ledger = ledger();
        ledger.report("fp", ReportReason::Other).await.unwrap();

        let record = ledger.block("fp").await.unwrap();
        assert_eq!(record.report_count, 1);
        assert!(ledger.is_hidden("fp").await.unwrap());

        // Block works even on a never-reported fingerprint.
        ledger.block("fresh").await.unwrap();
        assert!(ledger.is_hidden("fresh").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_zeroes_and_reaccumulates() {
        let ledger = ledger();
        for _ in 0..4 {
            ledger.report("fp", ReportReason::PoorQuality).await.unwrap();
        }
        ledger.block("fp").await.unwrap();

        let record = ledger.clear("fp").await.unwrap();
        assert_eq!(record.status, ModerationStatus::Active);
        assert_eq!(record.report_count, 0);
        assert!(!ledger.is_hidden("fp").await.unwrap());

        for _ in 0..3 {
            ledger.report("fp", ReportReason::Other).await.unwrap();
        }
        assert!(ledger.is_hidden("fp").await.unwrap());
    }

    #[tokio::test]
    async fn test_unreported_fingerprint_is_visible() {
        let ledger = ledger();
        assert!(!ledger.is_hidden("never-seen").await.unwrap());
        assert!(ledger.get("never-seen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_fingerprint_is_rejected() {
        let ledger = ledger();
        assert!(ledger.report("", ReportReason::Other).await.is_err());
        assert!(ledger.approve("").await.is_err());
        assert!(!ledger.is_hidden("").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_most_recently_updated_first() {
        let ledger = ledger();
        ledger.report("old", ReportReason::Other).await.unwrap();
        ledger.report("new", ReportReason::Other).await.unwrap();
        ledger.report("old", ReportReason::Other).await.unwrap();

        let listed = ledger.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].fingerprint, "old");
        assert_eq!(listed[1].fingerprint, "new");
    }

    #[tokio::test]
    async fn test_hidden_many_defaults_to_visible() {
        let ledger = ledger();
        for _ in 0..3 {
            ledger.report("hot", ReportReason::Other).await.unwrap();
        }

        let flags = ledger
            .hidden_many(&["hot".to_string(), "cold".to_string()])
            .await
            .unwrap();
        assert_eq!(flags.get("hot"), Some(&true));
        assert_eq!(flags.get("cold"), Some(&false));
    }
}
