//! Shared image repository.
//!
//! First-writer-wins store of community reference images, keyed by card
//! fingerprint. Records are immutable once published; moderation hides
//! them, it never deletes or rewrites them here.
//!
//! Two backends: PostgreSQL for production and an in-memory map for
//! development and tests. In both, the insert-if-absent primitive of the
//! backing store is the source of truth for uniqueness — there is no
//! check-then-insert window for two publishers to race through.

mod memory;
mod postgres;

pub use memory::MemorySharedImages;
pub use postgres::PostgresSharedImages;

use std::collections::HashMap;

use sqlx::PgPool;

use cardvault_core::{PublishOutcome, SharedImageInput, SharedImageRecord};

use crate::db::StoreError;

enum SharedBackend {
    Postgres(PostgresSharedImages),
    Memory(MemorySharedImages),
}

/// Repository of shared reference images, one record per fingerprint.
pub struct SharedImageRepository {
    backend: SharedBackend,
}

impl SharedImageRepository {
    /// Repository over an existing postgres pool.
    pub fn with_postgres(pool: PgPool) -> Self {
        Self {
            backend: SharedBackend::Postgres(PostgresSharedImages::new(pool)),
        }
    }

    /// In-memory repository (development and tests).
    pub fn in_memory() -> Self {
        Self {
            backend: SharedBackend::Memory(MemorySharedImages::new()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, SharedBackend::Postgres(_))
    }

    /// Publish a shared image for a fingerprint.
    ///
    /// At most one record may ever exist per fingerprint: the first
    /// successful publish wins and every later attempt reports
    /// [`PublishOutcome::AlreadyExists`] without touching the stored
    /// record. Safe to repeat after an unknown-outcome network failure —
    /// a retry lands in the `AlreadyExists` branch when the first attempt
    /// actually went through.
    pub async fn publish(&self, input: SharedImageInput) -> Result<PublishOutcome, StoreError> {
        if input.fingerprint.is_empty() {
            return Err(StoreError::InvalidInput(
                "cannot publish with an empty fingerprint".to_string(),
            ));
        }

        let outcome = match &self.backend {
            SharedBackend::Postgres(pg) => pg.publish(input).await?,
            SharedBackend::Memory(mem) => mem.publish(input),
        };
        Ok(outcome)
    }

    /// Fetch the record for a fingerprint, if any.
    pub async fn get(&self, fingerprint: &str) -> Result<Option<SharedImageRecord>, StoreError> {
        if fingerprint.is_empty() {
            return Ok(None);
        }
        match &self.backend {
            SharedBackend::Postgres(pg) => pg.get(fingerprint).await,
            SharedBackend::Memory(mem) => Ok(mem.get(fingerprint)),
        }
    }

    /// Batched lookup. Fingerprints with no record are omitted from the
    /// result, so a listing view issues one round trip instead of one per
    /// card.
    pub async fn get_many(
        &self,
        fingerprints: &[String],
    ) -> Result<HashMap<String, SharedImageRecord>, StoreError> {
        let wanted: Vec<String> = fingerprints
            .iter()
            .filter(|fp| !fp.is_empty())
            .cloned()
            .collect();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }

        match &self.backend {
            SharedBackend::Postgres(pg) => pg.get_many(&wanted).await,
            SharedBackend::Memory(mem) => Ok(mem.get_many(&wanted)),
        }
    }

    /// Count of stored records (admin/health surface).
    pub async fn count(&self) -> Result<i64, StoreError> {
        match &self.backend {
            SharedBackend::Postgres(pg) => pg.count().await,
            SharedBackend::Memory(mem) => Ok(mem.count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardvault_core::Orientation;

    fn input(fingerprint: &str, payload: &[u8], owner: &str) -> SharedImageInput {
        SharedImageInput {
            fingerprint: fingerprint.to_string(),
            storage_key: format!("key-{fingerprint}"),
            image: payload.to_vec(),
            orientation: Orientation::Front,
            slabbed: false,
            owner_id: owner.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_publish_wins() {
        let repo = SharedImageRepository::in_memory();

        let first = repo.publish(input("fp-1", b"original", "alice")).await.unwrap();
        assert_eq!(first, PublishOutcome::Created);

        let second = repo.publish(input("fp-1", b"different", "bob")).await.unwrap();
        assert_eq!(second, PublishOutcome::AlreadyExists);

        let record = repo.get("fp-1").await.unwrap().unwrap();
        assert_eq!(record.image, b"original");
        assert_eq!(record.owner_id, "alice");
    }

    #[tokio::test]
    async fn test_empty_fingerprint_is_rejected() {
        let repo = SharedImageRepository::in_memory();
        let err = repo.publish(input("", b"x", "alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));

        assert!(repo.get("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_many_omits_missing_fingerprints() {
        let repo = SharedImageRepository::in_memory();
        repo.publish(input("fp-a", b"a", "alice")).await.unwrap();
        repo.publish(input("fp-b", b"b", "bob")).await.unwrap();

        let found = repo
            .get_many(&[
                "fp-a".to_string(),
                "fp-missing".to_string(),
                "fp-b".to_string(),
                String::new(),
            ])
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.contains_key("fp-a"));
        assert!(found.contains_key("fp-b"));
        assert!(!found.contains_key("fp-missing"));
    }

    #[tokio::test]
    async fn test_count_tracks_unique_fingerprints() {
        let repo = SharedImageRepository::in_memory();
        repo.publish(input("fp-a", b"a", "alice")).await.unwrap();
        repo.publish(input("fp-a", b"b", "bob")).await.unwrap();
        repo.publish(input("fp-b", b"c", "carol")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
