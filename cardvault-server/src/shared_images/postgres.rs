//! PostgreSQL implementation of the shared image store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use cardvault_core::{Orientation, PublishOutcome, SharedImageInput, SharedImageRecord};

use crate::db::StoreError;

/// Postgres-backed shared image store.
#[derive(Clone)]
pub struct PostgresSharedImages {
    pool: PgPool,
}

/// Row type for database queries.
#[derive(FromRow)]
struct SharedImageRow {
    id: Uuid,
    fingerprint: String,
    storage_key: String,
    image: Vec<u8>,
    orientation: String,
    slabbed: bool,
    owner_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SharedImageRow> for SharedImageRecord {
    type Error = StoreError;

    fn try_from(row: SharedImageRow) -> Result<Self, StoreError> {
        let orientation = Orientation::parse(&row.orientation).ok_or_else(|| {
            StoreError::Serialization(format!("unknown orientation '{}'", row.orientation))
        })?;
        Ok(Self {
            id: row.id,
            fingerprint: row.fingerprint,
            storage_key: row.storage_key,
            image: row.image,
            orientation,
            slabbed: row.slabbed,
            owner_id: row.owner_id,
            created_at: row.created_at,
        })
    }
}

impl PostgresSharedImages {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conditional insert: the UNIQUE constraint on fingerprint decides
    /// who wins a publish race. Zero affected rows means a record already
    /// existed and was left untouched.
    pub async fn publish(&self, input: SharedImageInput) -> Result<PublishOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO shared_images (fingerprint, storage_key, image, orientation, slabbed, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (fingerprint) DO NOTHING
            "#,
        )
        .bind(&input.fingerprint)
        .bind(&input.storage_key)
        .bind(&input.image)
        .bind(input.orientation.as_str())
        .bind(input.slabbed)
        .bind(&input.owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            tracing::debug!(fingerprint = %input.fingerprint, "Stored shared image");
            Ok(PublishOutcome::Created)
        } else {
            tracing::debug!(fingerprint = %input.fingerprint, "Shared image already exists");
            Ok(PublishOutcome::AlreadyExists)
        }
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<SharedImageRecord>, StoreError> {
        let row: Option<SharedImageRow> = sqlx::query_as(
            r#"
            SELECT id, fingerprint, storage_key, image, orientation, slabbed, owner_id, created_at
            FROM shared_images
            WHERE fingerprint = $1
            "#,
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub async fn get_many(
        &self,
        fingerprints: &[String],
    ) -> Result<HashMap<String, SharedImageRecord>, StoreError> {
        let rows: Vec<SharedImageRow> = sqlx::query_as(
            r#"
            SELECT id, fingerprint, storage_key, image, orientation, slabbed, owner_id, created_at
            FROM shared_images
            WHERE fingerprint = ANY($1)
            "#,
        )
        .bind(fingerprints)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let record: SharedImageRecord = row.try_into()?;
                Ok((record.fingerprint.clone(), record))
            })
            .collect()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shared_images")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
