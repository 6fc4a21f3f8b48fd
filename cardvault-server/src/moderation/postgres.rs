//! PostgreSQL implementation of the moderation store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use cardvault_core::{ModerationRecord, ModerationStatus, ReportReason};

use crate::db::StoreError;

/// Postgres-backed moderation store.
#[derive(Clone)]
pub struct PostgresModerationStore {
    pool: PgPool,
}

/// Row type for database queries.
#[derive(FromRow)]
struct ModerationRow {
    fingerprint: String,
    report_count: i64,
    reasons: serde_json::Value,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ModerationRow> for ModerationRecord {
    type Error = StoreError;

    fn try_from(row: ModerationRow) -> Result<Self, StoreError> {
        let status = ModerationStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Serialization(format!("unknown moderation status '{}'", row.status))
        })?;
        let reasons: BTreeMap<String, u32> = serde_json::from_value(row.reasons)
            .map_err(|e| StoreError::Serialization(format!("bad reasons histogram: {e}")))?;

        Ok(Self {
            fingerprint: row.fingerprint,
            report_count: row.report_count.clamp(0, u32::MAX as i64) as u32,
            reasons,
            status,
            updated_at: row.updated_at,
        })
    }
}

impl PostgresModerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Increment the report count and the reason bucket in one upsert.
    ///
    /// The increment happens inside the statement against the persisted
    /// row, so two near-simultaneous reports both land regardless of
    /// arrival order. Status is deliberately not part of the update.
    pub async fn report(
        &self,
        fingerprint: &str,
        reason: ReportReason,
    ) -> Result<ModerationRecord, StoreError> {
        let row: ModerationRow = sqlx::query_as(
            r#"
            INSERT INTO image_reports (fingerprint, report_count, reasons, status)
            VALUES ($1, 1, jsonb_build_object($2::text, 1), 'active')
            ON CONFLICT (fingerprint) DO UPDATE SET
                report_count = image_reports.report_count + 1,
                reasons = image_reports.reasons || jsonb_build_object(
                    $2::text,
                    COALESCE((image_reports.reasons ->> $2::text)::bigint, 0) + 1
                ),
                updated_at = NOW()
            RETURNING fingerprint, report_count, reasons, status, updated_at
            "#,
        )
        .bind(fingerprint)
        .bind(reason.label())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Apply an administrator transition, creating the record if absent.
    pub async fn transition(
        &self,
        fingerprint: &str,
        status: ModerationStatus,
        reset_counts: bool,
    ) -> Result<ModerationRecord, StoreError> {
        let sql = if reset_counts {
            r#"
            INSERT INTO image_reports (fingerprint, report_count, reasons, status)
            VALUES ($1, 0, '{}'::jsonb, $2)
            ON CONFLICT (fingerprint) DO UPDATE SET
                status = $2,
                report_count = 0,
                reasons = '{}'::jsonb,
                updated_at = NOW()
            RETURNING fingerprint, report_count, reasons, status, updated_at
            "#
        } else {
            r#"
            INSERT INTO image_reports (fingerprint, report_count, reasons, status)
            VALUES ($1, 0, '{}'::jsonb, $2)
            ON CONFLICT (fingerprint) DO UPDATE SET
                status = $2,
                updated_at = NOW()
            RETURNING fingerprint, report_count, reasons, status, updated_at
            "#
        };

        let row: ModerationRow = sqlx::query_as(sql)
            .bind(fingerprint)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<ModerationRecord>, StoreError> {
        let row: Option<ModerationRow> = sqlx::query_as(
            r#"
            SELECT fingerprint, report_count, reasons, status, updated_at
            FROM image_reports
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
    ) -> Result<HashMap<String, ModerationRecord>, StoreError> {
        let rows: Vec<ModerationRow> = sqlx::query_as(
            r#"
            SELECT fingerprint, report_count, reasons, status, updated_at
            FROM image_reports
            WHERE fingerprint = ANY($1)
            "#,
        )
        .bind(fingerprints)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let record: ModerationRecord = row.try_into()?;
                Ok((record.fingerprint.clone(), record))
            })
            .collect()
    }

    pub async fn list(&self) -> Result<Vec<ModerationRecord>, StoreError> {
        let rows: Vec<ModerationRow> = sqlx::query_as(
            r#"
            SELECT fingerprint, report_count, reasons, status, updated_at
            FROM image_reports
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
