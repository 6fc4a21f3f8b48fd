//! Moderation handlers
//!
//! Viewer report submission, the administrator transitions and the review
//! listing.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cardvault_core::{ModerationRecord, ModerationStatus, ReportReason};

use crate::error::ApiError;
use crate::state::AppState;

/// Request to report a shared image.
#[derive(Deserialize, ToSchema)]
pub struct ReportRequest {
    /// Fingerprint of the reported image.
    pub fingerprint: String,
    /// Free-text reason; bucketed into the closed reason set, with
    /// anything unrecognized landing in "Other".
    #[serde(default)]
    pub reason: String,
}

/// Response after recording a report.
#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    /// Cumulative report count after this report.
    pub report_count: u32,
    /// Moderation status; reports never change it.
    #[schema(value_type = String, example = "active")]
    pub status: ModerationStatus,
    /// Whether the image is now hidden.
    pub hidden: bool,
}

/// A moderation ledger record in API responses.
#[derive(Serialize, ToSchema)]
pub struct ModerationRecordResponse {
    pub fingerprint: String,
    pub report_count: u32,
    /// Reason label -> count histogram.
    pub reasons: std::collections::BTreeMap<String, u32>,
    #[schema(value_type = String, example = "active")]
    pub status: ModerationStatus,
    pub hidden: bool,
    #[schema(value_type = String, example = "2026-08-01T10:00:00Z")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ModerationRecordResponse {
    fn from_record(record: ModerationRecord, hide_threshold: u32) -> Self {
        let hidden = record.hidden(hide_threshold);
        Self {
            fingerprint: record.fingerprint,
            report_count: record.report_count,
            reasons: record.reasons,
            status: record.status,
            hidden,
            updated_at: record.updated_at,
        }
    }
}

/// Report a shared image.
///
/// Creates the ledger record on first report, increments the count and the
/// reason bucket, and recomputes the hidden flag. Reporting never changes
/// moderation status; crossing the threshold hides an `active` image
/// without any administrator involvement.
#[utoipa::path(
    post,
    path = "/reports",
    tag = "Moderation",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Report recorded", body = ReportResponse),
        (status = 400, description = "Empty fingerprint")
    )
)]
pub async fn report_handler(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let reason = ReportReason::bucket(&request.reason);
    let outcome = state.moderation.report(&request.fingerprint, reason).await?;

    Ok(Json(ReportResponse {
        report_count: outcome.report_count,
        status: outcome.status,
        hidden: outcome.hidden,
    }))
}

/// Apply an administrator action to a fingerprint.
#[utoipa::path(
    post,
    path = "/moderation/{fingerprint}/{action}",
    tag = "Moderation",
    params(
        ("fingerprint" = String, Path, description = "Card fingerprint"),
        ("action" = String, Path, description = "One of approve, block, clear")
    ),
    responses(
        (status = 200, description = "Resulting ledger record", body = ModerationRecordResponse),
        (status = 400, description = "Unknown action or empty fingerprint")
    )
)]
pub async fn admin_action_handler(
    State(state): State<AppState>,
    Path((fingerprint, action)): Path<(String, String)>,
) -> Result<Json<ModerationRecordResponse>, ApiError> {
    let record = match action.as_str() {
        "approve" => state.moderation.approve(&fingerprint).await?,
        "block" => state.moderation.block(&fingerprint).await?,
        "clear" => state.moderation.clear(&fingerprint).await?,
        other => {
            return Err(ApiError::bad_request(format!(
                "Unknown moderation action '{other}'; expected approve, block or clear"
            )))
        }
    };

    Ok(Json(ModerationRecordResponse::from_record(
        record,
        state.moderation.hide_threshold(),
    )))
}

/// Fetch the ledger record for one fingerprint.
#[utoipa::path(
    get,
    path = "/moderation/{fingerprint}",
    tag = "Moderation",
    params(("fingerprint" = String, Path, description = "Card fingerprint")),
    responses(
        (status = 200, description = "Ledger record", body = ModerationRecordResponse),
        (status = 404, description = "Fingerprint has never been reported or moderated")
    )
)]
pub async fn get_moderation_handler(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<ModerationRecordResponse>, ApiError> {
    let record = state
        .moderation
        .get(&fingerprint)
        .await?
        .ok_or_else(|| ApiError::not_found("No moderation record for this fingerprint"))?;

    Ok(Json(ModerationRecordResponse::from_record(
        record,
        state.moderation.hide_threshold(),
    )))
}

/// Review listing response.
#[derive(Serialize, ToSchema)]
pub struct ModerationListResponse {
    /// All ledger records, most recently updated first.
    pub records: Vec<ModerationRecordResponse>,
}

/// List every ledger record for the administrator review surface.
#[utoipa::path(
    get,
    path = "/moderation",
    tag = "Moderation",
    responses(
        (status = 200, description = "All ledger records", body = ModerationListResponse)
    )
)]
pub async fn list_moderation_handler(
    State(state): State<AppState>,
) -> Result<Json<ModerationListResponse>, ApiError> {
    let threshold = state.moderation.hide_threshold();
    let records = state
        .moderation
        .list()
        .await?
        .into_iter()
        .map(|record| ModerationRecordResponse::from_record(record, threshold))
        .collect();

    Ok(Json(ModerationListResponse { records }))
}
