//! Shared image handlers
//!
//! Publishing a community reference image and looking records up, singly
//! or in a batch. These handlers forward to the repository and ledger;
//! the only logic here is boundary validation.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cardvault_core::{
    CardAttributes, CardvaultError, Fingerprint, Orientation, PublishOutcome, SharedImageInput,
    SharedImageRecord,
};

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// Maximum fingerprints per batch lookup.
const MAX_BATCH_SIZE: usize = 100;

/// Response for a publish attempt.
#[derive(Serialize, ToSchema)]
pub struct PublishResponse {
    /// `created` when this upload became the reference image,
    /// `already_exists` when an earlier publish won.
    #[schema(value_type = String, example = "created")]
    pub outcome: PublishOutcome,
    /// Fingerprint computed from the submitted card attributes.
    #[schema(example = "year:1989|set:upper deck|num:#1|player:ken griffey jr.")]
    pub fingerprint: String,
    /// Content-addressed storage key for the payload.
    #[schema(example = "a1b2c3d4...")]
    pub storage_key: String,
}

/// A shared image record in API responses.
#[derive(Serialize, ToSchema)]
pub struct SharedImageResponse {
    pub fingerprint: String,
    pub storage_key: String,
    #[schema(value_type = String, example = "front")]
    pub orientation: Orientation,
    pub slabbed: bool,
    pub owner_id: String,
    /// Whether moderation currently hides this image.
    pub hidden: bool,
    #[schema(value_type = String, example = "2026-08-01T10:00:00Z")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Base64-encoded payload, present only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl SharedImageResponse {
    fn from_record(record: SharedImageRecord, hidden: bool, include_image: bool) -> Self {
        Self {
            fingerprint: record.fingerprint,
            storage_key: record.storage_key,
            orientation: record.orientation,
            slabbed: record.slabbed,
            owner_id: record.owner_id,
            hidden,
            created_at: record.created_at,
            image_data: include_image.then(|| BASE64.encode(&record.image)),
        }
    }
}

/// Query parameters for single-record lookup.
#[derive(Deserialize)]
pub struct GetImageParams {
    /// Include the base64 payload in the response (default: false).
    #[serde(default)]
    pub include_image: bool,
}

/// Request for a batched lookup.
#[derive(Deserialize, ToSchema)]
pub struct BatchLookupRequest {
    /// Fingerprints to resolve; at most 100 per request.
    pub fingerprints: Vec<String>,
}

/// Response for a batched lookup.
#[derive(Serialize, ToSchema)]
pub struct BatchLookupResponse {
    /// Records keyed by fingerprint; fingerprints with no shared image are
    /// omitted. Hidden flags come from the same decision function as the
    /// single-record path.
    pub images: HashMap<String, SharedImageResponse>,
}

/// Publish a shared reference image for a card.
///
/// Accepts multipart/form-data with:
/// - `file`: the image payload
/// - `owner`: contributing collector identifier
/// - card attributes: `year`, `set`, `subset`, `number`, `player`, `team`,
///   `insert`, `variation`, `parallel`
/// - `orientation` (optional): "front" (default) or "back"
/// - `slabbed` (optional): "true" when the card sits in a graded holder
///
/// First writer wins: once a fingerprint has a reference image, later
/// publishes return `already_exists` and the stored record is untouched.
#[utoipa::path(
    post,
    path = "/images",
    tag = "Shared images",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Publish outcome", body = PublishResponse),
        (status = 400, description = "Invalid image or missing card attributes"),
        (status = 503, description = "Storage or classifier unavailable")
    )
)]
pub async fn publish_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PublishResponse>, ApiError> {
    let fields = MultipartFields::parse(&mut multipart).await?;
    let file = fields.require_file()?;

    let owner = fields
        .get_text("owner")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'owner' field"))?
        .to_string();

    let attrs = CardAttributes {
        year: fields.text_or_empty("year"),
        set_name: fields.text_or_empty("set"),
        subset: fields.text_or_empty("subset"),
        card_number: fields.text_or_empty("number"),
        player: fields.text_or_empty("player"),
        team: fields.text_or_empty("team"),
        insert: fields.text_or_empty("insert"),
        variation: fields.text_or_empty("variation"),
        parallel: fields.text_or_empty("parallel"),
    };
    let fingerprint = Fingerprint::build(&attrs);
    if fingerprint.is_empty() {
        return Err(CardvaultError::EmptyFingerprint.into());
    }

    let orientation = match fields.get_text("orientation") {
        None | Some("") => Orientation::Front,
        Some(raw) => Orientation::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid orientation '{raw}'")))?,
    };
    let slabbed = fields.get_bool("slabbed");

    // Policy first: malformed, oversized or undersized payloads never
    // reach the classifier or the store.
    state.policy.validate(&file.data)?;

    if let Some(classifier) = &state.classifier {
        let verdict = classifier.classify(&file.data).await?;
        tracing::debug!(
            provider = classifier.provider_id(),
            is_card_photo = verdict.is_card_photo,
            confidence = verdict.confidence,
            "Classifier verdict"
        );
        if !verdict.is_card_photo {
            let label = verdict.label.as_deref().unwrap_or("not a card photo");
            return Err(ApiError::bad_request(format!(
                "Image rejected by classifier: {label}"
            )));
        }
    }

    let storage_key = fingerprint.storage_key();
    let outcome = state
        .shared_images
        .publish(SharedImageInput {
            fingerprint: fingerprint.as_str().to_string(),
            storage_key: storage_key.clone(),
            image: file.data.clone(),
            orientation,
            slabbed,
            owner_id: owner,
        })
        .await?;

    Ok(Json(PublishResponse {
        outcome,
        fingerprint: fingerprint.as_str().to_string(),
        storage_key,
    }))
}

/// Fetch the shared image record for a fingerprint.
#[utoipa::path(
    get,
    path = "/images/{fingerprint}",
    tag = "Shared images",
    params(
        ("fingerprint" = String, Path, description = "Card fingerprint"),
        ("include_image" = Option<bool>, Query, description = "Include the base64 payload")
    ),
    responses(
        (status = 200, description = "Shared image record", body = SharedImageResponse),
        (status = 404, description = "No shared image for this fingerprint")
    )
)]
pub async fn get_image_handler(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
    Query(params): Query<GetImageParams>,
) -> Result<Json<SharedImageResponse>, ApiError> {
    let record = state
        .shared_images
        .get(&fingerprint)
        .await?
        .ok_or_else(|| ApiError::not_found("No shared image for this fingerprint"))?;

    let hidden = state.moderation.is_hidden(&fingerprint).await?;

    Ok(Json(SharedImageResponse::from_record(
        record,
        hidden,
        params.include_image,
    )))
}

/// Resolve many fingerprints in one round trip (listing views).
#[utoipa::path(
    post,
    path = "/images/batch",
    tag = "Shared images",
    request_body = BatchLookupRequest,
    responses(
        (status = 200, description = "Records keyed by fingerprint", body = BatchLookupResponse),
        (status = 400, description = "Too many fingerprints")
    )
)]
pub async fn batch_lookup_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchLookupRequest>,
) -> Result<Json<BatchLookupResponse>, ApiError> {
    if request.fingerprints.len() > MAX_BATCH_SIZE {
        return Err(ApiError::bad_request(format!(
            "At most {MAX_BATCH_SIZE} fingerprints per batch, got {}",
            request.fingerprints.len()
        )));
    }

    let records = state.shared_images.get_many(&request.fingerprints).await?;
    let hidden = state.moderation.hidden_many(&request.fingerprints).await?;

    let images = records
        .into_iter()
        .map(|(fp, record)| {
            let is_hidden = hidden.get(&fp).copied().unwrap_or(false);
            (fp, SharedImageResponse::from_record(record, is_hidden, false))
        })
        .collect();

    Ok(Json(BatchLookupResponse { images }))
}
