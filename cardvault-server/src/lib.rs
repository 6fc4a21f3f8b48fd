//! Cardvault Server - REST API for shared card images and moderation
//!
//! Hosts the two global, multi-writer resources of the system:
//!
//! - The **shared image repository**: first-writer-wins reference images
//!   keyed by card fingerprint, with the uniqueness guarantee pushed into
//!   the storage layer
//! - The **moderation ledger**: report counts, reason histograms and the
//!   administrator state machine, with server-side atomic increments
//!
//! Storage runs on PostgreSQL when `DATABASE_URL` is set and falls back to
//! in-memory maps for development and tests. This library exposes the
//! components for use in integration tests; the binary wires the same
//! pieces.

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod moderation;
pub mod multipart;
pub mod openapi;
pub mod routes;
pub mod shared_images;
pub mod state;

pub use classifier::{
    ClassifierError, ClassifierVerdict, HttpClassifier, HttpClassifierConfig, ImageClassifier,
    MockClassifier,
};
pub use config::Config;
pub use db::StoreError;
pub use error::ApiError;
pub use moderation::{MemoryModerationStore, ModerationLedger, PostgresModerationStore};
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_config};
pub use shared_images::{MemorySharedImages, PostgresSharedImages, SharedImageRepository};
pub use state::AppState;

use std::sync::Arc;

/// Build application state from configuration.
///
/// Connects to PostgreSQL (running migrations) when a database URL is
/// configured; otherwise both stores are in-memory and state does not
/// survive a restart.
pub async fn build_state(config: &Config) -> Result<AppState, StoreError> {
    let (shared_images, moderation) = match &config.database_url {
        Some(url) => {
            tracing::info!("Using PostgreSQL storage");
            let pool = db::connect(
                url,
                config.database_max_connections,
                config.database_min_connections,
            )
            .await?;
            (
                SharedImageRepository::with_postgres(pool.clone()),
                ModerationLedger::with_postgres(pool, config.hide_threshold),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage - data will be lost on restart!");
            (
                SharedImageRepository::in_memory(),
                ModerationLedger::in_memory(config.hide_threshold),
            )
        }
    };

    let classifier: Option<Arc<dyn ImageClassifier>> = match &config.classifier_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Image classifier configured");
            let http = HttpClassifier::new(HttpClassifierConfig::new(url))
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            Some(Arc::new(http))
        }
        None => {
            tracing::warn!("CLASSIFIER_URL not set, content classification disabled");
            None
        }
    };

    Ok(AppState {
        shared_images: Arc::new(shared_images),
        moderation: Arc::new(moderation),
        classifier,
        policy: config.image_policy(),
    })
}
