//! External image classifier.
//!
//! The server does not analyze image content itself; it asks an external
//! classifier whether an upload actually shows a card and interprets the
//! verdict. The trait keeps the transport swappable: an HTTP service in
//! production, a deterministic mock in tests and development.

mod http;
mod mock;

pub use http::{HttpClassifier, HttpClassifierConfig};
pub use mock::MockClassifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a classification attempt.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier request failed: {0}")]
    Request(String),

    #[error("Classifier returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Verdict returned by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    /// Whether the image appears to show a trading card.
    pub is_card_photo: bool,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
    /// Optional human-readable label for the detected content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A service that can judge whether an image shows a card.
///
/// Implementations must be thread-safe (`Send + Sync`); classification is
/// read-only from the caller's point of view and safe to retry.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Classify an encoded image payload.
    async fn classify(&self, image: &[u8]) -> Result<ClassifierVerdict, ClassifierError>;

    /// Provider identifier for logging.
    fn provider_id(&self) -> &'static str;
}
