//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use cardvault_core::ImagePolicy;

use crate::classifier::ImageClassifier;
use crate::moderation::ModerationLedger;
use crate::shared_images::SharedImageRepository;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// First-writer-wins shared image store
    pub shared_images: Arc<SharedImageRepository>,
    /// Report ledger and hide-threshold policy
    pub moderation: Arc<ModerationLedger>,
    /// External classifier; publishes skip classification when unset
    pub classifier: Option<Arc<dyn ImageClassifier>>,
    /// Image acceptance policy enforced before any store is touched
    pub policy: ImagePolicy,
}
