//! Mock classifier for tests and development.

use async_trait::async_trait;

use super::{ClassifierError, ClassifierVerdict, ImageClassifier};

/// Deterministic classifier that always returns the configured verdict.
pub struct MockClassifier {
    accept: bool,
}

impl MockClassifier {
    /// Mock that accepts every image as a card photo.
    pub fn accepting() -> Self {
        Self { accept: true }
    }

    /// Mock that rejects every image.
    pub fn rejecting() -> Self {
        Self { accept: false }
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::accepting()
    }
}

#[async_trait]
impl ImageClassifier for MockClassifier {
    async fn classify(&self, _image: &[u8]) -> Result<ClassifierVerdict, ClassifierError> {
        Ok(ClassifierVerdict {
            is_card_photo: self.accept,
            confidence: 1.0,
            label: (!self.accept).then(|| "not a card".to_string()),
        })
    }

    fn provider_id(&self) -> &'static str {
        "mock"
    }
}
