//! Shared image record types.
//!
//! A shared image is a community reference photo for a fingerprint. The
//! repository holding these records is first-writer-wins: at most one
//! record per fingerprint, never overwritten, hidden (not deleted) by
//! moderation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which face of the card the photo shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Front,
    Back,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A shared image record stored in the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedImageRecord {
    /// Unique database identifier.
    pub id: Uuid,
    /// Fingerprint this image is the reference for.
    pub fingerprint: String,
    /// Content-addressed key derived from the fingerprint (storage path
    /// segment for the payload).
    pub storage_key: String,
    /// Encoded image payload.
    pub image: Vec<u8>,
    /// Front or back of the card.
    pub orientation: Orientation,
    /// Whether the card sits in a graded holder.
    pub slabbed: bool,
    /// Collector who contributed the image.
    pub owner_id: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Input for publishing a new shared image.
#[derive(Debug, Clone)]
pub struct SharedImageInput {
    pub fingerprint: String,
    pub storage_key: String,
    pub image: Vec<u8>,
    pub orientation: Orientation,
    pub slabbed: bool,
    pub owner_id: String,
}

/// Outcome of a publish attempt.
///
/// `AlreadyExists` is success-adjacent, not an error: someone already
/// shared this card and the earlier record stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishOutcome {
    Created,
    AlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_parse() {
        assert_eq!(Orientation::parse("front"), Some(Orientation::Front));
        assert_eq!(Orientation::parse(" BACK "), Some(Orientation::Back));
        assert_eq!(Orientation::parse("sideways"), None);
    }

    #[test]
    fn test_publish_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&PublishOutcome::AlreadyExists).unwrap();
        assert_eq!(json, "\"already_exists\"");
    }
}
