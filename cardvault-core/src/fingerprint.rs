//! Card identity fingerprints.
//!
//! A fingerprint is a deterministic string identity derived from the
//! descriptive attributes of a card. Two cards with identical normalized
//! attributes always produce the same fingerprint, which makes it the join
//! key between the shared image repository and the moderation ledger.
//!
//! The concatenation order of the tagged segments is fixed. Changing it (or
//! any segment label) changes every stored key, so treat the layout below as
//! a persisted format.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Segment delimiter in the joined key.
const DELIMITER: char = '|';

/// Descriptive attributes of a single card.
///
/// Every field is optional in practice: missing attributes are treated as
/// empty strings and omitted from the joined key entirely, so an absent
/// qualifier never inserts an empty tagged segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardAttributes {
    pub year: String,
    pub set_name: String,
    pub subset: String,
    pub card_number: String,
    pub player: String,
    pub team: String,
    pub insert: String,
    pub variation: String,
    pub parallel: String,
}

/// Deterministic string identity for a card.
///
/// Opaque to callers; safe to use as a map key. Use [`Fingerprint::storage_key`]
/// when a URL-path-safe form is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from card attributes.
    ///
    /// Never fails. Every field is trimmed and lower-cased before use, so
    /// case and surrounding whitespace differences cannot fork identities.
    /// All-empty attributes yield an empty fingerprint, which downstream
    /// lookups must treat as absent (no dedup, no moderation).
    pub fn build(attrs: &CardAttributes) -> Self {
        let mut segments: Vec<String> = Vec::with_capacity(9);

        push_segment(&mut segments, "year", &attrs.year);
        push_segment(&mut segments, "set", &attrs.set_name);
        push_segment(&mut segments, "subset", &attrs.subset);

        // The card number carries a literal '#' prefix so that a bare
        // number can never collide with a player or team segment value.
        let number = normalize(&attrs.card_number);
        if !number.is_empty() {
            segments.push(format!("num:#{number}"));
        }

        push_segment(&mut segments, "player", &attrs.player);
        push_segment(&mut segments, "team", &attrs.team);
        push_segment(&mut segments, "insert", &attrs.insert);
        push_segment(&mut segments, "var", &attrs.variation);
        push_segment(&mut segments, "parallel", &attrs.parallel);

        Self(segments.join(&DELIMITER.to_string()))
    }

    /// Wrap an already-built fingerprint received from a caller.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no attribute contributed a segment. Empty fingerprints
    /// must not be published, reported or looked up.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content-addressed storage key derived from the fingerprint.
    ///
    /// SHA3-256 of the joined key, hex-encoded: flat, fixed-length and safe
    /// as a URL path segment or object-store name regardless of what
    /// characters the card attributes contained.
    pub fn storage_key(&self) -> String {
        let mut hasher = Sha3_256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn push_segment(segments: &mut Vec<String>, label: &str, value: &str) {
    let norm = normalize(value);
    if !norm.is_empty() {
        segments.push(format!("{label}:{norm}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_attrs() -> CardAttributes {
        CardAttributes {
            year: "1989".into(),
            set_name: "Upper Deck".into(),
            subset: "Star Rookie".into(),
            card_number: "1".into(),
            player: "Ken Griffey Jr.".into(),
            team: "Mariners".into(),
            insert: String::new(),
            variation: String::new(),
            parallel: String::new(),
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = Fingerprint::build(&full_attrs());
        let b = Fingerprint::build(&full_attrs());
        assert_eq!(a, b);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let mut noisy = full_attrs();
        noisy.set_name = "  UPPER deck ".into();
        noisy.player = "KEN GRIFFEY JR.".into();

        assert_eq!(Fingerprint::build(&full_attrs()), Fingerprint::build(&noisy));
    }

    #[test]
    fn test_any_field_difference_forks_identity() {
        let base = Fingerprint::build(&full_attrs());

        let mut other = full_attrs();
        other.card_number = "2".into();
        assert_ne!(base, Fingerprint::build(&other));

        let mut other = full_attrs();
        other.parallel = "Gold".into();
        assert_ne!(base, Fingerprint::build(&other));
    }

    #[test]
    fn test_omitted_qualifier_inserts_no_segment() {
        let mut attrs = full_attrs();
        attrs.subset = String::new();
        let fp = Fingerprint::build(&attrs);

        assert!(!fp.as_str().contains("subset:"));
        assert_ne!(fp, Fingerprint::build(&full_attrs()));
    }

    #[test]
    fn test_whitespace_only_field_is_omitted() {
        let mut attrs = full_attrs();
        attrs.insert = "   ".into();
        assert_eq!(Fingerprint::build(&attrs), Fingerprint::build(&full_attrs()));
    }

    #[test]
    fn test_all_empty_attributes_yield_empty_fingerprint() {
        let fp = Fingerprint::build(&CardAttributes::default());
        assert!(fp.is_empty());
        assert_eq!(fp.as_str(), "");
    }

    #[test]
    fn test_tagged_segments_prevent_cross_field_collisions() {
        let mut by_team = CardAttributes::default();
        by_team.team = "angels".into();

        let mut by_player = CardAttributes::default();
        by_player.player = "angels".into();

        assert_ne!(Fingerprint::build(&by_team), Fingerprint::build(&by_player));
    }

    #[test]
    fn test_number_prefix_survives_normalization() {
        let mut attrs = CardAttributes::default();
        attrs.card_number = " T-205 ".into();
        let fp = Fingerprint::build(&attrs);
        assert_eq!(fp.as_str(), "num:#t-205");
    }

    #[test]
    fn test_storage_key_is_hex_and_stable() {
        let fp = Fingerprint::build(&full_attrs());
        let key = fp.storage_key();

        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, fp.storage_key());
        assert_ne!(key, Fingerprint::from_raw("something else").storage_key());
    }
}
