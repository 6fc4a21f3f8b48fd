//! Moderation domain types and the hide decision.
//!
//! Every surface that renders a shared image decides visibility with
//! [`is_hidden`] and the same configured threshold. Keeping the decision in
//! one function is what stops a card list from showing an image the detail
//! view hides.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reports at or above this count hide an `active` image, unless
/// overridden by configuration.
pub const DEFAULT_HIDE_THRESHOLD: u32 = 3;

/// Moderation status of a shared image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    /// Default state; hidden only when the report count crosses the threshold.
    Active,
    /// Hidden unconditionally by an administrator.
    Blocked,
    /// Kept visible by an administrator regardless of future report counts.
    Approved,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Approved => "approved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "blocked" => Some(Self::Blocked),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of report reasons, plus the `Other` catch-all.
///
/// Reporters submit free text; it is bucketed here at the boundary so the
/// histogram key space stays bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportReason {
    NotACardPhoto,
    Inappropriate,
    Miscategorized,
    PoorQuality,
    Other,
}

impl ReportReason {
    /// Histogram key and display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotACardPhoto => "Not a card photo",
            Self::Inappropriate => "Inappropriate",
            Self::Miscategorized => "Miscategorized",
            Self::PoorQuality => "Poor quality",
            Self::Other => "Other",
        }
    }

    /// Bucket a raw reason string. Empty or unrecognized input falls into
    /// the `Other` bucket rather than widening the histogram key space.
    pub fn bucket(raw: &str) -> Self {
        let trimmed = raw.trim();
        [
            Self::NotACardPhoto,
            Self::Inappropriate,
            Self::Miscategorized,
            Self::PoorQuality,
            Self::Other,
        ]
        .into_iter()
        .find(|reason| reason.label().eq_ignore_ascii_case(trimmed))
        .unwrap_or(Self::Other)
    }
}

/// Moderation ledger entry for one fingerprint.
///
/// Exists independently of the shared image record: reports can reference a
/// fingerprint with no shared image at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRecord {
    /// Fingerprint the reports are about.
    pub fingerprint: String,
    /// Cumulative report count; monotonically increasing except on explicit
    /// approve/clear.
    pub report_count: u32,
    /// Reason label -> count histogram.
    pub reasons: BTreeMap<String, u32>,
    /// Current status; changed only by administrator actions.
    pub status: ModerationStatus,
    /// Last report or administrator action.
    pub updated_at: DateTime<Utc>,
}

impl ModerationRecord {
    /// Fresh record for a fingerprint that was just reported the first time.
    pub fn new(fingerprint: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            report_count: 0,
            reasons: BTreeMap::new(),
            status: ModerationStatus::Active,
            updated_at: now,
        }
    }

    pub fn hidden(&self, hide_threshold: u32) -> bool {
        is_hidden(self.status, self.report_count, hide_threshold)
    }
}

/// The hide decision.
///
/// `blocked` always hides, `approved` always shows, and `active` hides if
/// and only if the count has reached the threshold.
pub fn is_hidden(status: ModerationStatus, report_count: u32, hide_threshold: u32) -> bool {
    match status {
        ModerationStatus::Blocked => true,
        ModerationStatus::Approved => false,
        ModerationStatus::Active => report_count >= hide_threshold,
    }
}

/// What a report call hands back to the reporting surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub report_count: u32,
    pub status: ModerationStatus,
    pub hidden: bool,
}
