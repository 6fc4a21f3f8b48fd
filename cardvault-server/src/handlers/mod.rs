//! Request handlers
//!
//! Thin forwarding layer: each handler validates its boundary and calls
//! into the repository, ledger or classifier.

pub mod health;
pub mod images;
pub mod reports;

pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use images::{
    batch_lookup_handler, get_image_handler, publish_handler, BatchLookupRequest,
    BatchLookupResponse, PublishResponse, SharedImageResponse,
};
pub use reports::{
    admin_action_handler, get_moderation_handler, list_moderation_handler, report_handler,
    ModerationListResponse, ModerationRecordResponse, ReportRequest, ReportResponse,
};
