//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 specification for the Cardvault API.

use utoipa::OpenApi;

use crate::handlers::{
    BatchLookupRequest, BatchLookupResponse, HealthResponse, ModerationListResponse,
    ModerationRecordResponse, PublishResponse, ReadyResponse, ReportRequest, ReportResponse,
    SharedImageResponse,
};

/// Cardvault API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cardvault API",
        version = "0.1.0",
        description = r#"
## Shared card images and moderation

Collectors attach photos to catalog cards. One community reference image
may exist per card identity (fingerprint):

1. **Publish** a reference image via `POST /images` — first writer wins,
   later attempts report `already_exists`
2. **Resolve** images for a card detail or listing view via
   `GET /images/{fingerprint}` and `POST /images/batch`
3. Any viewer may **report** an image via `POST /reports`; enough reports
   hide it automatically
4. Administrators **approve**, **block** or **clear** via
   `POST /moderation/{fingerprint}/{action}`
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Shared images", description = "Publish and resolve community reference images"),
        (name = "Moderation", description = "Viewer reports and administrator actions"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::images::publish_handler,
        crate::handlers::images::get_image_handler,
        crate::handlers::images::batch_lookup_handler,
        crate::handlers::reports::report_handler,
        crate::handlers::reports::admin_action_handler,
        crate::handlers::reports::get_moderation_handler,
        crate::handlers::reports::list_moderation_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            PublishResponse,
            SharedImageResponse,
            BatchLookupRequest,
            BatchLookupResponse,
            ReportRequest,
            ReportResponse,
            ModerationRecordResponse,
            ModerationListResponse,
        )
    )
)]
pub struct ApiDoc;
