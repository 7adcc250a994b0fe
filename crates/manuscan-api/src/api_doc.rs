//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use manuscan_core::models;
use manuscan_services::{RecordOutcome, ScanOutcome};

/// OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Manuscan API",
        version = "0.1.0",
        description = "Reviewer email delivery and malware scanning of uploaded manuscripts. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Callable email functions
        handlers::callable::send_reviewer_invitation_email,
        handlers::callable::send_notification_email,
        // Storage events
        handlers::events::storage_finalized,
    ),
    components(
        schemas(
            handlers::callable::SendReviewerInvitationRequest,
            handlers::callable::SendNotificationRequest,
            handlers::callable::SendEmailResponse,
            models::UploadEvent,
            ScanOutcome,
            RecordOutcome,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "email", description = "Reviewer invitations and free-form notifications"),
        (name = "events", description = "Storage finalize notifications that trigger malware scans")
    )
)]
pub struct ApiDoc;
