//! Storage platform notifications.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use manuscan_core::models::UploadEvent;
use manuscan_services::ScanOutcome;
use std::sync::Arc;

/// Object-finalize notification: scan the upload if it is a manuscript.
///
/// Download failures return 502 and fail-closed scan errors 503 so the
/// platform redelivers the event.
#[utoipa::path(
    post,
    path = "/api/v0/events/storage-finalized",
    tag = "events",
    request_body = UploadEvent,
    responses(
        (status = 200, description = "Event processed", body = ScanOutcome),
        (status = 401, description = "Missing or invalid service key", body = ErrorResponse),
        (status = 502, description = "Upload could not be downloaded", body = ErrorResponse),
        (status = 503, description = "Scanner unavailable (fail-closed)", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, event), fields(bucket = %event.bucket, path = %event.name))]
pub async fn storage_finalized(
    State(state): State<Arc<AppState>>,
    ValidatedJson(event): ValidatedJson<UploadEvent>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state.scan.trigger.handle(&event).await?;
    Ok(Json(outcome))
}
