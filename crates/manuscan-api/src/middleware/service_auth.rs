//! Shared-secret authentication for machine-to-machine routes.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use manuscan_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Require `Authorization: Bearer <SERVICE_API_KEY>` when a key is configured.
pub async fn require_service_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.service_api_key.as_deref() else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(|h| h.strip_prefix("Bearer ")) else {
        tracing::warn!("Storage event rejected: missing or malformed authorization header");
        return HttpAppError(AppError::Unauthorized(
            "Missing or invalid authorization header".to_string(),
        ))
        .into_response();
    };

    if !secure_compare(token, expected) {
        tracing::warn!("Storage event rejected: invalid service key");
        return HttpAppError(AppError::Unauthorized("Invalid service key".to_string()))
            .into_response();
    }

    next.run(request).await
}
