//! Health check handlers and response types.

use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub clamav: String,
}

/// Liveness probe - process is running.
pub async fn liveness_check(_state: Arc<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the submission database must answer.
pub async fn readiness_check(state: Arc<AppState>) -> impl IntoResponse {
    let submissions = state.scan.submissions.clone();
    let database = run_check(TIMEOUT, async move { submissions.ping().await }, "not_ready").await;

    if database == "healthy" {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "database": "ready" })),
        )
    } else {
        tracing::error!(database = %database, "Database readiness check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "not_ready", "database": database })),
        )
    }
}

/// Full health check. Only the database decides the status code; storage and
/// the scanner daemon degrade the report.
pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    let submissions = state.scan.submissions.clone();
    let database = run_check(TIMEOUT, async move { submissions.ping().await }, "unhealthy").await;

    let storage = state.scan.storage.clone();
    let storage = run_check(
        TIMEOUT,
        async move {
            storage
                .exists("health-check-non-existent-key")
                .await
                .map(drop)
        },
        "degraded",
    )
    .await;

    let scanner = state.scan.scanner.clone();
    let clamav = run_check(TIMEOUT, async move { scanner.ping().await }, "degraded").await;

    let database_healthy = database == "healthy";
    let status = if !database_healthy {
        "unhealthy"
    } else if storage != "healthy" || clamav != "healthy" {
        "degraded"
    } else {
        "healthy"
    };

    if !database_healthy {
        tracing::error!(database = %database, "Health check failed");
    } else if status == "degraded" {
        tracing::warn!(storage = %storage, clamav = %clamav, "Health check degraded");
    }

    let response = HealthCheckResponse {
        status: status.to_string(),
        database,
        storage,
        clamav,
    };

    let status_code = if database_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
