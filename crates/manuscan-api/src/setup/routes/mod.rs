//! Route configuration and setup
//!
//! Health checks live in [health](health).

mod health;

use crate::constants::{CALLABLE_PREFIX, EVENTS_PREFIX};
use crate::handlers;
use crate::middleware::require_service_key;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use manuscan_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Requests are small JSON documents; uploads never pass through this service.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    Ok(app_router(state).layer(cors))
}

/// Every route with tracing and body limits applied, without CORS.
pub fn app_router(state: Arc<AppState>) -> Router<()> {
    let callable_routes = Router::new()
        .route(
            "/sendReviewerInvitationEmail",
            post(handlers::callable::send_reviewer_invitation_email),
        )
        .route(
            "/sendNotificationEmail",
            post(handlers::callable::send_notification_email),
        );

    let event_routes = Router::new()
        .route(
            "/storage-finalized",
            post(handlers::events::storage_finalized),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_service_key,
        ));

    public_routes(state.clone())
        .nest(CALLABLE_PREFIX, callable_routes)
        .nest(EVENTS_PREFIX, event_routes)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { health::health_check(state).await }
                }
            }),
        )
        .route(
            "/health/live",
            get({
                let state = state.clone();
                move || async { health::liveness_check(state).await }
            }),
        )
        .route(
            "/health/ready",
            get({
                let state = state.clone();
                move || async { health::readiness_check(state).await }
            }),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}
