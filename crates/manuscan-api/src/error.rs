//! HTTP error responses
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Every failure is
//! funnelled through `AppError` so the status code, the JSON body and the log
//! line all come from one `ErrorMetadata` lookup.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use manuscan_core::{AppError, DeliveryError, ErrorMetadata, LogLevel, ValidationError};
use manuscan_services::PipelineError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Cause chain; omitted in production and for sensitive errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Stable code such as `INVALID_INPUT` or `DELIVERY_FAILED`
    pub code: String,
    /// True when retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// `AppError` lives in core, so the `IntoResponse` impl needs a local wrapper.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<DeliveryError> for HttpAppError {
    fn from(err: DeliveryError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// `Json<T>` whose rejections use `ErrorResponse` (400) instead of axum's
/// plain-text bodies.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

fn show_details(error: &AppError) -> bool {
    let environment = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_default()
        .to_ascii_lowercase();
    let production = matches!(environment.as_str(), "production" | "prod");
    !production && !error.is_sensitive()
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let HttpAppError(error) = self;
        let code = error.error_code();

        match error.log_level() {
            LogLevel::Debug => tracing::debug!(error = %error, code, "Request failed"),
            LogLevel::Warn => tracing::warn!(error = %error, code, "Request failed"),
            LogLevel::Error => tracing::error!(error = %error, code, "Request failed"),
        }

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let details = show_details(&error);
        let body = ErrorResponse {
            error: error.client_message(),
            details: details.then(|| error.detailed_message()),
            error_type: details.then(|| error.error_type().to_string()),
            code: code.to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        };

        (status, Json(body)).into_response()
    }
}
