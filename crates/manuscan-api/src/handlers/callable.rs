//! Callable email endpoints used by the review front end.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use manuscan_services::{Notification, ReviewerInvitation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Missing fields deserialize as empty strings and are rejected by validation.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SendReviewerInvitationRequest {
    pub reviewer_email: String,
    pub reviewer_name: String,
    pub manuscript_title: String,
    pub deadline_date: String,
    pub manuscript_id: String,
    pub admin_name: String,
}

impl From<SendReviewerInvitationRequest> for ReviewerInvitation {
    fn from(req: SendReviewerInvitationRequest) -> Self {
        ReviewerInvitation {
            reviewer_email: req.reviewer_email,
            reviewer_name: req.reviewer_name,
            manuscript_title: req.manuscript_title,
            deadline_date: req.deadline_date,
            manuscript_id: req.manuscript_id,
            admin_name: req.admin_name,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

impl From<SendNotificationRequest> for Notification {
    fn from(req: SendNotificationRequest) -> Self {
        Notification {
            to: req.to,
            subject: req.subject,
            html_body: req.html_body,
            text_body: req.text_body,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub message_id: String,
}

#[utoipa::path(
    post,
    path = "/api/v0/callable/sendReviewerInvitationEmail",
    tag = "email",
    request_body = SendReviewerInvitationRequest,
    responses(
        (status = 200, description = "Invitation sent", body = SendEmailResponse),
        (status = 400, description = "Missing required field", body = ErrorResponse),
        (status = 502, description = "Mail delivery failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "send_reviewer_invitation"))]
pub async fn send_reviewer_invitation_email(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SendReviewerInvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invitation = ReviewerInvitation::from(request);
    let message = state.mail.composer.reviewer_invitation(&invitation)?;
    let receipt = state.mail.gateway.send(&message).await?;

    tracing::info!(
        message_id = %receipt.message_id,
        transport = receipt.transport,
        "Reviewer invitation sent"
    );

    Ok(Json(SendEmailResponse {
        message_id: receipt.message_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v0/callable/sendNotificationEmail",
    tag = "email",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Notification sent", body = SendEmailResponse),
        (status = 400, description = "Missing required field", body = ErrorResponse),
        (status = 502, description = "Mail delivery failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "send_notification"))]
pub async fn send_notification_email(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SendNotificationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let notification = Notification::from(request);
    let message = state.mail.composer.notification(&notification)?;
    let receipt = state.mail.gateway.send(&message).await?;

    tracing::info!(
        message_id = %receipt.message_id,
        transport = receipt.transport,
        "Notification sent"
    );

    Ok(Json(SendEmailResponse {
        message_id: receipt.message_id,
    }))
}
