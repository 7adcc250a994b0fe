//! Reviewer-facing email composition
//!
//! Turns validated request payloads into `EmailMessage`s. Nothing here sends
//! mail; hand the result to a `MailGateway`.

use manuscan_core::models::EmailMessage;
use manuscan_core::validation::{non_blank, require_non_empty};
use manuscan_core::AppError;
use minijinja::{context, Environment};

// The `.html` name enables minijinja's HTML auto-escaping.
const INVITATION_HTML_NAME: &str = "reviewer_invitation.html";
const INVITATION_TEXT_NAME: &str = "reviewer_invitation.txt";

const INVITATION_HTML: &str = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.5; color: #222;">
  <p>Dear {{ reviewer_name }},</p>
  <p>You have been invited to review the manuscript <strong>{{ manuscript_title }}</strong> (ID: {{ manuscript_id }}).</p>
  <p>Please submit your review by <strong>{{ deadline_date }}</strong>.</p>
  <p><a href="{{ review_portal_url|safe }}">Open the review portal</a> to accept or decline the invitation.</p>
  <p>Kind regards,<br>{{ admin_name }}</p>
</body>
</html>"#;

const INVITATION_TEXT: &str = "Dear {{ reviewer_name }},

You have been invited to review the manuscript \"{{ manuscript_title }}\" (ID: {{ manuscript_id }}).

Please submit your review by {{ deadline_date }}.

Open the review portal to accept or decline the invitation:
{{ review_portal_url }}

Kind regards,
{{ admin_name }}";

/// Request to invite a reviewer. Every field is required.
#[derive(Debug, Clone, Default)]
pub struct ReviewerInvitation {
    pub reviewer_email: String,
    pub reviewer_name: String,
    pub manuscript_title: String,
    pub deadline_date: String,
    pub manuscript_id: String,
    pub admin_name: String,
}

/// Free-form notification with caller-supplied content.
#[derive(Debug, Clone, Default)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

#[derive(Clone)]
pub struct NotificationComposer {
    sender: String,
    review_portal_url: String,
    templates: Environment<'static>,
}

impl NotificationComposer {
    /// # Arguments
    /// * `sender` - From header for every composed message (e.g. `Manuscan <editor@manuscan.app>`)
    /// * `review_portal_url` - Link placed in reviewer invitations
    pub fn new(sender: impl Into<String>, review_portal_url: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            review_portal_url: review_portal_url.into(),
            templates: Environment::new(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Build the invitation email. Fails with a validation error naming the
    /// first blank field.
    pub fn reviewer_invitation(
        &self,
        invitation: &ReviewerInvitation,
    ) -> Result<EmailMessage, AppError> {
        let to = require_non_empty("reviewerEmail", &invitation.reviewer_email)?;
        let reviewer_name = require_non_empty("reviewerName", &invitation.reviewer_name)?;
        let manuscript_title = require_non_empty("manuscriptTitle", &invitation.manuscript_title)?;
        let deadline_date = require_non_empty("deadlineDate", &invitation.deadline_date)?;
        let manuscript_id = require_non_empty("manuscriptId", &invitation.manuscript_id)?;
        let admin_name = require_non_empty("adminName", &invitation.admin_name)?;

        let ctx = context! {
            reviewer_name,
            manuscript_title,
            deadline_date,
            manuscript_id,
            admin_name,
            review_portal_url => self.review_portal_url.as_str(),
        };

        let html = self.render(INVITATION_HTML_NAME, INVITATION_HTML, &ctx)?;
        let text = self.render(INVITATION_TEXT_NAME, INVITATION_TEXT, &ctx)?;

        Ok(EmailMessage {
            from: self.sender.clone(),
            to: to.to_string(),
            subject: format!("Invitation to review: {}", manuscript_title),
            html,
            text: Some(text),
        })
    }

    /// Build a free-form notification. Content is passed through unchanged.
    pub fn notification(&self, notification: &Notification) -> Result<EmailMessage, AppError> {
        let to = require_non_empty("to", &notification.to)?;
        require_non_empty("subject", &notification.subject)?;
        require_non_empty("htmlBody", &notification.html_body)?;

        Ok(EmailMessage {
            from: self.sender.clone(),
            to: to.to_string(),
            subject: notification.subject.clone(),
            html: notification.html_body.clone(),
            text: non_blank(notification.text_body.as_deref()).and(notification.text_body.clone()),
        })
    }

    fn render(
        &self,
        name: &str,
        source: &str,
        ctx: &minijinja::Value,
    ) -> Result<String, AppError> {
        self.templates
            .render_named_str(name, source, ctx)
            .map_err(|e| AppError::Internal(format!("Failed to render {}: {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manuscan_core::ValidationError;

    fn composer() -> NotificationComposer {
        NotificationComposer::new(
            "Manuscan <editor@manuscan.app>",
            "https://review.manuscan.app/reviewer",
        )
    }

    fn invitation() -> ReviewerInvitation {
        ReviewerInvitation {
            reviewer_email: "ada@example.org".to_string(),
            reviewer_name: "Ada Lovelace".to_string(),
            manuscript_title: "On Analytical Engines".to_string(),
            deadline_date: "November 30, 2026".to_string(),
            manuscript_id: "MS-2026-0042".to_string(),
            admin_name: "Editorial Office".to_string(),
        }
    }

    #[test]
    fn invitation_contains_request_details() {
        let message = composer().reviewer_invitation(&invitation()).unwrap();

        assert_eq!(message.to, "ada@example.org");
        assert_eq!(message.from, "Manuscan <editor@manuscan.app>");
        assert_eq!(message.subject, "Invitation to review: On Analytical Engines");
        for needle in [
            "Ada Lovelace",
            "On Analytical Engines",
            "November 30, 2026",
            "MS-2026-0042",
            "Editorial Office",
            "https://review.manuscan.app/reviewer",
        ] {
            assert!(message.html.contains(needle), "html missing {needle}");
        }

        let text = message.text.unwrap();
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("November 30, 2026"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn invitation_escapes_interpolated_values() {
        let mut request = invitation();
        request.manuscript_title = "<script>alert(1)</script> & more".to_string();

        let message = composer().reviewer_invitation(&request).unwrap();

        assert!(!message.html.contains("<script>"));
        assert!(message.html.contains("&lt;script&gt;"));
        assert!(message.html.contains("&amp; more"));
    }

    #[test]
    fn invitation_fields_are_trimmed() {
        let mut request = invitation();
        request.reviewer_email = "  ada@example.org \n".to_string();
        request.manuscript_title = " Padded ".to_string();

        let message = composer().reviewer_invitation(&request).unwrap();

        assert_eq!(message.to, "ada@example.org");
        assert_eq!(message.subject, "Invitation to review: Padded");
    }

    #[test]
    fn invitation_names_first_missing_field() {
        let mut request = invitation();
        request.deadline_date = "   ".to_string();
        request.admin_name = String::new();

        let err = composer().reviewer_invitation(&request).unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingField("deadlineDate"))
        ));
    }

    #[test]
    fn notification_requires_subject() {
        let err = composer()
            .notification(&Notification {
                to: "author@example.org".to_string(),
                subject: "".to_string(),
                html_body: "<p>Your manuscript was accepted</p>".to_string(),
                text_body: None,
            })
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingField("subject"))
        ));
    }

    #[test]
    fn notification_passes_content_through() {
        let message = composer()
            .notification(&Notification {
                to: "author@example.org".to_string(),
                subject: "Decision on MS-2026-0042".to_string(),
                html_body: "<p>Accepted</p>".to_string(),
                text_body: Some("Accepted".to_string()),
            })
            .unwrap();

        assert_eq!(message.subject, "Decision on MS-2026-0042");
        assert_eq!(message.html, "<p>Accepted</p>");
        assert_eq!(message.text.as_deref(), Some("Accepted"));
    }

    #[test]
    fn blank_text_body_is_absent() {
        let message = composer()
            .notification(&Notification {
                to: "author@example.org".to_string(),
                subject: "Update".to_string(),
                html_body: "<p>Update</p>".to_string(),
                text_body: Some("  ".to_string()),
            })
            .unwrap();

        assert!(message.text.is_none());
    }
}
