//! Service construction from configuration

use crate::state::AppState;
use anyhow::{Context, Result};
use manuscan_core::Config;
use manuscan_db::{SubmissionRepository, SubmissionStore};
use manuscan_services::{
    create_storage, ClamAVScanner, HttpMailProvider, MailGateway, MailTransport, MalwareScanner,
    NotificationComposer, ScanFailurePolicy, SmtpMailTransport, UploadScanTrigger,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Build storage, scanner, mail, and the scan pipeline.
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend_type(), "Storage initialized");

    let scanner_config = config.scanner();
    let scanner: Arc<dyn MalwareScanner> = Arc::new(ClamAVScanner::from_config(scanner_config));
    let failure_policy = ScanFailurePolicy::from_fail_closed(scanner_config.fail_closed);
    tracing::info!(
        host = %scanner_config.host,
        port = scanner_config.port,
        timeout_secs = scanner_config.timeout_secs,
        fail_closed = scanner_config.fail_closed,
        "ClamAV scanner configured"
    );

    let submissions: Arc<dyn SubmissionStore> = Arc::new(SubmissionRepository::new(pool));

    let trigger = UploadScanTrigger::new(storage.clone(), scanner.clone(), submissions.clone())
        .with_bucket(config.watched_bucket().map(String::from))
        .with_prefix(config.manuscripts_prefix())
        .with_scratch_dir(config.scan_scratch_dir())
        .with_failure_policy(failure_policy);

    let mail_config = config.mail();
    let primary: Arc<dyn MailTransport> = Arc::new(HttpMailProvider::new(
        mail_config.api_base_url.clone(),
        mail_config.api_key.clone(),
    )?);
    let fallback: Option<Arc<dyn MailTransport>> = match &mail_config.smtp {
        Some(smtp) => Some(Arc::new(SmtpMailTransport::from_config(smtp)?) as Arc<dyn MailTransport>),
        None => {
            tracing::warn!("SMTP fallback not configured; mail delivery has no fallback");
            None
        }
    };
    let gateway = MailGateway::new(
        primary,
        fallback,
        Duration::from_secs(mail_config.attempt_timeout_secs),
    );
    let composer = NotificationComposer::new(
        mail_config.from.clone(),
        mail_config.review_portal_url.clone(),
    );

    Ok(Arc::new(AppState::new(
        composer,
        gateway,
        trigger,
        storage,
        scanner,
        submissions,
        config.service_api_key().map(String::from),
    )))
}
