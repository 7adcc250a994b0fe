//! Configuration validation
//!
//! Startup checks that go beyond `Config::validate`: combinations that are
//! legal but likely mistakes in a deployed service.

use anyhow::Result;
use manuscan_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Fails fast on settings that would break scanning or expose the event
/// endpoint; warns about settings that only degrade behavior.
pub fn validate_config(config: &Config) -> Result<()> {
    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    match config.storage_backend().unwrap_or(StorageBackend::S3) {
        StorageBackend::S3 if config.s3_bucket().is_none() => {
            return Err(anyhow::anyhow!("S3_BUCKET must be set for the s3 storage backend"));
        }
        StorageBackend::Local if config.local_storage_path().is_none() => {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set for the local storage backend"
            ));
        }
        _ => {}
    }

    if !config.manuscripts_prefix().ends_with('/') {
        tracing::warn!(
            prefix = %config.manuscripts_prefix(),
            "MANUSCRIPTS_PREFIX does not end with '/'; sibling paths sharing the prefix will be scanned too"
        );
    }

    if is_production && config.service_api_key().is_none() {
        tracing::warn!(
            "SERVICE_API_KEY not set in production - the storage event endpoint accepts unauthenticated requests"
        );
    }

    if config.mail().smtp.is_none() {
        tracing::warn!("SMTP_HOST not set - mail delivery has no fallback transport");
    }

    if config.scanner().fail_closed {
        tracing::info!("CLAMAV_FAIL_CLOSED enabled - scanner outages will fail storage events");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use manuscan_core::config::ServiceConfig;
    use manuscan_core::{MailConfig, ScannerConfig};

    fn local_config() -> ServiceConfig {
        ServiceConfig {
            server_port: 4000,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            log_format: "compact".to_string(),
            database_url: "postgresql://localhost/manuscan".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/var/lib/manuscan".to_string()),
            manuscripts_prefix: "manuscripts/".to_string(),
            event_bucket: None,
            scan_scratch_dir: None,
            scanner: ScannerConfig {
                host: "127.0.0.1".to_string(),
                port: 3310,
                timeout_secs: 30,
                fail_closed: false,
            },
            mail: MailConfig {
                api_key: "re_test".to_string(),
                api_base_url: "https://api.resend.com".to_string(),
                from: "Editorial Office <editor@example.org>".to_string(),
                smtp: None,
                attempt_timeout_secs: 15,
                review_portal_url: "https://review.example.org".to_string(),
            },
            service_api_key: None,
        }
    }

    fn validate(config: ServiceConfig) -> Result<()> {
        validate_config(&Config(Box::new(config)))
    }

    #[test]
    fn development_defaults_pass() {
        assert!(validate(local_config()).is_ok());
    }

    #[test]
    fn wildcard_cors_fails_in_production() {
        let mut config = local_config();
        config.environment = "production".to_string();
        assert!(validate(config.clone()).is_err());

        config.cors_origins = vec!["https://review.example.org".to_string()];
        assert!(validate(config).is_ok());
    }

    #[test]
    fn zero_db_timeout_fails() {
        let mut config = local_config();
        config.db_timeout_seconds = 0;
        assert!(validate(config).is_err());
    }

    #[test]
    fn backend_without_location_fails() {
        let mut config = local_config();
        config.local_storage_path = None;
        assert!(validate(config.clone()).is_err());

        config.storage_backend = None;
        let err = validate(config).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));
    }
}
