//! Configuration module
//!
//! Environment-sourced configuration for the scan pipeline, the mail gateway,
//! storage, and the HTTP server. `.env` files are honoured via `dotenvy`.

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const CLAMAV_HOST: &str = "127.0.0.1";
const CLAMAV_PORT: u16 = 3310;
const CLAMAV_TIMEOUT_SECS: u64 = 30;
const SMTP_PORT: u16 = 587;
const MAIL_ATTEMPT_TIMEOUT_SECS: u64 = 15;
const MAIL_API_BASE_URL: &str = "https://api.resend.com";
const MANUSCRIPTS_PREFIX: &str = "manuscripts/";
const REVIEW_PORTAL_URL: &str = "https://review.manuscan.app/reviewer";

/// Malware scanner daemon settings.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    /// When true, scanner failures are surfaced instead of treated as no-ops.
    pub fail_closed: bool,
}

/// SMTP relay used as the fallback mail transport.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

/// Mail delivery settings: primary HTTP provider plus optional SMTP fallback.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub from: String,
    pub smtp: Option<SmtpConfig>,
    pub attempt_timeout_secs: u64,
    pub review_portal_url: String,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub log_format: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, GCS interop, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    // Scan pipeline
    pub event_bucket: Option<String>,
    pub manuscripts_prefix: String,
    pub scan_scratch_dir: Option<PathBuf>,
    pub scanner: ScannerConfig,
    // Mail
    pub mail: MailConfig,
    // Shared secret for the storage event endpoint
    pub service_api_key: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn log_format(&self) -> &str {
        &self.inner().log_format
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    /// Bucket whose finalize events are scanned: `EVENT_BUCKET`, else the S3
    /// bucket. `None` accepts events from any bucket.
    pub fn watched_bucket(&self) -> Option<&str> {
        let inner = self.inner();
        inner.event_bucket.as_deref().or_else(|| {
            match inner.storage_backend.unwrap_or(StorageBackend::S3) {
                StorageBackend::S3 => inner.s3_bucket.as_deref(),
                StorageBackend::Local => None,
            }
        })
    }

    pub fn manuscripts_prefix(&self) -> &str {
        &self.inner().manuscripts_prefix
    }

    pub fn scan_scratch_dir(&self) -> PathBuf {
        self.inner()
            .scan_scratch_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }

    pub fn scanner(&self) -> &ScannerConfig {
        &self.inner().scanner
    }

    pub fn mail(&self) -> &MailConfig {
        &self.inner().mail
    }

    pub fn service_api_key(&self) -> Option<&str> {
        self.inner().service_api_key.as_deref()
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|s| s.trim().to_lowercase())
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok());

        let smtp = env_opt("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0)
                .unwrap_or(SMTP_PORT),
            user: env_opt("SMTP_USER"),
            password: env_opt("SMTP_PASSWORD"),
            tls: env_bool("SMTP_TLS", true),
        });

        let config = ServiceConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            aws_region: env_opt("AWS_REGION"),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            event_bucket: env_opt("EVENT_BUCKET"),
            manuscripts_prefix: env::var("MANUSCRIPTS_PREFIX")
                .unwrap_or_else(|_| MANUSCRIPTS_PREFIX.to_string()),
            scan_scratch_dir: env_opt("SCAN_SCRATCH_DIR").map(PathBuf::from),
            scanner: ScannerConfig {
                host: env::var("CLAMAV_HOST").unwrap_or_else(|_| CLAMAV_HOST.to_string()),
                port: env::var("CLAMAV_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(CLAMAV_PORT),
                timeout_secs: env::var("CLAMAV_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(CLAMAV_TIMEOUT_SECS),
                fail_closed: env_bool("CLAMAV_FAIL_CLOSED", false),
            },
            mail: MailConfig {
                api_key: env::var("MAIL_API_KEY")
                    .map_err(|_| anyhow::anyhow!("MAIL_API_KEY must be set"))?,
                api_base_url: env::var("MAIL_API_BASE_URL")
                    .unwrap_or_else(|_| MAIL_API_BASE_URL.to_string()),
                from: env::var("MAIL_FROM")
                    .map_err(|_| anyhow::anyhow!("MAIL_FROM must be set"))?,
                smtp,
                attempt_timeout_secs: env::var("MAIL_ATTEMPT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(MAIL_ATTEMPT_TIMEOUT_SECS),
                review_portal_url: env::var("REVIEW_PORTAL_URL")
                    .unwrap_or_else(|_| REVIEW_PORTAL_URL.to_string()),
            },
            service_api_key: env_opt("SERVICE_API_KEY"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if is_production_name(&self.environment) && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS cannot be 0"));
        }

        if self.mail.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("MAIL_API_KEY cannot be empty"));
        }

        if self.mail.from.trim().is_empty() {
            return Err(anyhow::anyhow!("MAIL_FROM cannot be empty"));
        }

        if self.mail.attempt_timeout_secs == 0 {
            return Err(anyhow::anyhow!("MAIL_ATTEMPT_TIMEOUT_SECS must be greater than 0"));
        }

        if self.scanner.timeout_secs == 0 {
            return Err(anyhow::anyhow!("CLAMAV_TIMEOUT_SECS must be greater than 0"));
        }

        if self.manuscripts_prefix.is_empty() {
            return Err(anyhow::anyhow!("MANUSCRIPTS_PREFIX cannot be empty"));
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
