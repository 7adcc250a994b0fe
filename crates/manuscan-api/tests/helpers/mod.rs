//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs in-process: local storage in a temp dir, the in-memory
//! submission store, and fake scanner/mail transports from
//! `manuscan_services::testing`. Run with `cargo test -p manuscan-api`.

use async_trait::async_trait;
use axum_test::TestServer;
use manuscan_api::constants::{CALLABLE_PREFIX, EVENTS_PREFIX};
use manuscan_api::setup::routes;
use manuscan_api::AppState;
use manuscan_core::models::Submission;
use manuscan_core::AppError;
use manuscan_db::{InMemorySubmissionStore, SubmissionStore};
use manuscan_services::testing::{FakeScanner, FakeTransport, FlakyStorage, TransportBehavior};
use manuscan_services::{
    LocalStorage, MailGateway, MailTransport, NotificationComposer, ScanFailurePolicy, Storage,
    UploadScanTrigger,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const SENDER: &str = "Editorial Office <editor@example.org>";
pub const PORTAL_URL: &str = "https://review.example.org/reviewer";
pub const BUCKET: &str = "journal-uploads";

pub fn callable_path(name: &str) -> String {
    format!("{}/{}", CALLABLE_PREFIX, name)
}

pub fn events_path(name: &str) -> String {
    format!("{}/{}", EVENTS_PREFIX, name)
}

/// Submission store whose database is down.
pub struct UnavailableStore;

#[async_trait]
impl SubmissionStore for UnavailableStore {
    async fn find_by_storage_path(&self, _storage_path: &str) -> Result<Vec<Submission>, AppError> {
        Err(AppError::Internal("connection refused".to_string()))
    }

    async fn mark_infected(&self, _id: Uuid, _viruses: &[String]) -> Result<(), AppError> {
        Err(AppError::Internal("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(AppError::Internal("connection refused".to_string()))
    }
}

pub struct TestAppBuilder {
    scanner: FakeScanner,
    primary: TransportBehavior,
    fallback: Option<TransportBehavior>,
    policy: ScanFailurePolicy,
    bucket: Option<String>,
    service_api_key: Option<String>,
    database_down: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            scanner: FakeScanner::clean(),
            primary: TransportBehavior::Accept(Some("re_123".to_string())),
            fallback: None,
            policy: ScanFailurePolicy::FailOpen,
            bucket: Some(BUCKET.to_string()),
            service_api_key: None,
            database_down: false,
        }
    }
}

impl TestAppBuilder {
    pub fn scanner(mut self, scanner: FakeScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn primary(mut self, behavior: TransportBehavior) -> Self {
        self.primary = behavior;
        self
    }

    pub fn fallback(mut self, behavior: TransportBehavior) -> Self {
        self.fallback = Some(behavior);
        self
    }

    pub fn failure_policy(mut self, policy: ScanFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn any_bucket(mut self) -> Self {
        self.bucket = None;
        self
    }

    pub fn service_api_key(mut self, key: &str) -> Self {
        self.service_api_key = Some(key.to_string());
        self
    }

    pub fn database_down(mut self) -> Self {
        self.database_down = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let temp_dir = TempDir::new().expect("create temp dir");
        let local = LocalStorage::new(temp_dir.path().join("objects"))
            .await
            .expect("create local storage");
        let storage = Arc::new(FlakyStorage::new(Arc::new(local)));
        let scanner = Arc::new(self.scanner);
        let submissions = InMemorySubmissionStore::new();
        let store: Arc<dyn SubmissionStore> = if self.database_down {
            Arc::new(UnavailableStore)
        } else {
            Arc::new(submissions.clone())
        };

        let primary = Arc::new(FakeTransport::new("http", self.primary));
        let fallback = self
            .fallback
            .map(|behavior| Arc::new(FakeTransport::new("smtp", behavior)));
        let gateway = MailGateway::new(
            primary.clone(),
            fallback
                .clone()
                .map(|f| f as Arc<dyn MailTransport>),
            Duration::from_millis(500),
        );
        let composer = NotificationComposer::new(SENDER, PORTAL_URL);

        let scratch_dir = temp_dir.path().join("scratch");
        std::fs::create_dir_all(&scratch_dir).expect("create scratch dir");
        let trigger = UploadScanTrigger::new(storage.clone(), scanner.clone(), store.clone())
            .with_bucket(self.bucket)
            .with_scratch_dir(scratch_dir)
            .with_failure_policy(self.policy);

        let state = Arc::new(AppState::new(
            composer,
            gateway,
            trigger,
            storage.clone(),
            scanner.clone(),
            store,
            self.service_api_key,
        ));

        let server = TestServer::new(routes::app_router(state)).expect("start test server");

        TestApp {
            server,
            storage,
            scanner,
            submissions,
            primary,
            fallback,
            _temp_dir: temp_dir,
        }
    }
}

/// Test application: server plus handles on every fake behind it.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<FlakyStorage>,
    pub scanner: Arc<FakeScanner>,
    pub submissions: InMemorySubmissionStore,
    pub primary: Arc<FakeTransport>,
    pub fallback: Option<Arc<FakeTransport>>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Store an object and a pending submission pointing at it.
    pub async fn seed_upload(&self, path: &str, contents: &[u8]) -> Submission {
        let url = self
            .storage
            .put_object(path, contents.to_vec(), "application/pdf")
            .await
            .expect("seed upload");
        let submission = Submission::pending(Uuid::new_v4(), Uuid::new_v4(), path, url);
        self.submissions.insert(submission.clone()).await;
        submission
    }
}

pub async fn setup_test_app() -> TestApp {
    TestAppBuilder::default().build().await
}
