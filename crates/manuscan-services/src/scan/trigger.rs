use super::{PipelineError, ScanFailurePolicy, ScanOutcome, ScratchFile, VerdictHandler};
use crate::scanner::MalwareScanner;
use manuscan_core::models::UploadEvent;
use manuscan_db::SubmissionStore;
use manuscan_storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MANUSCRIPTS_PREFIX: &str = "manuscripts/";

/// Entry point for storage finalize events.
///
/// Each call handles one event start to finish: prefix filter, download to a
/// scratch file, scan, then verdict.
#[derive(Clone)]
pub struct UploadScanTrigger {
    storage: Arc<dyn Storage>,
    scanner: Arc<dyn MalwareScanner>,
    verdicts: VerdictHandler,
    bucket: Option<String>,
    prefix: String,
    scratch_dir: PathBuf,
    failure_policy: ScanFailurePolicy,
}

impl UploadScanTrigger {
    /// Trigger watching `manuscripts/`, writing scratch copies to the system
    /// temp dir, with the fail-open policy.
    pub fn new(
        storage: Arc<dyn Storage>,
        scanner: Arc<dyn MalwareScanner>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            verdicts: VerdictHandler::new(storage.clone(), submissions),
            storage,
            scanner,
            bucket: None,
            prefix: DEFAULT_MANUSCRIPTS_PREFIX.to_string(),
            scratch_dir: std::env::temp_dir(),
            failure_policy: ScanFailurePolicy::default(),
        }
    }

    /// Only scan events from this bucket. Without one every bucket is accepted.
    pub fn with_bucket(mut self, bucket: Option<String>) -> Self {
        self.bucket = bucket;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: ScanFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether an object path is subject to scanning
    pub fn watches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    fn accepts_bucket(&self, bucket: &str) -> bool {
        self.bucket.as_deref().map_or(true, |expected| expected == bucket)
    }

    #[tracing::instrument(skip(self, event), fields(bucket = %event.bucket, path = %event.path()))]
    pub async fn handle(&self, event: &UploadEvent) -> Result<ScanOutcome, PipelineError> {
        if !self.accepts_bucket(&event.bucket) {
            tracing::warn!(
                expected = self.bucket.as_deref().unwrap_or_default(),
                "Upload event for an unwatched bucket, ignoring"
            );
            return Ok(ScanOutcome::Ignored);
        }

        let path = event.path();
        if !self.watches(path) {
            tracing::debug!(prefix = %self.prefix, "Upload outside manuscripts prefix, ignoring");
            return Ok(ScanOutcome::Ignored);
        }

        let start = Instant::now();
        let scratch = ScratchFile::download(self.storage.as_ref(), path, &self.scratch_dir)
            .await
            .inspect_err(|e| match e {
                PipelineError::Download { source, .. } if source.is_not_found() => {
                    tracing::warn!(error = %e, "Upload vanished before it could be scanned")
                }
                _ => tracing::error!(error = %e, "Failed to download upload for scanning"),
            })?;

        let size_bytes = scratch.size_bytes();
        let scan = self.scanner.scan_file(scratch.path()).await;
        drop(scratch);

        let result = match scan {
            Ok(result) => result,
            Err(e) => match self.failure_policy {
                ScanFailurePolicy::FailOpen => {
                    tracing::warn!(error = %e, "Scan failed, leaving file in place (fail-open)");
                    return Ok(ScanOutcome::ScanFailed {
                        reason: e.to_string(),
                    });
                }
                ScanFailurePolicy::FailClosed => {
                    tracing::error!(error = %e, "Scan failed (fail-closed)");
                    return Err(PipelineError::Scan(e));
                }
            },
        };

        let outcome = self.verdicts.apply(event, &result).await;
        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            size_bytes,
            infected = result.infected,
            "Upload scan finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeScanner, FlakyStorage};
    use manuscan_core::models::{Submission, SubmissionStatus};
    use manuscan_core::ScanError;
    use manuscan_db::InMemorySubmissionStore;
    use manuscan_storage::LocalStorage;
    use tempfile::TempDir;
    use uuid::Uuid;

    const PATH: &str = "manuscripts/abc.pdf";
    const BODY: &[u8] = b"%PDF-1.7 manuscript";

    struct Harness {
        _root: TempDir,
        scratch: TempDir,
        storage: Arc<FlakyStorage>,
        scanner: Arc<FakeScanner>,
        store: InMemorySubmissionStore,
        submission: Submission,
    }

    impl Harness {
        async fn new(scanner: FakeScanner) -> Self {
            let root = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let local = LocalStorage::new(root.path()).await.unwrap();
            let storage = Arc::new(FlakyStorage::new(Arc::new(local)));
            storage
                .put_object(PATH, BODY.to_vec(), "application/pdf")
                .await
                .unwrap();

            let store = InMemorySubmissionStore::new();
            let submission = Submission::pending(
                Uuid::new_v4(),
                Uuid::new_v4(),
                PATH,
                "https://files.example.org/manuscripts/abc.pdf",
            );
            store.insert(submission.clone()).await;

            Self {
                _root: root,
                scratch,
                storage,
                scanner: Arc::new(scanner),
                store,
                submission,
            }
        }

        fn trigger(&self) -> UploadScanTrigger {
            UploadScanTrigger::new(
                self.storage.clone(),
                self.scanner.clone(),
                Arc::new(self.store.clone()),
            )
            .with_scratch_dir(self.scratch.path())
        }

        fn scratch_is_empty(&self) -> bool {
            std::fs::read_dir(self.scratch.path()).unwrap().count() == 0
        }

        async fn object_exists(&self) -> bool {
            self.storage.exists(PATH).await.unwrap()
        }

        async fn record(&self) -> Submission {
            self.store.get(self.submission.id).await.unwrap()
        }
    }

    #[tokio::test]
    async fn infected_upload_is_deleted_and_records_rejected() {
        let h = Harness::new(FakeScanner::infected(&["Eicar-Test"])).await;

        let outcome = h.trigger().handle(&UploadEvent::new("papers", PATH)).await.unwrap();

        assert!(matches!(outcome, ScanOutcome::Infected { object_deleted: true, ref records } if records.len() == 1));
        assert!(!h.object_exists().await);
        let record = h.record().await;
        assert_eq!(record.status, SubmissionStatus::RejectedInfected);
        assert_eq!(record.infected_viruses, vec!["Eicar-Test"]);
        assert!(record.file_url.is_none() && record.storage_path.is_none());

        let scanned = h.scanner.scanned();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].contents, BODY);
        assert!(!scanned[0].path.exists());
        assert!(h.scratch_is_empty());
    }

    #[tokio::test]
    async fn clean_upload_is_left_alone() {
        let h = Harness::new(FakeScanner::clean()).await;

        let outcome = h.trigger().handle(&UploadEvent::new("papers", PATH)).await.unwrap();

        assert_eq!(outcome, ScanOutcome::Clean);
        assert!(h.object_exists().await);
        assert_eq!(h.record().await, h.submission);
        assert!(h.scratch_is_empty());
    }

    #[tokio::test]
    async fn paths_outside_prefix_are_ignored() {
        let h = Harness::new(FakeScanner::infected(&["Eicar-Test"])).await;

        let outcome = h
            .trigger()
            .handle(&UploadEvent::new("papers", "uploads/other.txt"))
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Ignored);
        assert_eq!(h.storage.downloads(), 0);
        assert!(h.scanner.scanned().is_empty());
        assert_eq!(h.record().await, h.submission);
    }

    #[tokio::test]
    async fn other_bucket_is_ignored() {
        let h = Harness::new(FakeScanner::infected(&["Eicar-Test"])).await;
        let trigger = h.trigger().with_bucket(Some("papers".to_string()));

        let outcome = trigger
            .handle(&UploadEvent::new("some-other-bucket", PATH))
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Ignored);
        assert_eq!(h.storage.downloads(), 0);
        assert!(h.scanner.scanned().is_empty());
        assert!(h.object_exists().await);
        assert_eq!(h.record().await, h.submission);
    }

    #[tokio::test]
    async fn watched_bucket_is_scanned() {
        let h = Harness::new(FakeScanner::infected(&["Eicar-Test"])).await;
        let trigger = h.trigger().with_bucket(Some("papers".to_string()));

        let outcome = trigger.handle(&UploadEvent::new("papers", PATH)).await.unwrap();

        assert!(matches!(outcome, ScanOutcome::Infected { object_deleted: true, .. }));
        assert!(!h.object_exists().await);
    }

    #[tokio::test]
    async fn custom_prefix_is_honored() {
        let h = Harness::new(FakeScanner::clean()).await;
        let trigger = h.trigger().with_prefix("incoming/");

        assert!(!trigger.watches(PATH));
        assert!(trigger.watches("incoming/x.pdf"));
        let outcome = trigger.handle(&UploadEvent::new("papers", PATH)).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Ignored);
    }

    #[tokio::test]
    async fn scanner_error_fails_open_without_changes() {
        let h = Harness::new(FakeScanner::failing(ScanError::TimedOut { timeout_secs: 30 })).await;

        let outcome = h.trigger().handle(&UploadEvent::new("papers", PATH)).await.unwrap();

        assert!(matches!(outcome, ScanOutcome::ScanFailed { ref reason } if reason.contains("30")));
        assert!(h.object_exists().await);
        assert_eq!(h.record().await, h.submission);
        assert!(h.scratch_is_empty());
    }

    #[tokio::test]
    async fn scanner_error_fail_closed_propagates() {
        let h = Harness::new(FakeScanner::failing(ScanError::Unreachable(
            "connection refused".to_string(),
        )))
        .await;

        let err = h
            .trigger()
            .with_failure_policy(ScanFailurePolicy::FailClosed)
            .handle(&UploadEvent::new("papers", PATH))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Scan(ScanError::Unreachable(_))));
        assert!(h.object_exists().await);
        assert_eq!(h.record().await, h.submission);
        assert!(h.scratch_is_empty());
    }

    #[tokio::test]
    async fn download_failure_propagates_without_scanning() {
        let h = Harness::new(FakeScanner::infected(&["Eicar-Test"])).await;
        h.storage.fail_downloads(true);

        let err = h
            .trigger()
            .handle(&UploadEvent::new("papers", PATH))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Download { .. }));
        assert!(h.scanner.scanned().is_empty());
        h.storage.fail_downloads(false);
        assert!(h.object_exists().await);
        assert_eq!(h.record().await, h.submission);
        assert!(h.scratch_is_empty());
    }

    #[tokio::test]
    async fn delete_failure_still_rejects_records() {
        let h = Harness::new(FakeScanner::infected(&["Eicar-Test"])).await;
        h.storage.fail_deletes(true);

        let outcome = h.trigger().handle(&UploadEvent::new("papers", PATH)).await.unwrap();

        assert!(matches!(outcome, ScanOutcome::Infected { object_deleted: false, .. }));
        assert!(h.object_exists().await);
        assert_eq!(h.record().await.status, SubmissionStatus::RejectedInfected);
    }
}
