//! Application state shared by all handlers.

use manuscan_db::SubmissionStore;
use manuscan_services::{MailGateway, MalwareScanner, NotificationComposer, Storage, UploadScanTrigger};
use std::sync::Arc;

/// Email composition and delivery
#[derive(Clone)]
pub struct MailState {
    pub composer: NotificationComposer,
    pub gateway: MailGateway,
}

/// Upload scanning and the dependencies health probes check
#[derive(Clone)]
pub struct ScanState {
    pub trigger: UploadScanTrigger,
    pub storage: Arc<dyn Storage>,
    pub scanner: Arc<dyn MalwareScanner>,
    pub submissions: Arc<dyn SubmissionStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub mail: MailState,
    pub scan: ScanState,
    /// Shared secret for the storage event endpoint; unset leaves it open
    pub service_api_key: Option<String>,
}

impl AppState {
    /// Assemble state from already-built services.
    pub fn new(
        composer: NotificationComposer,
        gateway: MailGateway,
        trigger: UploadScanTrigger,
        storage: Arc<dyn Storage>,
        scanner: Arc<dyn MalwareScanner>,
        submissions: Arc<dyn SubmissionStore>,
        service_api_key: Option<String>,
    ) -> Self {
        Self {
            mail: MailState { composer, gateway },
            scan: ScanState {
                trigger,
                storage,
                scanner,
                submissions,
            },
            service_api_key,
        }
    }
}
