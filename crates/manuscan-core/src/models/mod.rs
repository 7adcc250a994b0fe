pub mod email;
pub mod submission;
pub mod upload;

pub use email::EmailMessage;
pub use submission::{Submission, SubmissionStatus};
pub use upload::{ScanResult, UploadEvent};
