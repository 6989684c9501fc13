pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod job;
pub mod models;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::ArchiverConfig;
pub use dispatch::{ArchiveDispatcher, ArchiveEvent, ArchiveReporter, LOG_TARGET, TracingReporter};
pub use error::{AppError, NetworkFailureKind};
pub use extract::extract_urls;
pub use job::NoteArchiveJob;
pub use models::{ArchiveOutcome, DispatchSummary, ExtractedUrl, ModNote};
pub use traits::{ArchiveClient, NoteRecord};
