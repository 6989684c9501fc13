use std::future::Future;

use crate::error::AppError;

/// Submits a fully built save-endpoint target over HTTP.
///
/// Implementations own transport concerns (timeouts, TLS, User-Agent, retry
/// budget) and must map failures they can classify to [`AppError::Network`].
/// `Ok(None)` means the call completed without producing a response.
pub trait ArchiveClient: Send + Sync + Clone {
    fn submit(&self, target: &str) -> impl Future<Output = Result<Option<u16>, AppError>> + Send;
}

/// Read-only view of a record carrying note text.
pub trait NoteRecord {
    fn id(&self) -> &str;

    fn note_text(&self) -> &str;
}
