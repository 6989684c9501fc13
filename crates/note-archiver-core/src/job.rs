use uuid::Uuid;

use crate::dispatch::{ArchiveDispatcher, ArchiveEvent, ArchiveReporter};
use crate::error::AppError;
use crate::extract::extract_urls;
use crate::models::DispatchSummary;
use crate::traits::{ArchiveClient, NoteRecord};

/// The unit of work run by the scheduler whenever a note is created.
///
/// Each call to [`perform`](Self::perform) owns its link list and shares
/// nothing with other invocations.
#[derive(Clone)]
pub struct NoteArchiveJob<C: ArchiveClient> {
    dispatcher: ArchiveDispatcher<C>,
}

impl<C: ArchiveClient> NoteArchiveJob<C> {
    pub fn new(dispatcher: ArchiveDispatcher<C>) -> Self {
        Self { dispatcher }
    }

    /// Extract links from the record's note text and archive each of them.
    ///
    /// Returns immediately when the note has no links. Errors outside the
    /// classified network set are returned so the scheduler can fail the
    /// invocation.
    pub async fn perform<N, R>(&self, record: &N, reporter: &R) -> Result<DispatchSummary, AppError>
    where
        N: NoteRecord + ?Sized,
        R: ArchiveReporter,
    {
        let urls = extract_urls(record.note_text());
        if urls.is_empty() {
            return Ok(DispatchSummary::default());
        }

        let run_id = Uuid::new_v4();
        let record_id = record.id();
        reporter.report(ArchiveEvent::BatchStarted {
            run_id,
            record_id,
            url_count: urls.len(),
        });

        let summary = self.dispatcher.dispatch(&urls, reporter).await?;

        reporter.report(ArchiveEvent::BatchFinished {
            run_id,
            record_id,
            summary: &summary,
        });

        Ok(summary)
    }
}
