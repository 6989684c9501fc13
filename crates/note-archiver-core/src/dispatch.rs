use std::time::Duration;

use uuid::Uuid;

use crate::config::ArchiverConfig;
use crate::error::{AppError, NetworkFailureKind};
use crate::models::{ArchiveOutcome, DispatchSummary, ExtractedUrl};
use crate::traits::ArchiveClient;

/// Fixed tracing target for every archiver log line.
pub const LOG_TARGET: &str = "note_archiver";

/// Events emitted while archiving a note's links.
#[derive(Debug, Clone)]
pub enum ArchiveEvent<'a> {
    BatchStarted {
        run_id: Uuid,
        record_id: &'a str,
        url_count: usize,
    },
    Submitting {
        url: &'a str,
        target: &'a str,
    },
    Saved {
        url: &'a str,
        status: u16,
    },
    NoResponse {
        url: &'a str,
    },
    Failed {
        url: &'a str,
        kind: NetworkFailureKind,
        message: &'a str,
    },
    Pausing {
        delay: Duration,
    },
    BatchFinished {
        run_id: Uuid,
        record_id: &'a str,
        summary: &'a DispatchSummary,
    },
}

/// Trait for receiving archive events (decoupled logging).
pub trait ArchiveReporter: Send + Sync {
    fn report(&self, event: ArchiveEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ArchiveReporter for TracingReporter {
    fn report(&self, event: ArchiveEvent<'_>) {
        match event {
            ArchiveEvent::BatchStarted {
                run_id,
                record_id,
                url_count,
            } => {
                tracing::info!(target: LOG_TARGET, %run_id, %record_id, %url_count, "Archiving links from note");
            }
            ArchiveEvent::Submitting { url, target } => {
                tracing::debug!(target: LOG_TARGET, %url, save_target = %target, "Submitting link");
            }
            ArchiveEvent::Saved { url, status } => {
                tracing::info!(target: LOG_TARGET, %url, %status, "Saved");
            }
            ArchiveEvent::NoResponse { url } => {
                tracing::warn!(target: LOG_TARGET, %url, "No response from archive service");
            }
            ArchiveEvent::Failed { url, kind, message } => {
                tracing::warn!(target: LOG_TARGET, %url, %kind, error = %message, "Archive submission failed");
            }
            ArchiveEvent::Pausing { delay } => {
                tracing::debug!(target: LOG_TARGET, delay_ms = %delay.as_millis(), "Pausing before next link");
            }
            ArchiveEvent::BatchFinished {
                run_id,
                record_id,
                summary,
            } => {
                tracing::debug!(
                    target: LOG_TARGET,
                    %run_id,
                    %record_id,
                    saved = summary.saved,
                    no_response = summary.no_response,
                    failed = summary.failed,
                    "Finished archiving note"
                );
            }
        }
    }
}

/// Submits links to the save endpoint one at a time with fixed pacing.
///
/// A failure on one link never affects the next. Only classified network
/// failures are contained; every other error ends the batch and is returned.
#[derive(Clone)]
pub struct ArchiveDispatcher<C: ArchiveClient> {
    client: C,
    config: ArchiverConfig,
}

impl<C: ArchiveClient> ArchiveDispatcher<C> {
    pub fn new(client: C, config: ArchiverConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    pub async fn dispatch<R: ArchiveReporter>(
        &self,
        urls: &[ExtractedUrl],
        reporter: &R,
    ) -> Result<DispatchSummary, AppError> {
        let mut summary = DispatchSummary::default();

        for (i, url) in urls.iter().enumerate() {
            let outcome = self.submit_one(url, reporter).await?;
            summary.record(&outcome);

            if i + 1 < urls.len() {
                reporter.report(ArchiveEvent::Pausing {
                    delay: self.config.pacing_interval,
                });
                tokio::time::sleep(self.config.pacing_interval).await;
                summary.pauses += 1;
            }
        }

        Ok(summary)
    }

    async fn submit_one<R: ArchiveReporter>(
        &self,
        url: &ExtractedUrl,
        reporter: &R,
    ) -> Result<ArchiveOutcome, AppError> {
        let url = url.as_str();
        let target = self.config.save_target(url);
        reporter.report(ArchiveEvent::Submitting {
            url,
            target: &target,
        });

        match self.client.submit(&target).await {
            Ok(Some(status)) => {
                reporter.report(ArchiveEvent::Saved { url, status });
                Ok(ArchiveOutcome::Saved { status })
            }
            Ok(None) => {
                reporter.report(ArchiveEvent::NoResponse { url });
                Ok(ArchiveOutcome::NoResponse)
            }
            Err(AppError::Network { kind, message }) => {
                reporter.report(ArchiveEvent::Failed {
                    url,
                    kind,
                    message: &message,
                });
                Ok(ArchiveOutcome::Failed { kind, message })
            }
            Err(e) => Err(e),
        }
    }
}
