//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::dispatch::{ArchiveEvent, ArchiveReporter};
use crate::error::AppError;
use crate::traits::ArchiveClient;

// ---------------------------------------------------------------------------
// MockArchiveClient
// ---------------------------------------------------------------------------

/// Mock client that records submitted targets and replays queued results.
#[derive(Clone, Default)]
pub struct MockArchiveClient {
    /// Queue of results. Each call pops the first element.
    /// If empty, returns `Ok(Some(200))`.
    responses: Arc<Mutex<Vec<Result<Option<u16>, AppError>>>>,
    targets: Arc<Mutex<Vec<String>>>,
}

impl MockArchiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<Option<u16>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            targets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every target submitted so far, in call order.
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

impl ArchiveClient for MockArchiveClient {
    async fn submit(&self, target: &str) -> Result<Option<u16>, AppError> {
        self.targets.lock().unwrap().push(target.to_string());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Some(200))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.as_str() == label)
            .count()
    }
}

impl ArchiveReporter for MockReporter {
    fn report(&self, event: ArchiveEvent<'_>) {
        let label = match &event {
            ArchiveEvent::BatchStarted { .. } => "BatchStarted",
            ArchiveEvent::Submitting { .. } => "Submitting",
            ArchiveEvent::Saved { .. } => "Saved",
            ArchiveEvent::NoResponse { .. } => "NoResponse",
            ArchiveEvent::Failed { .. } => "Failed",
            ArchiveEvent::Pausing { .. } => "Pausing",
            ArchiveEvent::BatchFinished { .. } => "BatchFinished",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}
