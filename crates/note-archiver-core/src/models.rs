use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, NetworkFailureKind};
use crate::traits::NoteRecord;

/// A normalized absolute `http`/`https` URL found in note text.
///
/// Only [`extract_urls`](crate::extract::extract_urls) constructs these, so
/// the trailing-punctuation and scheme invariants always hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExtractedUrl(String);

impl ExtractedUrl {
    pub(crate) fn new(url: String) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ExtractedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single submission attempt. Lives for one URL only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The save endpoint answered. Any status code counts.
    Saved { status: u16 },
    /// The call completed but produced no response.
    NoResponse,
    /// A classified network failure was contained.
    Failed {
        kind: NetworkFailureKind,
        message: String,
    },
}

/// Tally of one dispatch run, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub saved: usize,
    pub no_response: usize,
    pub failed: usize,
    pub pauses: usize,
}

impl DispatchSummary {
    pub fn submitted(&self) -> usize {
        self.saved + self.no_response + self.failed
    }

    pub(crate) fn record(&mut self, outcome: &ArchiveOutcome) {
        match outcome {
            ArchiveOutcome::Saved { .. } => self.saved += 1,
            ArchiveOutcome::NoResponse => self.no_response += 1,
            ArchiveOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// A moderator note as handed over by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModNote {
    pub id: String,
    pub note: String,
}

impl ModNote {
    pub fn new(id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            note: note.into(),
        }
    }

    /// Parse one newline-delimited JSON record.
    pub fn from_json_line(line: &str) -> Result<Self, AppError> {
        let note: ModNote = serde_json::from_str(line)
            .map_err(|e| AppError::InvalidRecord(format!("malformed note record: {e}")))?;
        if note.id.trim().is_empty() {
            return Err(AppError::InvalidRecord("note record has an empty id".into()));
        }
        Ok(note)
    }
}

impl NoteRecord for ModNote {
    fn id(&self) -> &str {
        &self.id
    }

    fn note_text(&self) -> &str {
        &self.note
    }
}
