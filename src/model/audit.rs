//! Append-only audit trail attached to a task.
//!
//! History entries describe every status, priority, and comment mutation;
//! comments dual-write one history entry carrying the same timestamp. Entries
//! are never edited, reordered, or deleted.

use chrono::{DateTime, Utc};

use super::task::Task;
use crate::error::{Error, Result};

/// One timestamped change description.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// One timestamped comment by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentEntry {
    pub at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

/// Append-only change log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History(Vec<HistoryEntry>);

impl History {
    /// Append one entry. Blank text is rejected.
    pub fn record(&mut self, at: DateTime<Utc>, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::Validation("history text must not be blank".into()));
        }
        self.0.push(HistoryEntry { at, text });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub(crate) fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self(entries)
    }
}

/// Append-only comment log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comments(Vec<CommentEntry>);

impl Comments {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&CommentEntry> {
        self.0.last()
    }

    pub fn entries(&self) -> &[CommentEntry] {
        &self.0
    }

    pub(crate) fn from_entries(entries: Vec<CommentEntry>) -> Self {
        Self(entries)
    }

    fn push(&mut self, entry: CommentEntry) {
        self.0.push(entry);
    }
}

// ============================================================================
// Audit operations on Task
// ============================================================================

impl Task {
    /// Append a history entry describing a change.
    pub fn record(&mut self, at: DateTime<Utc>, text: impl Into<String>) -> Result<()> {
        self.history.record(at, text)
    }

    /// Add a comment and its derived history entry.
    ///
    /// Both entries share `at`; the history message is
    /// `"Comment added by {author}"`.
    pub fn comment(&mut self, at: DateTime<Utc>, author: &str, text: &str) -> Result<()> {
        if author.trim().is_empty() {
            return Err(Error::Validation("comment author must not be blank".into()));
        }
        if text.trim().is_empty() {
            return Err(Error::Validation("comment text must not be blank".into()));
        }
        self.comments.push(CommentEntry {
            at,
            author: author.to_string(),
            text: text.to_string(),
        });
        self.history.record(at, format!("Comment added by {author}"))
    }
}
