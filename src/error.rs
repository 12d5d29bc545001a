//! Crate-wide error taxonomy.
//!
//! Every failure a caller can observe is a typed variant of [`Error`]; nothing
//! in the engine panics or swallows a failure. The one sanctioned degradation
//! is the lenient load opt-in on the storage gateway, which logs a warning and
//! starts empty instead of failing on an unreadable document.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A stored or supplied value that could not be decoded into its typed form.
///
/// Carries the logical field name and the offending value so a caller can
/// report exactly what in the document is broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {value:?}")]
pub struct DecodeError {
    /// Which field failed to decode ("priority", "status", "start_time", ...).
    pub field: &'static str,
    /// The offending value as it appeared in the document.
    pub value: String,
}

impl DecodeError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Errors surfaced by workflow, account, and storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown username, project id, task id, or pending registration.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation: project id, username/email, or admin record.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// The user is already a member of the project (or is its owner).
    #[error("already a member: {0}")]
    AlreadyMember(String),

    /// The user is not a member of the project.
    #[error("not a member: {0}")]
    NotMember(String),

    /// An assignee outside the project's members and owner.
    #[error("invalid assignee: {0}")]
    InvalidAssignee(String),

    /// Bad credentials or a disabled account.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A field in the persisted document could not be decoded.
    #[error("store decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The persisted document is not valid JSON.
    #[error("store document is corrupt: {0}")]
    CorruptStore(#[from] serde_json::Error),

    /// The underlying storage is unavailable.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
