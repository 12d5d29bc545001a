//! Task records and the Priority/Status enumerations.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::audit::{Comments, History};
use crate::error::DecodeError;

// ============================================================================
// Enumerations
// ============================================================================

/// Task priority, most urgent first.
///
/// The declared order is the total order: CRITICAL sorts before LOW. Stored
/// and transported by name, never by rank, so reordering cannot corrupt
/// persisted data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric urgency rank, 1 = most urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }

    /// Wire and display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRITICAL" => Ok(Self::Critical),
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(DecodeError::new("priority", other)),
        }
    }
}

/// Task status.
///
/// BACKLOG → TODO → DOING → DONE → ARCHIVED is the conventional path, but no
/// ordering or transition graph is enforced here; see the workflow engine's
/// transition policy for the extension point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Backlog,
    Todo,
    Doing,
    Done,
    Archived,
}

impl Status {
    /// Wire and display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "BACKLOG",
            Self::Todo => "TODO",
            Self::Doing => "DOING",
            Self::Done => "DONE",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BACKLOG" => Ok(Self::Backlog),
            "TODO" => Ok(Self::Todo),
            "DOING" => Ok(Self::Doing),
            "DONE" => Ok(Self::Done),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(DecodeError::new("status", other)),
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Due timestamp. Defaults to midnight of the creation day.
    pub due_at: DateTime<Utc>,
    /// Usernames assigned to this task, duplicate-free, insertion order.
    pub assignees: Vec<String>,
    pub priority: Priority,
    pub status: Status,
    pub history: History,
    pub comments: Comments,
}

impl Task {
    /// Create a task in BACKLOG with empty history and comments.
    ///
    /// `due_at` starts at 00:00 of the creation day; duplicate assignees are
    /// dropped, first occurrence wins.
    pub fn new(
        title: String,
        description: String,
        priority: Priority,
        assignees: Vec<String>,
    ) -> Self {
        let created_at = Utc::now();
        let due_at = created_at.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            created_at,
            due_at,
            assignees: dedup_usernames(assignees),
            priority,
            status: Status::Backlog,
            history: History::default(),
            comments: Comments::default(),
        }
    }
}

/// Drop duplicate usernames, keeping first-occurrence order.
pub(crate) fn dedup_usernames(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}
