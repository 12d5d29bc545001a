//! Project records and the canonical project key.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::task::Task;

/// Canonical key of a project: the owning username plus the owner-scoped id.
///
/// Project ids are unique only within one owner's projects, so every lookup
/// and every cross-reference carries the owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectKey {
    pub owner: String,
    pub id: String,
}

impl ProjectKey {
    pub fn new(owner: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.id)
    }
}

/// A project: caller-supplied id, metadata, member usernames, and tasks.
///
/// The canonical copy lives once in the store's project arena under its
/// [`ProjectKey`]; owner and member views reference it by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Usernames with member access, duplicate-free, insertion order. The
    /// owner is never listed here.
    pub members: Vec<String>,
    pub tasks: Vec<Task>,
}

impl Project {
    /// Create an empty project.
    pub fn new(id: String, title: String, description: String) -> Self {
        Self {
            id,
            title,
            description,
            members: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Find a task by id.
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    #[test]
    fn test_project_key_display() {
        let key = ProjectKey::new("bob", "p1");
        assert_eq!(key.to_string(), "bob/p1");
    }

    #[test]
    fn test_task_lookup() {
        let mut p = Project::new("p1".into(), "First".into(), "".into());
        let task = Task::new("t".into(), "".into(), Priority::Low, vec![]);
        let id = task.id;
        p.tasks.push(task);
        assert!(p.task(id).is_some());
        assert!(p.task(Uuid::new_v4()).is_none());
    }
}
