//! The in-memory store and its durable document form.
//!
//! Projects live exactly once in a canonical arena keyed by `(owner, id)`;
//! the per-user owned and member views hold identifiers resolved against the
//! arena at read time, so there are no value copies to diverge.

mod document;
pub mod gateway;
mod membership;

pub use gateway::StorageGateway;

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::model::{Project, ProjectKey, Task, User};

/// The entire in-memory state: every user plus the canonical project arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    pub(crate) users: BTreeMap<String, User>,
    pub(crate) projects: BTreeMap<ProjectKey, Project>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Read views
    // ========================================================================

    /// Look up a user by username.
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// All users with their usernames, ordered by username.
    pub fn users(&self) -> impl Iterator<Item = (&str, &User)> + '_ {
        self.users.iter().map(|(name, user)| (name.as_str(), user))
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn contains_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// True if any user already claims `email`.
    pub fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email == email)
    }

    /// Resolve a project by its canonical key.
    pub fn project(&self, key: &ProjectKey) -> Option<&Project> {
        self.projects.get(key)
    }

    /// Projects owned by `username`, in creation order.
    pub fn owned_projects(&self, username: &str) -> Vec<&Project> {
        let Some(user) = self.users.get(username) else {
            return Vec::new();
        };
        user.owned
            .iter()
            .filter_map(|id| self.projects.get(&ProjectKey::new(username, id)))
            .collect()
    }

    /// Projects where `username` is a member, in join order.
    pub fn member_projects(&self, username: &str) -> Vec<&Project> {
        let Some(user) = self.users.get(username) else {
            return Vec::new();
        };
        user.member_of
            .iter()
            .filter_map(|key| self.projects.get(key))
            .collect()
    }

    /// Find a task inside a project.
    pub fn task(&self, key: &ProjectKey, task_id: Uuid) -> Option<&Task> {
        self.projects.get(key).and_then(|p| p.task(task_id))
    }

    // ========================================================================
    // Crate-internal mutation (workflow engine, accounts, decode)
    // ========================================================================

    pub(crate) fn user_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.get_mut(username)
    }

    pub(crate) fn project_mut(&mut self, key: &ProjectKey) -> Option<&mut Project> {
        self.projects.get_mut(key)
    }

    pub(crate) fn insert_user(&mut self, username: String, user: User) {
        self.users.insert(username, user);
    }
}
