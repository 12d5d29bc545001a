//! User records.

use super::project::ProjectKey;

/// A registered user.
///
/// The username is the store key and is not repeated here. Users are never
/// deleted; administrative disable flips `active` and keeps the record.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    /// Opaque bcrypt hash; plaintext is never stored.
    pub credential_hash: String,
    pub active: bool,
    /// Ids of owned projects, creation order.
    pub owned: Vec<String>,
    /// Keys of projects this user belongs to as a member, join order.
    pub member_of: Vec<ProjectKey>,
}

impl User {
    /// Create an active user with no projects.
    pub fn new(email: String, credential_hash: String) -> Self {
        Self {
            email,
            credential_hash,
            active: true,
            owned: Vec::new(),
            member_of: Vec::new(),
        }
    }
}
