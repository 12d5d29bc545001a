//! Membership bookkeeping: every arena mutation that touches the
//! owned/member views lives here so both sides always move together.

use crate::error::{Error, Result};
use crate::model::{Project, ProjectKey, User};

use super::Store;

impl Store {
    /// Insert a project under `owner`, registering it in the owned view.
    pub(crate) fn insert_project(&mut self, owner: &str, project: Project) -> Result<()> {
        let user = self
            .users
            .get_mut(owner)
            .ok_or_else(|| Error::NotFound(format!("user {owner}")))?;
        let key = ProjectKey::new(owner, &project.id);
        if user.owned.iter().any(|id| *id == project.id) {
            return Err(Error::DuplicateId(format!("project {key}")));
        }
        user.owned.push(project.id.clone());
        self.projects.insert(key, project);
        Ok(())
    }

    /// Remove a project from the arena and from every view that references it.
    pub(crate) fn remove_project(&mut self, key: &ProjectKey) -> Result<Project> {
        let project = self
            .projects
            .remove(key)
            .ok_or_else(|| Error::NotFound(format!("project {key}")))?;
        if let Some(owner) = self.users.get_mut(&key.owner) {
            owner.owned.retain(|id| *id != key.id);
        }
        for member in &project.members {
            if let Some(user) = self.users.get_mut(member) {
                user.member_of.retain(|k| k != key);
            }
        }
        Ok(project)
    }

    /// The owning user of a project, or `NotFound` for either half.
    pub fn owner_of(&self, key: &ProjectKey) -> Result<&User> {
        if !self.projects.contains_key(key) {
            return Err(Error::NotFound(format!("project {key}")));
        }
        self.users
            .get(&key.owner)
            .ok_or_else(|| Error::NotFound(format!("user {}", key.owner)))
    }

    /// Add `username` to a project's member list and mirror the reference.
    pub(crate) fn add_member(&mut self, key: &ProjectKey, username: &str) -> Result<()> {
        match self.users.get(username) {
            Some(user) if user.active => {}
            _ => return Err(Error::NotFound(format!("user {username}"))),
        }
        if username == key.owner {
            return Err(Error::AlreadyMember(format!("{username} owns {key}")));
        }
        let project = self
            .projects
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(format!("project {key}")))?;
        if project.members.iter().any(|m| m == username) {
            return Err(Error::AlreadyMember(format!("{username} in {key}")));
        }
        project.members.push(username.to_string());
        if let Some(user) = self.users.get_mut(username) {
            user.member_of.push(key.clone());
        }
        Ok(())
    }

    /// Drop `username` from a project's member list and the mirrored view.
    pub(crate) fn remove_member(&mut self, key: &ProjectKey, username: &str) -> Result<()> {
        let project = self
            .projects
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(format!("project {key}")))?;
        if !project.members.iter().any(|m| m == username) {
            return Err(Error::NotMember(format!("{username} in {key}")));
        }
        project.members.retain(|m| m != username);
        if let Some(user) = self.users.get_mut(username) {
            user.member_of.retain(|k| k != key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Store {
        let mut store = Store::new();
        for name in ["ann", "ben"] {
            store.insert_user(
                name.to_string(),
                User::new(format!("{name}@example.com"), "hash".into()),
            );
        }
        store
            .insert_project("ann", Project::new("web".into(), "Website".into(), "".into()))
            .unwrap();
        store
    }

    #[test]
    fn test_duplicate_project_id_rejected() {
        let mut store = seeded();
        let err = store
            .insert_project("ann", Project::new("web".into(), "Again".into(), "".into()))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
        assert_eq!(store.user("ann").unwrap().owned.len(), 1);
    }

    #[test]
    fn test_add_member_mirrors_both_sides() {
        let mut store = seeded();
        let key = ProjectKey::new("ann", "web");
        store.add_member(&key, "ben").unwrap();
        assert_eq!(store.project(&key).unwrap().members, vec!["ben".to_string()]);
        assert_eq!(store.user("ben").unwrap().member_of, vec![key.clone()]);

        let err = store.add_member(&key, "ben").unwrap_err();
        assert!(matches!(err, Error::AlreadyMember(_)));
    }

    #[test]
    fn test_owner_cannot_join_as_member() {
        let mut store = seeded();
        let err = store
            .add_member(&ProjectKey::new("ann", "web"), "ann")
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyMember(_)));
    }

    #[test]
    fn test_disabled_user_cannot_join() {
        let mut store = seeded();
        store.user_mut("ben").unwrap().active = false;
        let err = store
            .add_member(&ProjectKey::new("ann", "web"), "ben")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_remove_member_requires_membership() {
        let mut store = seeded();
        let key = ProjectKey::new("ann", "web");
        let err = store.remove_member(&key, "ben").unwrap_err();
        assert!(matches!(err, Error::NotMember(_)));

        store.add_member(&key, "ben").unwrap();
        store.remove_member(&key, "ben").unwrap();
        assert!(store.project(&key).unwrap().members.is_empty());
        assert!(store.user("ben").unwrap().member_of.is_empty());
    }

    #[test]
    fn test_owner_of_resolves_through_the_key() {
        let store = seeded();
        let owner = store.owner_of(&ProjectKey::new("ann", "web")).unwrap();
        assert_eq!(owner.email, "ann@example.com");

        let err = store.owner_of(&ProjectKey::new("ann", "gone")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_remove_project_prunes_member_views() {
        let mut store = seeded();
        let key = ProjectKey::new("ann", "web");
        store.add_member(&key, "ben").unwrap();
        let removed = store.remove_project(&key).unwrap();
        assert_eq!(removed.id, "web");
        assert!(store.project(&key).is_none());
        assert!(store.user("ann").unwrap().owned.is_empty());
        assert!(store.user("ben").unwrap().member_of.is_empty());
    }
}
