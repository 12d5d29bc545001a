//! The workflow engine: every project and task mutation goes through here.
//!
//! Operations take the acting username, require the account to be active, and
//! only reach projects the actor owns. Nothing here persists; callers bracket
//! a batch of operations with a gateway load and save.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Priority, Project, ProjectKey, Status, Task};
use crate::store::Store;

use super::policy::{Permissive, TransitionPolicy};

// ============================================================================
// Operation inputs
// ============================================================================

/// Parameters for a new task. Missing priority defaults to LOW.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub assignees: Vec<String>,
}

/// A partial task edit; `None` fields are left alone.
///
/// Priority moves are routed through the same policy and history recording
/// as [`Workflow::change_priority`], except that re-stating the current
/// priority is a no-op. Assignee changes are not recorded in history.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignees: Option<Vec<String>>,
    pub priority: Option<Priority>,
}

// ============================================================================
// Engine
// ============================================================================

/// Validates and applies mutations against a [`Store`].
pub struct Workflow {
    policy: Arc<dyn TransitionPolicy>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    /// Engine with the permissive default policy.
    pub fn new() -> Self {
        Self {
            policy: Arc::new(Permissive),
        }
    }

    /// Engine with a caller-supplied transition policy.
    pub fn with_policy(policy: Arc<dyn TransitionPolicy>) -> Self {
        Self { policy }
    }

    // ------------------------------------------------------------------------
    // Projects and membership
    // ------------------------------------------------------------------------

    /// Create an empty project owned by the actor.
    pub fn create_project(
        &self,
        store: &mut Store,
        actor: &str,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<ProjectKey> {
        ensure_active(store, actor)?;
        if id.trim().is_empty() {
            return Err(Error::Validation("project id must not be blank".into()));
        }
        let project = Project::new(id.to_string(), title.to_string(), description.to_string());
        store.insert_project(actor, project)?;
        let key = ProjectKey::new(actor, id);
        info!(project = %key, "project created");
        Ok(key)
    }

    /// Delete one of the actor's projects along with all its tasks.
    pub fn delete_project(&self, store: &mut Store, actor: &str, id: &str) -> Result<()> {
        ensure_active(store, actor)?;
        let key = ProjectKey::new(actor, id);
        store.remove_project(&key)?;
        info!(project = %key, "project deleted");
        Ok(())
    }

    /// Add `username` as a member of the actor's project.
    pub fn add_member(
        &self,
        store: &mut Store,
        actor: &str,
        id: &str,
        username: &str,
    ) -> Result<()> {
        ensure_active(store, actor)?;
        let key = ProjectKey::new(actor, id);
        store.add_member(&key, username)?;
        info!(project = %key, member = %username, "member added");
        Ok(())
    }

    /// Remove `username` from the actor's project.
    pub fn remove_member(
        &self,
        store: &mut Store,
        actor: &str,
        id: &str,
        username: &str,
    ) -> Result<()> {
        ensure_active(store, actor)?;
        let key = ProjectKey::new(actor, id);
        store.remove_member(&key, username)?;
        info!(project = %key, member = %username, "member removed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    /// Create a task in the actor's project, returning its generated id.
    pub fn create_task(
        &self,
        store: &mut Store,
        actor: &str,
        project_id: &str,
        new_task: NewTask,
    ) -> Result<Uuid> {
        ensure_active(store, actor)?;
        if new_task.title.trim().is_empty() {
            return Err(Error::Validation("task title must not be blank".into()));
        }
        let key = ProjectKey::new(actor, project_id);
        let project = owned_project_mut(store, &key)?;
        let assignees = validate_assignees(project, &key.owner, new_task.assignees)?;
        let task = Task::new(
            new_task.title,
            new_task.description,
            new_task.priority.unwrap_or(Priority::Low),
            assignees,
        );
        let task_id = task.id;
        project.tasks.push(task);
        info!(project = %key, task = %task_id, "task created");
        Ok(task_id)
    }

    /// Apply a partial edit to a task in the actor's project.
    ///
    /// Everything is validated before anything is written, so a rejected
    /// field leaves the task untouched.
    pub fn edit_task(
        &self,
        store: &mut Store,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        edit: TaskEdit,
    ) -> Result<()> {
        ensure_active(store, actor)?;
        if let Some(title) = &edit.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("task title must not be blank".into()));
            }
        }
        let key = ProjectKey::new(actor, project_id);
        let project = owned_project_mut(store, &key)?;
        let assignees = match edit.assignees {
            Some(names) => Some(validate_assignees(project, &key.owner, names)?),
            None => None,
        };
        let task = project
            .task_mut(task_id)
            .ok_or_else(|| Error::NotFound(format!("task {task_id}")))?;
        let priority_move = match edit.priority {
            Some(p) if p != task.priority => {
                self.check_priority(task.priority, p)?;
                Some(p)
            }
            _ => None,
        };

        if let Some(title) = edit.title {
            task.title = title;
        }
        if let Some(description) = edit.description {
            task.description = description;
        }
        if let Some(names) = assignees {
            task.assignees = names;
        }
        if let Some(priority) = priority_move {
            apply_priority(task, priority)?;
        }
        info!(project = %key, task = %task_id, "task edited");
        Ok(())
    }

    /// Move a task to `status`, recording the change in its history.
    pub fn change_status(
        &self,
        store: &mut Store,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        status: Status,
    ) -> Result<()> {
        ensure_active(store, actor)?;
        let key = ProjectKey::new(actor, project_id);
        let task = owned_task_mut(store, &key, task_id)?;
        if !self.policy.allow_status(task.status, status) {
            return Err(Error::Validation(format!(
                "status transition {} -> {} is not allowed",
                task.status, status
            )));
        }
        task.status = status;
        task.record(Utc::now(), format!("Status changed to {status}"))?;
        info!(project = %key, task = %task_id, status = %status, "task status changed");
        Ok(())
    }

    /// Reprioritize a task, recording the change in its history.
    pub fn change_priority(
        &self,
        store: &mut Store,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        priority: Priority,
    ) -> Result<()> {
        ensure_active(store, actor)?;
        let key = ProjectKey::new(actor, project_id);
        let task = owned_task_mut(store, &key, task_id)?;
        self.check_priority(task.priority, priority)?;
        apply_priority(task, priority)?;
        info!(project = %key, task = %task_id, priority = %priority, "task priority changed");
        Ok(())
    }

    /// Comment on a task as the actor; the comment lands in both logs.
    pub fn add_comment(
        &self,
        store: &mut Store,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        text: &str,
    ) -> Result<()> {
        ensure_active(store, actor)?;
        let key = ProjectKey::new(actor, project_id);
        let task = owned_task_mut(store, &key, task_id)?;
        task.comment(Utc::now(), actor, text)?;
        info!(project = %key, task = %task_id, "comment added");
        Ok(())
    }

    fn check_priority(&self, from: Priority, to: Priority) -> Result<()> {
        if self.policy.allow_priority(from, to) {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "priority change {from} -> {to} is not allowed"
            )))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ensure_active(store: &Store, actor: &str) -> Result<()> {
    let user = store
        .user(actor)
        .ok_or_else(|| Error::NotFound(format!("user {actor}")))?;
    if !user.active {
        return Err(Error::Auth(format!("account {actor} is disabled")));
    }
    Ok(())
}

fn owned_project_mut<'a>(store: &'a mut Store, key: &ProjectKey) -> Result<&'a mut Project> {
    store
        .project_mut(key)
        .ok_or_else(|| Error::NotFound(format!("project {key}")))
}

fn owned_task_mut<'a>(
    store: &'a mut Store,
    key: &ProjectKey,
    task_id: Uuid,
) -> Result<&'a mut Task> {
    owned_project_mut(store, key)?
        .task_mut(task_id)
        .ok_or_else(|| Error::NotFound(format!("task {task_id}")))
}

/// Every assignee must be the owner or a current member.
fn validate_assignees(
    project: &Project,
    owner: &str,
    assignees: Vec<String>,
) -> Result<Vec<String>> {
    let assignees = crate::model::task::dedup_usernames(assignees);
    for name in &assignees {
        if name != owner && !project.members.iter().any(|m| m == name) {
            return Err(Error::InvalidAssignee(name.clone()));
        }
    }
    Ok(assignees)
}

fn apply_priority(task: &mut Task, priority: Priority) -> Result<()> {
    task.priority = priority;
    task.record(Utc::now(), format!("Priority changed to {priority}"))
}
