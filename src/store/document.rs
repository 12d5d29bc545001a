//! Durable document form of the store.
//!
//! The schema is a JSON object keyed by username. Enum leaves travel as their
//! UPPERCASE names and timestamps as RFC 3339 text. Decoding is two-stage:
//! text that is not valid JSON fails as `CorruptStore`, while valid JSON with
//! a bad leaf or an inconsistent reference graph fails as `Decode` naming the
//! offending field.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DecodeError, Result};
use crate::model::{
    CommentEntry, Comments, History, HistoryEntry, Priority, Project, ProjectKey, Status, Task,
    User,
};

use super::Store;

// ============================================================================
// Wire schema
// ============================================================================

type StoreDoc = BTreeMap<String, UserDoc>;

#[derive(Debug, Serialize, Deserialize)]
struct UserDoc {
    email: String,
    #[serde(rename = "credentialHash")]
    credential_hash: String,
    active: bool,
    #[serde(default)]
    projects: ProjectViewsDoc,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectViewsDoc {
    #[serde(default)]
    managed: Vec<ProjectDoc>,
    #[serde(default)]
    member: Vec<ProjectKey>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectDoc {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    tasks: Vec<TaskDoc>,
}

/// Task leaves stay as text in the document so a bad value can be reported
/// by field instead of failing the whole parse.
#[derive(Debug, Serialize, Deserialize)]
struct TaskDoc {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    start_time: String,
    end_time: String,
    #[serde(default)]
    assignees: Vec<String>,
    priority: String,
    status: String,
    #[serde(default)]
    history: Vec<(String, String)>,
    #[serde(default)]
    comments: Vec<(String, String, String)>,
}

// ============================================================================
// Encode
// ============================================================================

pub(crate) fn encode(store: &Store) -> Result<String> {
    let mut doc = StoreDoc::new();
    for (username, user) in &store.users {
        let managed = user
            .owned
            .iter()
            .filter_map(|id| store.projects.get(&ProjectKey::new(username, id)))
            .map(encode_project)
            .collect();
        doc.insert(
            username.clone(),
            UserDoc {
                email: user.email.clone(),
                credential_hash: user.credential_hash.clone(),
                active: user.active,
                projects: ProjectViewsDoc {
                    managed,
                    member: user.member_of.clone(),
                },
            },
        );
    }
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn encode_project(project: &Project) -> ProjectDoc {
    ProjectDoc {
        id: project.id.clone(),
        title: project.title.clone(),
        description: project.description.clone(),
        members: project.members.clone(),
        tasks: project.tasks.iter().map(encode_task).collect(),
    }
}

fn encode_task(task: &Task) -> TaskDoc {
    TaskDoc {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        start_time: task.created_at.to_rfc3339(),
        end_time: task.due_at.to_rfc3339(),
        assignees: task.assignees.clone(),
        priority: task.priority.to_string(),
        status: task.status.to_string(),
        history: task
            .history
            .entries()
            .iter()
            .map(|e| (e.at.to_rfc3339(), e.text.clone()))
            .collect(),
        comments: task
            .comments
            .entries()
            .iter()
            .map(|c| (c.at.to_rfc3339(), c.author.clone(), c.text.clone()))
            .collect(),
    }
}

// ============================================================================
// Decode
// ============================================================================

pub(crate) fn decode(raw: &str) -> Result<Store> {
    if raw.trim().is_empty() {
        return Ok(Store::default());
    }
    let doc: StoreDoc = serde_json::from_str(raw)?;

    let mut store = Store::default();
    let mut emails = HashSet::new();
    for (username, user_doc) in doc {
        if !emails.insert(user_doc.email.clone()) {
            return Err(DecodeError::new("email", user_doc.email).into());
        }
        let mut user = User::new(user_doc.email, user_doc.credential_hash);
        user.active = user_doc.active;
        user.member_of = user_doc.projects.member;
        for project_doc in user_doc.projects.managed {
            let project = decode_project(&username, project_doc)?;
            let key = ProjectKey::new(&username, &project.id);
            if store.projects.contains_key(&key) {
                return Err(DecodeError::new("project id", key.to_string()).into());
            }
            user.owned.push(project.id.clone());
            store.projects.insert(key, project);
        }
        store.users.insert(username, user);
    }
    verify_references(&store)?;
    Ok(store)
}

fn decode_project(owner: &str, doc: ProjectDoc) -> Result<Project> {
    if doc.id.trim().is_empty() {
        return Err(DecodeError::new("project id", doc.id).into());
    }
    let mut seen = HashSet::new();
    for member in &doc.members {
        if member == owner || !seen.insert(member.clone()) {
            return Err(DecodeError::new("member", member.clone()).into());
        }
    }
    let mut project = Project::new(doc.id, doc.title, doc.description);
    project.members = doc.members;
    let mut task_ids = HashSet::new();
    for task_doc in doc.tasks {
        let task = decode_task(task_doc)?;
        if !task_ids.insert(task.id) {
            return Err(DecodeError::new("task id", task.id.to_string()).into());
        }
        project.tasks.push(task);
    }
    Ok(project)
}

fn decode_task(doc: TaskDoc) -> Result<Task> {
    let id = Uuid::parse_str(&doc.id).map_err(|_| DecodeError::new("task id", &doc.id))?;
    let created_at = parse_ts("start_time", &doc.start_time)?;
    let due_at = parse_ts("end_time", &doc.end_time)?;
    let priority: Priority = doc.priority.parse()?;
    let status: Status = doc.status.parse()?;

    let mut history = Vec::with_capacity(doc.history.len());
    for (at, text) in doc.history {
        let at = parse_ts("history", &at)?;
        history.push(HistoryEntry { at, text });
    }
    let mut comments = Vec::with_capacity(doc.comments.len());
    for (at, author, text) in doc.comments {
        let at = parse_ts("comments", &at)?;
        comments.push(CommentEntry { at, author, text });
    }

    Ok(Task {
        id,
        title: doc.title,
        description: doc.description,
        created_at,
        due_at,
        assignees: doc.assignees,
        priority,
        status,
        history: History::from_entries(history),
        comments: Comments::from_entries(comments),
    })
}

fn parse_ts(field: &'static str, value: &str) -> std::result::Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DecodeError::new(field, value))
}

/// Walk the membership graph in both directions once all users are loaded.
fn verify_references(store: &Store) -> Result<()> {
    for (username, user) in &store.users {
        let mut seen = HashSet::new();
        for key in &user.member_of {
            if !seen.insert(key.clone()) {
                return Err(DecodeError::new("member project", key.to_string()).into());
            }
            match store.projects.get(key) {
                Some(project) if project.members.iter().any(|m| m == username) => {}
                _ => return Err(DecodeError::new("member project", key.to_string()).into()),
            }
        }
    }
    for (key, project) in &store.projects {
        for member in &project.members {
            match store.users.get(member) {
                Some(user) if user.member_of.iter().any(|k| k == key) => {}
                _ => return Err(DecodeError::new("member", member.clone()).into()),
            }
        }
    }
    Ok(())
}
