//! Entity model: users, projects, tasks, and the audit trail.
//!
//! Pure data definitions. Workflow rules live in `crate::workflow`, the
//! canonical collections and membership relation in `crate::store`.

pub mod audit;
pub mod project;
pub mod task;
pub mod user;

pub use audit::{CommentEntry, Comments, History, HistoryEntry};
pub use project::{Project, ProjectKey};
pub use task::{Priority, Status, Task};
pub use user::User;
