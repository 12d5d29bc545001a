//! Pluggable gatekeeping for task transitions.

use crate::model::{Priority, Status};

/// Decides which status and priority moves the engine accepts.
///
/// The engine consults the policy before touching the task; a rejected move
/// surfaces as a validation error and leaves the task unchanged.
pub trait TransitionPolicy: Send + Sync {
    /// Allow moving a task from `from` to `to`. Defaults to allowing every
    /// move, including `from == to`.
    fn allow_status(&self, _from: Status, _to: Status) -> bool {
        true
    }

    /// Allow changing a task's priority. Defaults to allowing every change.
    fn allow_priority(&self, _from: Priority, _to: Priority) -> bool {
        true
    }
}

/// The default policy: everything is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl TransitionPolicy for Permissive {}
