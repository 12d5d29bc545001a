//! Task workflow: the transition policy seam and the mutation engine.

pub mod engine;
pub mod policy;

pub use engine::{NewTask, TaskEdit, Workflow};
pub use policy::{Permissive, TransitionPolicy};
