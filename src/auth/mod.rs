//! Accounts and authentication: registration with email verification,
//! login, the administrator record, and password hashing.

pub mod accounts;
pub mod admin;
pub mod credentials;
pub mod pending;

pub use accounts::{AccountManager, Notifier, NullNotifier, Session};
pub use admin::{AdminRecord, AdminStore};
pub use pending::{PendingRegistration, PendingStore};
