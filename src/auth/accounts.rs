//! Account lifecycle: registration with email verification, login, disable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::User;
use crate::store::Store;

use super::credentials::{hash_password, verify_password};
use super::pending::{PendingRegistration, PendingStore};

// ============================================================================
// Collaborators
// ============================================================================

/// Delivers a short verification code out of band. Fire-and-forget; there is
/// no delivery confirmation.
pub trait Notifier: Send + Sync {
    fn send_code(&self, email: &str, code: &str);
}

/// Discards every code. For tests and non-interactive tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send_code(&self, _email: &str, _code: &str) {}
}

/// Proof of a successful login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

// ============================================================================
// Manager
// ============================================================================

/// Runs the registration, login and disable flows against a store.
pub struct AccountManager {
    pending: PendingStore,
    notifier: Arc<dyn Notifier>,
}

impl AccountManager {
    pub fn new(pending_ttl: Duration, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pending: PendingStore::new(pending_ttl),
            notifier,
        }
    }

    /// Start a registration: validate, hash the password, park the candidate
    /// and send the verification code. The store is untouched until the code
    /// is confirmed.
    ///
    /// The username is trimmed and the email trimmed and lowercased before
    /// anything else, so case variants of one mailbox resolve to one account.
    pub fn register(
        &self,
        store: &Store,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Uuid> {
        let email = email.trim().to_lowercase();
        let username = username.trim();
        validate_registration(username, &email, password)?;
        if store.contains_user(username) || store.email_taken(&email) {
            return Err(Error::DuplicateId(
                "username or email already registered".into(),
            ));
        }
        let credential_hash = hash_password(password)?;
        let code = generate_otp();
        let pending_id = self.pending.insert(PendingRegistration {
            email: email.clone(),
            username: username.to_string(),
            credential_hash,
            code: code.clone(),
        });
        self.notifier.send_code(&email, &code);
        info!(username = %username, "registration pending verification");
        Ok(pending_id)
    }

    /// Complete a registration with the emailed code.
    ///
    /// A wrong code leaves the entry in place so the candidate can retry
    /// until the TTL runs out.
    pub fn confirm(&self, store: &mut Store, pending_id: Uuid, code: &str) -> Result<String> {
        let pending = self
            .pending
            .get(pending_id)
            .ok_or_else(|| Error::NotFound(format!("pending registration {pending_id}")))?;
        if pending.code != code {
            return Err(Error::Auth("invalid verification code".into()));
        }
        // The name or email may have been claimed while the code was in flight.
        if store.contains_user(&pending.username) || store.email_taken(&pending.email) {
            self.pending.remove(pending_id);
            return Err(Error::DuplicateId(
                "username or email already registered".into(),
            ));
        }
        self.pending.remove(pending_id);
        let PendingRegistration {
            email,
            username,
            credential_hash,
            ..
        } = pending;
        store.insert_user(username.clone(), User::new(email, credential_hash));
        info!(username = %username, "registration confirmed");
        Ok(username)
    }

    /// Log a user in. Unknown usernames and wrong passwords read the same.
    pub fn login(&self, store: &Store, username: &str, password: &str) -> Result<Session> {
        let invalid = || Error::Auth("invalid username or password".into());
        let user = store.user(username).ok_or_else(invalid)?;
        if !user.active {
            return Err(Error::Auth(format!("account {username} is disabled")));
        }
        if !verify_password(password, &user.credential_hash) {
            return Err(invalid());
        }
        info!(username = %username, "login succeeded");
        Ok(Session {
            username: username.to_string(),
            logged_in_at: Utc::now(),
        })
    }

    /// Disable an account. The record stays; logins and operations stop.
    pub fn disable_user(&self, store: &mut Store, username: &str) -> Result<()> {
        let user = store
            .user_mut(username)
            .ok_or_else(|| Error::NotFound(format!("user {username}")))?;
        user.active = false;
        info!(username = %username, "account disabled");
        Ok(())
    }

    /// Live pending registrations, expired entries excluded.
    pub fn pending_count(&self) -> usize {
        self.pending.purge_expired();
        self.pending.len()
    }
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::Validation("username must not be blank".into()));
    }
    if !valid_email(email) {
        return Err(Error::Validation("a valid email address is required".into()));
    }
    if password.len() < 8 {
        return Err(Error::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

fn valid_email(email: &str) -> bool {
    email.contains('@')
        && email
            .split('@')
            .nth(1)
            .map_or(false, |domain| domain.contains('.'))
}

fn generate_otp() -> String {
    rand::random_range(100_000..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Captures sent codes so tests can complete the confirmation flow.
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn last_code(&self) -> String {
            self.sent.lock().unwrap().last().unwrap().1.clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn send_code(&self, email: &str, code: &str) {
            self.sent.lock().unwrap().push((email.into(), code.into()));
        }
    }

    fn manager(notifier: Arc<RecordingNotifier>) -> AccountManager {
        AccountManager::new(Duration::from_secs(600), notifier)
    }

    #[test]
    fn test_register_parks_without_touching_store() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let store = Store::new();

        accounts
            .register(&store, "ida@example.com", "ida", "longenough")
            .unwrap();
        assert_eq!(store.user_count(), 0);
        assert_eq!(accounts.pending_count(), 1);

        let code = notifier.last_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_confirm_creates_user() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let mut store = Store::new();

        let pending = accounts
            .register(&store, "ida@example.com", "ida", "longenough")
            .unwrap();
        let username = accounts
            .confirm(&mut store, pending, &notifier.last_code())
            .unwrap();
        assert_eq!(username, "ida");

        let user = store.user("ida").unwrap();
        assert!(user.active);
        assert_eq!(user.email, "ida@example.com");
        assert_eq!(accounts.pending_count(), 0);
    }

    #[test]
    fn test_wrong_code_keeps_entry_for_retry() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let mut store = Store::new();

        let pending = accounts
            .register(&store, "ida@example.com", "ida", "longenough")
            .unwrap();
        // Codes are always six digits, so a five digit guess can never match.
        let err = accounts.confirm(&mut store, pending, "12345").unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(accounts.pending_count(), 1);

        accounts
            .confirm(&mut store, pending, &notifier.last_code())
            .unwrap();
        assert!(store.contains_user("ida"));
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        let accounts = manager(RecordingNotifier::new());
        let store = Store::new();
        for (email, username, password) in [
            ("ida@example.com", "  ", "longenough"),
            ("no-at-sign", "ida", "longenough"),
            ("ida@nodot", "ida", "longenough"),
            ("ida@example.com", "ida", "short"),
        ] {
            let err = accounts.register(&store, email, username, password).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{email} {username}");
        }
    }

    #[test]
    fn test_register_normalizes_email_and_username() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let mut store = Store::new();

        let pending = accounts
            .register(&store, "  Ida@Example.COM ", " ida ", "longenough")
            .unwrap();
        accounts
            .confirm(&mut store, pending, &notifier.last_code())
            .unwrap();

        let user = store.user("ida").unwrap();
        assert_eq!(user.email, "ida@example.com");

        // A case variant of a taken address is the same address.
        let err = accounts
            .register(&store, "IDA@example.com", "ida2", "longenough")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
    }

    #[test]
    fn test_duplicate_username_or_email_rejected() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let mut store = Store::new();
        store.insert_user(
            "ida".into(),
            User::new("ida@example.com".into(), "hash".into()),
        );

        let err = accounts
            .register(&store, "other@example.com", "ida", "longenough")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));

        let err = accounts
            .register(&store, "ida@example.com", "ida2", "longenough")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
    }

    #[test]
    fn test_confirm_rechecks_uniqueness() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let mut store = Store::new();

        let pending = accounts
            .register(&store, "ida@example.com", "ida", "longenough")
            .unwrap();
        // Claimed while the code was in flight.
        store.insert_user(
            "ida".into(),
            User::new("ida@example.com".into(), "hash".into()),
        );

        let err = accounts
            .confirm(&mut store, pending, &notifier.last_code())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
        assert_eq!(accounts.pending_count(), 0);
    }

    #[test]
    fn test_login_does_not_leak_which_half_failed() {
        let notifier = RecordingNotifier::new();
        let accounts = manager(notifier.clone());
        let mut store = Store::new();
        let hash = bcrypt::hash("longenough", 4).unwrap();
        store.insert_user("ida".into(), User::new("ida@example.com".into(), hash));

        let unknown = accounts.login(&store, "ghost", "longenough").unwrap_err();
        let wrong = accounts.login(&store, "ida", "badpassword").unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());

        let session = accounts.login(&store, "ida", "longenough").unwrap();
        assert_eq!(session.username, "ida");
    }

    #[test]
    fn test_disabled_account_cannot_login() {
        let accounts = manager(RecordingNotifier::new());
        let mut store = Store::new();
        let hash = bcrypt::hash("longenough", 4).unwrap();
        store.insert_user("ida".into(), User::new("ida@example.com".into(), hash));

        accounts.disable_user(&mut store, "ida").unwrap();
        let err = accounts.login(&store, "ida", "longenough").unwrap_err();
        assert!(matches!(err, Error::Auth(msg) if msg.contains("disabled")));
    }

    #[test]
    fn test_expired_pending_is_gone() {
        let notifier = RecordingNotifier::new();
        let accounts = AccountManager::new(Duration::ZERO, notifier.clone());
        let mut store = Store::new();

        let pending = accounts
            .register(&store, "ida@example.com", "ida", "longenough")
            .unwrap();
        let err = accounts
            .confirm(&mut store, pending, &notifier.last_code())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(accounts.pending_count(), 0);
    }
}
