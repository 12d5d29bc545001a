//! Holding area for registrations awaiting email verification.
//!
//! Candidates never touch the store until their code is confirmed. Entries
//! expire after a configurable TTL; an expired candidate simply registers
//! again.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// A registration candidate that has been issued a verification code.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub email: String,
    pub username: String,
    pub credential_hash: String,
    pub code: String,
}

struct PendingEntry {
    issued_at: Instant,
    registration: PendingRegistration,
}

/// TTL-bounded store of unconfirmed registrations.
pub struct PendingStore {
    entries: DashMap<Uuid, PendingEntry>,
    ttl: Duration,
}

impl PendingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Park a registration, returning the handle used to confirm it.
    pub fn insert(&self, registration: PendingRegistration) -> Uuid {
        self.purge_expired();
        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            PendingEntry {
                issued_at: Instant::now(),
                registration,
            },
        );
        id
    }

    /// Fetch a live entry without consuming it.
    pub fn get(&self, id: Uuid) -> Option<PendingRegistration> {
        self.purge_expired();
        self.entries.get(&id).map(|e| e.registration.clone())
    }

    /// Consume an entry, live or not.
    pub fn remove(&self, id: Uuid) -> Option<PendingRegistration> {
        self.entries.remove(&id).map(|(_, e)| e.registration)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry older than the TTL.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.issued_at.elapsed() < ttl);
    }
}
