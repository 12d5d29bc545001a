//! The administrator record, a separate single-object document.
//!
//! At most one administrator exists at a time: creation fails while the file
//! is present, and disabling removes the file outright.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::store::gateway::write_atomic;

use super::accounts::Session;
use super::credentials::{hash_password, verify_password};

/// The persisted administrator document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRecord {
    pub username: String,
    /// bcrypt hash of the administrator password.
    pub password: String,
    pub active: bool,
}

/// Manages the administrator document at a fixed path.
#[derive(Debug, Clone)]
pub struct AdminStore {
    path: PathBuf,
}

impl AdminStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the administrator. Fails while a record already exists.
    pub fn create(&self, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(Error::Validation("username must not be blank".into()));
        }
        if password.len() < 8 {
            return Err(Error::Validation(
                "password must be at least 8 characters".into(),
            ));
        }
        if self.exists() {
            return Err(Error::DuplicateId("administrator already exists".into()));
        }
        let record = AdminRecord {
            username: username.to_string(),
            password: hash_password(password)?,
            active: true,
        };
        write_atomic(&self.path, &serde_json::to_string_pretty(&record)?)?;
        info!(username = %username, "administrator created");
        Ok(())
    }

    /// Log the administrator in.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let record = self.load()?;
        if record.username != username {
            return Err(Error::Auth("invalid username or password".into()));
        }
        if !record.active {
            return Err(Error::Auth(format!("account {username} is disabled")));
        }
        if !verify_password(password, &record.password) {
            return Err(Error::Auth("invalid username or password".into()));
        }
        info!(username = %username, "administrator login succeeded");
        Ok(Session {
            username: username.to_string(),
            logged_in_at: Utc::now(),
        })
    }

    /// Remove the administrator record entirely.
    pub fn disable(&self) -> Result<()> {
        if !self.exists() {
            return Err(Error::NotFound("administrator record".into()));
        }
        fs::remove_file(&self.path)?;
        info!("administrator disabled");
        Ok(())
    }

    fn load(&self) -> Result<AdminRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound("administrator record".into()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }
}
