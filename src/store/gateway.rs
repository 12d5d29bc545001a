//! File-backed persistence for the store document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{document, Store};

/// Reads and writes the store document at a fixed path.
#[derive(Debug, Clone)]
pub struct StorageGateway {
    path: PathBuf,
}

impl StorageGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, failing loudly on unreadable documents.
    ///
    /// A missing file is an empty store; every other problem propagates.
    pub fn load(&self) -> Result<Store> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file missing, starting empty");
                return Ok(Store::default());
            }
            Err(e) => return Err(e.into()),
        };
        let store = document::decode(&raw)?;
        debug!(path = %self.path.display(), users = store.user_count(), "store loaded");
        Ok(store)
    }

    /// Lenient load: a corrupt or undecodable document is logged and replaced
    /// with an empty store. I/O failures still propagate.
    pub fn load_or_empty(&self) -> Result<Store> {
        match self.load() {
            Err(e @ (Error::CorruptStore(_) | Error::Decode(_))) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable store");
                Ok(Store::default())
            }
            other => other,
        }
    }

    /// Persist the store through a temp file plus rename.
    pub fn save(&self, store: &Store) -> Result<()> {
        let contents = document::encode(store)?;
        write_atomic(&self.path, &contents)?;
        debug!(path = %self.path.display(), users = store.user_count(), "store saved");
        Ok(())
    }
}

/// Write `contents` via a hidden temp file in the same directory, so readers
/// never observe a partial document.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp = temp_path(path);
    fs::write(&temp, contents)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
