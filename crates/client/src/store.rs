//! Durable mirror of the session credentials (`token`, `username`).
//!
//! The store is written on every credential mutation and read once at startup
//! to seed the in-memory session. It is never consulted as a source of truth
//! afterwards, with one exception: the transport falls back to the stored
//! token when the in-memory one is empty.
//!
//! # File format
//!
//! ```json
//! { "token": "eyJhbGciOi...", "username": "admin" }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use jinkops_auth::SessionState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session store at {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted subset of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl PersistedSession {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.username.is_none()
    }

    /// Initial in-memory state. Both entries must be present (and non-blank)
    /// for the process to start logged in.
    pub fn to_state(&self) -> SessionState {
        match (non_blank(&self.token), non_blank(&self.username)) {
            (Some(token), Some(username)) => SessionState::seeded(token, username),
            _ => SessionState::new(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Storage backend for [`PersistedSession`].
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<PersistedSession, StoreError>;

    fn save_token(&self, token: &str) -> Result<(), StoreError>;

    fn save_username(&self, username: &str) -> Result<(), StoreError>;

    /// Remove both entries. Succeeds when nothing is stored.
    fn clear(&self) -> Result<(), StoreError>;

    fn stored_token(&self) -> Option<String> {
        self.load().ok().and_then(|p| p.token).filter(|t| !t.is_empty())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<PersistedSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(token: &str, username: &str) -> Self {
        Self {
            inner: Mutex::new(PersistedSession {
                token: Some(token.to_string()),
                username: Some(username.to_string()),
            }),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut PersistedSession) -> R) -> R {
        f(&mut self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        Ok(self.with_inner(|p| p.clone()))
    }

    fn save_token(&self, token: &str) -> Result<(), StoreError> {
        self.with_inner(|p| p.token = Some(token.to_string()));
        Ok(())
    }

    fn save_username(&self, username: &str) -> Result<(), StoreError> {
        self.with_inner(|p| p.username = Some(username.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.with_inner(|p| *p = PersistedSession::default());
        Ok(())
    }
}

/// JSON file store, `0600` on Unix.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// `<config dir>/jinkops/session.json`, falling back to the working
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("jinkops"))
            .unwrap_or_else(|| PathBuf::from(".jinkops"))
            .join("session.json")
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_file(&self) -> Result<PersistedSession, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PersistedSession::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(PersistedSession::default());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_file(&self, session: &PersistedSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string_pretty(session).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, body).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut PersistedSession)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // A corrupt file is overwritten rather than blocking every later write.
        let mut session = self.read_file().unwrap_or_default();
        f(&mut session);
        self.write_file(&session)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        self.read_file()
    }

    fn save_token(&self, token: &str) -> Result<(), StoreError> {
        self.modify(|s| s.token = Some(token.to_string()))
    }

    fn save_username(&self, username: &str) -> Result<(), StoreError> {
        self.modify(|s| s.username = Some(username.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
