//! Session identity and the lifetime of a session's storage.
//!
//! Each session owns a directory under `<data_dir>/sessions/`. Its lists live
//! only as long as that directory does.

use crate::storage::{Backend, JsonlStorage, SessionStorage, SqliteStorage};
use eyre::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Identifier of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Start a new, time-ordered session id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let uuid = Uuid::parse_str(s.trim()).with_context(|| format!("Invalid session id: {}", s))?;
        Ok(Self(uuid))
    }
}

/// Directory holding the storage for session `id`
pub fn session_dir(data_dir: &Path, id: &SessionId) -> PathBuf {
    data_dir.join("sessions").join(id.to_string())
}

/// Open the storage for a session directory
pub fn open_storage(backend: Backend, dir: &Path) -> Result<Box<dyn SessionStorage>> {
    let storage: Box<dyn SessionStorage> = match backend {
        Backend::Jsonl => Box::new(JsonlStorage::open(dir)?),
        Backend::Sqlite => Box::new(SqliteStorage::open(dir)?),
    };
    Ok(storage)
}

/// End a session, discarding both of its lists
///
/// Returns whether there was anything to remove.
pub fn end_session(data_dir: &Path, id: &SessionId) -> Result<bool> {
    let dir = session_dir(data_dir, id);
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove session directory {}", dir.display()))?;
    info!(session = %id, "Session ended");
    Ok(true)
}
