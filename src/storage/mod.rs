//! Session-scoped key-value storage backends.
//!
//! The task list mirrors its two lists into a `SessionStorage` after every
//! change and reads them back once when it is opened. Backends:
//!
//! - [`MemoryStorage`]: in-process map, lost when dropped
//! - [`JsonlStorage`]: append-only JSONL log, latest entry per key wins
//! - [`SqliteStorage`]: single SQLite table keyed by name

mod jsonl;
mod sqlite;

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use jsonl::JsonlStorage;
pub use sqlite::SqliteStorage;

/// Key-value store scoped to one session
pub trait SessionStorage {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Which on-disk backend a session uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Jsonl,
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Jsonl => write!(f, "jsonl"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
