// SQLite-backed session storage

use super::{SessionStorage, now_ms};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const FILE_NAME: &str = "session.db";

/// Key-value table in a per-session SQLite database
pub struct SqliteStorage {
    path: PathBuf,
    db: Connection,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").field("path", &self.path).finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Open or create the database inside `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create session directory")?;

        let path = dir.join(FILE_NAME);
        let db = Connection::open(&path).context("Failed to open SQLite database")?;

        let storage = Self { path, db };
        storage.create_schema()?;
        info!(path = ?storage.path, "Opened session database");
        Ok(storage)
    }

    /// Open a database that lives only as long as this value
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let storage = Self {
            path: PathBuf::from(":memory:"),
            db,
        };
        storage.create_schema()?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating session schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl SessionStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read session entry")?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, now_ms()],
            )
            .context("Failed to write session entry")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert!(temp.path().join("session.db").exists());
        assert_eq!(storage.path(), temp.path().join("session.db"));
    }

    #[test]
    fn test_get_missing_key() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.get("tasks").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.set("tasks", r#"["a"]"#).unwrap();
        storage.set("tasks", r#"["a","b"]"#).unwrap();
        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["a","b"]"#));

        let count: i64 = storage
            .db
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_reopen_sees_previous_writes() {
        let temp = TempDir::new().unwrap();
        {
            let mut storage = SqliteStorage::open(temp.path()).unwrap();
            storage.set("completedTasks", r#"["done"]"#).unwrap();
        }
        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("completedTasks").unwrap().as_deref(), Some(r#"["done"]"#));
    }
}
