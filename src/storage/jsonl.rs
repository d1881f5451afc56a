// JSONL-backed session storage

use super::{SessionStorage, now_ms};
use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FILE_NAME: &str = "session.jsonl";

/// Log length that triggers a rewrite down to one line per key
pub const COMPACT_THRESHOLD: usize = 64;

/// One write to the log
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    key: String,
    value: String,
    updated_at: i64,
}

/// Append-only JSONL log of key-value writes
///
/// Every `set` appends a line and the last line for a key wins. The log is
/// compacted to one line per key when opened and whenever it grows past
/// [`COMPACT_THRESHOLD`] lines.
#[derive(Debug, Clone)]
pub struct JsonlStorage {
    path: PathBuf,
    lines: usize,
}

impl JsonlStorage {
    /// Open or create the log inside `dir`, compacting any existing log
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create session directory")?;

        let mut storage = Self {
            path: dir.join(FILE_NAME),
            lines: 0,
        };
        if storage.path.exists() {
            storage.compact()?;
        }
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines currently in the log
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Rewrite the log with only the latest entry per key
    ///
    /// The new log is written beside the old one and renamed over it.
    pub fn compact(&mut self) -> Result<()> {
        let (entries, before) = self.read_latest()?;

        let tmp_path = self.path.with_extension("jsonl.tmp");
        {
            let file = File::create(&tmp_path).context("Failed to create compacted JSONL file")?;
            let mut writer = BufWriter::new(&file);
            for entry in entries.values() {
                let json = serde_json::to_string(entry)?;
                writeln!(writer, "{}", json)?;
            }
            writer.flush()?;
            drop(writer);
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path).context("Failed to replace JSONL file")?;

        self.lines = entries.len();
        info!(file = ?self.path, before, after = self.lines, "Compacted session log");
        Ok(())
    }

    fn append(&mut self, entry: &Entry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open JSONL file for appending")?;

        file.lock_exclusive().context("Failed to acquire file lock")?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;
        self.lines += 1;

        // Lock is released when file is dropped
        Ok(())
    }

    /// Latest entry per key plus the number of lines read
    fn read_latest(&self) -> Result<(BTreeMap<String, Entry>, usize)> {
        let mut entries: BTreeMap<String, Entry> = BTreeMap::new();
        if !self.path.exists() {
            return Ok((entries, 0));
        }

        let file = File::open(&self.path).context("Failed to open JSONL file")?;
        file.lock_shared().context("Failed to acquire file lock")?;
        let reader = BufReader::new(&file);
        let mut lines = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(
                        file = ?self.path,
                        line = line_num + 1,
                        error = ?e,
                        "Failed to read line, skipping"
                    );
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }
            lines += 1;

            let entry: Entry = match serde_json::from_str(&line) {
                Ok(e) => e,
                Err(e) => {
                    warn!(
                        file = ?self.path,
                        line = line_num + 1,
                        error = ?e,
                        "Failed to parse JSON, skipping"
                    );
                    continue;
                }
            };

            // This process is the only writer, so file order is write order
            entries.insert(entry.key.clone(), entry);
        }

        debug!(file = ?self.path, count = entries.len(), lines, "Loaded latest entries from JSONL");
        Ok((entries, lines))
    }
}

impl SessionStorage for JsonlStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let (mut entries, _) = self.read_latest()?;
        Ok(entries.remove(key).map(|e| e.value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let entry = Entry {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: now_ms(),
        };
        self.append(&entry)?;

        if self.lines > COMPACT_THRESHOLD {
            self.compact()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragGesture;
    use crate::store::TaskListStore;
    use tempfile::TempDir;

    fn file_lines(storage: &JsonlStorage) -> usize {
        fs::read_to_string(storage.path()).unwrap().lines().count()
    }

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sessions").join("abc");

        let storage = JsonlStorage::open(&dir).unwrap();
        assert!(dir.exists());
        assert_eq!(storage.path(), dir.join("session.jsonl"));
        assert_eq!(storage.line_count(), 0);
    }

    #[test]
    fn test_get_missing_file() {
        let temp = TempDir::new().unwrap();
        let storage = JsonlStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("tasks").unwrap(), None);
    }

    #[test]
    fn test_set_appends_and_latest_wins() {
        let temp = TempDir::new().unwrap();
        let mut storage = JsonlStorage::open(temp.path()).unwrap();

        storage.set("tasks", r#"["a"]"#).unwrap();
        storage.set("tasks", r#"["a","b"]"#).unwrap();
        storage.set("completedTasks", r#"["c"]"#).unwrap();

        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["a","b"]"#));
        assert_eq!(storage.get("completedTasks").unwrap().as_deref(), Some(r#"["c"]"#));
        assert_eq!(file_lines(&storage), 3);
        assert_eq!(storage.line_count(), 3);
    }

    #[test]
    fn test_later_line_wins_over_timestamp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.jsonl");

        // Clock stepped backwards between the two writes
        fs::write(
            &path,
            r#"{"key":"tasks","value":"[\"old\"]","updated_at":2000}
{"key":"tasks","value":"[\"new\"]","updated_at":1500}
"#,
        )
        .unwrap();

        let storage = JsonlStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["new"]"#));
    }

    #[test]
    fn test_malformed_line_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.jsonl");

        fs::write(
            &path,
            r#"{"key":"tasks","value":"[\"a\"]","updated_at":1000}
{malformed json}

{"key":"completedTasks","value":"[\"b\"]","updated_at":1000}
"#,
        )
        .unwrap();

        let storage = JsonlStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["a"]"#));
        assert_eq!(storage.get("completedTasks").unwrap().as_deref(), Some(r#"["b"]"#));
        assert_eq!(file_lines(&storage), 2);
    }

    #[test]
    fn test_open_compacts_existing_log() {
        let temp = TempDir::new().unwrap();
        {
            let mut storage = JsonlStorage::open(temp.path()).unwrap();
            for i in 0..10 {
                storage.set("tasks", &format!(r#"["v{}"]"#, i)).unwrap();
            }
            storage.set("completedTasks", r#"["done"]"#).unwrap();
            assert_eq!(file_lines(&storage), 11);
        }

        let storage = JsonlStorage::open(temp.path()).unwrap();
        assert_eq!(file_lines(&storage), 2);
        assert_eq!(storage.line_count(), 2);
        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["v9"]"#));
        assert_eq!(storage.get("completedTasks").unwrap().as_deref(), Some(r#"["done"]"#));
        assert!(!temp.path().join("session.jsonl.tmp").exists());
    }

    #[test]
    fn test_repeated_writes_stay_bounded() {
        let temp = TempDir::new().unwrap();
        let mut storage = JsonlStorage::open(temp.path()).unwrap();

        for i in 0..500 {
            storage.set("tasks", &format!(r#"["v{}"]"#, i)).unwrap();
            assert!(file_lines(&storage) <= COMPACT_THRESHOLD);
        }
        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["v499"]"#));
    }

    #[test]
    fn test_long_drags_keep_log_bounded() {
        let temp = TempDir::new().unwrap();
        let mut store = TaskListStore::open(JsonlStorage::open(temp.path()).unwrap());
        for i in 0..50 {
            store.add(&format!("task {}", i));
        }
        for _ in 0..10 {
            DragGesture::drag_to(&mut store, 0, 49).unwrap();
            DragGesture::drag_to(&mut store, 49, 0).unwrap();
        }

        assert!(file_lines(store.storage()) <= COMPACT_THRESHOLD);

        let expected = store.list().clone();
        let reloaded = TaskListStore::open(JsonlStorage::open(temp.path()).unwrap());
        assert_eq!(reloaded.list(), &expected);
        assert_eq!(reloaded.pending().len(), 50);
    }

    #[test]
    fn test_reopen_sees_previous_writes() {
        let temp = TempDir::new().unwrap();
        {
            let mut storage = JsonlStorage::open(temp.path()).unwrap();
            storage.set("tasks", r#"["persisted"]"#).unwrap();
        }
        let storage = JsonlStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("tasks").unwrap().as_deref(), Some(r#"["persisted"]"#));
    }
}
