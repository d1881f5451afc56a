// Task list store: in-memory lists mirrored into session storage

use crate::error::Result;
use crate::list::TaskList;
use crate::storage::SessionStorage;
use crate::task::Task;
use tracing::{debug, info, warn};

/// Storage key holding the pending list
pub const TASKS_KEY: &str = "tasks";

/// Storage key holding the completed list
pub const COMPLETED_KEY: &str = "completedTasks";

/// Task list bound to a session storage
///
/// The in-memory lists are the source of truth. After each mutation the
/// changed list is written back as a JSON array of strings; a failed write is
/// logged and the mutation still stands.
#[derive(Debug)]
pub struct TaskListStore<S: SessionStorage> {
    list: TaskList,
    storage: S,
    show_completed: bool,
}

impl<S: SessionStorage> TaskListStore<S> {
    /// Load both lists from `storage`
    ///
    /// Missing, unreadable or malformed values load as empty lists.
    pub fn open(storage: S) -> Self {
        let pending = read_key(&storage, TASKS_KEY);
        let completed = read_key(&storage, COMPLETED_KEY);
        let list = TaskList::from_json(pending.as_deref(), completed.as_deref());

        info!(
            pending = list.pending().len(),
            completed = list.completed().len(),
            "Opened task list"
        );

        Self {
            list,
            storage,
            show_completed: false,
        }
    }

    pub fn pending(&self) -> &[Task] {
        self.list.pending()
    }

    pub fn completed(&self) -> &[Task] {
        self.list.completed()
    }

    pub fn list(&self) -> &TaskList {
        &self.list
    }

    /// Whether the completed list is currently shown
    pub fn show_completed(&self) -> bool {
        self.show_completed
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Append a task; blank text is silently ignored and nothing is written
    pub fn add(&mut self, text: &str) {
        if self.list.add(text) {
            self.persist_pending();
        }
    }

    /// Delete the pending task at `index`
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.list.remove(index)?;
        self.persist_pending();
        Ok(())
    }

    /// Move the pending task at `index` to the completed list
    pub fn complete(&mut self, index: usize) -> Result<()> {
        self.list.complete(index)?;
        self.persist_completed();
        self.persist_pending();
        Ok(())
    }

    /// Move the pending task at `from` to position `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.list.reorder(from, to)?;
        if from != to {
            self.persist_pending();
        }
        Ok(())
    }

    /// Flip completed-list visibility; never persisted
    pub fn toggle_completed_visibility(&mut self) {
        self.show_completed = !self.show_completed;
        debug!(show_completed = self.show_completed, "Toggled completed visibility");
    }

    fn persist_pending(&mut self) {
        let json = self.list.pending_json();
        self.write_key(TASKS_KEY, &json);
    }

    fn persist_completed(&mut self) {
        let json = self.list.completed_json();
        self.write_key(COMPLETED_KEY, &json);
    }

    fn write_key(&mut self, key: &str, json: &str) {
        match self.storage.set(key, json) {
            Ok(()) => debug!(key, "Persisted list"),
            Err(e) => warn!(key, error = ?e, "Failed to persist list, keeping in-memory state"),
        }
    }
}

fn read_key<S: SessionStorage>(storage: &S, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = ?e, "Failed to read persisted list, starting empty");
            None
        }
    }
}
