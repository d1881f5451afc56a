// Pending/completed task lists and their state transitions

use crate::error::{Result, TaskListError};
use crate::task::Task;
use tracing::{debug, warn};

/// The two ordered task sequences, with no storage attached
///
/// A task lives in exactly one of the lists. `pending` is in user order,
/// `completed` is in completion order, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    pending: Vec<Task>,
    completed: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the persisted JSON blobs
    ///
    /// Missing or unparsable values load as empty lists.
    pub fn from_json(pending: Option<&str>, completed: Option<&str>) -> Self {
        Self {
            pending: parse_tasks("pending", pending),
            completed: parse_tasks("completed", completed),
        }
    }

    pub fn pending(&self) -> &[Task] {
        &self.pending
    }

    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    pub fn pending_json(&self) -> String {
        encode_tasks(&self.pending)
    }

    pub fn completed_json(&self) -> String {
        encode_tasks(&self.completed)
    }

    /// Append a task to the pending list
    ///
    /// Blank text is ignored. Returns whether the list changed.
    pub fn add(&mut self, text: &str) -> bool {
        match Task::new(text) {
            Some(task) => {
                debug!(task = task.as_str(), "add: appending pending task");
                self.pending.push(task);
                true
            }
            None => {
                debug!("add: ignoring blank task");
                false
            }
        }
    }

    /// Remove the pending task at `index`, shifting later tasks down
    pub fn remove(&mut self, index: usize) -> Result<Task> {
        self.check_index("remove", index)?;
        let task = self.pending.remove(index);
        debug!(index, task = task.as_str(), "remove: removed pending task");
        Ok(task)
    }

    /// Move the pending task at `index` to the end of the completed list
    pub fn complete(&mut self, index: usize) -> Result<Task> {
        self.check_index("complete", index)?;
        let task = self.pending.remove(index);
        self.completed.push(task.clone());
        debug!(index, task = task.as_str(), "complete: moved task to completed");
        Ok(task)
    }

    /// Move the pending task at `from` so that it ends up at position `to`
    ///
    /// Both indices refer to the list as it is before the move.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index("reorder", from)?;
        self.check_index("reorder", to)?;

        if from == to {
            return Ok(());
        }

        let task = self.pending.remove(from);
        self.pending.insert(to, task);
        debug!(from, to, "reorder: moved pending task");
        Ok(())
    }

    fn check_index(&self, op: &'static str, index: usize) -> Result<()> {
        let len = self.pending.len();
        if index >= len {
            return Err(TaskListError::InvalidIndex { op, index, len });
        }
        Ok(())
    }
}

fn parse_tasks(list: &str, raw: Option<&str>) -> Vec<Task> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let entries: Vec<String> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(list, error = ?e, "Failed to parse persisted tasks, starting empty");
            return Vec::new();
        }
    };

    let total = entries.len();
    let tasks: Vec<Task> = entries.iter().filter_map(|s| Task::new(s)).collect();
    if tasks.len() != total {
        warn!(list, dropped = total - tasks.len(), "Dropped blank persisted tasks");
    }
    tasks
}

fn encode_tasks(tasks: &[Task]) -> String {
    // Serializing a slice of plain strings cannot fail
    serde_json::to_string(tasks).unwrap_or_else(|_| "[]".to_string())
}
