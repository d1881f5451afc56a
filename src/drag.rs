// Drag-and-drop reordering driven by hover events

use crate::error::{Result, TaskListError};
use crate::storage::SessionStorage;
use crate::store::TaskListStore;
use tracing::debug;

/// An in-progress drag of one pending task
///
/// Hover events arrive once per item boundary the pointer crosses. Each one
/// moves the dragged task to the hovered position and remembers where it now
/// sits, so consecutive hovers never compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragGesture {
    index: usize,
}

impl DragGesture {
    pub fn start(index: usize) -> Self {
        Self { index }
    }

    /// Current position of the dragged task
    pub fn index(&self) -> usize {
        self.index
    }

    /// Handle the pointer hovering over the task at `over`
    ///
    /// Returns whether the list was reordered.
    pub fn hover<S: SessionStorage>(&mut self, store: &mut TaskListStore<S>, over: usize) -> Result<bool> {
        if over == self.index {
            return Ok(false);
        }
        store.reorder(self.index, over)?;
        debug!(from = self.index, to = over, "hover: dragged task moved");
        self.index = over;
        Ok(true)
    }

    /// Drag the task at `from` to `to`, hovering over every position in between
    ///
    /// Both positions are checked before the first hover, so a bad target
    /// leaves the list untouched.
    pub fn drag_to<S: SessionStorage>(store: &mut TaskListStore<S>, from: usize, to: usize) -> Result<()> {
        let len = store.pending().len();
        for index in [from, to] {
            if index >= len {
                return Err(TaskListError::InvalidIndex { op: "drag", index, len });
            }
        }

        let mut gesture = Self::start(from);
        if to >= from {
            for over in from..=to {
                gesture.hover(store, over)?;
            }
        } else {
            for over in (to..=from).rev() {
                gesture.hover(store, over)?;
            }
        }
        Ok(())
    }
}
