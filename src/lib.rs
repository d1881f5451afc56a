// TodoList - Session-scoped to-do list with drag reordering

pub mod config;
pub mod drag;
pub mod error;
pub mod list;
pub mod logging;
pub mod session;
pub mod storage;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use drag::DragGesture;
pub use error::{Result, TaskListError};
pub use list::TaskList;
pub use session::SessionId;
pub use storage::{Backend, JsonlStorage, MemoryStorage, SessionStorage, SqliteStorage};
pub use store::{COMPLETED_KEY, TASKS_KEY, TaskListStore};
pub use task::Task;
