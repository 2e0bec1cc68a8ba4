//! Task list: entries, the state machine over them, and its persisted board.

mod board;
mod list;
mod model;

pub use board::{TaskBoard, TASKS_KEY};
pub use list::{TaskGroup, TaskList};
pub use model::{TaskEntry, TaskType};
