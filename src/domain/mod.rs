pub mod board;
pub mod column;
pub mod task;

pub use board::{Board, BoardConfig};
pub use column::{Column, ColumnId, ColumnRecord};
pub use task::{Priority, Task, TaskId};
