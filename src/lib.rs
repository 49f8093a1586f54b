//! # Taskboard Core
//!
//! State engine for a kanban task board.
//!
//! The crate owns the authoritative board (ordered columns holding ordered
//! tasks), the operations that rewrite it, read-only projections for
//! search and filtering, and the versioned persistence contract. Rendering
//! and pointer handling live with the embedding UI, which drives a
//! [`BoardStore`] and re-renders from the snapshots it publishes.

pub mod dnd;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod query;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use dnd::{DragPayload, DropTarget};
pub use domain::{
    board::{Board, BoardConfig},
    column::{Column, ColumnId},
    task::{Priority, Task, TaskId},
};
pub use error::{Result, TaskBoardError};
pub use persistence::{BoardPersistence, PersistenceAdapter, PersistenceConfig};
pub use query::{project, BoardStats, ColumnStats, SearchAndFilter, TaskFilter};
pub use storage::Storage;
pub use store::BoardStore;
