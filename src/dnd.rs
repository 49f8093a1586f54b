//! Drag-and-drop bridge.
//!
//! The UI's drag machinery reports only "this task was dropped on that
//! column". Pointer tracking and visual feedback stay with the UI.

use crate::{
    domain::{ColumnId, TaskId},
    persistence::BoardPersistence,
    store::BoardStore,
};
use serde::{Deserialize, Serialize};

/// Data carried by a drag session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub task_id: TaskId,
    pub source_column_id: ColumnId,
}

impl DragPayload {
    pub fn new(task_id: impl Into<TaskId>, source_column_id: impl Into<ColumnId>) -> Self {
        Self {
            task_id: task_id.into(),
            source_column_id: source_column_id.into(),
        }
    }
}

/// A column accepting drops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub column_id: ColumnId,
}

impl DropTarget {
    pub fn new(column_id: impl Into<ColumnId>) -> Self {
        Self {
            column_id: column_id.into(),
        }
    }

    /// A column never accepts a task dragged out of itself
    pub fn accepts(&self, payload: &DragPayload) -> bool {
        payload.source_column_id != self.column_id
    }
}

impl<P: BoardPersistence> BoardStore<P> {
    /// Applies a completed drop.
    ///
    /// When the dragged task is part of a multi-task selection in its
    /// column, the whole selection moves; otherwise just the task is
    /// appended to the target. Returns false if the drop was refused or
    /// nothing moved.
    pub async fn drop_task(&mut self, payload: &DragPayload, target: &DropTarget) -> bool {
        if !target.accepts(payload) {
            tracing::debug!(
                "Refusing drop of '{}' onto its own column '{}'",
                payload.task_id,
                target.column_id
            );
            return false;
        }

        let selection = self.selected_task_ids(&payload.source_column_id);
        if selection.len() > 1 && selection.contains(&payload.task_id) {
            self.bulk_move_tasks(&selection, &payload.source_column_id, &target.column_id)
                .await
        } else {
            self.move_task(
                &payload.task_id,
                &payload.source_column_id,
                &target.column_id,
                None,
            )
            .await
        }
    }
}
