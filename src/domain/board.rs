use crate::{
    domain::{
        column::{Column, ColumnId, ColumnRecord},
        task::{Task, TaskId},
    },
    error::{Result, TaskBoardError},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Board configuration used when seeding a fresh board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub default_columns: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_columns: vec![
                "To Do".to_string(),
                "In Progress".to_string(),
                "Done".to_string(),
            ],
        }
    }
}

/// Kanban board state: columns kept sorted by their dense `order` rank.
///
/// Every mutating method either applies completely or returns an error and
/// leaves the board untouched, so callers may treat an `Err` as a no-op.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    columns: Vec<Column>,
}

impl Board {
    /// Seeds a board from the configured column titles, ids "1", "2", ...
    pub fn new(config: &BoardConfig) -> Self {
        let columns = config
            .default_columns
            .iter()
            .enumerate()
            .map(|(i, title)| Column::new(ColumnId::from((i + 1).to_string()), title.clone(), i))
            .collect();
        Self { columns }
    }

    /// Builds a board from persisted column records.
    ///
    /// Missing `order` values default to the record's position, columns are
    /// sorted by `order` and renumbered densely, and repeated column or task
    /// ids keep only their first occurrence in stored order.
    pub fn hydrate(records: Vec<ColumnRecord>) -> Self {
        let mut column_ids = HashSet::new();
        let mut columns: Vec<Column> = records
            .into_iter()
            .enumerate()
            .filter_map(|(position, record)| {
                if !column_ids.insert(record.id.clone()) {
                    tracing::warn!(
                        "Dropping duplicate column '{}' with {} tasks",
                        record.id,
                        record.tasks.len()
                    );
                    return None;
                }
                Some(record.into_column(position))
            })
            .collect();
        columns.sort_by_key(|c| c.order);

        let mut seen = HashSet::new();
        for column in &mut columns {
            column.tasks.retain(|task| {
                let first = seen.insert(task.id.clone());
                if !first {
                    tracing::warn!(
                        "Dropping duplicate task '{}' found in column '{}'",
                        task.id,
                        column.id
                    );
                }
                first
            });
        }

        let mut board = Self { columns };
        board.renumber();
        board
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn from_sorted_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    fn column_mut(&mut self, id: &ColumnId) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| TaskBoardError::ColumnNotFound(id.to_string()))
    }

    fn column_index(&self, id: &ColumnId) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| TaskBoardError::ColumnNotFound(id.to_string()))
    }

    /// Finds a task anywhere on the board
    pub fn find_task(&self, id: &TaskId) -> Option<(&ColumnId, &Task)> {
        self.columns
            .iter()
            .find_map(|c| c.task(id).map(|t| (&c.id, t)))
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    fn renumber(&mut self) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.order = i;
        }
    }

    // Task operations

    /// Appends a new task to the end of a column
    pub fn add_task(&mut self, column_id: &ColumnId, text: &str) -> Result<TaskId> {
        let text = Task::validate_text(text)?;
        let column = self.column_mut(column_id)?;
        let id = TaskId::generate();
        column.tasks.push(Task::new(id.clone(), text));
        Ok(id)
    }

    pub fn remove_task(&mut self, column_id: &ColumnId, task_id: &TaskId) -> Result<()> {
        self.column_mut(column_id)?.take_task(task_id)?;
        Ok(())
    }

    pub fn toggle_task_complete(&mut self, column_id: &ColumnId, task_id: &TaskId) -> Result<()> {
        self.column_mut(column_id)?
            .task_mut(task_id)?
            .toggle_completed();
        Ok(())
    }

    pub fn edit_task(&mut self, column_id: &ColumnId, task_id: &TaskId, text: &str) -> Result<()> {
        self.column_mut(column_id)?.task_mut(task_id)?.set_text(text)
    }

    /// Moves a task between (or within) columns.
    ///
    /// `new_index` is clamped to the target's length; `None` appends.
    pub fn move_task(
        &mut self,
        task_id: &TaskId,
        from: &ColumnId,
        to: &ColumnId,
        new_index: Option<usize>,
    ) -> Result<()> {
        let from_index = self.column_index(from)?;
        let to_index = self.column_index(to)?;

        let task = self.columns[from_index].take_task(task_id)?;
        self.columns[to_index].insert_task(task, new_index);
        Ok(())
    }

    pub fn toggle_task_selection(&mut self, column_id: &ColumnId, task_id: &TaskId) -> Result<()> {
        self.column_mut(column_id)?
            .task_mut(task_id)?
            .toggle_selected();
        Ok(())
    }

    pub fn select_all_tasks(&mut self, column_id: &ColumnId, selected: bool) -> Result<()> {
        for task in &mut self.column_mut(column_id)?.tasks {
            task.selected = selected;
        }
        Ok(())
    }

    /// Removes every listed task from the column; unknown ids are ignored
    pub fn bulk_delete_tasks(&mut self, column_id: &ColumnId, task_ids: &[TaskId]) -> Result<()> {
        let ids: HashSet<&TaskId> = task_ids.iter().collect();
        self.column_mut(column_id)?
            .tasks
            .retain(|t| !ids.contains(&t.id));
        Ok(())
    }

    /// Sets completion on every listed task and consumes their selection
    pub fn bulk_toggle_complete(
        &mut self,
        column_id: &ColumnId,
        task_ids: &[TaskId],
        completed: bool,
    ) -> Result<()> {
        let ids: HashSet<&TaskId> = task_ids.iter().collect();
        for task in &mut self.column_mut(column_id)?.tasks {
            if ids.contains(&task.id) {
                task.completed = completed;
                task.selected = false;
            }
        }
        Ok(())
    }

    /// Moves the listed tasks to the end of `to`, keeping their relative
    /// order and clearing their selection. Returns how many tasks moved.
    pub fn bulk_move_tasks(
        &mut self,
        task_ids: &[TaskId],
        from: &ColumnId,
        to: &ColumnId,
    ) -> Result<usize> {
        let from_index = self.column_index(from)?;
        let to_index = self.column_index(to)?;
        let ids: HashSet<&TaskId> = task_ids.iter().collect();

        let source = &mut self.columns[from_index].tasks;
        let (mut moving, staying): (Vec<Task>, Vec<Task>) =
            source.drain(..).partition(|t| ids.contains(&t.id));
        *source = staying;

        for task in &mut moving {
            task.selected = false;
        }
        let moved = moving.len();
        self.columns[to_index].tasks.extend(moving);
        Ok(moved)
    }

    // Column operations

    /// Appends a new empty column ranked after all existing ones
    pub fn add_column(&mut self, title: &str) -> Result<ColumnId> {
        let title = Column::validate_title(title)?;
        let id = ColumnId::generate();
        let order = self.columns.len();
        self.columns.push(Column::new(id.clone(), title, order));
        Ok(id)
    }

    /// Deletes a column together with its tasks
    pub fn remove_column(&mut self, column_id: &ColumnId) -> Result<Column> {
        let index = self.column_index(column_id)?;
        let removed = self.columns.remove(index);
        self.renumber();
        Ok(removed)
    }

    pub fn edit_column(&mut self, column_id: &ColumnId, title: &str) -> Result<()> {
        self.column_mut(column_id)?.set_title(title)
    }

    /// Reinserts a column at `new_index`, clamped to the last position
    pub fn move_column(&mut self, column_id: &ColumnId, new_index: usize) -> Result<()> {
        let index = self.column_index(column_id)?;
        let column = self.columns.remove(index);
        let new_index = new_index.min(self.columns.len());
        self.columns.insert(new_index, column);
        self.renumber();
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(&BoardConfig::default())
    }
}
