use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{
    domain::task::{Task, TaskId},
    error::{Result, TaskBoardError},
};

/// Unique identifier for a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered bucket of tasks with a display rank among its siblings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub order: usize,
}

impl Column {
    pub const MAX_TITLE_LEN: usize = 50;

    pub fn new(id: ColumnId, title: String, order: usize) -> Self {
        Self {
            id,
            title,
            tasks: Vec::new(),
            color: None,
            order,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Trims `title` and checks it against the column title limits.
    pub fn validate_title(title: &str) -> Result<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(TaskBoardError::EmptyColumnTitle);
        }
        let len = trimmed.chars().count();
        if len > Self::MAX_TITLE_LEN {
            return Err(TaskBoardError::ColumnTitleTooLong {
                len,
                max: Self::MAX_TITLE_LEN,
            });
        }
        Ok(trimmed.to_string())
    }

    /// Replaces the title, rejecting empty, over-long or identical input
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        let title = Self::validate_title(title)?;
        if title == self.title {
            return Err(TaskBoardError::Unchanged);
        }
        self.title = title;
        Ok(())
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TaskBoardError::TaskNotFound(id.to_string()))
    }

    pub fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Removes and returns the task with the given id
    pub fn take_task(&mut self, id: &TaskId) -> Result<Task> {
        let index = self
            .position_of(id)
            .ok_or_else(|| TaskBoardError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    /// Inserts at `index` clamped to `[0, len]`, or appends when `None`
    pub fn insert_task(&mut self, task: Task, index: Option<usize>) {
        match index {
            Some(i) => {
                let i = i.min(self.tasks.len());
                self.tasks.insert(i, task);
            }
            None => self.tasks.push(task),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn selected_task_ids(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.selected)
            .map(|t| t.id.clone())
            .collect()
    }
}

/// A column as found in persisted data, where `order` may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: Option<usize>,
}

impl ColumnRecord {
    /// Builds a column, falling back to `position` when no order was stored.
    ///
    /// Stored text is held to the same limits as user input: titles and task
    /// text are trimmed and cut to their maximum length, a blank title becomes
    /// "Column N", and tasks with blank text are dropped.
    pub fn into_column(self, position: usize) -> Column {
        let id = self.id;
        let title = clean_stored_text(&self.title, Column::MAX_TITLE_LEN)
            .unwrap_or_else(|| format!("Column {}", position + 1));
        let tasks = self
            .tasks
            .into_iter()
            .filter_map(|mut task| match clean_stored_text(&task.text, Task::MAX_TEXT_LEN) {
                Some(text) => {
                    task.text = text;
                    Some(task)
                }
                None => {
                    tracing::warn!("Dropping task '{}' with blank text in column '{}'", task.id, id);
                    None
                }
            })
            .collect();

        Column {
            id,
            title,
            tasks,
            color: self.color,
            order: self.order.unwrap_or(position),
        }
    }
}

fn clean_stored_text(text: &str, max: usize) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max).collect::<String>().trim_end().to_string())
}
