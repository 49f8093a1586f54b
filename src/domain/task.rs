use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{Result, TaskBoardError};

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!(
                "Invalid priority '{}'. Valid priorities: low, medium, high",
                s
            )),
        }
    }
}

/// A single card on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Transient UI selection; cleared whenever a bulk operation consumes it.
    #[serde(default)]
    pub selected: bool,
}

impl Task {
    pub const MAX_TEXT_LEN: usize = 500;

    /// Creates a new task from already validated text
    pub fn new(id: TaskId, text: String) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at: Utc::now(),
            due_date: None,
            priority: None,
            selected: false,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Trims `text` and checks it against the task text limits.
    pub fn validate_text(text: &str) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TaskBoardError::EmptyTaskText);
        }
        let len = trimmed.chars().count();
        if len > Self::MAX_TEXT_LEN {
            return Err(TaskBoardError::TaskTextTooLong {
                len,
                max: Self::MAX_TEXT_LEN,
            });
        }
        Ok(trimmed.to_string())
    }

    /// Replaces the text, rejecting empty, over-long or identical input
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        let text = Self::validate_text(text)?;
        if text == self.text {
            return Err(TaskBoardError::Unchanged);
        }
        self.text = text;
        Ok(())
    }

    pub fn toggle_completed(&mut self) {
        self.completed = !self.completed;
    }

    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
    }

    /// Case-insensitive substring match on the task text
    pub fn matches(&self, query_lower: &str) -> bool {
        self.text.to_lowercase().contains(query_lower)
    }
}
