//! Read-only projections of a [`Board`] for display.
//!
//! Nothing here mutates the board; projections are fresh values built from a
//! borrowed snapshot.

use crate::domain::{Board, Column, Task};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Completion filter applied to every column's tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl TaskFilter {
    pub fn accepts(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Incomplete => !task.completed,
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Completed => write!(f, "completed"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "incomplete" => Ok(Self::Incomplete),
            _ => Err(format!(
                "Invalid filter '{}'. Valid filters: all, completed, incomplete",
                s
            )),
        }
    }
}

/// Search and filter criteria
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAndFilter {
    pub search_query: String,
    pub filter: TaskFilter,
}

impl SearchAndFilter {
    pub fn new(search_query: impl Into<String>, filter: TaskFilter) -> Self {
        Self {
            search_query: search_query.into(),
            filter,
        }
    }

    fn matcher(&self) -> impl Fn(&Task) -> bool + '_ {
        let query = self.search_query.trim().to_lowercase();
        move |task| self.filter.accepts(task) && (query.is_empty() || task.matches(&query))
    }
}

/// Builds a filtered view of `board`.
///
/// Columns, their titles and ranks pass through untouched; only each
/// column's task sequence is filtered. Search and filter are combined with
/// AND, and search is a case-insensitive substring match on task text.
pub fn project(board: &Board, criteria: &SearchAndFilter) -> Board {
    let keep = criteria.matcher();
    let columns = board
        .columns()
        .iter()
        .map(|column| Column {
            id: column.id.clone(),
            title: column.title.clone(),
            tasks: column.tasks.iter().filter(|t| keep(*t)).cloned().collect(),
            color: column.color.clone(),
            order: column.order,
        })
        .collect();
    Board::from_sorted_columns(columns)
}

/// Unfiltered aggregate counts across the whole board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
}

impl BoardStats {
    pub fn of(board: &Board) -> Self {
        board
            .columns()
            .iter()
            .map(ColumnStats::of)
            .fold(Self::default(), |acc, c| Self {
                total: acc.total + c.total,
                completed: acc.completed + c.completed,
            })
    }

    pub fn incomplete(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}

/// Per-column "completed/total" counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ColumnStats {
    pub total: usize,
    pub completed: usize,
}

impl ColumnStats {
    pub fn of(column: &Column) -> Self {
        Self {
            total: column.tasks.len(),
            completed: column.completed_count(),
        }
    }
}

impl fmt::Display for ColumnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}
