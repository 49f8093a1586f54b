use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskBoardError>;

#[derive(Debug, Error)]
pub enum TaskBoardError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task text must not be empty")]
    EmptyTaskText,

    #[error("Task text is {len} characters, the limit is {max}")]
    TaskTextTooLong { len: usize, max: usize },

    #[error("Column title must not be empty")]
    EmptyColumnTitle,

    #[error("Column title is {len} characters, the limit is {max}")]
    ColumnTitleTooLong { len: usize, max: usize },

    #[error("Value unchanged")]
    Unchanged,

    #[error("Stored data version {stored} does not match supported version {expected}")]
    VersionMismatch { stored: String, expected: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl TaskBoardError {
    /// True for errors that mean "the request was not applicable" rather
    /// than "something broke".
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_)
                | Self::ColumnNotFound(_)
                | Self::EmptyTaskText
                | Self::TaskTextTooLong { .. }
                | Self::EmptyColumnTitle
                | Self::ColumnTitleTooLong { .. }
                | Self::Unchanged
        )
    }
}
