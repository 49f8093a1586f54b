//! Versioned persistence of the whole board as a single blob.
//!
//! Layout in the underlying [`Storage`]:
//!
//! ```text
//! taskboard_data    -> {"columns": [...], "version": "1.0.0", "lastUpdated": "<RFC 3339>"}
//! taskboard_version -> 1.0.0
//! ```
//!
//! Persistence is best-effort: failures are logged and never reach the
//! caller, and any stored data that cannot be used is treated as absent.

use crate::{
    domain::{Board, Column, ColumnRecord},
    error::{Result, TaskBoardError},
    storage::Storage,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the board store needs from persistence
#[async_trait]
pub trait BoardPersistence: Send + Sync {
    /// Writes the full board; failures are logged, not returned
    async fn save(&self, board: &Board);

    /// Returns the stored board, or `None` when nothing usable is stored
    async fn load(&self) -> Option<Board>;

    /// Discards everything stored
    async fn clear(&self);
}

#[async_trait]
impl<P: BoardPersistence + ?Sized> BoardPersistence for Arc<P> {
    async fn save(&self, board: &Board) {
        (**self).save(board).await
    }

    async fn load(&self) -> Option<Board> {
        (**self).load().await
    }

    async fn clear(&self) {
        (**self).clear().await
    }
}

/// Storage keys and format version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub data_key: String,
    pub version_key: String,
    pub version: String,
}

impl PersistenceConfig {
    pub const CURRENT_VERSION: &'static str = "1.0.0";
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_key: "taskboard_data".to_string(),
            version_key: "taskboard_version".to_string(),
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredBoardRef<'a> {
    columns: &'a [Column],
    version: &'a str,
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBoard {
    #[serde(default)]
    columns: Vec<ColumnRecord>,
    #[serde(default)]
    version: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// [`BoardPersistence`] over any key/value [`Storage`] engine
pub struct PersistenceAdapter<S> {
    storage: S,
    config: PersistenceConfig,
}

impl<S: Storage> PersistenceAdapter<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, PersistenceConfig::default())
    }

    pub fn with_config(storage: S, config: PersistenceConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    async fn try_save(&self, board: &Board) -> Result<()> {
        let blob = StoredBoardRef {
            columns: board.columns(),
            version: &self.config.version,
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string(&blob)?;

        self.storage.set_item(&self.config.data_key, &json).await?;
        self.storage
            .set_item(&self.config.version_key, &self.config.version)
            .await?;
        Ok(())
    }

    async fn try_load(&self) -> Result<Option<Board>> {
        let Some(raw) = self.storage.get_item(&self.config.data_key).await? else {
            return Ok(None);
        };

        let stored_version = self.storage.get_item(&self.config.version_key).await?;
        self.check_version(stored_version.as_deref())?;

        let blob: StoredBoard = serde_json::from_str(&raw)?;
        if let Some(version) = blob.version.as_deref() {
            self.check_version(Some(version))?;
        }

        if blob.columns.is_empty() {
            return Ok(None);
        }
        Ok(Some(Board::hydrate(blob.columns)))
    }

    fn check_version(&self, stored: Option<&str>) -> Result<()> {
        match stored {
            Some(v) if v == self.config.version => Ok(()),
            other => Err(TaskBoardError::VersionMismatch {
                stored: other.unwrap_or("<missing>").to_string(),
                expected: self.config.version.clone(),
            }),
        }
    }

    async fn try_clear(&self) -> Result<()> {
        self.storage.remove_item(&self.config.data_key).await?;
        self.storage.remove_item(&self.config.version_key).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: Storage> BoardPersistence for PersistenceAdapter<S> {
    async fn save(&self, board: &Board) {
        match self.try_save(board).await {
            Ok(()) => tracing::debug!(
                "Saved board with {} columns and {} tasks",
                board.columns().len(),
                board.task_count()
            ),
            Err(e) => tracing::error!("Failed to save board to storage: {}", e),
        }
    }

    async fn load(&self) -> Option<Board> {
        match self.try_load().await {
            Ok(board) => board,
            Err(e @ TaskBoardError::VersionMismatch { .. }) => {
                tracing::warn!("Storage version mismatch, clearing data: {}", e);
                self.clear().await;
                None
            }
            Err(e @ TaskBoardError::SerializationError(_)) => {
                tracing::error!("Stored board is corrupt, clearing data: {}", e);
                self.clear().await;
                None
            }
            Err(e) => {
                tracing::error!("Failed to load board from storage: {}", e);
                None
            }
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.try_clear().await {
            tracing::error!("Failed to clear storage: {}", e);
        }
    }
}
