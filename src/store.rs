//! The authoritative board and the operations that mutate it.
//!
//! Each operation is applied to a copy of the current board. If the copy was
//! rewritten successfully it is published to subscribers and then persisted;
//! otherwise nothing changes and nothing is written. The published board is
//! authoritative even if the caller stops waiting for the write. Rejections (blank text,
//! unknown ids, unchanged values) are logged at debug level and reported to
//! the caller only as a `false`/`None` outcome.

use crate::{
    domain::{Board, BoardConfig, Column, ColumnId, Task, TaskId},
    error::Result,
    persistence::BoardPersistence,
    query::{project, BoardStats, SearchAndFilter},
};
use tokio::sync::watch;

pub struct BoardStore<P> {
    persistence: P,
    config: BoardConfig,
    state: watch::Sender<Board>,
}

impl<P: BoardPersistence> BoardStore<P> {
    /// Hydrates the board from `persistence`, seeding and saving the default
    /// columns when nothing usable is stored.
    pub async fn open(persistence: P) -> Self {
        Self::open_with_config(persistence, BoardConfig::default()).await
    }

    pub async fn open_with_config(persistence: P, config: BoardConfig) -> Self {
        let board = match persistence.load().await {
            Some(board) => {
                tracing::debug!("Loaded board with {} columns", board.columns().len());
                board
            }
            None => {
                let board = Board::new(&config);
                persistence.save(&board).await;
                board
            }
        };
        Self::with_board(persistence, config, board)
    }

    /// Wraps an existing board without touching storage
    pub fn with_board(persistence: P, config: BoardConfig, board: Board) -> Self {
        let (state, _) = watch::channel(board);
        Self {
            persistence,
            config,
            state,
        }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Borrows the current board. Do not hold the guard across an `.await`.
    pub fn board(&self) -> watch::Ref<'_, Board> {
        self.state.borrow()
    }

    pub fn snapshot(&self) -> Board {
        self.state.borrow().clone()
    }

    /// Receives every board published after a successful mutation
    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.state.subscribe()
    }

    pub fn column(&self, id: &ColumnId) -> Option<Column> {
        self.state.borrow().column(id).cloned()
    }

    pub fn find_task(&self, id: &TaskId) -> Option<(ColumnId, Task)> {
        self.state
            .borrow()
            .find_task(id)
            .map(|(column, task)| (column.clone(), task.clone()))
    }

    pub fn selected_task_ids(&self, column_id: &ColumnId) -> Vec<TaskId> {
        self.state
            .borrow()
            .column(column_id)
            .map(Column::selected_task_ids)
            .unwrap_or_default()
    }

    pub fn project(&self, criteria: &SearchAndFilter) -> Board {
        project(&self.state.borrow(), criteria)
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats::of(&self.state.borrow())
    }

    async fn apply<T>(
        &mut self,
        operation: &'static str,
        mutate: impl FnOnce(&mut Board) -> Result<T>,
    ) -> Option<T> {
        let mut next = self.snapshot();
        match mutate(&mut next) {
            Ok(value) => {
                self.state.send_replace(next.clone());
                self.persistence.save(&next).await;
                Some(value)
            }
            Err(e) if e.is_rejection() => {
                tracing::debug!("Ignoring {}: {}", operation, e);
                None
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", operation, e);
                None
            }
        }
    }

    // Task operations

    pub async fn add_task(&mut self, column_id: &ColumnId, text: &str) -> Option<TaskId> {
        self.apply("add_task", |board| board.add_task(column_id, text))
            .await
    }

    pub async fn remove_task(&mut self, column_id: &ColumnId, task_id: &TaskId) -> bool {
        self.apply("remove_task", |board| board.remove_task(column_id, task_id))
            .await
            .is_some()
    }

    pub async fn toggle_task_complete(&mut self, column_id: &ColumnId, task_id: &TaskId) -> bool {
        self.apply("toggle_task_complete", |board| {
            board.toggle_task_complete(column_id, task_id)
        })
        .await
        .is_some()
    }

    pub async fn edit_task(&mut self, column_id: &ColumnId, task_id: &TaskId, text: &str) -> bool {
        self.apply("edit_task", |board| board.edit_task(column_id, task_id, text))
            .await
            .is_some()
    }

    pub async fn move_task(
        &mut self,
        task_id: &TaskId,
        from: &ColumnId,
        to: &ColumnId,
        new_index: Option<usize>,
    ) -> bool {
        self.apply("move_task", |board| {
            board.move_task(task_id, from, to, new_index)
        })
        .await
        .is_some()
    }

    pub async fn toggle_task_selection(&mut self, column_id: &ColumnId, task_id: &TaskId) -> bool {
        self.apply("toggle_task_selection", |board| {
            board.toggle_task_selection(column_id, task_id)
        })
        .await
        .is_some()
    }

    pub async fn select_all_tasks(&mut self, column_id: &ColumnId, selected: bool) -> bool {
        self.apply("select_all_tasks", |board| {
            board.select_all_tasks(column_id, selected)
        })
        .await
        .is_some()
    }

    pub async fn bulk_delete_tasks(&mut self, column_id: &ColumnId, task_ids: &[TaskId]) -> bool {
        self.apply("bulk_delete_tasks", |board| {
            board.bulk_delete_tasks(column_id, task_ids)
        })
        .await
        .is_some()
    }

    pub async fn bulk_toggle_complete(
        &mut self,
        column_id: &ColumnId,
        task_ids: &[TaskId],
        completed: bool,
    ) -> bool {
        self.apply("bulk_toggle_complete", |board| {
            board.bulk_toggle_complete(column_id, task_ids, completed)
        })
        .await
        .is_some()
    }

    pub async fn bulk_move_tasks(
        &mut self,
        task_ids: &[TaskId],
        from: &ColumnId,
        to: &ColumnId,
    ) -> bool {
        self.apply("bulk_move_tasks", |board| {
            board.bulk_move_tasks(task_ids, from, to)
        })
        .await
        .is_some()
    }

    // Column operations

    pub async fn add_column(&mut self, title: &str) -> Option<ColumnId> {
        self.apply("add_column", |board| board.add_column(title))
            .await
    }

    pub async fn remove_column(&mut self, column_id: &ColumnId) -> bool {
        self.apply("remove_column", |board| board.remove_column(column_id))
            .await
            .is_some()
    }

    pub async fn edit_column(&mut self, column_id: &ColumnId, title: &str) -> bool {
        self.apply("edit_column", |board| board.edit_column(column_id, title))
            .await
            .is_some()
    }

    pub async fn move_column(&mut self, column_id: &ColumnId, new_index: usize) -> bool {
        self.apply("move_column", |board| board.move_column(column_id, new_index))
            .await
            .is_some()
    }

    /// Discards stored data and starts over from the default columns
    pub async fn reset(&mut self) {
        self.persistence.clear().await;
        let board = Board::new(&self.config);
        self.state.send_replace(board.clone());
        self.persistence.save(&board).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        persistence::PersistenceAdapter,
        storage::{MemoryStorage, Storage},
    };
    use async_trait::async_trait;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    /// Records every saved board instead of writing anywhere
    #[derive(Default)]
    struct RecordingPersistence {
        stored: Mutex<Option<Board>>,
        saves: AtomicUsize,
        clears: AtomicUsize,
    }

    impl RecordingPersistence {
        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        fn last_saved(&self) -> Option<Board> {
            self.stored.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BoardPersistence for RecordingPersistence {
        async fn save(&self, board: &Board) {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = Some(board.clone());
        }

        async fn load(&self) -> Option<Board> {
            self.stored.lock().unwrap().clone()
        }

        async fn clear(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = None;
        }
    }

    /// A backend whose writes never complete
    struct StalledPersistence;

    #[async_trait]
    impl BoardPersistence for StalledPersistence {
        async fn save(&self, _board: &Board) {
            std::future::pending::<()>().await
        }

        async fn load(&self) -> Option<Board> {
            None
        }

        async fn clear(&self) {}
    }

    fn col(id: &str) -> ColumnId {
        ColumnId::from(id)
    }

    async fn setup() -> (Arc<RecordingPersistence>, BoardStore<Arc<RecordingPersistence>>) {
        let persistence = Arc::new(RecordingPersistence::default());
        let store = BoardStore::open(persistence.clone()).await;
        (persistence, store)
    }

    fn titles(board: &Board) -> Vec<String> {
        board.columns().iter().map(|c| c.title.clone()).collect()
    }

    #[tokio::test]
    async fn test_open_seeds_and_saves_defaults() {
        let (persistence, store) = setup().await;

        assert_eq!(titles(&store.board()), vec!["To Do", "In Progress", "Done"]);
        assert_eq!(persistence.saves(), 1);
        assert_eq!(persistence.last_saved().unwrap(), store.snapshot());
    }

    #[tokio::test]
    async fn test_open_uses_stored_board() {
        let persistence = Arc::new(RecordingPersistence::default());
        let mut stored = Board::default();
        stored.add_column("Review").unwrap();
        *persistence.stored.lock().unwrap() = Some(stored.clone());

        let store = BoardStore::open(persistence.clone()).await;

        assert_eq!(store.snapshot(), stored);
        assert_eq!(persistence.saves(), 0);
    }

    #[tokio::test]
    async fn test_open_with_custom_columns() {
        let config = BoardConfig {
            default_columns: vec!["Backlog".to_string(), "Now".to_string()],
        };
        let store =
            BoardStore::open_with_config(Arc::new(RecordingPersistence::default()), config).await;

        assert_eq!(titles(&store.board()), vec!["Backlog", "Now"]);
    }

    #[tokio::test]
    async fn test_add_task_scenario() {
        let (persistence, mut store) = setup().await;

        let id = store.add_task(&col("1"), "Write spec").await.unwrap();

        let column = store.column(&col("1")).unwrap();
        assert_eq!(column.tasks.len(), 1);
        assert_eq!(column.tasks[0].id, id);
        assert_eq!(column.tasks[0].text, "Write spec");
        assert!(!column.tasks[0].completed);
        assert_eq!(persistence.saves(), 2);
        assert_eq!(persistence.last_saved().unwrap(), store.snapshot());
    }

    #[tokio::test]
    async fn test_rejections_do_not_persist_or_notify() {
        let (persistence, mut store) = setup().await;
        let id = store.add_task(&col("1"), "Task").await.unwrap();
        let rx = store.subscribe();
        let saves = persistence.saves();

        assert!(store.add_task(&col("1"), "   ").await.is_none());
        assert!(store.add_task(&col("1"), &"x".repeat(501)).await.is_none());
        assert!(!store.remove_task(&col("1"), &TaskId::from("ghost")).await);
        assert!(!store.edit_task(&col("1"), &id, "Task").await);
        assert!(!store.edit_column(&col("1"), "To Do").await);
        assert!(store.add_column("").await.is_none());
        assert!(!store.remove_column(&col("nope")).await);
        assert!(!store.move_column(&col("nope"), 0).await);
        assert!(!store.move_task(&id, &col("2"), &col("3"), None).await);

        assert_eq!(persistence.saves(), saves);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_each_mutation_saves_once_and_notifies() {
        let (persistence, mut store) = setup().await;
        let mut rx = store.subscribe();

        let id = store.add_task(&col("1"), "Task").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().find_task(&id).is_some());

        assert!(store.toggle_task_complete(&col("1"), &id).await);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().find_task(&id).unwrap().1.completed);

        assert_eq!(persistence.saves(), 3);
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (_persistence, mut store) = setup().await;

        let id = store.add_task(&col("1"), "Draft").await.unwrap();
        assert!(store.edit_task(&col("1"), &id, "Final").await);
        assert!(store.toggle_task_selection(&col("1"), &id).await);
        assert_eq!(store.selected_task_ids(&col("1")), vec![id.clone()]);
        assert!(store.move_task(&id, &col("1"), &col("2"), Some(5)).await);

        let (column, task) = store.find_task(&id).unwrap();
        assert_eq!(column, col("2"));
        assert_eq!(task.text, "Final");

        assert!(store.remove_task(&col("2"), &id).await);
        assert!(store.find_task(&id).is_none());
    }

    #[tokio::test]
    async fn test_bulk_toggle_scenario() {
        let (_persistence, mut store) = setup().await;
        let t1 = store.add_task(&col("1"), "t1").await.unwrap();
        let t2 = store.add_task(&col("1"), "t2").await.unwrap();
        let t3 = store.add_task(&col("1"), "t3").await.unwrap();
        store.toggle_task_selection(&col("1"), &t1).await;
        store.toggle_task_selection(&col("1"), &t2).await;

        assert!(
            store
                .bulk_toggle_complete(&col("1"), &[t1.clone(), t2.clone()], true)
                .await
        );

        for id in [&t1, &t2] {
            let (_, task) = store.find_task(id).unwrap();
            assert!(task.completed);
            assert!(!task.selected);
        }
        let (_, task) = store.find_task(&t3).unwrap();
        assert!(!task.completed);
        assert!(!task.selected);
    }

    #[tokio::test]
    async fn test_bulk_delete_and_move() {
        let (_persistence, mut store) = setup().await;
        let a = store.add_task(&col("1"), "a").await.unwrap();
        let b = store.add_task(&col("1"), "b").await.unwrap();
        let c = store.add_task(&col("1"), "c").await.unwrap();
        store.select_all_tasks(&col("1"), true).await;

        assert!(store.bulk_delete_tasks(&col("1"), &[b.clone()]).await);
        assert!(
            store
                .bulk_move_tasks(&[a.clone(), c.clone()], &col("1"), &col("3"))
                .await
        );

        assert!(store.column(&col("1")).unwrap().tasks.is_empty());
        let done: Vec<TaskId> = store
            .column(&col("3"))
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(done, vec![a, c]);
        assert!(store.selected_task_ids(&col("3")).is_empty());
    }

    #[tokio::test]
    async fn test_remove_column_scenario() {
        let (_persistence, mut store) = setup().await;

        assert!(store.remove_column(&col("2")).await);

        let board = store.snapshot();
        let orders: Vec<usize> = board.columns().iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(titles(&board), vec!["To Do", "Done"]);
    }

    #[tokio::test]
    async fn test_move_column_scenario() {
        let (_persistence, mut store) = setup().await;

        assert!(store.move_column(&col("3"), 0).await);

        let board = store.snapshot();
        let ids: Vec<&str> = board.columns().iter().map(|c| c.id.as_str()).collect();
        let orders: Vec<usize> = board.columns().iter().map(|c| c.order).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_column_crud() {
        let (_persistence, mut store) = setup().await;

        let id = store.add_column("Review").await.unwrap();
        assert_eq!(store.column(&id).unwrap().order, 3);
        assert!(store.edit_column(&id, "QA").await);
        assert_eq!(store.column(&id).unwrap().title, "QA");
    }

    #[tokio::test]
    async fn test_projection_and_stats() {
        let (_persistence, mut store) = setup().await;
        let a = store.add_task(&col("1"), "Alpha").await.unwrap();
        store.add_task(&col("2"), "Beta").await.unwrap();
        store.toggle_task_complete(&col("1"), &a).await;

        let view = store.project(&SearchAndFilter::new("alp", Default::default()));
        assert_eq!(view.task_count(), 1);

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        // the store itself is unfiltered
        assert_eq!(store.board().task_count(), 2);
    }

    #[tokio::test]
    async fn test_reset() {
        let (persistence, mut store) = setup().await;
        store.add_task(&col("1"), "Task").await;
        store.remove_column(&col("3")).await;

        store.reset().await;

        assert_eq!(store.snapshot(), Board::default());
        assert_eq!(persistence.clears.load(Ordering::SeqCst), 1);
        assert_eq!(persistence.last_saved().unwrap(), Board::default());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_state() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = BoardStore::open(PersistenceAdapter::new(storage.clone())).await;
        storage.fail_writes(true);

        let id = store.add_task(&col("1"), "Unsaved").await.unwrap();

        assert!(store.find_task(&id).is_some());
        let raw = storage.get_item("taskboard_data").await.unwrap().unwrap();
        assert!(!raw.contains("Unsaved"));
    }

    #[tokio::test]
    async fn test_mutation_is_published_before_write_completes() {
        let mut store =
            BoardStore::with_board(StalledPersistence, BoardConfig::default(), Board::default());
        let rx = store.subscribe();

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            store.add_task(&col("1"), "Pending write"),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(store.board().task_count(), 1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().task_count(), 1);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let storage = Arc::new(MemoryStorage::new());
        let id = {
            let mut store = BoardStore::open(PersistenceAdapter::new(storage.clone())).await;
            let id = store.add_task(&col("2"), "Persisted").await.unwrap();
            store.move_column(&col("2"), 0).await;
            id
        };

        let store = BoardStore::open(PersistenceAdapter::new(storage)).await;

        let (column, task) = store.find_task(&id).unwrap();
        assert_eq!(column, col("2"));
        assert_eq!(task.text, "Persisted");
        assert_eq!(store.board().columns()[0].id, col("2"));
    }

    #[tokio::test]
    async fn test_version_mismatch_falls_back_to_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut store = BoardStore::open(PersistenceAdapter::new(storage.clone())).await;
            store.add_task(&col("1"), "Old").await;
        }
        storage.set_item("taskboard_version", "0.9.0").await.unwrap();

        let store = BoardStore::open(PersistenceAdapter::new(storage.clone())).await;

        assert_eq!(store.board().task_count(), 0);
        assert_eq!(
            storage.get_item("taskboard_version").await.unwrap().as_deref(),
            Some("1.0.0")
        );
    }

    #[tokio::test]
    async fn test_invariants_hold_over_mixed_sequence() {
        let (_persistence, mut store) = setup().await;
        let mut tasks = Vec::new();
        for i in 0..6 {
            let column = col(&((i % 3) + 1).to_string());
            tasks.push(store.add_task(&column, &format!("task {}", i)).await.unwrap());
        }
        let extra = store.add_column("Extra").await.unwrap();
        store.move_task(&tasks[0], &col("1"), &extra, Some(0)).await;
        store.bulk_move_tasks(&tasks[1..3], &col("2"), &col("1")).await;
        store.move_column(&extra, 0).await;
        store.remove_column(&col("3")).await;
        store.move_task(&tasks[1], &col("1"), &col("2"), None).await;
        store.move_task(&tasks[1], &col("2"), &col("1"), None).await;

        let board = store.snapshot();
        let orders: Vec<usize> = board.columns().iter().map(|c| c.order).collect();
        assert_eq!(orders, (0..board.columns().len()).collect::<Vec<_>>());

        let mut seen = std::collections::HashSet::new();
        for column in board.columns() {
            for task in &column.tasks {
                assert!(seen.insert(task.id.clone()));
            }
        }
        assert_eq!(store.find_task(&tasks[1]).unwrap().0, col("1"));
    }
}
