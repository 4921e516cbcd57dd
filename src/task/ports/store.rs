//! Store port for durable task records.
//!
//! Mutations that must be atomic with a status announcement run inside a
//! [`TaskTransaction`] opened by the caller. Reads and bulk statements run
//! directly against the store.

use crate::task::domain::{PageRequest, Task, TaskFilter, TaskId, TaskPage, TaskStats, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Durable task record store.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Transaction handle produced by [`TaskStore::begin`].
    type Transaction: TaskTransaction;

    /// Opens a transaction scope.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when no transaction can be
    /// started.
    async fn begin(&self) -> TaskStoreResult<Self::Transaction>;

    /// Finds a task by identifier outside any transaction.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Deletes a task, returning the number of rows removed.
    ///
    /// Existence check and removal are one statement, so zero is the only
    /// signal that the task was absent.
    async fn delete_by_id(&self, id: TaskId) -> TaskStoreResult<u64>;

    /// Returns one page of matching tasks, newest first, and the size of
    /// the whole matching set, both read from the same snapshot.
    async fn query_page(&self, filter: &TaskFilter, page: PageRequest)
    -> TaskStoreResult<TaskPage>;

    /// Sets the status of every listed task in one statement.
    ///
    /// Unknown identifiers are ignored. Returns the number of distinct
    /// tasks written, whether or not their status was already `status`.
    async fn bulk_set_status(
        &self,
        ids: &[TaskId],
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> TaskStoreResult<u64>;

    /// Deletes every listed task in one statement, returning the number of
    /// rows removed. Unknown identifiers are ignored.
    async fn bulk_delete(&self, ids: &[TaskId]) -> TaskStoreResult<u64>;

    /// Computes aggregate counts over the matching tasks in one read.
    async fn aggregate_counts(&self, filter: &TaskFilter) -> TaskStoreResult<TaskStats>;
}

/// Transaction scope over the task store.
///
/// Writes become visible to other readers only after
/// [`TaskTransaction::commit`]. Dropping a transaction without committing
/// discards its writes.
#[async_trait]
pub trait TaskTransaction: Send {
    /// Inserts a new task and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the identifier is
    /// already taken or was used by a deleted task.
    async fn insert(&mut self, task: &Task) -> TaskStoreResult<Task>;

    /// Loads a task as seen by this transaction and claims it until the
    /// transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::VersionConflict`] when another open
    /// transaction already holds the task.
    async fn find_by_id(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Writes a modified task and returns the stored record with its next
    /// version.
    ///
    /// The write is a compare-and-swap on [`Task::version`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::VersionConflict`] when another writer
    /// committed first and [`TaskStoreError::NotFound`] when the task no
    /// longer exists.
    async fn save(&mut self, task: &Task) -> TaskStoreResult<Task>;

    /// Makes every write of this transaction durable.
    async fn commit(self) -> TaskStoreResult<()>;

    /// Discards every write of this transaction.
    async fn rollback(self) -> TaskStoreResult<()>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier exists or existed.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task changed since it was read.
    #[error("task {task_id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        /// Task whose write was rejected.
        task_id: TaskId,
        /// Version the writer read.
        expected: u64,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
