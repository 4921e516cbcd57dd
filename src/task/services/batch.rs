//! Bulk lifecycle transitions over many tasks.
//!
//! Batch writes are single store statements and are not announced to the
//! status notifier. Callers needing per-task announcements re-read the
//! affected tasks and publish for each one themselves.

use super::{TaskServiceError, TaskServiceResult, deadline::store_call};
use crate::config::EngineConfig;
use crate::task::{
    domain::{BatchAction, TaskId, TaskStatus},
    ports::TaskStore,
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of applying a [`BatchAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Action that was applied.
    pub action: BatchAction,
    /// Number of tasks the store changed.
    pub affected: u64,
}

/// Batch operator for status and delete transitions.
#[derive(Clone)]
pub struct TaskBatchService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    store_timeout: Option<Duration>,
}

impl<S, C> TaskBatchService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a batch service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            store_timeout: None,
        }
    }

    /// Applies the store deadline from `config`.
    #[must_use]
    pub const fn with_config(mut self, config: &EngineConfig) -> Self {
        self.store_timeout = config.store_timeout;
        self
    }

    /// Sets `status` on every listed task.
    ///
    /// Unknown identifiers are ignored. Every existing task is written,
    /// including tasks that already had `status`, and counts towards the
    /// returned total.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::EmptyInput`] for an empty list, before
    /// touching the store, and [`TaskServiceError::Persistence`] when the
    /// store fails.
    pub async fn set_status(&self, ids: &[TaskId], status: TaskStatus) -> TaskServiceResult<u64> {
        ensure_not_empty(ids)?;
        debug!(requested = ids.len(), status = %status, "batch status update");
        let affected = store_call(
            self.store_timeout,
            "batch status update",
            self.store.bulk_set_status(ids, status, self.clock.utc()),
        )
        .await?;
        info!(requested = ids.len(), affected, status = %status, "batch status update applied");
        Ok(affected)
    }

    /// Marks every listed task completed.
    ///
    /// # Errors
    ///
    /// See [`TaskBatchService::set_status`].
    pub async fn complete(&self, ids: &[TaskId]) -> TaskServiceResult<u64> {
        self.set_status(ids, TaskStatus::Completed).await
    }

    /// Deletes every listed task. Unknown identifiers are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::EmptyInput`] for an empty list, before
    /// touching the store, and [`TaskServiceError::Persistence`] when the
    /// store fails.
    pub async fn delete(&self, ids: &[TaskId]) -> TaskServiceResult<u64> {
        ensure_not_empty(ids)?;
        debug!(requested = ids.len(), "batch delete");
        let affected =
            store_call(self.store_timeout, "batch delete", self.store.bulk_delete(ids)).await?;
        info!(requested = ids.len(), affected, "batch delete applied");
        Ok(affected)
    }

    /// Dispatches a named batch action.
    ///
    /// # Errors
    ///
    /// See [`TaskBatchService::complete`] and [`TaskBatchService::delete`].
    pub async fn apply(&self, action: BatchAction, ids: &[TaskId]) -> TaskServiceResult<BatchOutcome> {
        let affected = match action {
            BatchAction::Complete => self.complete(ids).await?,
            BatchAction::Delete => self.delete(ids).await?,
        };
        Ok(BatchOutcome { action, affected })
    }
}

const fn ensure_not_empty(ids: &[TaskId]) -> TaskServiceResult<()> {
    if ids.is_empty() {
        return Err(TaskServiceError::EmptyInput);
    }
    Ok(())
}
