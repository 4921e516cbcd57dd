//! Single-task lifecycle orchestration with status propagation.
//!
//! Every status-affecting mutation is staged in a store transaction, the
//! resulting status is published, and only then is the transaction
//! committed. A failed or timed-out publish rolls the transaction back, so
//! a successful return means the write is durable and was announced at
//! least once.

use super::{
    TaskServiceError, TaskServiceResult,
    deadline::{bounded, store_call},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{
        NewTaskData, OwnerId, StatusChange, StatusChangedEvent, Task, TaskDomainError, TaskId,
        TaskPatch, TaskPriority, TaskStatus, TaskTitle,
    },
    ports::{StatusNotifier, TaskStore, TaskStoreError, TaskTransaction},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    owner_id: OwnerId,
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    due_date: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, owner_id: OwnerId) -> Self {
        Self {
            title: title.into(),
            owner_id,
            description: None,
            status: None,
            priority: None,
            due_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial status instead of the default.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the priority instead of the default.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    fn into_data(self) -> Result<NewTaskData, TaskDomainError> {
        Ok(NewTaskData {
            title: TaskTitle::new(self.title)?,
            description: self.description,
            status: self.status,
            priority: self.priority,
            owner_id: self.owner_id,
            due_date: self.due_date,
        })
    }
}

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<S, N, C>
where
    S: TaskStore,
    N: StatusNotifier,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    store_timeout: Option<Duration>,
    publish_timeout: Option<Duration>,
}

impl<S, N, C> TaskLifecycleService<S, N, C>
where
    S: TaskStore,
    N: StatusNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service with default deadlines.
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        let config = EngineConfig::default();
        Self {
            store,
            notifier,
            clock,
            store_timeout: config.store_timeout,
            publish_timeout: config.publish_timeout,
        }
    }

    /// Applies the deadlines from `config`.
    #[must_use]
    pub const fn with_config(mut self, config: &EngineConfig) -> Self {
        self.store_timeout = config.store_timeout;
        self.publish_timeout = config.publish_timeout;
        self
    }

    /// Creates a task and announces its initial status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] for a malformed request,
    /// [`TaskServiceError::Persistence`] when the store write fails, and
    /// [`TaskServiceError::Propagation`] or [`TaskServiceError::Timeout`]
    /// when the announcement fails; in the last two cases the task is not
    /// kept.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskServiceResult<Task> {
        let task = Task::new(request.into_data()?, &*self.clock);
        debug!(task_id = %task.id(), status = %task.status(), "creating task");

        let mut transaction = self.begin().await?;
        let staged = store_call(self.store_timeout, "insert task", transaction.insert(&task)).await;
        let stored = match staged {
            Ok(stored) => stored,
            Err(err) => {
                self.abandon(transaction).await;
                return Err(err);
            }
        };

        self.announce_and_commit(transaction, &stored).await?;
        info!(task_id = %stored.id(), status = %stored.status(), "task created");
        Ok(stored)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist
    /// and [`TaskServiceError::Persistence`] when the lookup fails.
    pub async fn find_one(&self, id: TaskId) -> TaskServiceResult<Task> {
        store_call(self.store_timeout, "find task", self.store.find_by_id(id))
            .await?
            .ok_or(TaskServiceError::NotFound(id))
    }

    /// Applies a patch to a task.
    ///
    /// The new status is announced only when the patch changed it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist,
    /// [`TaskServiceError::Persistence`] when the store fails or another
    /// writer committed first, and [`TaskServiceError::Propagation`] or
    /// [`TaskServiceError::Timeout`] when the announcement fails; in the
    /// last two cases the task is left unchanged.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        debug!(task_id = %id, "updating task");
        let mut transaction = self.begin().await?;
        let (stored, change) = match self.stage_update(&mut transaction, id, patch).await {
            Ok(staged) => staged,
            Err(err) => {
                if let TaskServiceError::Persistence(TaskStoreError::VersionConflict { .. }) = &err {
                    warn!(task_id = %id, "task was modified concurrently, update discarded");
                }
                self.abandon(transaction).await;
                return Err(err);
            }
        };

        if change.is_change() {
            self.announce_and_commit(transaction, &stored).await?;
        } else {
            self.commit(transaction).await?;
        }
        info!(
            task_id = %id,
            status = %stored.status(),
            announced = change.is_change(),
            "task updated"
        );
        Ok(stored)
    }

    /// Sets the status of a single task.
    ///
    /// Equivalent to [`TaskLifecycleService::update`] with a status-only
    /// patch.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycleService::update`].
    pub async fn update_status(&self, id: TaskId, status: TaskStatus) -> TaskServiceResult<Task> {
        self.update(id, TaskPatch::new().with_status(status)).await
    }

    /// Deletes a task. Deletion is not announced.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when no row was deleted and
    /// [`TaskServiceError::Persistence`] when the store fails.
    pub async fn remove(&self, id: TaskId) -> TaskServiceResult<()> {
        let affected =
            store_call(self.store_timeout, "delete task", self.store.delete_by_id(id)).await?;
        if affected == 0 {
            return Err(TaskServiceError::NotFound(id));
        }
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn begin(&self) -> TaskServiceResult<S::Transaction> {
        store_call(self.store_timeout, "begin transaction", self.store.begin()).await
    }

    async fn stage_update(
        &self,
        transaction: &mut S::Transaction,
        id: TaskId,
        patch: TaskPatch,
    ) -> TaskServiceResult<(Task, StatusChange)> {
        let mut task = store_call(self.store_timeout, "load task", transaction.find_by_id(id))
            .await?
            .ok_or(TaskServiceError::NotFound(id))?;
        let change = task.apply_patch(patch, &*self.clock);
        let stored = store_call(self.store_timeout, "save task", transaction.save(&task)).await?;
        Ok((stored, change))
    }

    async fn commit(&self, transaction: S::Transaction) -> TaskServiceResult<()> {
        store_call(self.store_timeout, "commit transaction", transaction.commit()).await
    }

    /// Publishes the task's current status, then commits. Any publish
    /// failure rolls the transaction back.
    async fn announce_and_commit(
        &self,
        transaction: S::Transaction,
        task: &Task,
    ) -> TaskServiceResult<()> {
        let event = StatusChangedEvent::for_task(task);
        let published = bounded(
            self.publish_timeout,
            self.notifier.publish_status_changed(&event),
        )
        .await;

        match published {
            Ok(Ok(())) => self.commit(transaction).await,
            Ok(Err(source)) => {
                let rolled_back = self.abandon(transaction).await;
                if rolled_back {
                    warn!(
                        task_id = %event.task_id,
                        status = %event.status,
                        error = %source,
                        "status publish failed, change rolled back"
                    );
                } else {
                    error!(
                        task_id = %event.task_id,
                        status = %event.status,
                        error = %source,
                        "status publish failed and rollback could not be confirmed"
                    );
                }
                Err(TaskServiceError::Propagation {
                    task_id: event.task_id,
                    status: event.status,
                    rolled_back,
                    source,
                })
            }
            Err(after) => {
                self.abandon(transaction).await;
                warn!(
                    task_id = %event.task_id,
                    status = %event.status,
                    ?after,
                    "status publish timed out, change rolled back"
                );
                Err(TaskServiceError::Timeout {
                    operation: "publish status change",
                    after,
                })
            }
        }
    }

    /// Rolls back, reporting whether the rollback was confirmed.
    async fn abandon(&self, transaction: S::Transaction) -> bool {
        match bounded(self.store_timeout, transaction.rollback()).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(error = %err, "transaction rollback failed");
                false
            }
            Err(after) => {
                warn!(?after, "transaction rollback timed out");
                false
            }
        }
    }
}
