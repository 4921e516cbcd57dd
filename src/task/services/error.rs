//! Caller-facing error taxonomy for task services.

use crate::task::{
    domain::{TaskDomainError, TaskId, TaskStatus},
    ports::{NotifierError, TaskStoreError},
};
use std::time::Duration;
use thiserror::Error;

/// Service-level errors for task lifecycle, batch and query operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Input was rejected before any store interaction.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// A batch operation was given no identifiers.
    #[error("batch operation requires at least one task identifier")]
    EmptyInput,

    /// The store failed; nothing was changed by this operation unless a
    /// commit outcome was lost.
    #[error(transparent)]
    Persistence(TaskStoreError),

    /// The status change was staged but could not be announced.
    ///
    /// `rolled_back` reports whether the staged write was discarded. When it
    /// is `false` the store could not confirm the rollback.
    #[error("status {status} of task {task_id} was not announced (rolled back: {rolled_back})")]
    Propagation {
        /// Task whose announcement failed.
        task_id: TaskId,
        /// Status that was to be announced.
        status: TaskStatus,
        /// Whether the staged write was discarded.
        rolled_back: bool,
        /// Notifier failure.
        #[source]
        source: NotifierError,
    },

    /// An external call exceeded its deadline.
    #[error("{operation} did not finish within {after:?}")]
    Timeout {
        /// The call that timed out.
        operation: &'static str,
        /// Configured deadline.
        after: Duration,
    },
}

impl From<TaskStoreError> for TaskServiceError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

/// Stable classification of [`TaskServiceError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskErrorKind {
    /// See [`TaskServiceError::Validation`].
    Validation,
    /// See [`TaskServiceError::NotFound`].
    NotFound,
    /// See [`TaskServiceError::EmptyInput`].
    EmptyInput,
    /// See [`TaskServiceError::Persistence`].
    Persistence,
    /// See [`TaskServiceError::Propagation`].
    Propagation,
    /// See [`TaskServiceError::Timeout`].
    Timeout,
}

impl TaskErrorKind {
    /// Returns the canonical name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::EmptyInput => "empty_input",
            Self::Persistence => "persistence",
            Self::Propagation => "propagation",
            Self::Timeout => "timeout",
        }
    }

    /// Returns `true` for conditions the caller caused and can correct.
    #[must_use]
    pub const fn is_caller_error(self) -> bool {
        matches!(self, Self::Validation | Self::NotFound | Self::EmptyInput)
    }
}

impl TaskServiceError {
    /// Returns the stable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> TaskErrorKind {
        match self {
            Self::Validation(_) => TaskErrorKind::Validation,
            Self::NotFound(_) => TaskErrorKind::NotFound,
            Self::EmptyInput => TaskErrorKind::EmptyInput,
            Self::Persistence(_) => TaskErrorKind::Persistence,
            Self::Propagation { .. } => TaskErrorKind::Propagation,
            Self::Timeout { .. } => TaskErrorKind::Timeout,
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;
