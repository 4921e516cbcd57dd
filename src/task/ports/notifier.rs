//! Notifier port for status-change announcements.

use crate::task::domain::StatusChangedEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Producer side of the status-update work queue.
///
/// Delivery is at-least-once; consumers must tolerate duplicates. No
/// ordering is promised, even for events about the same task.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Enqueues a status-change announcement.
    ///
    /// Returns once the queue has accepted the message.
    async fn publish_status_changed(&self, event: &StatusChangedEvent) -> NotifierResult<()>;
}

/// Errors returned by notifier adapters.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The queue cannot accept messages right now.
    #[error("status queue unavailable: {0}")]
    Unavailable(String),

    /// The queue refused the message.
    #[error("status queue rejected message: {0}")]
    Rejected(String),

    /// Transport-level failure.
    #[error("status queue transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifierError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
