//! In-memory status notifier that records announcements.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::task::{
    domain::StatusChangedEvent,
    ports::{NotifierError, NotifierResult, StatusNotifier},
};

/// Recording notifier for tests and local runs.
///
/// Accepted events are kept in publish order. A failure mode and an
/// artificial latency can be configured to exercise propagation errors and
/// deadlines.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusNotifier {
    state: Arc<RwLock<NotifierState>>,
}

#[derive(Debug, Default)]
struct NotifierState {
    published: Vec<StatusChangedEvent>,
    failure: Option<String>,
    latency: Option<Duration>,
    attempts: usize,
}

fn lock_error(err: impl std::fmt::Display) -> NotifierError {
    NotifierError::transport(std::io::Error::other(err.to_string()))
}

impl InMemoryStatusNotifier {
    /// Creates a notifier that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every subsequent publish with
    /// [`NotifierError::Unavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] when lock acquisition fails.
    pub fn fail_with(&self, reason: impl Into<String>) -> NotifierResult<()> {
        self.state.write().map_err(lock_error)?.failure = Some(reason.into());
        Ok(())
    }

    /// Accepts publishes again after [`InMemoryStatusNotifier::fail_with`].
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] when lock acquisition fails.
    pub fn recover(&self) -> NotifierResult<()> {
        self.state.write().map_err(lock_error)?.failure = None;
        Ok(())
    }

    /// Delays every publish by the given duration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] when lock acquisition fails.
    pub fn set_latency(&self, latency: Duration) -> NotifierResult<()> {
        self.state.write().map_err(lock_error)?.latency = Some(latency);
        Ok(())
    }

    /// Returns accepted events in publish order.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] when lock acquisition fails.
    pub fn published(&self) -> NotifierResult<Vec<StatusChangedEvent>> {
        Ok(self.state.read().map_err(lock_error)?.published.clone())
    }

    /// Returns how many publishes were attempted, accepted or not.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] when lock acquisition fails.
    pub fn attempts(&self) -> NotifierResult<usize> {
        Ok(self.state.read().map_err(lock_error)?.attempts)
    }
}

#[async_trait]
impl StatusNotifier for InMemoryStatusNotifier {
    async fn publish_status_changed(&self, event: &StatusChangedEvent) -> NotifierResult<()> {
        let latency = {
            let mut state = self.state.write().map_err(lock_error)?;
            state.attempts += 1;
            state.latency
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().map_err(lock_error)?;
        if let Some(reason) = &state.failure {
            return Err(NotifierError::Unavailable(reason.clone()));
        }
        state.published.push(*event);
        Ok(())
    }
}
