//! Queue-backed status notifier over a bounded Tokio channel.
//!
//! The channel stands in for the broker's "enqueue message" primitive: a
//! publish resolves once the message is buffered, and the receiving half is
//! handed to whichever worker drains the queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::task::{
    domain::{STATUS_UPDATE_JOB, StatusChangedEvent},
    ports::{NotifierError, NotifierResult, StatusNotifier},
};

/// Message placed on the status-update queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedJob {
    /// Job name consumers dispatch on.
    pub name: String,
    /// JSON job payload.
    pub payload: serde_json::Value,
    /// When the producer enqueued the job.
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedJob {
    /// Decodes the payload of a status-update job.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Rejected`] for jobs of another kind and
    /// [`NotifierError::Transport`] when the payload does not decode.
    pub fn status_event(&self) -> NotifierResult<StatusChangedEvent> {
        if self.name != STATUS_UPDATE_JOB {
            return Err(NotifierError::Rejected(format!(
                "unexpected job name: {}",
                self.name
            )));
        }
        serde_json::from_value(self.payload.clone()).map_err(NotifierError::transport)
    }
}

/// Producer half of the status-update queue.
#[derive(Debug, Clone)]
pub struct ChannelStatusNotifier {
    sender: mpsc::Sender<QueuedJob>,
}

impl ChannelStatusNotifier {
    /// Creates a queue holding at most `capacity` undelivered jobs and
    /// returns the producer together with the consumer half.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<QueuedJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl StatusNotifier for ChannelStatusNotifier {
    async fn publish_status_changed(&self, event: &StatusChangedEvent) -> NotifierResult<()> {
        let payload = serde_json::to_value(event).map_err(NotifierError::transport)?;
        let job = QueuedJob {
            name: STATUS_UPDATE_JOB.to_owned(),
            payload,
            enqueued_at: Utc::now(),
        };
        self.sender
            .send(job)
            .await
            .map_err(|_| NotifierError::Unavailable("status queue consumer has shut down".to_owned()))
    }
}
