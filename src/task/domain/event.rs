//! Status-change announcement payload.

use super::{Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue job name used for status-change announcements.
pub const STATUS_UPDATE_JOB: &str = "task-status-update";

/// Announcement that a task now holds a status.
///
/// Carries the status value at commit time rather than a delta, so
/// consumers can process redelivered or reordered events idempotently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedEvent {
    /// Task whose status changed.
    pub task_id: TaskId,
    /// Current status of the task.
    pub status: TaskStatus,
    /// When the mutation was applied.
    pub occurred_at: DateTime<Utc>,
}

impl StatusChangedEvent {
    /// Builds the announcement for a task's current status.
    #[must_use]
    pub const fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id(),
            status: task.status(),
            occurred_at: task.updated_at(),
        }
    }
}
