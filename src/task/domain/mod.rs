//! Domain model for task lifecycle management.
//!
//! The task domain covers the task aggregate, its status and priority
//! enumerations, partial updates, read-side filters and the status-change
//! announcement payload. Infrastructure concerns stay outside this module.

mod error;
mod event;
mod ids;
mod patch;
mod query;
mod status;
mod task;

pub use error::TaskDomainError;
pub use event::{STATUS_UPDATE_JOB, StatusChangedEvent};
pub use ids::{OwnerId, TaskId};
pub use patch::TaskPatch;
pub use query::{BatchAction, PageRequest, TaskFilter, TaskPage, TaskStats};
pub use status::{TaskPriority, TaskStatus};
pub use task::{NewTaskData, PersistedTaskData, StatusChange, Task, TaskTitle};

/// Longest accepted task title, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;
