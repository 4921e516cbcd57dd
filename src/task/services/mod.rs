//! Application services for task lifecycle orchestration.
//!
//! - [`TaskLifecycleService`]: create, read, update and delete single tasks
//!   with status announcements.
//! - [`TaskBatchService`]: bulk status and delete transitions.
//! - [`TaskQueryService`]: paginated listing and statistics.

mod batch;
mod deadline;
mod error;
mod lifecycle;
mod query;

pub use batch::{BatchOutcome, TaskBatchService};
pub use error::{TaskErrorKind, TaskServiceError, TaskServiceResult};
pub use lifecycle::{CreateTaskRequest, TaskLifecycleService};
pub use query::{ListTasksQuery, TaskQueryService};
