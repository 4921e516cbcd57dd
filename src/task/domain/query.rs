//! Read-side value types: filters, pagination and aggregate counts.

use super::{OwnerId, Task, TaskDomainError, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Predicate over tasks used by listing and aggregate reads.
///
/// Unset fields match everything. `search` is a case-insensitive substring
/// match over title and description; the creation bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    owner_id: Option<OwnerId>,
    search: Option<String>,
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Creates a filter that matches every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to a status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts results to a priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts results to tasks owned by a user.
    #[must_use]
    pub const fn with_owner(mut self, owner_id: OwnerId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Restricts results to tasks whose title or description contains the
    /// given text. Blank text is ignored.
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let raw = text.into();
        let trimmed = raw.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Restricts results to tasks created at or after the instant.
    #[must_use]
    pub const fn with_created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    /// Restricts results to tasks created at or before the instant.
    #[must_use]
    pub const fn with_created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Returns the status predicate.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the priority predicate.
    #[must_use]
    pub const fn priority(&self) -> Option<TaskPriority> {
        self.priority
    }

    /// Returns the owner predicate.
    #[must_use]
    pub const fn owner_id(&self) -> Option<OwnerId> {
        self.owner_id
    }

    /// Returns the search text.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Returns the inclusive lower creation bound.
    #[must_use]
    pub const fn created_from(&self) -> Option<DateTime<Utc>> {
        self.created_from
    }

    /// Returns the inclusive upper creation bound.
    #[must_use]
    pub const fn created_to(&self) -> Option<DateTime<Utc>> {
        self.created_to
    }

    /// Checks the filter is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidDateRange`] when the lower creation
    /// bound lies after the upper one.
    pub fn validate(&self) -> Result<(), TaskDomainError> {
        match (self.created_from, self.created_to) {
            (Some(from), Some(to)) if from > to => Err(TaskDomainError::InvalidDateRange),
            _ => Ok(()),
        }
    }

    /// Evaluates the predicate against a task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|status| task.status() == status)
            && self.priority.is_none_or(|priority| task.priority() == priority)
            && self.owner_id.is_none_or(|owner| task.owner_id() == owner)
            && self
                .created_from
                .is_none_or(|from| task.created_at() >= from)
            && self.created_to.is_none_or(|to| task.created_at() <= to)
            && self.search.as_deref().is_none_or(|text| search_matches(task, text))
    }
}

fn search_matches(task: &Task, text: &str) -> bool {
    let needle = text.to_lowercase();
    task.title().as_str().to_lowercase().contains(&needle)
        || task
            .description()
            .is_some_and(|description| description.to_lowercase().contains(&needle))
}

/// Validated one-based page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Creates page coordinates, rejecting a zero page or a limit outside
    /// `1..=max_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPage`] or
    /// [`TaskDomainError::InvalidLimit`].
    pub const fn bounded(page: u32, limit: u32, max_limit: u32) -> Result<Self, TaskDomainError> {
        if page == 0 {
            return Err(TaskDomainError::InvalidPage(page));
        }
        if limit == 0 || limit > max_limit {
            return Err(TaskDomainError::InvalidLimit {
                limit,
                max: max_limit,
            });
        }
        Ok(Self { page, limit })
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Returns how many matching rows precede this page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// One page of tasks plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    /// Tasks on this page, newest first.
    pub items: Vec<Task>,
    /// Number of tasks matching the filter across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
}

impl TaskPage {
    /// Returns the number of pages needed to show every matching task.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// Aggregate task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// All matching tasks.
    pub total: u64,
    /// Matching tasks with status [`TaskStatus::Completed`].
    pub completed: u64,
    /// Matching tasks with status [`TaskStatus::Pending`].
    pub pending: u64,
    /// Matching tasks with priority [`TaskPriority::High`].
    pub high_priority: u64,
}

/// Transition applied by a batch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// Mark every task completed.
    Complete,
    /// Delete every task.
    Delete,
}

impl BatchAction {
    /// Returns the canonical action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }
}

impl TryFrom<&str> for BatchAction {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "complete" => Ok(Self::Complete),
            "delete" => Ok(Self::Delete),
            _ => Err(TaskDomainError::InvalidBatchAction(value.to_owned())),
        }
    }
}
