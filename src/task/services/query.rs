//! Read-only listing and statistics over stored tasks.

use super::{TaskServiceResult, deadline::store_call};
use crate::config::EngineConfig;
use crate::task::{
    domain::{PageRequest, Task, TaskFilter, TaskPage, TaskStats, TaskStatus},
    ports::TaskStore,
};
use std::sync::Arc;
use std::time::Duration;

/// Listing request: a filter plus optional page coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTasksQuery {
    filter: TaskFilter,
    page: Option<u32>,
    limit: Option<u32>,
}

impl ListTasksQuery {
    /// Creates a query for the first page of every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the one-based page number.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Query and statistics service.
#[derive(Clone)]
pub struct TaskQueryService<S>
where
    S: TaskStore,
{
    store: Arc<S>,
    store_timeout: Option<Duration>,
    default_page_limit: u32,
    max_page_limit: u32,
}

impl<S> TaskQueryService<S>
where
    S: TaskStore,
{
    /// Creates a query service with default page limits.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, &EngineConfig::default())
    }

    /// Creates a query service using the deadlines and page limits of
    /// `config`.
    #[must_use]
    pub const fn with_config(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            store,
            store_timeout: config.store_timeout,
            default_page_limit: config.default_page_limit,
            max_page_limit: config.max_page_limit,
        }
    }

    /// Returns one page of matching tasks, newest first, with the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Validation`] for a zero page, a
    /// limit outside the accepted range or an inverted date range, and
    /// [`super::TaskServiceError::Persistence`] when the store fails.
    pub async fn list(&self, query: ListTasksQuery) -> TaskServiceResult<TaskPage> {
        query.filter.validate()?;
        let page = PageRequest::bounded(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(self.default_page_limit),
            self.max_page_limit,
        )?;
        store_call(
            self.store_timeout,
            "list tasks",
            self.store.query_page(&query.filter, page),
        )
        .await
    }

    /// Returns every task with the given status, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Persistence`] when the store fails.
    pub async fn find_by_status(&self, status: TaskStatus) -> TaskServiceResult<Vec<Task>> {
        let filter = TaskFilter::new().with_status(status);
        let everything = PageRequest::bounded(1, u32::MAX, u32::MAX)?;
        let page = store_call(
            self.store_timeout,
            "find tasks by status",
            self.store.query_page(&filter, everything),
        )
        .await?;
        Ok(page.items)
    }

    /// Returns aggregate counts over every task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Persistence`] when the store fails.
    pub async fn stats(&self) -> TaskServiceResult<TaskStats> {
        self.stats_for(&TaskFilter::new()).await
    }

    /// Returns aggregate counts over the matching tasks.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Validation`] for an inverted date
    /// range and [`super::TaskServiceError::Persistence`] when the store
    /// fails.
    pub async fn stats_for(&self, filter: &TaskFilter) -> TaskServiceResult<TaskStats> {
        filter.validate()?;
        store_call(
            self.store_timeout,
            "task statistics",
            self.store.aggregate_counts(filter),
        )
        .await
    }
}
