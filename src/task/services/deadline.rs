//! Deadlines for calls into external collaborators.

use super::{TaskServiceError, TaskServiceResult};
use crate::task::ports::TaskStoreResult;
use std::future::Future;
use std::time::Duration;

/// Awaits `future`, giving up after `limit` when one is set.
///
/// Returns the elapsed deadline on timeout.
pub(super) async fn bounded<F>(limit: Option<Duration>, future: F) -> Result<F::Output, Duration>
where
    F: Future,
{
    match limit {
        Some(after) => tokio::time::timeout(after, future)
            .await
            .map_err(|_| after),
        None => Ok(future.await),
    }
}

/// Awaits a store call under the store deadline.
pub(super) async fn store_call<T, F>(
    limit: Option<Duration>,
    operation: &'static str,
    future: F,
) -> TaskServiceResult<T>
where
    F: Future<Output = TaskStoreResult<T>>,
{
    bounded(limit, future)
        .await
        .map_err(|after| TaskServiceError::Timeout { operation, after })?
        .map_err(TaskServiceError::from)
}
