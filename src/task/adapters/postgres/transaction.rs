//! Explicit `PostgreSQL` transaction pinned to one pooled connection.
//!
//! The transaction stays open across async calls so the lifecycle service
//! can await the status publish before deciding to commit. Blocking Diesel
//! calls run on the blocking pool; the connection is moved in and out of
//! each call.

use super::{
    conversion::{row_to_task, to_changeset, to_new_row, version_to_column},
    models::TaskRow,
    schema::tasks,
};
use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskStoreError, TaskStoreResult, TaskTransaction},
};
use async_trait::async_trait;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

type PooledConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Open transaction over a [`super::PostgresTaskStore`].
///
/// A connection returned to the pool with its transaction still open is
/// treated as broken and discarded, which rolls the transaction back.
pub struct PostgresTaskTransaction {
    connection: Option<PooledConn>,
}

impl std::fmt::Debug for PostgresTaskTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresTaskTransaction")
            .field("open", &self.connection.is_some())
            .finish()
    }
}

impl PostgresTaskTransaction {
    pub(super) const fn new(connection: PooledConn) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    async fn run<F, T>(&mut self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut connection = self.connection.take().ok_or_else(|| {
            TaskStoreError::persistence(std::io::Error::other("transaction is no longer usable"))
        })?;
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let outcome = f(&mut connection);
            (connection, outcome)
        })
        .await
        .map_err(TaskStoreError::persistence)?;
        self.connection = Some(returned);
        result
    }
}

fn current_row(connection: &mut PgConnection, id: TaskId) -> TaskStoreResult<Option<TaskRow>> {
    tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()
        .map_err(TaskStoreError::persistence)
}

/// Locks the row for this transaction.
///
/// A row already locked by another open transaction is reported as a
/// [`TaskStoreError::VersionConflict`] instead of waiting for it.
fn claim_row(connection: &mut PgConnection, id: TaskId) -> TaskStoreResult<Option<TaskRow>> {
    let locked = tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .for_update()
        .skip_locked()
        .first::<TaskRow>(connection)
        .optional()
        .map_err(TaskStoreError::persistence)?;
    if locked.is_some() {
        return Ok(locked);
    }
    match current_row(connection, id)? {
        Some(row) => Err(TaskStoreError::VersionConflict {
            task_id: id,
            expected: u64::try_from(row.version).unwrap_or_default(),
        }),
        None => Ok(None),
    }
}

#[async_trait]
impl TaskTransaction for PostgresTaskTransaction {
    async fn insert(&mut self, task: &Task) -> TaskStoreResult<Task> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;
        self.run(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::DuplicateTask(task_id)
                    }
                    _ => TaskStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await?;
        Ok(task.clone())
    }

    async fn find_by_id(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run(move |connection| claim_row(connection, id)?.map(row_to_task).transpose())
            .await
    }

    async fn save(&mut self, task: &Task) -> TaskStoreResult<Task> {
        let task_id = task.id();
        let expected = task.version();
        let expected_column = version_to_column(expected)?;
        let stored = task.next_version();
        let changeset = to_changeset(&stored)?;

        self.run(move |connection| {
            let updated = diesel::update(
                tasks::table
                    .find(task_id.into_inner())
                    .filter(tasks::version.eq(expected_column)),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(TaskStoreError::persistence)?;

            if updated == 0 {
                return Err(match current_row(connection, task_id)? {
                    Some(_) => TaskStoreError::VersionConflict { task_id, expected },
                    None => TaskStoreError::NotFound(task_id),
                });
            }
            Ok(())
        })
        .await?;
        Ok(stored)
    }

    async fn commit(mut self) -> TaskStoreResult<()> {
        self.run(|connection| {
            AnsiTransactionManager::commit_transaction(connection)
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn rollback(mut self) -> TaskStoreResult<()> {
        self.run(|connection| {
            AnsiTransactionManager::rollback_transaction(connection)
                .map_err(TaskStoreError::persistence)
        })
        .await
    }
}
