//! `PostgreSQL` store implementation for task records.

use super::{
    conversion::{contains_pattern, row_to_task},
    models::TaskRow,
    schema::tasks,
    transaction::PostgresTaskTransaction,
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{
        PageRequest, Task, TaskFilter, TaskId, TaskPage, TaskPriority, TaskStats, TaskStatus,
    },
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::dsl::{count_star, sql};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::BigInt;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for the given database URL.
///
/// # Errors
///
/// Returns [`TaskStoreError::Persistence`] when the pool cannot open its
/// initial connections.
pub fn build_pool(database_url: &str, max_size: u32) -> TaskStoreResult<TaskPgPool> {
    Pool::builder()
        .max_size(max_size.max(1))
        .build(ConnectionManager::new(database_url))
        .map_err(TaskStoreError::persistence)
}

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Connects using the database URL and pool size from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when no database URL is
    /// configured or the pool cannot be built.
    pub fn connect(config: &EngineConfig) -> TaskStoreResult<Self> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            TaskStoreError::persistence(std::io::Error::other("DATABASE_URL is not set"))
        })?;
        build_pool(url, config.db_pool_size).map(Self::new)
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

/// Applies a filter to a boxed `tasks` query.
fn filtered(filter: &TaskFilter) -> tasks::BoxedQuery<'static, Pg> {
    let mut query = tasks::table.into_boxed();
    if let Some(status) = filter.status() {
        query = query.filter(tasks::status.eq(status.as_str()));
    }
    if let Some(priority) = filter.priority() {
        query = query.filter(tasks::priority.eq(priority.as_str()));
    }
    if let Some(owner_id) = filter.owner_id() {
        query = query.filter(tasks::owner_id.eq(owner_id.into_inner()));
    }
    if let Some(from) = filter.created_from() {
        query = query.filter(tasks::created_at.ge(from));
    }
    if let Some(to) = filter.created_to() {
        query = query.filter(tasks::created_at.le(to));
    }
    if let Some(text) = filter.search() {
        let pattern = contains_pattern(text);
        query = query.filter(
            tasks::title
                .ilike(pattern.clone())
                .nullable()
                .or(tasks::description.ilike(pattern)),
        );
    }
    query
}

fn uuids(ids: &[TaskId]) -> Vec<uuid::Uuid> {
    ids.iter().map(|id| id.into_inner()).collect()
}

fn to_count(value: i64) -> TaskStoreResult<u64> {
    u64::try_from(value).map_err(TaskStoreError::persistence)
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

fn count_where(column: &str, value: &str) -> String {
    format!("COUNT(*) FILTER (WHERE {column} = '{value}')")
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    type Transaction = PostgresTaskTransaction;

    async fn begin(&self) -> TaskStoreResult<Self::Transaction> {
        let pool = self.pool.clone();
        let connection = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            AnsiTransactionManager::begin_transaction(&mut *connection)
                .map_err(TaskStoreError::persistence)?;
            Ok::<_, TaskStoreError>(connection)
        })
        .await
        .map_err(TaskStoreError::persistence)??;
        Ok(PostgresTaskTransaction::new(connection))
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn delete_by_id(&self, id: TaskId) -> TaskStoreResult<u64> {
        self.run_blocking(move |connection| {
            diesel::delete(tasks::table.find(id.into_inner()))
                .execute(connection)
                .map(affected)
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn query_page(
        &self,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> TaskStoreResult<TaskPage> {
        let owned_filter = filter.clone();
        let limit = i64::from(page.limit());
        let offset = i64::try_from(page.offset()).map_err(TaskStoreError::persistence)?;

        self.run_blocking(move |connection| {
            // Count and page share one snapshot.
            let (total, rows) = connection
                .build_transaction()
                .read_only()
                .repeatable_read()
                .run::<_, diesel::result::Error, _>(|tx| {
                    let total = filtered(&owned_filter).count().get_result::<i64>(tx)?;
                    let rows = filtered(&owned_filter)
                        .select(TaskRow::as_select())
                        .order((tasks::created_at.desc(), tasks::id.desc()))
                        .limit(limit)
                        .offset(offset)
                        .load::<TaskRow>(tx)?;
                    Ok((total, rows))
                })
                .map_err(TaskStoreError::persistence)?;

            let items = rows
                .into_iter()
                .map(row_to_task)
                .collect::<TaskStoreResult<Vec<_>>>()?;
            Ok(TaskPage {
                items,
                total: to_count(total)?,
                page: page.page(),
                limit: page.limit(),
            })
        })
        .await
    }

    async fn bulk_set_status(
        &self,
        ids: &[TaskId],
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> TaskStoreResult<u64> {
        let targets = uuids(ids);
        self.run_blocking(move |connection| {
            diesel::update(tasks::table.filter(tasks::id.eq_any(targets)))
                .set((
                    tasks::status.eq(status.as_str()),
                    tasks::updated_at.eq(updated_at),
                    tasks::version.eq(tasks::version + 1_i64),
                ))
                .execute(connection)
                .map(affected)
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn bulk_delete(&self, ids: &[TaskId]) -> TaskStoreResult<u64> {
        let targets = uuids(ids);
        self.run_blocking(move |connection| {
            diesel::delete(tasks::table.filter(tasks::id.eq_any(targets)))
                .execute(connection)
                .map(affected)
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn aggregate_counts(&self, filter: &TaskFilter) -> TaskStoreResult<TaskStats> {
        let owned_filter = filter.clone();
        self.run_blocking(move |connection| {
            let (total, completed, pending, high_priority) = filtered(&owned_filter)
                .select((
                    count_star(),
                    sql::<BigInt>(&count_where("status", TaskStatus::Completed.as_str())),
                    sql::<BigInt>(&count_where("status", TaskStatus::Pending.as_str())),
                    sql::<BigInt>(&count_where("priority", TaskPriority::High.as_str())),
                ))
                .get_result::<(i64, i64, i64, i64)>(connection)
                .map_err(TaskStoreError::persistence)?;

            Ok(TaskStats {
                total: to_count(total)?,
                completed: to_count(completed)?,
                pending: to_count(pending)?,
                high_priority: to_count(high_priority)?,
            })
        })
        .await
    }
}
