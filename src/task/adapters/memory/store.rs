//! In-memory task store with transactional staging.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::task::{
    domain::{
        PageRequest, Task, TaskFilter, TaskId, TaskPage, TaskPriority, TaskStats, TaskStatus,
    },
    ports::{TaskStore, TaskStoreError, TaskStoreResult, TaskTransaction},
};

/// Thread-safe in-memory task store.
///
/// Transactions stage their writes privately and claim every task they load
/// until they finish. A second transaction loading a claimed task fails
/// with [`TaskStoreError::VersionConflict`] straight away, while bulk writes
/// and deletes wait for the claim to be released. Staged updates are still
/// checked against the committed version on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    tasks: HashMap<TaskId, Task>,
    retired_ids: HashSet<TaskId>,
    row_locks: HashMap<TaskId, Arc<Mutex<()>>>,
    outage: Option<String>,
}

impl InMemoryStoreState {
    fn ensure_available(&self) -> TaskStoreResult<()> {
        self.outage.as_ref().map_or_else(
            || Ok(()),
            |reason| Err(TaskStoreError::persistence(std::io::Error::other(reason.clone()))),
        )
    }

    fn id_taken(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id) || self.retired_ids.contains(&id)
    }

    fn row_lock(&mut self, id: TaskId) -> Arc<Mutex<()>> {
        Arc::clone(self.row_locks.entry(id).or_default())
    }

    fn retire(&mut self, id: TaskId) -> bool {
        if self.tasks.remove(&id).is_none() {
            return false;
        }
        self.row_locks.remove(&id);
        self.retired_ids.insert(id);
        true
    }
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a persistence error until
    /// [`InMemoryTaskStore::restore`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when lock acquisition fails.
    pub fn simulate_outage(&self, reason: impl Into<String>) -> TaskStoreResult<()> {
        write_state(&self.state)?.outage = Some(reason.into());
        Ok(())
    }

    /// Ends a simulated outage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when lock acquisition fails.
    pub fn restore(&self) -> TaskStoreResult<()> {
        write_state(&self.state)?.outage = None;
        Ok(())
    }

    /// Returns the number of committed tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when lock acquisition fails.
    pub fn len(&self) -> TaskStoreResult<usize> {
        Ok(read_state(&self.state)?.tasks.len())
    }

    /// Returns `true` when no task has been committed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when lock acquisition fails.
    pub fn is_empty(&self) -> TaskStoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Waits for the claims on every existing task in `ids`, in identifier
    /// order.
    async fn lock_rows(&self, ids: &[TaskId]) -> TaskStoreResult<Vec<OwnedMutexGuard<()>>> {
        let mut ordered: Vec<TaskId> = distinct(ids).into_iter().collect();
        ordered.sort_unstable();
        let locks = {
            let mut state = write_state(&self.state)?;
            state.ensure_available()?;
            let mut locks = Vec::with_capacity(ordered.len());
            for id in ordered {
                if state.tasks.contains_key(&id) {
                    locks.push(state.row_lock(id));
                }
            }
            locks
        };
        let mut guards = Vec::with_capacity(locks.len());
        for lock in locks {
            guards.push(lock.lock_owned().await);
        }
        Ok(guards)
    }
}

fn read_state(
    state: &RwLock<InMemoryStoreState>,
) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryStoreState>> {
    state
        .read()
        .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
}

fn write_state(
    state: &RwLock<InMemoryStoreState>,
) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
    state
        .write()
        .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
}

fn distinct(ids: &[TaskId]) -> HashSet<TaskId> {
    ids.iter().copied().collect()
}

fn count(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Newest first; identifier breaks ties so paging is deterministic.
fn newest_first(left: &Task, right: &Task) -> std::cmp::Ordering {
    right
        .created_at()
        .cmp(&left.created_at())
        .then_with(|| right.id().cmp(&left.id()))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    type Transaction = InMemoryTaskTransaction;

    async fn begin(&self) -> TaskStoreResult<Self::Transaction> {
        read_state(&self.state)?.ensure_available()?;
        Ok(InMemoryTaskTransaction {
            state: Arc::clone(&self.state),
            staged: HashMap::new(),
            claims: HashMap::new(),
        })
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = read_state(&self.state)?;
        state.ensure_available()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: TaskId) -> TaskStoreResult<u64> {
        let _claims = self.lock_rows(&[id]).await?;
        let mut state = write_state(&self.state)?;
        state.ensure_available()?;
        Ok(u64::from(state.retire(id)))
    }

    async fn query_page(
        &self,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> TaskStoreResult<TaskPage> {
        let state = read_state(&self.state)?;
        state.ensure_available()?;
        let mut matching: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .collect();
        matching.sort_by(|left, right| newest_first(left, right));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|task| (*task).clone())
            .collect();

        Ok(TaskPage {
            items,
            total: count(matching.len()),
            page: page.page(),
            limit: page.limit(),
        })
    }

    async fn bulk_set_status(
        &self,
        ids: &[TaskId],
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> TaskStoreResult<u64> {
        let _claims = self.lock_rows(ids).await?;
        let mut state = write_state(&self.state)?;
        state.ensure_available()?;
        let mut affected = 0_u64;
        for id in distinct(ids) {
            if let Some(task) = state.tasks.get_mut(&id) {
                task.bulk_set_status(status, updated_at);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn bulk_delete(&self, ids: &[TaskId]) -> TaskStoreResult<u64> {
        let _claims = self.lock_rows(ids).await?;
        let mut state = write_state(&self.state)?;
        state.ensure_available()?;
        let mut affected = 0_u64;
        for id in distinct(ids) {
            if state.retire(id) {
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn aggregate_counts(&self, filter: &TaskFilter) -> TaskStoreResult<TaskStats> {
        let state = read_state(&self.state)?;
        state.ensure_available()?;
        let stats = state
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .fold(TaskStats::default(), |mut stats, task| {
                stats.total += 1;
                match task.status() {
                    TaskStatus::Completed => stats.completed += 1,
                    TaskStatus::Pending => stats.pending += 1,
                    _ => {}
                }
                if task.priority() == TaskPriority::High {
                    stats.high_priority += 1;
                }
                stats
            });
        Ok(stats)
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    Insert(Task),
    Update { task: Task, expected_version: u64 },
}

impl StagedWrite {
    const fn task(&self) -> &Task {
        match self {
            Self::Insert(task) | Self::Update { task, .. } => task,
        }
    }
}

/// Transaction over an [`InMemoryTaskStore`].
///
/// Claims on loaded tasks are released when the transaction is committed,
/// rolled back or dropped.
#[derive(Debug)]
pub struct InMemoryTaskTransaction {
    state: Arc<RwLock<InMemoryStoreState>>,
    staged: HashMap<TaskId, StagedWrite>,
    claims: HashMap<TaskId, OwnedMutexGuard<()>>,
}

impl InMemoryTaskTransaction {
    /// Claims `id` for this transaction unless it already holds the claim.
    fn claim(&mut self, id: TaskId) -> TaskStoreResult<()> {
        if self.claims.contains_key(&id) {
            return Ok(());
        }
        let (lock, committed_version) = {
            let mut state = write_state(&self.state)?;
            state.ensure_available()?;
            let Some(version) = state.tasks.get(&id).map(Task::version) else {
                return Ok(());
            };
            (state.row_lock(id), version)
        };
        let guard = lock
            .try_lock_owned()
            .map_err(|_| TaskStoreError::VersionConflict {
                task_id: id,
                expected: committed_version,
            })?;
        self.claims.insert(id, guard);
        Ok(())
    }
}

#[async_trait]
impl TaskTransaction for InMemoryTaskTransaction {
    async fn insert(&mut self, task: &Task) -> TaskStoreResult<Task> {
        let taken = {
            let state = read_state(&self.state)?;
            state.ensure_available()?;
            state.id_taken(task.id())
        };
        if taken || self.staged.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        self.staged
            .insert(task.id(), StagedWrite::Insert(task.clone()));
        Ok(task.clone())
    }

    async fn find_by_id(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(Some(staged.task().clone()));
        }
        self.claim(id)?;
        let state = read_state(&self.state)?;
        state.ensure_available()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn save(&mut self, task: &Task) -> TaskStoreResult<Task> {
        let current = self
            .find_by_id(task.id())
            .await?
            .ok_or(TaskStoreError::NotFound(task.id()))?;
        if current.version() != task.version() {
            return Err(TaskStoreError::VersionConflict {
                task_id: task.id(),
                expected: task.version(),
            });
        }

        let stored = task.next_version();
        let write = match self.staged.remove(&task.id()) {
            Some(StagedWrite::Insert(_)) => StagedWrite::Insert(stored.clone()),
            Some(StagedWrite::Update {
                expected_version, ..
            }) => StagedWrite::Update {
                task: stored.clone(),
                expected_version,
            },
            None => StagedWrite::Update {
                task: stored.clone(),
                expected_version: current.version(),
            },
        };
        self.staged.insert(task.id(), write);
        Ok(stored)
    }

    async fn commit(self) -> TaskStoreResult<()> {
        let mut state = write_state(&self.state)?;
        state.ensure_available()?;

        for (id, write) in &self.staged {
            match write {
                StagedWrite::Insert(_) if state.id_taken(*id) => {
                    return Err(TaskStoreError::DuplicateTask(*id));
                }
                StagedWrite::Update {
                    expected_version, ..
                } => {
                    let stored = state.tasks.get(id).ok_or(TaskStoreError::NotFound(*id))?;
                    if stored.version() != *expected_version {
                        return Err(TaskStoreError::VersionConflict {
                            task_id: *id,
                            expected: *expected_version,
                        });
                    }
                }
                StagedWrite::Insert(_) => {}
            }
        }

        for (id, write) in self.staged {
            let task = match write {
                StagedWrite::Insert(task) | StagedWrite::Update { task, .. } => task,
            };
            state.tasks.insert(id, task);
        }
        Ok(())
    }

    async fn rollback(self) -> TaskStoreResult<()> {
        Ok(())
    }
}
