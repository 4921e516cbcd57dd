//! Shared test helpers for in-memory task engine integration tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use tasklane::task::{
    adapters::memory::{InMemoryStatusNotifier, InMemoryTaskStore},
    domain::{OwnerId, Task, TaskId, TaskPriority, TaskStatus},
    services::{CreateTaskRequest, TaskBatchService, TaskLifecycleService, TaskQueryService},
};

/// Clock that advances one minute on every reading, so creation order is
/// strictly increasing.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    /// Creates a clock starting at a fixed instant.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
            .single()
            .expect("valid start instant");
        Self::starting_at(start)
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().expect("clock lock");
        let now = *next;
        *next = now + Duration::minutes(1);
        now
    }
}

/// Lifecycle service over in-memory adapters.
pub type MemoryLifecycle =
    TaskLifecycleService<InMemoryTaskStore, InMemoryStatusNotifier, SteppingClock>;

/// Every service wired to one shared store and notifier.
pub struct Engine {
    pub store: Arc<InMemoryTaskStore>,
    pub notifier: Arc<InMemoryStatusNotifier>,
    pub clock: Arc<SteppingClock>,
    pub lifecycle: MemoryLifecycle,
    pub batch: TaskBatchService<InMemoryTaskStore, SteppingClock>,
    pub query: TaskQueryService<InMemoryTaskStore>,
}

/// Provides a fresh engine for each test.
#[fixture]
pub fn engine() -> Engine {
    let store = Arc::new(InMemoryTaskStore::new());
    let notifier = Arc::new(InMemoryStatusNotifier::new());
    let clock = Arc::new(SteppingClock::default());
    Engine {
        lifecycle: TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        ),
        batch: TaskBatchService::new(Arc::clone(&store), Arc::clone(&clock)),
        query: TaskQueryService::new(Arc::clone(&store)),
        store,
        notifier,
        clock,
    }
}

/// Creates one task per `(title, status, priority)` entry, in order.
///
/// # Errors
///
/// Returns an error if any creation fails.
pub async fn create_tasks(
    engine: &Engine,
    owner_id: OwnerId,
    specs: &[(&str, TaskStatus, TaskPriority)],
) -> Result<Vec<Task>, eyre::Report> {
    let mut created = Vec::with_capacity(specs.len());
    for (title, status, priority) in specs {
        let request = CreateTaskRequest::new(*title, owner_id)
            .with_status(*status)
            .with_priority(*priority);
        created.push(engine.lifecycle.create(request).await?);
    }
    Ok(created)
}

/// Collects identifiers in order.
#[must_use]
pub fn ids_of(tasks: &[Task]) -> Vec<TaskId> {
    tasks.iter().map(Task::id).collect()
}
