//! Shared world state for status propagation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasklane::task::{
    adapters::memory::{InMemoryStatusNotifier, InMemoryTaskStore},
    domain::Task,
    services::{TaskBatchService, TaskLifecycleService, TaskServiceError},
};

/// Lifecycle service type used by the BDD world.
pub type TestLifecycleService =
    TaskLifecycleService<InMemoryTaskStore, InMemoryStatusNotifier, DefaultClock>;

/// Batch service type used by the BDD world.
pub type TestBatchService = TaskBatchService<InMemoryTaskStore, DefaultClock>;

/// Scenario world for status propagation behaviour tests.
pub struct StatusPropagationWorld {
    pub notifier: Arc<InMemoryStatusNotifier>,
    pub lifecycle: TestLifecycleService,
    pub batch: TestBatchService,
    pub tasks: HashMap<String, Task>,
    pub last_affected: Option<u64>,
    pub last_error: Option<TaskServiceError>,
}

impl StatusPropagationWorld {
    /// Creates a world backed by fresh in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let notifier = Arc::new(InMemoryStatusNotifier::new());
        let clock = Arc::new(DefaultClock);
        let lifecycle =
            TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&notifier), Arc::clone(&clock));
        let batch = TaskBatchService::new(store, clock);

        Self {
            notifier,
            lifecycle,
            batch,
            tasks: HashMap::new(),
            last_affected: None,
            last_error: None,
        }
    }

    /// Returns the task registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was registered under that name.
    pub fn task(&self, name: &str) -> Result<&Task, eyre::Report> {
        self.tasks
            .get(name)
            .ok_or_else(|| eyre::eyre!("no task named {name} in scenario world"))
    }
}

impl Default for StatusPropagationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StatusPropagationWorld {
    StatusPropagationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
