//! Status announcements delivered over the job channel.

use std::sync::Arc;

use super::helpers::SteppingClock;
use rstest::rstest;
use tasklane::config::EngineConfig;
use tasklane::task::{
    adapters::{ChannelStatusNotifier, memory::InMemoryTaskStore},
    domain::{OwnerId, STATUS_UPDATE_JOB, TaskStatus},
    services::{CreateTaskRequest, TaskLifecycleService, TaskServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_enqueues_status_jobs_in_order() {
    let config = EngineConfig::default();
    let (notifier, mut jobs) = ChannelStatusNotifier::bounded(config.queue_capacity);
    let service = TaskLifecycleService::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(notifier),
        Arc::new(SteppingClock::default()),
    )
    .with_config(&config);

    let created = service
        .create(CreateTaskRequest::new("Queue me", OwnerId::new()))
        .await
        .expect("task creation should succeed");
    service
        .update_status(created.id(), TaskStatus::InProgress)
        .await
        .expect("status update should succeed");

    let first = jobs.recv().await.expect("first job");
    let second = jobs.recv().await.expect("second job");
    assert_eq!(first.name, STATUS_UPDATE_JOB);
    assert_eq!(
        first.status_event().expect("decodes").status,
        TaskStatus::Pending
    );
    let event = second.status_event().expect("decodes");
    assert_eq!(event.task_id, created.id());
    assert_eq!(event.status, TaskStatus::InProgress);
    assert!(jobs.try_recv().is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_queue_prevents_creation() {
    let (notifier, jobs) = ChannelStatusNotifier::bounded(4);
    drop(jobs);
    let store = Arc::new(InMemoryTaskStore::new());
    let service = TaskLifecycleService::new(
        Arc::clone(&store),
        Arc::new(notifier),
        Arc::new(SteppingClock::default()),
    );

    let result = service
        .create(CreateTaskRequest::new("Nobody listening", OwnerId::new()))
        .await;

    assert!(matches!(
        result,
        Err(TaskServiceError::Propagation {
            rolled_back: true,
            ..
        })
    ));
    assert!(store.is_empty().expect("len"));
}
