//! In-memory integration tests for single-task lifecycle operations.

use super::helpers::{Engine, engine};
use std::time::Duration;
use rstest::rstest;
use tasklane::config::EngineConfig;
use tasklane::task::{
    domain::{OwnerId, StatusChangedEvent, TaskPatch, TaskPriority, TaskStatus},
    services::{CreateTaskRequest, TaskErrorKind, TaskServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_then_complete_publishes_each_status(engine: Engine) {
    let created = engine
        .lifecycle
        .create(
            CreateTaskRequest::new("Prepare quarterly report", OwnerId::new())
                .with_description("Numbers from finance")
                .with_priority(TaskPriority::High),
        )
        .await
        .expect("task creation should succeed");

    let completed = engine
        .lifecycle
        .update_status(created.id(), TaskStatus::Completed)
        .await
        .expect("status update should succeed");

    let published = engine.notifier.published().expect("published events");
    assert_eq!(
        published,
        vec![
            StatusChangedEvent::for_task(&created),
            StatusChangedEvent::for_task(&completed),
        ]
    );
    assert_eq!(completed.description(), Some("Numbers from finance"));
    assert_eq!(completed.created_at(), created.created_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_status_update_is_published_once(engine: Engine) {
    let created = engine
        .lifecycle
        .create(CreateTaskRequest::new("Idempotent", OwnerId::new()))
        .await
        .expect("task creation should succeed");

    for _ in 0..2 {
        engine
            .lifecycle
            .update_status(created.id(), TaskStatus::InProgress)
            .await
            .expect("status update should succeed");
    }

    let in_progress = engine
        .notifier
        .published()
        .expect("published events")
        .into_iter()
        .filter(|event| event.status == TaskStatus::InProgress)
        .count();
    assert_eq!(in_progress, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recovered_queue_accepts_retry(engine: Engine) {
    let created = engine
        .lifecycle
        .create(CreateTaskRequest::new("Retry me", OwnerId::new()))
        .await
        .expect("task creation should succeed");
    engine.notifier.fail_with("broker restart").expect("toggle");

    let failed = engine
        .lifecycle
        .update_status(created.id(), TaskStatus::Failed)
        .await;
    assert!(matches!(
        failed.as_ref().map_err(TaskServiceError::kind),
        Err(TaskErrorKind::Propagation)
    ));

    engine.notifier.recover().expect("toggle");
    let retried = engine
        .lifecycle
        .update_status(created.id(), TaskStatus::Failed)
        .await
        .expect("retry should succeed");

    assert_eq!(retried.status(), TaskStatus::Failed);
    assert_eq!(retried.version(), created.version() + 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn patch_updates_fields_without_announcing(engine: Engine) {
    let created = engine
        .lifecycle
        .create(CreateTaskRequest::new("Plan offsite", OwnerId::new()))
        .await
        .expect("task creation should succeed");
    let new_owner = OwnerId::new();

    let updated = engine
        .lifecycle
        .update(
            created.id(),
            TaskPatch::new()
                .with_owner(new_owner)
                .with_priority(TaskPriority::Urgent),
        )
        .await
        .expect("update should succeed");

    assert_eq!(updated.owner_id(), new_owner);
    assert_eq!(updated.priority(), TaskPriority::Urgent);
    assert_eq!(engine.notifier.published().expect("published").len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn store_deadline_is_applied(engine: Engine) {
    let service = engine
        .lifecycle
        .with_config(&EngineConfig::default().with_store_timeout(Duration::from_secs(5)));

    let created = service
        .create(CreateTaskRequest::new("Within deadline", OwnerId::new()))
        .await
        .expect("task creation should succeed");

    assert_eq!(
        service.find_one(created.id()).await.expect("lookup"),
        created
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removed_task_is_gone(engine: Engine) {
    let created = engine
        .lifecycle
        .create(CreateTaskRequest::new("Disposable", OwnerId::new()))
        .await
        .expect("task creation should succeed");

    engine
        .lifecycle
        .remove(created.id())
        .await
        .expect("delete should succeed");

    assert!(engine.store.is_empty().expect("len"));
    assert!(matches!(
        engine.lifecycle.remove(created.id()).await,
        Err(TaskServiceError::NotFound(_))
    ));
}
