//! In-memory integration tests for batch transitions.

use super::helpers::{Engine, create_tasks, engine, ids_of};
use rstest::rstest;
use tasklane::task::{
    domain::{BatchAction, OwnerId, TaskFilter, TaskId, TaskPriority, TaskStatus},
    services::{ListTasksQuery, TaskServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_complete_then_list_completed(engine: Engine) {
    let tasks = create_tasks(
        &engine,
        OwnerId::new(),
        &[
            ("First", TaskStatus::Pending, TaskPriority::Low),
            ("Second", TaskStatus::InProgress, TaskPriority::Low),
            ("Third", TaskStatus::Pending, TaskPriority::Low),
        ],
    )
    .await
    .expect("seed tasks");
    let mut ids = ids_of(&tasks);
    ids.truncate(2);
    ids.push(TaskId::new());

    let outcome = engine
        .batch
        .apply(BatchAction::Complete, &ids)
        .await
        .expect("batch should succeed");

    assert_eq!(outcome.affected, 2);
    let completed = engine
        .query
        .list(
            ListTasksQuery::new()
                .with_filter(TaskFilter::new().with_status(TaskStatus::Completed)),
        )
        .await
        .expect("listing should succeed");
    assert_eq!(completed.total, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_writes_are_not_announced(engine: Engine) {
    let tasks = create_tasks(
        &engine,
        OwnerId::new(),
        &[("Quiet", TaskStatus::Pending, TaskPriority::Low)],
    )
    .await
    .expect("seed tasks");
    let before = engine.notifier.attempts().expect("attempts");

    engine
        .batch
        .complete(&ids_of(&tasks))
        .await
        .expect("batch should succeed");

    assert_eq!(engine.notifier.attempts().expect("attempts"), before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_delete_with_duplicates_counts_once(engine: Engine) {
    let tasks = create_tasks(
        &engine,
        OwnerId::new(),
        &[("Duplicate", TaskStatus::Pending, TaskPriority::Low)],
    )
    .await
    .expect("seed tasks");
    let id = tasks.first().expect("seeded task").id();

    let affected = engine
        .batch
        .delete(&[id, id, id])
        .await
        .expect("batch should succeed");

    assert_eq!(affected, 1);
    assert!(matches!(
        engine.lifecycle.find_one(id).await,
        Err(TaskServiceError::NotFound(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_batch_is_rejected(engine: Engine) {
    let result = engine.batch.apply(BatchAction::Delete, &[]).await;
    assert!(matches!(result, Err(TaskServiceError::EmptyInput)));
}
