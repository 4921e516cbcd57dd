//! In-memory integration tests for listing and statistics.

use super::helpers::{Engine, create_tasks, engine, ids_of};
use chrono::Duration;
use mockable::Clock;
use rstest::rstest;
use tasklane::task::{
    domain::{OwnerId, TaskFilter, TaskPriority, TaskStats, TaskStatus},
    services::ListTasksQuery,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pages_walk_the_whole_set_newest_first(engine: Engine) {
    let specs: Vec<(&str, TaskStatus, TaskPriority)> = ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|title| (title, TaskStatus::Pending, TaskPriority::Low))
        .collect();
    let tasks = create_tasks(&engine, OwnerId::new(), &specs)
        .await
        .expect("seed tasks");

    let mut seen = Vec::new();
    for page in 1..=3 {
        let result = engine
            .query
            .list(ListTasksQuery::new().with_page(page).with_limit(2))
            .await
            .expect("listing should succeed");
        assert_eq!(result.total, 5);
        assert_eq!(result.total_pages(), 3);
        seen.extend(ids_of(&result.items));
    }

    let mut expected = ids_of(&tasks);
    expected.reverse();
    assert_eq!(seen, expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_and_owner_filters_combine(engine: Engine) {
    let alice = OwnerId::new();
    let bob = OwnerId::new();
    create_tasks(
        &engine,
        alice,
        &[
            ("Renew TLS certificate", TaskStatus::Pending, TaskPriority::High),
            ("Order lunch", TaskStatus::Pending, TaskPriority::Low),
        ],
    )
    .await
    .expect("seed tasks");
    create_tasks(
        &engine,
        bob,
        &[("Renew domain", TaskStatus::Pending, TaskPriority::Low)],
    )
    .await
    .expect("seed tasks");

    let page = engine
        .query
        .list(
            ListTasksQuery::new()
                .with_filter(TaskFilter::new().with_owner(alice).with_search("renew")),
        )
        .await
        .expect("listing should succeed");

    assert_eq!(page.total, 1);
    assert_eq!(
        page.items.first().map(|task| task.title().as_str()),
        Some("Renew TLS certificate")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creation_window_filters_results(engine: Engine) {
    let window_start = engine.clock.utc() + Duration::seconds(30);
    create_tasks(
        &engine,
        OwnerId::new(),
        &[
            ("Inside", TaskStatus::Pending, TaskPriority::Low),
            ("Outside", TaskStatus::Pending, TaskPriority::Low),
        ],
    )
    .await
    .expect("seed tasks");

    let page = engine
        .query
        .list(ListTasksQuery::new().with_filter(
            TaskFilter::new()
                .with_created_from(window_start)
                .with_created_to(window_start + Duration::minutes(1)),
        ))
        .await
        .expect("listing should succeed");

    assert_eq!(page.total, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stats_follow_lifecycle_changes(engine: Engine) {
    let tasks = create_tasks(
        &engine,
        OwnerId::new(),
        &[
            ("One", TaskStatus::Pending, TaskPriority::High),
            ("Two", TaskStatus::Pending, TaskPriority::Medium),
            ("Three", TaskStatus::InProgress, TaskPriority::High),
        ],
    )
    .await
    .expect("seed tasks");
    engine
        .batch
        .complete(&ids_of(&tasks)[..1])
        .await
        .expect("batch should succeed");

    let stats = engine.query.stats().await.expect("stats should succeed");

    assert_eq!(
        stats,
        TaskStats {
            total: 3,
            completed: 1,
            pending: 1,
            high_priority: 2,
        }
    );
}
