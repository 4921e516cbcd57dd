//! Then steps for status propagation BDD scenarios.

use super::world::{StatusPropagationWorld, run_async};
use rstest_bdd_macros::then;
use tasklane::task::domain::TaskStatus;

#[then(r#"task "{name}" has status "{status}""#)]
fn task_has_status(
    world: &StatusPropagationWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let id = world.task(&name)?.id();
    let stored = run_async(world.lifecycle.find_one(id))
        .map_err(|err| eyre::eyre!("lookup of task {name} failed: {err}"))?;

    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then(r#"exactly {count:usize} announcement of "{status}" was published for task "{name}""#)]
fn announcements_published(
    world: &StatusPropagationWorld,
    count: usize,
    status: String,
    name: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let id = world.task(&name)?.id();
    let published = world
        .notifier
        .published()
        .map_err(|err| eyre::eyre!("read published events: {err}"))?;
    let matching = published
        .iter()
        .filter(|event| event.task_id == id && event.status == expected)
        .count();

    eyre::ensure!(
        matching == count,
        "expected {count} announcements of {expected}, found {matching}"
    );
    Ok(())
}

#[then("the batch affected {count:u64} task")]
fn batch_affected(world: &StatusPropagationWorld, count: u64) -> Result<(), eyre::Report> {
    let affected = world
        .last_affected
        .ok_or_else(|| eyre::eyre!("missing batch result, last error: {:?}", world.last_error))?;
    eyre::ensure!(affected == count, "expected {count} affected, found {affected}");
    Ok(())
}

#[then(r#"the operation fails with error kind "{kind}""#)]
fn operation_fails_with(world: &StatusPropagationWorld, kind: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the operation to fail"))?;
    eyre::ensure!(
        err.kind().as_str() == kind,
        "expected {kind} error, got {err:?}"
    );
    Ok(())
}
