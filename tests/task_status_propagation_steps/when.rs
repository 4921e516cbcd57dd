//! When steps for status propagation BDD scenarios.

use super::world::{StatusPropagationWorld, run_async};
use rstest_bdd_macros::when;
use tasklane::task::domain::{TaskId, TaskStatus};

#[when(r#"task "{name}" is updated to status "{status}""#)]
fn update_task_status(
    world: &mut StatusPropagationWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let status = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let id = world.task(&name)?.id();
    match run_async(world.lifecycle.update_status(id, status)) {
        Ok(updated) => {
            world.tasks.insert(name, updated);
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"task "{name}" and an unknown task are batch completed"#)]
fn batch_complete_with_unknown(
    world: &mut StatusPropagationWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let ids = [world.task(&name)?.id(), TaskId::new()];
    match run_async(world.batch.complete(&ids)) {
        Ok(affected) => world.last_affected = Some(affected),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"task "{name}" is deleted"#)]
fn delete_task(world: &mut StatusPropagationWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?.id();
    if let Err(err) = run_async(world.lifecycle.remove(id)) {
        world.last_error = Some(err);
    }
    Ok(())
}

#[when("an empty batch completion is requested")]
fn empty_batch_completion(world: &mut StatusPropagationWorld) {
    if let Err(err) = run_async(world.batch.complete(&[])) {
        world.last_error = Some(err);
    }
}
