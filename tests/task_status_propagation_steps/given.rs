//! Given steps for status propagation BDD scenarios.

use super::world::{StatusPropagationWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasklane::task::{
    domain::{OwnerId, TaskStatus},
    services::CreateTaskRequest,
};

#[given(r#"a pending task named "{name}""#)]
fn pending_task(world: &mut StatusPropagationWorld, name: String) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(format!("Scenario task {name}"), OwnerId::new())
        .with_status(TaskStatus::Pending);
    let created = run_async(world.lifecycle.create(request)).wrap_err("create scenario task")?;
    world.tasks.insert(name, created);
    Ok(())
}

#[given(r#"task "{name}" has been updated to status "{status}""#)]
fn task_already_updated(
    world: &mut StatusPropagationWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let status = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let id = world.task(&name)?.id();
    let updated = run_async(world.lifecycle.update_status(id, status))
        .wrap_err("update task in scenario setup")?;
    world.tasks.insert(name, updated);
    Ok(())
}

#[given(r#"task "{name}" has been deleted"#)]
fn task_already_deleted(world: &mut StatusPropagationWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?.id();
    run_async(world.lifecycle.remove(id)).wrap_err("delete task in scenario setup")?;
    Ok(())
}

#[given("the status queue is unavailable")]
fn status_queue_unavailable(world: &mut StatusPropagationWorld) -> Result<(), eyre::Report> {
    world
        .notifier
        .fail_with("queue offline")
        .wrap_err("toggle notifier failure")?;
    Ok(())
}
