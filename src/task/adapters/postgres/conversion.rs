//! Conversions between task aggregates and Diesel rows.

use super::models::{NewTaskRow, TaskChangeset, TaskRow};
use crate::task::{
    domain::{OwnerId, PersistedTaskData, Task, TaskId, TaskPriority, TaskStatus, TaskTitle},
    ports::{TaskStoreError, TaskStoreResult},
};

pub(super) fn version_to_column(version: u64) -> TaskStoreResult<i64> {
    i64::try_from(version).map_err(TaskStoreError::persistence)
}

pub(super) fn to_new_row(task: &Task) -> TaskStoreResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        owner_id: task.owner_id().into_inner(),
        due_date: task.due_date(),
        version: version_to_column(task.version())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

/// Builds the changeset for `stored`, the task carrying its next version.
pub(super) fn to_changeset(stored: &Task) -> TaskStoreResult<TaskChangeset> {
    Ok(TaskChangeset {
        title: stored.title().as_str().to_owned(),
        description: stored.description().map(str::to_owned),
        status: stored.status().as_str().to_owned(),
        priority: stored.priority().as_str().to_owned(),
        owner_id: stored.owner_id().into_inner(),
        due_date: stored.due_date(),
        version: version_to_column(stored.version())?,
        updated_at: stored.updated_at(),
    })
}

pub(super) fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        status,
        priority,
        owner_id,
        due_date,
        version,
        created_at,
        updated_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title: TaskTitle::new(title).map_err(TaskStoreError::persistence)?,
        description,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskStoreError::persistence)?,
        priority: TaskPriority::try_from(priority.as_str())
            .map_err(TaskStoreError::persistence)?,
        owner_id: OwnerId::from_uuid(owner_id),
        due_date,
        version: u64::try_from(version).map_err(TaskStoreError::persistence)?,
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}

/// Builds an `ILIKE` pattern matching `text` anywhere, escaping wildcards.
pub(super) fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
