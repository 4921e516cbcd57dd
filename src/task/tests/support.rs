//! Shared fixtures for task unit tests.

use crate::task::domain::{NewTaskData, OwnerId, Task, TaskPriority, TaskStatus, TaskTitle};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::Mutex;

/// Clock that advances one second on every reading.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
            .single()
            .expect("valid start instant");
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().expect("clock lock");
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}

pub fn new_task(
    clock: &impl Clock,
    title: &str,
    status: TaskStatus,
    priority: TaskPriority,
) -> Task {
    Task::new(
        NewTaskData {
            title: TaskTitle::new(title).expect("valid title"),
            description: None,
            status: Some(status),
            priority: Some(priority),
            owner_id: OwnerId::new(),
            due_date: None,
        },
        clock,
    )
}
