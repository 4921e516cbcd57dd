//! In-memory adapters for task lifecycle tests and local runs.

mod notifier;
mod store;

pub use notifier::InMemoryStatusNotifier;
pub use store::{InMemoryTaskStore, InMemoryTaskTransaction};
