//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services:
//! the durable record store and the status-change notifier.

pub mod notifier;
pub mod store;

pub use notifier::{NotifierError, NotifierResult, StatusNotifier};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult, TaskTransaction};
