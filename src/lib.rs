//! Tasklane: task lifecycle engine with fail-fast status propagation.
//!
//! This crate stores tasks, applies single and bulk lifecycle transitions,
//! and announces status changes to a downstream job queue. A status change
//! that cannot be announced is rolled back rather than committed silently.
//!
//! # Architecture
//!
//! Tasklane follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and notification
//! - **Adapters**: Concrete implementations of ports (memory, `PostgreSQL`,
//!   job channel)
//!
//! # Modules
//!
//! - [`config`]: Engine settings loaded from the environment
//! - [`task`]: Task domain, lifecycle, batch and query services

pub mod config;
pub mod task;
