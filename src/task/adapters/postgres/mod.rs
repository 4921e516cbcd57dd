//! `PostgreSQL` adapters for task persistence.

mod conversion;
mod models;
mod repository;
mod schema;
mod transaction;

pub use repository::{PostgresTaskStore, TaskPgPool, build_pool};
pub use transaction::PostgresTaskTransaction;
