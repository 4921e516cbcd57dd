//! Task lifecycle management with status propagation.
//!
//! Tasks are created, updated and deleted through [`services`]. Every status
//! change made through the single-task lifecycle is announced on the status
//! notifier before it is committed, so consumers never miss a durable
//! change. Bulk transitions and read-side queries live alongside it. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
