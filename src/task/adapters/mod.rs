//! Adapter implementations of the task ports.

mod channel;
pub mod memory;
pub mod postgres;

pub use channel::{ChannelStatusNotifier, QueuedJob};
