//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or validating task domain values.
///
/// Every variant is raised before any store interaction takes place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storage limit.
    #[error("task title exceeds {max} characters (got {0})", max = super::MAX_TITLE_LENGTH)]
    TitleTooLong(usize),

    /// The status value is not part of the status enumeration.
    #[error("unknown task status: {0}")]
    InvalidStatus(String),

    /// The priority value is not part of the priority enumeration.
    #[error("unknown task priority: {0}")]
    InvalidPriority(String),

    /// The batch action name is not recognised.
    #[error("unknown batch action: {0}")]
    InvalidBatchAction(String),

    /// Page numbers start at one.
    #[error("invalid page {0}, expected a value of at least 1")]
    InvalidPage(u32),

    /// Page size is zero or above the configured cap.
    #[error("invalid page limit {limit}, expected a value between 1 and {max}")]
    InvalidLimit {
        /// Requested page size.
        limit: u32,
        /// Largest accepted page size.
        max: u32,
    },

    /// A creation-time range whose lower bound is after its upper bound.
    #[error("creation time range is inverted")]
    InvalidDateRange,
}
