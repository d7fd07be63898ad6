//! Error types for the crossing simulation
//!
//! Input problems are reported to the caller, capacity overflow is a warning
//! carried alongside the accepted trains, and synchronization faults are
//! contract violations that abort the run.

//-----------------------------------------------------------------------------
// Error Types
//-----------------------------------------------------------------------------

use thiserror::Error;

/// Main error type for the crossing crates.
#[derive(Error, Debug)]
pub enum CrossingError {
    /// A train record could not be parsed.
    #[error("Malformed train record #{record}: {reason}")]
    InputMalformed { record: usize, reason: String },

    /// More trains were offered than the configured maximum.
    #[error("Too many trains in input (max {max}), {rejected} record(s) rejected")]
    CapacityExceeded { max: usize, rejected: usize },

    /// An internal consistency check failed. This is a design defect, not a
    /// runtime condition to recover from.
    #[error("Synchronization fault: {0}")]
    SynchronizationFault(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An I/O error while writing events or reading input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled before every train crossed.
    #[error("Simulation cancelled")]
    Cancelled,

    /// A spawned actor or arbiter task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl CrossingError {
    /// Shorthand for a synchronization fault.
    pub fn fault(message: impl Into<String>) -> Self {
        CrossingError::SynchronizationFault(message.into())
    }

    /// Whether this error means the scheduling discipline was broken.
    pub fn is_fault(&self) -> bool {
        matches!(self, CrossingError::SynchronizationFault(_))
    }
}

impl From<tokio::task::JoinError> for CrossingError {
    fn from(err: tokio::task::JoinError) -> Self {
        CrossingError::TaskJoin(err.to_string())
    }
}

/// Result type alias for crossing operations.
pub type CrossingResult<T> = Result<T, CrossingError>;
