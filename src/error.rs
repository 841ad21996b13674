//! Error types for window resolution, bucketing and submission.

use thiserror::Error;

/// Result type for slotwise domain operations
pub type Result<T> = std::result::Result<T, SlotwiseError>;

/// Errors raised by the scheduling core.
///
/// None of these are fatal: each one is scoped to a single submission or
/// refresh and the user can retry after fixing the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotwiseError {
    /// No appliance was chosen before submitting
    #[error("Choose an appliance before adding an event")]
    MissingSelection,

    /// The appliance name is not in the catalog
    #[error("Unknown appliance: {0}")]
    UnknownAppliance(String),

    /// Time preference toggled on without picking either bound
    #[error("Time preference is enabled but neither a start nor an end time was picked")]
    AmbiguousTimePreference,

    /// Slot label is not `HH:MM` on the grid
    #[error("Invalid slot '{0}': expected HH:MM on the slot grid")]
    InvalidSlotFormat(String),

    /// Day token other than today/tomorrow
    #[error("Invalid day '{0}': expected 'today' or 'tomorrow'")]
    InvalidDayToken(String),

    /// Event timestamp that is not ISO-8601
    #[error("Invalid timestamp '{0}': expected ISO-8601")]
    InvalidTimestamp(String),

    /// Events were requested without a user identifier
    #[error("No user identifier available to fetch events")]
    MissingUser,

    /// Collaborator could not be reached
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Collaborator answered with a structured error
    #[error("Scheduler rejected the request: {0}")]
    SchedulerRejected(String),
}

impl SlotwiseError {
    /// Whether re-submitting the same input could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlotwiseError::NetworkFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_failures_are_retryable() {
        assert!(SlotwiseError::NetworkFailure("timeout".into()).is_retryable());
        assert!(!SlotwiseError::MissingSelection.is_retryable());
        assert!(!SlotwiseError::SchedulerRejected("bad".into()).is_retryable());
    }

    #[test]
    fn test_messages_name_the_offending_input() {
        let err = SlotwiseError::InvalidSlotFormat("9:15".into());
        assert!(err.to_string().contains("9:15"));
    }
}
