//! Error types for the scheduler core.

use thiserror::Error;

/// Errors that make a whole view request fail.
///
/// Problems with a single event (bad timestamps, unparseable RRULEs) are
/// reported as [`Warning`](crate::diagnostics::Warning)s instead, so that one
/// bad event never blanks the calendar.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Unsupported view type: '{0}' (expected month, week or day)")]
    UnsupportedViewType(String),

    #[error("Invalid time zone identifier: '{0}'")]
    InvalidTimeZone(String),

    #[error("Invalid instant '{0}': expected ISO-8601 with an explicit UTC marker or offset")]
    InvalidInstant(String),

    #[error("Invalid recurrence rule for event '{event_id}': {reason}")]
    InvalidRecurrenceRule { event_id: String, reason: String },

    #[error("Invalid hour range {start}..{end}: start must be before end and end at most 24")]
    InvalidHourRange { start: u32, end: u32 },

    #[error("Invalid week start {0}: expected 0 (Sunday) through 6 (Saturday)")]
    InvalidWeekStart(u8),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
