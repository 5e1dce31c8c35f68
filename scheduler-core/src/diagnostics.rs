//! Recoverable, per-event problems collected while building a view.

use serde::{Deserialize, Serialize};

/// What went wrong with a single event or request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// An event's start or end could not be parsed; "now" was used instead.
    InvalidInstant,
    /// An exception date could not be parsed and was ignored.
    InvalidExceptionDate,
    /// A filter bound could not be parsed and was ignored.
    InvalidFilterBound,
    /// The RRULE could not be parsed; the event was treated as non-recurring.
    InvalidRecurrenceRule,
    /// Expansion stopped at the configured occurrence limit.
    OccurrenceLimitReached,
    /// The requested locale is unknown; `en-US` was used instead.
    UnknownLocale,
}

/// A recoverable problem, surfaced to the caller alongside the view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub kind: WarningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub message: String,
}

/// Collects warnings during one pipeline run and mirrors them to the log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: WarningKind, event_id: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(kind = ?kind, event_id = event_id.unwrap_or("-"), "{}", message);
        self.warnings.push(Warning {
            kind,
            event_id: event_id.map(str::to_string),
            message,
        });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
