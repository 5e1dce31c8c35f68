//! Calendar events as supplied by the editing collaborator, and their
//! concrete occurrences.
//!
//! Events are the source of truth and are never mutated here. Timestamps stay
//! as the ISO-8601 strings the caller sent; they are resolved into instants
//! once per pipeline run so that a malformed value only degrades its own event.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{SchedulerError, SchedulerResult};

/// A calendar event (possibly recurring, possibly all-day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    /// Category tag used for styling and filtering.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// ISO-8601 instant with an explicit `Z` or offset.
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,

    // Recurrence
    /// RRULE body, e.g. `FREQ=WEEKLY;BYDAY=MO,WE,FR`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    /// Occurrence instants to suppress
    #[serde(default, alias = "exDate", skip_serializing_if = "Vec::is_empty")]
    pub exception_dates: Vec<String>,

    // Passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<EventColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Explicit colour override for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventColor {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Event {
            id: id.into(),
            title: title.into(),
            kind: String::new(),
            start: start.into(),
            end: end.into(),
            all_day: false,
            recurrence_rule: None,
            exception_dates: Vec::new(),
            color: None,
            resource_id: None,
            data: None,
        }
    }

    /// True when the event carries a non-blank recurrence rule.
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .is_some_and(|rule| !rule.trim().is_empty())
    }

    /// Free-text description stored in the opaque payload, if any.
    pub fn description(&self) -> Option<String> {
        match self.data.as_ref()?.get("description")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Resolve `start`/`end` into instants.
    ///
    /// Unparseable values fall back to `now` and an end before the start is
    /// pulled up to the start; both cases are reported as warnings.
    pub fn resolve_span(
        &self,
        now: DateTime<Utc>,
        diagnostics: &mut Diagnostics,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.resolve_instant(&self.start, "start", now, diagnostics);
        let end = self.resolve_instant(&self.end, "end", now, diagnostics);

        if end < start {
            diagnostics.warn(
                WarningKind::InvalidInstant,
                Some(&self.id),
                format!("end {} is before start {}; using start", self.end, self.start),
            );
            return (start, start);
        }

        (start, end)
    }

    fn resolve_instant(
        &self,
        value: &str,
        field: &str,
        now: DateTime<Utc>,
        diagnostics: &mut Diagnostics,
    ) -> DateTime<Utc> {
        match parse_instant(value) {
            Ok(instant) => instant,
            Err(e) => {
                diagnostics.warn(
                    WarningKind::InvalidInstant,
                    Some(&self.id),
                    format!("{field}: {e}; falling back to now"),
                );
                now
            }
        }
    }
}

/// Parse an ISO-8601 instant. Strings without a UTC marker or offset are rejected.
pub fn parse_instant(value: &str) -> SchedulerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SchedulerError::InvalidInstant(value.to_string()))
}

/// Format an instant as `2025-01-21T09:00:00.000Z`.
pub fn to_iso_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One concrete instance of a (possibly recurring) event.
///
/// The originating event is referenced by `base_event_id`, to be resolved
/// against the caller's own id → event map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// `base_event_id` for plain events, `{base_event_id}_{iso instant}` for
    /// recurrence instances.
    pub id: String,
    pub base_event_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<EventColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl Occurrence {
    /// The event itself as a single occurrence.
    pub fn single(event: &Event, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::build(event, event.id.clone(), start, end, false)
    }

    /// One instance of a recurring event starting at `start`.
    pub fn instance(event: &Event, start: DateTime<Utc>, duration: Duration) -> Self {
        let id = format!("{}_{}", event.id, to_iso_string(start));
        Self::build(event, id, start, start + duration, true)
    }

    fn build(
        event: &Event,
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        is_recurring: bool,
    ) -> Self {
        Occurrence {
            id,
            base_event_id: event.id.clone(),
            title: event.title.clone(),
            kind: event.kind.clone(),
            start,
            end,
            all_day: event.all_day,
            is_recurring,
            color: event.color.clone(),
            resource_id: event.resource_id.clone(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
