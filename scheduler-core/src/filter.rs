//! Event filtering by date bounds, type and keyword.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::diagnostics::Diagnostics;
use crate::event::{Event, Occurrence};

/// Filter as sent by the caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Event types to keep; empty keeps all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.types.as_ref().is_none_or(|t| t.is_empty())
            && self.keyword.as_deref().is_none_or(|k| k.trim().is_empty())
    }

    /// Parse the bounds and normalise the keyword.
    pub fn resolve(&self, diagnostics: &mut Diagnostics) -> ResolvedFilter {
        ResolvedFilter {
            range: DateRange::from_bounds(self.from.as_deref(), self.to.as_deref(), diagnostics),
            types: self.types.clone().unwrap_or_default(),
            keyword: self
                .keyword
                .as_deref()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        }
    }
}

/// An [`EventFilter`] with parsed bounds.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFilter {
    pub range: DateRange,
    pub types: Vec<String>,
    /// Lowercased and trimmed
    pub keyword: Option<String>,
}

impl ResolvedFilter {
    /// Whether a base event with resolved span `[start, end]` passes.
    ///
    /// A recurring event is only checked against `to` here: instances after
    /// its first one may still reach past `from`, so the lower bound is
    /// applied per occurrence instead.
    pub fn matches_event(&self, event: &Event, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if !self.types.is_empty() && !self.types.iter().any(|t| *t == event.kind) {
            return false;
        }

        if let Some(keyword) = &self.keyword {
            let in_title = event.title.to_lowercase().contains(keyword);
            let in_description = event
                .description()
                .is_some_and(|d| d.to_lowercase().contains(keyword));
            if !in_title && !in_description {
                return false;
            }
        }

        if event.is_recurring() {
            self.range.to.is_none_or(|to| start <= to)
        } else {
            self.range.admits(start, end)
        }
    }

    pub fn matches_occurrence(&self, occurrence: &Occurrence) -> bool {
        self.range.admits(occurrence.start, occurrence.end)
    }
}
