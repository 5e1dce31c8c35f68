//! Clipping occurrences to the view window and splitting multi-day spans
//! into per-day segments.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::date_range::{ViewWindow, day_bounds, day_of, last_day_of_span, spans_overlap};
use crate::event::{EventColor, Occurrence};
use crate::layout::{StackLayout, TimeGridLayout};

/// One day's visible slice of an occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// The occurrence id, suffixed with `_{YYYY-MM-DD}` for multi-day slices.
    pub id: String,
    pub occurrence_id: String,
    /// Lookup key into the caller's own event map.
    pub base_event_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<EventColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub is_recurring: bool,

    /// Unclipped bounds of the occurrence.
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub display_start: DateTime<Utc>,
    pub display_end: DateTime<Utc>,

    pub all_day: bool,
    pub continues_before: bool,
    pub continues_after: bool,
    pub is_multi_day_span: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<TimeGridLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackLayout>,
}

impl Segment {
    fn from_occurrence(
        occurrence: &Occurrence,
        id: String,
        display_start: DateTime<Utc>,
        display_end: DateTime<Utc>,
        is_multi_day_span: bool,
    ) -> Self {
        Segment {
            id,
            occurrence_id: occurrence.id.clone(),
            base_event_id: occurrence.base_event_id.clone(),
            title: occurrence.title.clone(),
            kind: occurrence.kind.clone(),
            color: occurrence.color.clone(),
            resource_id: occurrence.resource_id.clone(),
            is_recurring: occurrence.is_recurring,
            start: occurrence.start,
            end: occurrence.end,
            display_start,
            display_end,
            all_day: occurrence.all_day,
            continues_before: display_start != occurrence.start,
            continues_after: display_end != occurrence.end,
            is_multi_day_span,
            layout: None,
            stack: None,
        }
    }

    /// All-day or multi-day: drawn as a bar rather than on the time grid.
    pub fn is_all_day_for_layout(&self) -> bool {
        self.all_day || self.is_multi_day_span
    }

    /// Visible duration.
    pub fn display_duration(&self) -> Duration {
        self.display_end - self.display_start
    }

    /// Whether the visible part of this segment falls on `day` in `tz`.
    pub fn touches_day(&self, day: NaiveDate, tz: Tz) -> bool {
        let (from, to) = day_bounds(day, tz);
        spans_overlap(self.display_start, self.display_end, from, to)
    }
}

/// Whether an occurrence's true start and end fall on different local days.
pub fn is_multi_day(occurrence: &Occurrence, tz: Tz) -> bool {
    day_of(occurrence.start, tz) != last_day_of_span(occurrence.start, occurrence.end, tz)
}

/// Clip occurrences to `window` and split timed multi-day ones per day.
///
/// The result is sorted: bars (all-day or multi-day) first, then by
/// `display_start`.
pub fn segment_occurrences(occurrences: &[Occurrence], window: &ViewWindow, tz: Tz) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(occurrences.len());

    for occurrence in occurrences {
        if !spans_overlap(occurrence.start, occurrence.end, window.start, window.end) {
            continue;
        }

        let multi_day = is_multi_day(occurrence, tz);

        if multi_day && !occurrence.all_day {
            split_per_day(occurrence, window, tz, &mut segments);
        } else {
            let display_start = occurrence.start.max(window.start);
            let display_end = occurrence.end.min(window.end);
            if display_end < display_start {
                continue;
            }
            segments.push(Segment::from_occurrence(
                occurrence,
                occurrence.id.clone(),
                display_start,
                display_end,
                multi_day,
            ));
        }
    }

    sort_segments(&mut segments);

    tracing::debug!(
        occurrences = occurrences.len(),
        segments = segments.len(),
        "Segmented occurrences"
    );

    segments
}

fn split_per_day(occurrence: &Occurrence, window: &ViewWindow, tz: Tz, out: &mut Vec<Segment>) {
    let (Some(&window_first), Some(&window_last)) = (window.days.first(), window.days.last())
    else {
        return;
    };
    let first = day_of(occurrence.start, tz).max(window_first);
    let last = last_day_of_span(occurrence.start, occurrence.end, tz).min(window_last);

    for day in first.iter_days().take_while(|d| *d <= last) {

        let (day_start, day_end) = day_bounds(day, tz);
        let display_start = occurrence.start.max(day_start);
        let display_end = occurrence.end.min(day_end);

        // Nothing visible left after clipping
        if display_end <= display_start {
            continue;
        }

        out.push(Segment::from_occurrence(
            occurrence,
            format!("{}_{}", occurrence.id, day.format("%Y-%m-%d")),
            display_start,
            display_end,
            true,
        ));
    }
}

/// Bars first, then ascending `display_start`; ids break ties.
pub fn sort_segments(segments: &mut [Segment]) {
    segments.sort_by(compare_segments);
}

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    b.is_all_day_for_layout()
        .cmp(&a.is_all_day_for_layout())
        .then(a.display_start.cmp(&b.display_start))
        .then_with(|| a.id.cmp(&b.id))
}
