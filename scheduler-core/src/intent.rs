//! Move intents produced by drag and drop.
//!
//! The core never edits events. These helpers only compute the new bounds a
//! caller should apply to the base event before re-running the pipeline.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::date_range::{day_of, last_day_of_span, local_instant, start_of_day};
use crate::event::to_iso_string;
use crate::segment::Segment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveIntent {
    pub event_id: String,
    pub new_start: String,
    pub new_end: String,
    /// Set when the drop changes the all-day flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
}

impl MoveIntent {
    fn new(segment: &Segment, start: DateTime<Utc>, end: DateTime<Utc>, all_day: Option<bool>) -> Self {
        MoveIntent {
            event_id: segment.base_event_id.clone(),
            new_start: to_iso_string(start),
            new_end: to_iso_string(end),
            all_day,
        }
    }
}

/// Duration of the whole occurrence, or the fallback when it has none.
fn kept_duration(segment: &Segment, config: &LayoutConfig) -> Duration {
    let duration = segment.end - segment.start;
    if duration <= Duration::zero() {
        Duration::minutes(config.fallback_duration_minutes)
    } else {
        duration
    }
}

/// Instant of a time-grid slot, for click-to-create.
pub fn slot_instant(day: NaiveDate, hour: u32, minute: u32, tz: Tz) -> DateTime<Utc> {
    local_instant(day, hour, minute, tz)
}

/// Drop a segment on a time slot of `day`.
///
/// The event keeps its duration and becomes a timed event.
pub fn drop_on_slot(
    segment: &Segment,
    day: NaiveDate,
    hour: u32,
    minute: u32,
    tz: Tz,
    config: &LayoutConfig,
) -> MoveIntent {
    let start = slot_instant(day, hour, minute, tz);
    let end = start + kept_duration(segment, config);
    let all_day = segment.all_day.then_some(false);

    tracing::debug!(event_id = %segment.base_event_id, %start, "Dropped on time slot");
    MoveIntent::new(segment, start, end, all_day)
}

/// Drop a segment on a month cell: same local time of day, same duration.
pub fn drop_on_day(segment: &Segment, day: NaiveDate, tz: Tz, config: &LayoutConfig) -> MoveIntent {
    let local = segment.start.with_timezone(&tz);
    let start = local_instant(day, local.hour(), local.minute(), tz);
    let end = start + kept_duration(segment, config);

    MoveIntent::new(segment, start, end, None)
}

/// Drop a segment in the all-day area of `day`.
///
/// The event becomes all-day, starts at midnight and covers at least one
/// whole day.
pub fn drop_on_all_day(segment: &Segment, day: NaiveDate, tz: Tz) -> MoveIntent {
    let span_days = if segment.end > segment.start {
        let first = day_of(segment.start, tz);
        let last = last_day_of_span(segment.start, segment.end, tz);
        (last - first).num_days() + 1
    } else {
        1
    };

    let start = start_of_day(day, tz);
    let end = start_of_day(day + Duration::days(span_days), tz);
    let all_day = (!segment.all_day).then_some(true);

    MoveIntent::new(segment, start, end, all_day)
}
