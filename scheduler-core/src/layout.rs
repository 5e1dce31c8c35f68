//! Screen positions for segments.
//!
//! Timed segments of one day are placed on the time grid with bucketed
//! column assignment: segments whose start times round down to the same
//! bucket sit side by side, everything else gets the full width. Overlaps
//! between segments in different buckets are not detected, so a 09:00-11:00
//! event and a 09:30 event in the same day simply stack on top of each other
//! (the later one wins on `z_index` only within its own bucket).
//!
//! Bars (all-day or multi-day segments) are stacked vertically, longest first.

use std::collections::BTreeMap;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::date_range::{day_of, local_instant, minutes_of_day};
use crate::segment::Segment;

/// Time-grid position of a timed segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGridLayout {
    /// Minutes from the day-start hour to `display_start`, never negative.
    pub row_start_minutes: i64,
    pub duration_minutes: i64,
    pub column_index: usize,
    pub column_count: usize,
    pub left_percent: f64,
    pub width_percent: f64,
    pub z_index: u32,
    pub top_px: f64,
    pub height_px: f64,
}

/// Vertical slot of a bar in the all-day area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackLayout {
    pub row: usize,
    pub top_px: f64,
    pub height_px: f64,
}

/// Start of the overlap bucket for a minute-of-day value.
pub fn bucket_start(minutes: i64, bucket_minutes: u32) -> i64 {
    let bucket = i64::from(bucket_minutes.max(1));
    minutes.div_euclid(bucket) * bucket
}

/// Lay out the timed segments of one calendar day.
///
/// `segments` is reordered by `display_start` and every entry gets a
/// [`TimeGridLayout`]. Bars are ignored.
pub fn layout_time_grid(segments: &mut [Segment], day_start_hour: u32, tz: Tz, config: &LayoutConfig) {
    segments.sort_by(|a, b| {
        a.display_start
            .cmp(&b.display_start)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, segment) in segments.iter().enumerate() {
        if segment.is_all_day_for_layout() {
            continue;
        }
        let key = bucket_start(
            minutes_of_day(segment.display_start, tz),
            config.bucket_minutes,
        );
        buckets.entry(key).or_default().push(idx);
    }

    for members in buckets.values() {
        let count = members.len();
        let column_width = config.usable_width_percent / count as f64;

        for (column, &idx) in members.iter().enumerate() {
            let segment = &mut segments[idx];

            let grid_start = local_instant(day_of(segment.display_start, tz), day_start_hour, 0, tz);
            let row_start_minutes = (segment.display_start - grid_start).num_minutes().max(0);
            let duration_minutes = segment
                .display_duration()
                .num_minutes()
                .max(config.min_duration_minutes);

            segment.layout = Some(TimeGridLayout {
                row_start_minutes,
                duration_minutes,
                column_index: column,
                column_count: count,
                left_percent: column as f64 * column_width + config.left_gutter_percent,
                width_percent: column_width,
                z_index: config.base_z_index + column as u32,
                top_px: minutes_to_px(row_start_minutes, config.hour_height_px),
                height_px: minutes_to_px(duration_minutes, config.hour_height_px),
            });
        }

        if count > 1 {
            tracing::trace!(bucket_size = count, "Split overlap bucket into columns");
        }
    }
}

fn minutes_to_px(minutes: i64, hour_height_px: f64) -> f64 {
    minutes as f64 / 60.0 * hour_height_px
}

/// Stack bars longest-first at a fixed row height.
///
/// `segments` is reordered; timed segments are ignored.
pub fn layout_all_day(segments: &mut [Segment], config: &LayoutConfig) {
    segments.sort_by(|a, b| {
        span(b)
            .cmp(&span(a))
            .then(a.display_start.cmp(&b.display_start))
            .then_with(|| a.id.cmp(&b.id))
    });

    let bars = segments.iter_mut().filter(|s| s.is_all_day_for_layout());
    for (row, segment) in bars.enumerate() {
        segment.stack = Some(StackLayout {
            row,
            top_px: row as f64 * config.all_day_row_height_px,
            height_px: config.all_day_row_height_px,
        });
    }
}

fn span(segment: &Segment) -> Duration {
    segment.end - segment.start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::event::{Event, Occurrence};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn timed(id: &str, start: &str, end: &str) -> Segment {
        let event = Event::new(id, id, start, end);
        let (s, e) = event.resolve_span(Utc::now(), &mut Diagnostics::new());
        let occurrence = Occurrence::single(&event, s, e);
        let window = crate::date_range::ViewWindow {
            start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            days: Utc
                .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .unwrap()
                .date_naive()
                .iter_days()
                .take(31)
                .collect(),
        };
        crate::segment::segment_occurrences(&[occurrence], &window, Tz::UTC)
            .into_iter()
            .next()
            .unwrap()
    }

    fn bar(id: &str, start: &str, end: &str) -> Segment {
        Segment {
            all_day: true,
            ..timed(id, start, end)
        }
    }

    fn grid(segment: &Segment) -> &TimeGridLayout {
        segment.layout.as_ref().expect("Timed segment should have a layout")
    }

    #[test]
    fn test_bucket_start_rounds_down() {
        assert_eq!(bucket_start(544, 5), 540);
        assert_eq!(bucket_start(540, 5), 540);
        assert_eq!(bucket_start(549, 15), 540);
    }

    #[test]
    fn test_same_start_events_share_bucket() {
        let mut segments = vec![
            timed("a", "2025-01-21T09:00:00Z", "2025-01-21T09:30:00Z"),
            timed("b", "2025-01-21T09:00:00Z", "2025-01-21T10:00:00Z"),
        ];

        layout_time_grid(&mut segments, 0, Tz::UTC, &LayoutConfig::default());

        let (a, b) = (grid(&segments[0]), grid(&segments[1]));
        assert_eq!(a.column_count, 2);
        assert_eq!(b.column_count, 2);
        assert!((a.width_percent - 48.0).abs() < 1e-9);
        assert!((b.width_percent - 48.0).abs() < 1e-9);
        assert_ne!(a.left_percent, b.left_percent);
        assert_eq!(a.left_percent, 2.0);
        assert_eq!(b.left_percent, 50.0);
        assert_eq!((a.z_index, b.z_index), (10, 11));
    }

    #[test]
    fn test_starts_within_five_minutes_are_concurrent() {
        let mut segments = vec![
            timed("a", "2025-01-21T09:01:00Z", "2025-01-21T09:30:00Z"),
            timed("b", "2025-01-21T09:04:00Z", "2025-01-21T10:00:00Z"),
            timed("c", "2025-01-21T09:05:00Z", "2025-01-21T10:00:00Z"),
        ];

        layout_time_grid(&mut segments, 0, Tz::UTC, &LayoutConfig::default());

        assert_eq!(grid(&segments[0]).column_count, 2);
        assert_eq!(grid(&segments[1]).column_count, 2);
        assert_eq!(grid(&segments[2]).column_count, 1);
        assert_eq!(grid(&segments[2]).width_percent, 96.0);
    }

    #[test]
    fn test_bucket_columns_are_dense_and_fit() {
        for count in 1..=12 {
            let mut segments: Vec<_> = (0..count)
                .map(|i| timed(&format!("e{i}"), "2025-01-21T14:00:00Z", "2025-01-21T15:00:00Z"))
                .collect();

            layout_time_grid(&mut segments, 0, Tz::UTC, &LayoutConfig::default());

            let columns: HashSet<_> = segments.iter().map(|s| grid(s).column_index).collect();
            assert_eq!(columns, (0..count).collect::<HashSet<_>>());

            let total: f64 = segments.iter().map(|s| grid(s).width_percent).sum();
            assert!(total <= 100.0 + 1e-9, "{count} columns use {total}%");

            for s in &segments {
                let layout = grid(s);
                assert!(layout.column_index < layout.column_count);
                assert!(layout.left_percent + layout.width_percent <= 100.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_row_start_is_relative_to_day_start_hour() {
        let mut segments = vec![
            timed("early", "2025-01-21T07:00:00Z", "2025-01-21T09:00:00Z"),
            timed("late", "2025-01-21T10:30:00Z", "2025-01-21T11:00:00Z"),
        ];

        layout_time_grid(&mut segments, 8, Tz::UTC, &LayoutConfig::default());

        assert_eq!(grid(&segments[0]).row_start_minutes, 0, "Clamped at the grid top");
        assert_eq!(grid(&segments[1]).row_start_minutes, 150);
        assert_eq!(grid(&segments[1]).top_px, 150.0);
    }

    #[test]
    fn test_short_events_get_minimum_duration() {
        let mut segments = vec![timed("blip", "2025-01-21T12:00:00Z", "2025-01-21T12:05:00Z")];

        layout_time_grid(&mut segments, 0, Tz::UTC, &LayoutConfig::default());

        assert_eq!(grid(&segments[0]).duration_minutes, 15);
        assert_eq!(grid(&segments[0]).height_px, 15.0);
    }

    #[test]
    fn test_configurable_bucket_size() {
        let config = LayoutConfig {
            bucket_minutes: 30,
            ..LayoutConfig::default()
        };
        let mut segments = vec![
            timed("a", "2025-01-21T09:00:00Z", "2025-01-21T10:00:00Z"),
            timed("b", "2025-01-21T09:20:00Z", "2025-01-21T10:00:00Z"),
        ];

        layout_time_grid(&mut segments, 0, Tz::UTC, &config);

        assert_eq!(grid(&segments[0]).column_count, 2);
    }

    #[test]
    fn test_all_day_stack_longest_first() {
        let mut segments = vec![
            bar("short", "2025-01-21T00:00:00Z", "2025-01-22T00:00:00Z"),
            bar("long", "2025-01-20T00:00:00Z", "2025-01-24T00:00:00Z"),
        ];

        layout_all_day(&mut segments, &LayoutConfig::default());

        assert_eq!(segments[0].base_event_id, "long");
        let rows: Vec<_> = segments
            .iter()
            .map(|s| s.stack.as_ref().map(|l| (l.row, l.top_px)))
            .collect();
        assert_eq!(rows, vec![Some((0, 0.0)), Some((1, 24.0))]);
        assert!(segments.iter().all(|s| s.layout.is_none()));
    }
}
