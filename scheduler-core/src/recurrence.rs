//! RRULE expansion for recurring events.
//!
//! Expands each event into concrete occurrences around a view window,
//! respecting exception dates. A broken rule never fails the view: the event
//! degrades to a single, non-recurring occurrence.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::{RRule, RRuleSet, Unvalidated};

use crate::config::LayoutConfig;
use crate::date_range::{ViewWindow, day_bounds, resolve_local, spans_overlap};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::SchedulerError;
use crate::event::{Event, Occurrence, parse_instant};

/// Expand one event with resolved span `[start, end]` into occurrences
/// relevant to `window`.
///
/// A plain event passes through as a single occurrence; dropping it when it
/// misses the window is left to the segmenter.
pub fn expand_event(
    event: &Event,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: &ViewWindow,
    tz: Tz,
    config: &LayoutConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Occurrence> {
    if event.is_recurring() {
        expand_recurring_event(event, start, end, window, tz, config, diagnostics)
    } else {
        vec![Occurrence::single(event, start, end)]
    }
}

/// Occurrences are generated in the window padded on both sides by the larger
/// of `recurrence_buffer_days` and the event's own duration, so instances that
/// start before the window but run into it are kept.
fn expand_recurring_event(
    event: &Event,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: &ViewWindow,
    tz: Tz,
    config: &LayoutConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Occurrence> {
    let rule = event.recurrence_rule.as_deref().unwrap_or_default();

    let rrule_set = match build_rrule_set(&event.id, rule, start, tz) {
        Ok(set) => set,
        Err(e) => {
            diagnostics.warn(
                WarningKind::InvalidRecurrenceRule,
                Some(&event.id),
                format!("{e}; treating event as non-recurring"),
            );
            return if spans_overlap(start, end, window.start, window.end) {
                vec![Occurrence::single(event, start, end)]
            } else {
                Vec::new()
            };
        }
    };

    let duration = end - start;
    let buffer = Duration::days(config.recurrence_buffer_days).max(duration);
    let exdates = exception_instants(event, diagnostics);

    // Widen by a second on each side so boundary instants are always included
    let rrule_tz = rrule::Tz::Tz(tz);
    let after = (window.start - buffer - Duration::seconds(1)).with_timezone(&rrule_tz);
    let before = (window.end + buffer + Duration::seconds(1)).with_timezone(&rrule_tz);

    let result = rrule_set.after(after).before(before).all(config.max_occurrences);

    if result.limited {
        diagnostics.warn(
            WarningKind::OccurrenceLimitReached,
            Some(&event.id),
            format!(
                "expansion stopped after {} occurrences",
                config.max_occurrences
            ),
        );
    }

    let occurrences: Vec<Occurrence> = result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|instant| !exdates.contains(instant))
        .map(|instant| Occurrence::instance(event, instant, duration))
        .collect();

    tracing::trace!(
        event_id = %event.id,
        generated = result.dates.len(),
        kept = occurrences.len(),
        "Expanded recurring event"
    );

    occurrences
}

/// Parse an RRULE body anchored at `dtstart`.
///
/// The anchor is placed in the render zone so that wall-clock times stay put
/// across DST transitions.
fn build_rrule_set(
    event_id: &str,
    rule: &str,
    dtstart: DateTime<Utc>,
    tz: Tz,
) -> Result<RRuleSet, SchedulerError> {
    let invalid = |reason: String| SchedulerError::InvalidRecurrenceRule {
        event_id: event_id.to_string(),
        reason,
    };

    let body = rule.trim();
    let body = body.strip_prefix("RRULE:").unwrap_or(body);
    let body = normalize_until(body, tz);

    let rrule = body
        .parse::<RRule<Unvalidated>>()
        .map_err(|e| invalid(e.to_string()))?;

    rrule
        .build(dtstart.with_timezone(&rrule::Tz::Tz(tz)))
        .map_err(|e| invalid(e.to_string()))
}

/// Rewrite a date-only or floating `UNTIL` as a UTC instant.
///
/// rrule rejects both forms once DTSTART carries a zone. A date means the
/// end of that day in `tz`; a floating date-time is read as wall clock in `tz`.
fn normalize_until(body: &str, tz: Tz) -> String {
    body.split(';')
        .map(|part| {
            let Some((name, value)) = part.split_once('=') else {
                return part.to_string();
            };
            if !name.trim().eq_ignore_ascii_case("UNTIL") {
                return part.to_string();
            }

            let value = value.trim();
            let until = if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
                Some(day_bounds(date, tz).1 - Duration::seconds(1))
            } else if let Ok(local) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
                Some(resolve_local(local, tz))
            } else {
                None
            };

            match until {
                Some(instant) => format!("{name}={}", instant.format("%Y%m%dT%H%M%SZ")),
                None => part.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Exception dates as instants; unparseable entries are skipped with a warning.
fn exception_instants(event: &Event, diagnostics: &mut Diagnostics) -> HashSet<DateTime<Utc>> {
    event
        .exception_dates
        .iter()
        .filter_map(|raw| match parse_instant(raw) {
            Ok(instant) => Some(instant),
            Err(e) => {
                diagnostics.warn(
                    WarningKind::InvalidExceptionDate,
                    Some(&event.id),
                    format!("{e}; exception ignored"),
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    fn daily_event(rule: &str) -> Event {
        Event {
            recurrence_rule: Some(rule.to_string()),
            ..Event::new(
                "daily",
                "Standup",
                "2025-01-01T09:00:00Z",
                "2025-01-01T09:15:00Z",
            )
        }
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> ViewWindow {
        ViewWindow {
            start,
            end,
            days: Vec::new(),
        }
    }

    fn expand_with(
        event: &Event,
        window: &ViewWindow,
        tz: Tz,
        config: &LayoutConfig,
    ) -> (Vec<Occurrence>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let (start, end) = event.resolve_span(Utc::now(), &mut diagnostics);
        let occurrences = expand_event(event, start, end, window, tz, config, &mut diagnostics);
        (occurrences, diagnostics)
    }

    fn expand(event: &Event, from: DateTime<Utc>, to: DateTime<Utc>) -> (Vec<Occurrence>, Diagnostics) {
        expand_with(event, &window(from, to), Tz::UTC, &LayoutConfig::default())
    }

    #[test_log::test]
    fn test_exception_dates_are_removed() {
        let event = Event {
            exception_dates: vec![
                "2025-01-06T09:00:00Z".to_string(),
                "2025-01-07T09:00:00Z".to_string(),
            ],
            ..daily_event("FREQ=DAILY;COUNT=14")
        };

        let (occurrences, diagnostics) = expand(&event, day(0), day(13));

        assert_eq!(occurrences.len(), 12);
        assert!(occurrences.iter().all(|o| o.start != day(5) && o.start != day(6)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_exception_match_is_by_instant_not_date() {
        // Same day as an occurrence but a different time: nothing is suppressed
        let event = Event {
            exception_dates: vec!["2025-01-03T10:00:00Z".to_string()],
            ..daily_event("FREQ=DAILY;COUNT=5")
        };

        let (occurrences, _) = expand(&event, day(0), day(4));

        assert_eq!(occurrences.len(), 5);
    }

    #[test]
    fn test_exception_with_offset_matches_same_instant() {
        let event = Event {
            exception_dates: vec!["2025-01-03T10:00:00+01:00".to_string()],
            ..daily_event("FREQ=DAILY;COUNT=5")
        };

        let (occurrences, _) = expand(&event, day(0), day(4));

        assert_eq!(occurrences.len(), 4);
        assert!(occurrences.iter().all(|o| o.start != day(2)));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let event = daily_event("FREQ=WEEKLY;BYDAY=MO,WE,FR");

        let (first, _) = expand(&event, day(10), day(40));
        let (second, _) = expand(&event, day(10), day(40));

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_instances_keep_duration_and_ids() {
        let (occurrences, _) = expand(&daily_event("FREQ=DAILY;COUNT=3"), day(0), day(2));

        assert_eq!(occurrences.len(), 3);
        for occurrence in &occurrences {
            assert_eq!(occurrence.duration(), Duration::minutes(15));
            assert_eq!(occurrence.base_event_id, "daily");
            assert!(occurrence.id.starts_with("daily_2025-01-0"));
        }
        assert_eq!(occurrences[1].id, "daily_2025-01-02T09:00:00.000Z");
    }

    #[test]
    fn test_buffer_includes_occurrences_just_outside_window() {
        let (occurrences, _) = expand(&daily_event("FREQ=DAILY"), day(20), day(21));

        // 7-day buffer on either side of the two-day window
        assert!(occurrences.iter().any(|o| o.start == day(13)));
        assert!(occurrences.iter().any(|o| o.start == day(28)));
        assert!(occurrences.iter().all(|o| o.start >= day(13) && o.start <= day(28)));
    }

    #[test]
    fn test_long_events_widen_the_buffer() {
        // Ten-day event repeating monthly: the instance starting 9 days before
        // the window still overlaps it
        let event = Event {
            recurrence_rule: Some("FREQ=MONTHLY".to_string()),
            ..Event::new("long", "Retreat", "2025-01-01T00:00:00Z", "2025-01-11T00:00:00Z")
        };
        let from = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

        let (occurrences, _) = expand(&event, from, from + Duration::days(1));

        assert!(occurrences.iter().any(|o| o.start == Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
    }

    #[test_log::test]
    fn test_invalid_rule_falls_back_to_single_occurrence() {
        let event = daily_event("FREQ=SOMETIMES;COUNT=3");

        let (inside, diagnostics) = expand(&event, day(0), day(1));
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].id, "daily");
        assert!(!inside[0].is_recurring);
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::InvalidRecurrenceRule);

        let (outside, _) = expand(&event, day(30), day(31));
        assert!(outside.is_empty(), "Fallback event outside the window is dropped");
    }

    #[test]
    fn test_rrule_prefix_is_accepted() {
        let (occurrences, diagnostics) =
            expand(&daily_event("RRULE:FREQ=DAILY;COUNT=2"), day(0), day(5));
        assert_eq!(occurrences.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_date_only_until_includes_that_day() {
        let (occurrences, diagnostics) =
            expand(&daily_event("FREQ=DAILY;UNTIL=20250105"), day(0), day(10));

        assert!(diagnostics.is_empty());
        assert_eq!(occurrences.len(), 5);
        assert_eq!(occurrences[4].start, Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_date_only_until_ends_at_local_midnight() {
        // Ends 2025-01-05 23:59:59 in Berlin, i.e. 22:59:59Z
        let event = Event {
            recurrence_rule: Some("FREQ=DAILY;UNTIL=20250105".to_string()),
            ..Event::new("late", "Late", "2025-01-01T23:30:00Z", "2025-01-01T23:45:00Z")
        };
        let berlin: Tz = "Europe/Berlin".parse().unwrap();

        let (occurrences, diagnostics) =
            expand_with(&event, &window(day(0), day(10)), berlin, &LayoutConfig::default());

        assert!(diagnostics.is_empty());
        assert_eq!(occurrences.len(), 4);
    }

    #[test]
    fn test_floating_until_is_read_in_render_zone() {
        let berlin: Tz = "Europe/Berlin".parse().unwrap();
        let event = daily_event("FREQ=DAILY;UNTIL=20250105T093000");

        let (occurrences, diagnostics) =
            expand_with(&event, &window(day(0), day(10)), berlin, &LayoutConfig::default());

        assert!(diagnostics.is_empty());
        // 09:30 Berlin is 08:30Z, before the fifth instance
        assert_eq!(occurrences.len(), 4);
        assert!(occurrences.iter().all(|o| o.is_recurring));
    }

    #[test]
    fn test_normalize_until_leaves_utc_and_other_parts_alone() {
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20250105T090000Z;INTERVAL=2", Tz::UTC),
            "FREQ=DAILY;UNTIL=20250105T090000Z;INTERVAL=2"
        );
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20250105", Tz::UTC),
            "FREQ=DAILY;UNTIL=20250105T235959Z"
        );
    }

    #[test]
    fn test_bad_exception_date_is_skipped_with_warning() {
        let event = Event {
            exception_dates: vec!["2025-01-02".to_string()],
            ..daily_event("FREQ=DAILY;COUNT=3")
        };

        let (occurrences, diagnostics) = expand(&event, day(0), day(3));

        assert_eq!(occurrences.len(), 3);
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::InvalidExceptionDate);
    }

    #[test]
    fn test_occurrence_limit_is_reported() {
        let config = LayoutConfig {
            max_occurrences: 5,
            ..LayoutConfig::default()
        };
        let event = daily_event("FREQ=HOURLY");

        let (occurrences, diagnostics) = expand_with(&event, &window(day(0), day(3)), Tz::UTC, &config);

        assert_eq!(occurrences.len(), 5);
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::OccurrenceLimitReached);
    }

    #[test]
    fn test_wall_clock_is_kept_across_dst_in_render_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // 09:00 CET
        let event = Event {
            recurrence_rule: Some("FREQ=DAILY;COUNT=5".to_string()),
            ..Event::new("berlin", "Breakfast", "2025-03-28T08:00:00Z", "2025-03-28T08:30:00Z")
        };
        let berlin_window = window(
            Utc.with_ymd_and_hms(2025, 3, 28, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap(),
        );

        let (occurrences, _) = expand_with(&event, &berlin_window, tz, &LayoutConfig::default());

        assert_eq!(occurrences.len(), 5);
        for occurrence in &occurrences {
            assert_eq!(occurrence.start.with_timezone(&tz).hour(), 9);
        }
    }

    #[test]
    fn test_plain_events_pass_through() {
        let event = Event::new("one", "Lunch", "2025-05-01T12:00:00Z", "2025-05-01T13:00:00Z");

        let (occurrences, _) = expand(&event, day(0), day(1));

        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].id, "one");
    }
}
