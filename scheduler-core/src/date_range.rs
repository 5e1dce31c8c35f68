//! View windows and calendar arithmetic.
//!
//! Every day boundary is computed in the render context's time zone and only
//! then converted to an instant. Windows are half-open: `end` is the first
//! instant after the last visible day.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::context::RenderContext;
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::SchedulerError;
use crate::event::parse_instant;

/// The calendar view being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Month,
    Week,
    Day,
}

impl FromStr for ViewType {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(ViewType::Month),
            "week" => Ok(ViewType::Week),
            "day" => Ok(ViewType::Day),
            _ => Err(SchedulerError::UnsupportedViewType(s.to_string())),
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewType::Month => "month",
            ViewType::Week => "week",
            ViewType::Day => "day",
        };
        f.write_str(name)
    }
}

/// The instant range and ordered day list covered by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewWindow {
    pub start: DateTime<Utc>,
    /// Exclusive: midnight after the last day.
    pub end: DateTime<Utc>,
    pub days: Vec<NaiveDate>,
}

impl ViewWindow {
    /// Build the window for `view_type` around `anchor`.
    pub fn compute(view_type: ViewType, anchor: DateTime<Utc>, ctx: &RenderContext) -> Self {
        let anchor_day = day_of(anchor, ctx.time_zone);

        let (first, last) = match view_type {
            ViewType::Day => (anchor_day, anchor_day),
            ViewType::Week => {
                let first = start_of_week(anchor_day, ctx.week_starts_on);
                (first, first + Duration::days(6))
            }
            ViewType::Month => {
                let month_start = start_of_month(anchor_day);
                let month_end = end_of_month(anchor_day);
                (
                    start_of_week(month_start, ctx.week_starts_on),
                    end_of_week(month_end, ctx.week_starts_on),
                )
            }
        };

        let days = first
            .iter_days()
            .take_while(|d| *d <= last)
            .collect::<Vec<_>>();

        ViewWindow {
            start: start_of_day(first, ctx.time_zone),
            end: start_of_day(last + Duration::days(1), ctx.time_zone),
            days,
        }
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.days.first().is_some_and(|first| day >= *first)
            && self.days.last().is_some_and(|last| day <= *last)
    }
}

/// Convert a local wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times
/// skipped by a DST jump move forward to the first valid minute.
pub fn resolve_local(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => (1..=24 * 60)
            .find_map(|m| {
                tz.from_local_datetime(&(local + Duration::minutes(m)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| local.and_utc()),
    }
}

/// Midnight of `date` in `tz`, as an instant.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    resolve_local(date.and_time(NaiveTime::MIN), tz)
}

/// `date` at `hour:minute` local time in `tz`. Hour 24 is the next midnight.
pub fn local_instant(date: NaiveDate, hour: u32, minute: u32, tz: Tz) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN)
        + Duration::hours(i64::from(hour))
        + Duration::minutes(i64::from(minute));
    resolve_local(local, tz)
}

/// Half-open `[midnight, next midnight)` bounds of `date` in `tz`.
pub fn day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (start_of_day(date, tz), start_of_day(date + Duration::days(1), tz))
}

/// Calendar day of `instant` in `tz`.
pub fn day_of(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Calendar day of the last moment of a span ending at `end`.
///
/// A span ending exactly at midnight belongs to the previous day.
pub fn last_day_of_span(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> NaiveDate {
    if end > start {
        day_of(end - Duration::nanoseconds(1), tz)
    } else {
        day_of(start, tz)
    }
}

/// Whether the span `[start, end)` intersects `[from, to)`.
///
/// A zero-length span counts as intersecting when `from <= start < to`.
pub fn spans_overlap(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> bool {
    if start == end {
        start >= from && start < to
    } else {
        start < to && end > from
    }
}

/// Minutes since local midnight for `instant` in `tz`.
pub fn minutes_of_day(instant: DateTime<Utc>, tz: Tz) -> i64 {
    let local = instant.with_timezone(&tz);
    i64::from(local.hour()) * 60 + i64::from(local.minute())
}

pub fn start_of_week(date: NaiveDate, week_starts_on: Weekday) -> NaiveDate {
    let offset = (date.weekday().num_days_from_sunday() + 7
        - week_starts_on.num_days_from_sunday())
        % 7;
    date - Duration::days(i64::from(offset))
}

pub fn end_of_week(date: NaiveDate, week_starts_on: Weekday) -> NaiveDate {
    start_of_week(date, week_starts_on) + Duration::days(6)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date)
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .unwrap_or(date)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Map 0 = Sunday … 6 = Saturday to a weekday.
pub fn weekday_from_sunday_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Direction for toolbar-style navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    Prev,
    Next,
    Today,
}

impl FromStr for NavigationDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prev" | "previous" => Ok(NavigationDirection::Prev),
            "next" => Ok(NavigationDirection::Next),
            "today" => Ok(NavigationDirection::Today),
            other => Err(format!("Unknown direction '{other}'. Expected prev, next or today")),
        }
    }
}

/// Move the anchor by one view period (month, week or day) in local time.
pub fn navigate(
    view_type: ViewType,
    anchor: DateTime<Utc>,
    direction: NavigationDirection,
    now: DateTime<Utc>,
    tz: Tz,
) -> DateTime<Utc> {
    let forward = match direction {
        NavigationDirection::Today => return now,
        NavigationDirection::Next => true,
        NavigationDirection::Prev => false,
    };

    let local = anchor.with_timezone(&tz).naive_local();

    let moved = match view_type {
        ViewType::Month if forward => local.checked_add_months(Months::new(1)),
        ViewType::Month => local.checked_sub_months(Months::new(1)),
        ViewType::Week if forward => local.checked_add_signed(Duration::days(7)),
        ViewType::Week => local.checked_sub_signed(Duration::days(7)),
        ViewType::Day if forward => local.checked_add_signed(Duration::days(1)),
        ViewType::Day => local.checked_sub_signed(Duration::days(1)),
    };

    moved.map(|m| resolve_local(m, tz)).unwrap_or(anchor)
}

/// Optional instant bounds used to filter events.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Parse optional bound strings. Malformed bounds are ignored with a warning.
    pub fn from_bounds(from: Option<&str>, to: Option<&str>, diagnostics: &mut Diagnostics) -> Self {
        DateRange {
            from: from.and_then(|s| parse_bound("from", s, diagnostics)),
            to: to.and_then(|s| parse_bound("to", s, diagnostics)),
        }
    }

    /// Whether a span `[start, end]` is not entirely outside the bounds.
    pub fn admits(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let after_from = self.from.is_none_or(|from| end >= from);
        let before_to = self.to.is_none_or(|to| start <= to);
        after_from && before_to
    }
}

fn parse_bound(name: &str, value: &str, diagnostics: &mut Diagnostics) -> Option<DateTime<Utc>> {
    match parse_instant(value) {
        Ok(instant) => Some(instant),
        Err(e) => {
            diagnostics.warn(
                WarningKind::InvalidFilterBound,
                None,
                format!("filter.{name}: {e}; bound ignored"),
            );
            None
        }
    }
}
