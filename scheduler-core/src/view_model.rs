//! The view-model pipeline: filter, expand, segment, lay out.
//!
//! [`build_view_model`] is the single entry point. It dispatches on the view
//! type to a month, week or day builder that share the same segmentation and
//! layout steps.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::context::{RenderContext, ViewRequest};
use crate::date_range::{ViewType, ViewWindow, day_of, is_weekend, local_instant, start_of_week};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::SchedulerResult;
use crate::event::{Event, Occurrence};
use crate::filter::{EventFilter, ResolvedFilter};
use crate::layout::{layout_all_day, layout_time_grid};
use crate::recurrence::expand_event;
use crate::segment::{Segment, segment_occurrences};

/// One day cell of a month grid or one column of a week grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayViewModel {
    pub date: NaiveDate,
    pub is_today: bool,
    /// False for the leading/trailing days a month grid borrows from
    /// adjacent months.
    pub is_current_period: bool,
    pub is_weekend: bool,
    /// Month: the first `max_per_cell` segments of the day.
    /// Week: timed segments with time-grid layout.
    pub segments: Vec<Segment>,
    /// Week only: bars with stack layout.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_day_segments: Vec<Segment>,
    /// Month only: segments hidden by the per-cell cap.
    #[serde(default)]
    pub overflow_count: usize,
}

impl DayViewModel {
    fn new(date: NaiveDate, ctx: &RenderContext, is_current_period: bool) -> Self {
        DayViewModel {
            date,
            is_today: date == ctx.today,
            is_current_period,
            is_weekend: is_weekend(date),
            segments: Vec::new(),
            all_day_segments: Vec::new(),
            overflow_count: 0,
        }
    }
}

/// One hour slot of the day view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourViewModel {
    /// Start of the slot as an instant.
    pub start: DateTime<Utc>,
    pub hour: u32,
    pub label: String,
    pub is_today: bool,
    pub is_current_period: bool,
    pub is_weekend: bool,
    /// Timed segments starting in this slot, laid out against the whole day.
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ViewModel {
    Month {
        days: Vec<DayViewModel>,
    },
    Week {
        days: Vec<DayViewModel>,
    },
    Day {
        hours: Vec<HourViewModel>,
        all_day: Vec<Segment>,
    },
}

/// Everything the renderer needs for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutput {
    pub view_type: ViewType,
    pub title: String,
    pub window: ViewWindow,
    /// Abbreviated day names, starting at the configured first weekday.
    pub weekday_names: Vec<String>,
    pub model: ViewModel,
    pub warnings: Vec<Warning>,
}

/// Compute the full view model for `request`.
///
/// Fails only when the request itself is unusable (view type, zone, hour
/// range, week start). Problems with individual events end up in
/// `warnings` and never blank the view.
pub fn build_view_model(
    events: &[Event],
    filter: &EventFilter,
    request: &ViewRequest,
    config: &LayoutConfig,
) -> SchedulerResult<ViewOutput> {
    let mut diagnostics = Diagnostics::new();

    let resolved = request.resolve(&mut diagnostics)?;
    let ctx = &resolved.context;
    let window = ViewWindow::compute(resolved.view_type, resolved.anchor, ctx);
    let anchor_day = day_of(resolved.anchor, ctx.time_zone);

    let filter = filter.resolve(&mut diagnostics);
    let occurrences = collect_occurrences(
        events,
        &filter,
        &window,
        resolved.now,
        ctx.time_zone,
        config,
        &mut diagnostics,
    );
    let segments = segment_occurrences(&occurrences, &window, ctx.time_zone);

    let model = match resolved.view_type {
        ViewType::Month => ViewModel::Month {
            days: month_days(&segments, &window, anchor_day, ctx, config),
        },
        ViewType::Week => ViewModel::Week {
            days: week_days(&segments, &window, ctx, config),
        },
        ViewType::Day => {
            let (hours, all_day) = day_hours(&segments, anchor_day, ctx, config);
            ViewModel::Day { hours, all_day }
        }
    };

    tracing::debug!(
        view = %resolved.view_type,
        events = events.len(),
        segments = segments.len(),
        warnings = diagnostics.warnings().len(),
        "Built view model"
    );

    Ok(ViewOutput {
        view_type: resolved.view_type,
        title: view_title(resolved.view_type, &window, anchor_day, ctx),
        weekday_names: weekday_names(anchor_day, ctx),
        window,
        model,
        warnings: diagnostics.into_warnings(),
    })
}

fn collect_occurrences(
    events: &[Event],
    filter: &ResolvedFilter,
    window: &ViewWindow,
    now: DateTime<Utc>,
    tz: Tz,
    config: &LayoutConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Occurrence> {
    let mut occurrences = Vec::with_capacity(events.len());

    for event in events {
        let (start, end) = event.resolve_span(now, diagnostics);
        if !filter.matches_event(event, start, end) {
            continue;
        }

        occurrences.extend(
            expand_event(event, start, end, window, tz, config, diagnostics)
                .into_iter()
                .filter(|o| filter.matches_occurrence(o)),
        );
    }

    occurrences
}

fn month_days(
    segments: &[Segment],
    window: &ViewWindow,
    anchor_day: NaiveDate,
    ctx: &RenderContext,
    config: &LayoutConfig,
) -> Vec<DayViewModel> {
    window
        .days
        .iter()
        .map(|&date| {
            let in_month = date.year() == anchor_day.year() && date.month() == anchor_day.month();
            let mut cell = DayViewModel::new(date, ctx, in_month);

            let mut visible: Vec<Segment> = segments
                .iter()
                .filter(|s| s.touches_day(date, ctx.time_zone))
                .cloned()
                .collect();
            cell.overflow_count = visible.len().saturating_sub(config.max_per_cell);
            visible.truncate(config.max_per_cell);
            cell.segments = visible;

            cell
        })
        .collect()
}

fn week_days(
    segments: &[Segment],
    window: &ViewWindow,
    ctx: &RenderContext,
    config: &LayoutConfig,
) -> Vec<DayViewModel> {
    window
        .days
        .iter()
        .map(|&date| {
            let mut cell = DayViewModel::new(date, ctx, true);
            let (timed, bars) = lay_out_day(segments, date, ctx, config);
            cell.segments = timed;
            cell.all_day_segments = bars;
            cell
        })
        .collect()
}

fn day_hours(
    segments: &[Segment],
    date: NaiveDate,
    ctx: &RenderContext,
    config: &LayoutConfig,
) -> (Vec<HourViewModel>, Vec<Segment>) {
    let tz = ctx.time_zone;
    let (timed, bars) = lay_out_day(segments, date, ctx, config);
    let label_format = hour_label_format(&ctx.locale_tag);

    let hours = (ctx.day_start_hour..ctx.day_end_hour)
        .map(|hour| {
            let start = local_instant(date, hour, 0, tz);
            let next = local_instant(date, hour + 1, 0, tz);
            let first_slot = hour == ctx.day_start_hour;
            let last_slot = hour + 1 == ctx.day_end_hour;

            // The outer slots also take segments starting outside the grid
            let in_slot = |s: &&Segment| {
                (last_slot || s.display_start < next) && (first_slot || s.display_start >= start)
            };

            HourViewModel {
                start,
                hour,
                label: start
                    .with_timezone(&tz)
                    .format_localized(label_format, ctx.locale)
                    .to_string(),
                is_today: date == ctx.today,
                is_current_period: true,
                is_weekend: is_weekend(date),
                segments: timed.iter().filter(in_slot).cloned().collect(),
            }
        })
        .collect();

    (hours, bars)
}

/// Timed segments and bars touching `date`, each with their layout applied.
fn lay_out_day(
    segments: &[Segment],
    date: NaiveDate,
    ctx: &RenderContext,
    config: &LayoutConfig,
) -> (Vec<Segment>, Vec<Segment>) {
    let (mut bars, mut timed): (Vec<Segment>, Vec<Segment>) = segments
        .iter()
        .filter(|s| s.touches_day(date, ctx.time_zone))
        .cloned()
        .partition(Segment::is_all_day_for_layout);

    layout_time_grid(&mut timed, ctx.day_start_hour, ctx.time_zone, config);
    layout_all_day(&mut bars, config);

    (timed, bars)
}

fn hour_label_format(locale_tag: &str) -> &'static str {
    if locale_tag.starts_with("en") {
        "%-I:%M %p"
    } else {
        "%H:%M"
    }
}

/// Localized title, e.g. `January 2025`, `Jan 20 - Jan 26, 2025` or
/// `Tuesday, January 21, 2025`.
pub fn view_title(
    view_type: ViewType,
    window: &ViewWindow,
    anchor_day: NaiveDate,
    ctx: &RenderContext,
) -> String {
    let locale = ctx.locale;
    match view_type {
        ViewType::Month => anchor_day.format_localized("%B %Y", locale).to_string(),
        ViewType::Week => {
            let first = window.days.first().copied().unwrap_or(anchor_day);
            let last = window.days.last().copied().unwrap_or(anchor_day);
            format!(
                "{} - {}",
                first.format_localized("%b %-d", locale),
                last.format_localized("%b %-d, %Y", locale)
            )
        }
        ViewType::Day => anchor_day
            .format_localized("%A, %B %-d, %Y", locale)
            .to_string(),
    }
}

/// Seven abbreviated weekday names starting at the configured week start.
pub fn weekday_names(anchor_day: NaiveDate, ctx: &RenderContext) -> Vec<String> {
    let first = start_of_week(anchor_day, ctx.week_starts_on);
    (0..7)
        .map(|offset| {
            (first + Duration::days(offset))
                .format_localized("%a", ctx.locale)
                .to_string()
        })
        .collect()
}
