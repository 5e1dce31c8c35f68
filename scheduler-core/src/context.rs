//! View requests and the immutable render context threaded through the pipeline.

use chrono::{DateTime, Locale, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::date_range::{ViewType, day_of, weekday_from_sunday_index};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{SchedulerError, SchedulerResult};
use crate::event::parse_instant;

static DEFAULT_LOCALE: &str = "en-US";

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_week_starts_on() -> u8 {
    1
}

fn default_day_end_hour() -> u32 {
    24
}

/// A view request as sent by the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    /// `month`, `week` or `day`; anything else fails the request.
    pub view_type: String,
    /// ISO-8601 instant inside the period to show.
    pub anchor_date: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// 0 = Sunday … 6 = Saturday
    #[serde(default = "default_week_starts_on")]
    pub week_starts_on: u8,
    #[serde(default)]
    pub day_start_hour: u32,
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u32,
    /// Reference instant for "today"; the wall clock when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl ViewRequest {
    pub fn new(view_type: impl Into<String>, anchor_date: impl Into<String>) -> Self {
        ViewRequest {
            view_type: view_type.into(),
            anchor_date: anchor_date.into(),
            locale: default_locale(),
            time_zone: default_time_zone(),
            week_starts_on: default_week_starts_on(),
            day_start_hour: 0,
            day_end_hour: default_day_end_hour(),
            now: None,
        }
    }

    /// Validate the request and resolve it into typed values.
    ///
    /// Fatal problems (view type, zone, hour range, week start) are errors;
    /// a malformed anchor or `now` falls back to the wall clock with a warning.
    pub fn resolve(&self, diagnostics: &mut Diagnostics) -> SchedulerResult<ResolvedRequest> {
        let view_type: ViewType = self.view_type.parse()?;

        let time_zone: Tz = self
            .time_zone
            .trim()
            .parse()
            .map_err(|_| SchedulerError::InvalidTimeZone(self.time_zone.clone()))?;

        let week_starts_on = weekday_from_sunday_index(self.week_starts_on)
            .ok_or(SchedulerError::InvalidWeekStart(self.week_starts_on))?;

        if self.day_start_hour >= self.day_end_hour || self.day_end_hour > 24 {
            return Err(SchedulerError::InvalidHourRange {
                start: self.day_start_hour,
                end: self.day_end_hour,
            });
        }

        let wall_clock = Utc::now();
        let now = match self.now.as_deref() {
            Some(raw) => instant_or(raw, "now", wall_clock, diagnostics),
            None => wall_clock,
        };
        let anchor = instant_or(&self.anchor_date, "anchorDate", now, diagnostics);

        let (locale, locale_tag) = resolve_locale(&self.locale, diagnostics);

        Ok(ResolvedRequest {
            view_type,
            anchor,
            now,
            context: RenderContext {
                locale,
                locale_tag,
                time_zone,
                week_starts_on,
                day_start_hour: self.day_start_hour,
                day_end_hour: self.day_end_hour,
                today: day_of(now, time_zone),
            },
        })
    }
}

fn instant_or(
    raw: &str,
    field: &str,
    fallback: DateTime<Utc>,
    diagnostics: &mut Diagnostics,
) -> DateTime<Utc> {
    parse_instant(raw).unwrap_or_else(|e| {
        diagnostics.warn(
            WarningKind::InvalidInstant,
            None,
            format!("{field}: {e}; falling back to now"),
        );
        fallback
    })
}

/// A validated view request.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub view_type: ViewType,
    pub anchor: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub context: RenderContext,
}

/// Locale, zone and working-hour bounds for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub locale: Locale,
    /// BCP-47 style tag of `locale`, e.g. `de-DE`.
    pub locale_tag: String,
    pub time_zone: Tz,
    pub week_starts_on: Weekday,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    /// The current calendar day in `time_zone`.
    pub today: NaiveDate,
}

impl RenderContext {
    /// UTC, en-US, Monday weeks, full-day hours.
    pub fn utc() -> Self {
        RenderContext {
            locale: Locale::en_US,
            locale_tag: DEFAULT_LOCALE.to_string(),
            time_zone: Tz::UTC,
            week_starts_on: Weekday::Mon,
            day_start_hour: 0,
            day_end_hour: 24,
            today: Utc::now().date_naive(),
        }
    }
}

/// Map `de-DE`, `de_de` or bare `de` to a chrono locale, falling back to en-US.
fn resolve_locale(tag: &str, diagnostics: &mut Diagnostics) -> (Locale, String) {
    let normalized = tag.trim().replace('-', "_");

    let candidates = match normalized.split_once('_') {
        Some((language, region)) => vec![format!(
            "{}_{}",
            language.to_lowercase(),
            region.to_uppercase()
        )],
        None => {
            let language = normalized.to_lowercase();
            vec![
                language.clone(),
                format!("{language}_{}", language.to_uppercase()),
            ]
        }
    };

    for candidate in candidates {
        if let Ok(locale) = Locale::try_from(candidate.as_str()) {
            return (locale, candidate.replace('_', "-"));
        }
    }

    diagnostics.warn(
        WarningKind::UnknownLocale,
        None,
        format!("locale '{tag}' not found, using {DEFAULT_LOCALE}"),
    );
    (Locale::en_US, DEFAULT_LOCALE.to_string())
}
