//! Reading events and turning command-line strings into core inputs.

use std::io::Read;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use scheduler_core::date_range::resolve_local;
use scheduler_core::event::to_iso_string;
use scheduler_core::{Event, SchedulerConfig, ViewRequest};

use crate::ViewArgs;

/// Read a JSON array of events from a file, or stdin for "-".
pub fn load_events(path: &str) -> Result<Vec<Event>> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Could not read events from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Could not read {path}"))?
    };

    let events: Vec<Event> =
        serde_json::from_str(&content).with_context(|| format!("Invalid event JSON in {path}"))?;
    tracing::info!(count = events.len(), source = path, "Loaded events");

    Ok(events)
}

/// Zone name from the flag, then the config, then the system.
pub fn time_zone_name(args: &ViewArgs, config: &SchedulerConfig) -> String {
    args.tz
        .clone()
        .or_else(|| config.view.time_zone.clone())
        .or_else(|| iana_time_zone::get_timezone().ok())
        .unwrap_or_else(|| "UTC".to_string())
}

pub fn time_zone(args: &ViewArgs, config: &SchedulerConfig) -> Result<Tz> {
    let name = time_zone_name(args, config);
    name.parse()
        .map_err(|_| anyhow::anyhow!("Unknown time zone \"{name}\""))
}

/// A user-supplied point in time.
pub struct When {
    pub instant: DateTime<Utc>,
    pub local: NaiveDateTime,
    /// False for bare dates like "friday" or "2025-03-20".
    pub has_time: bool,
}

/// Parse an ISO-8601 instant, a local date/time, or natural language.
pub fn parse_when(input: &str, tz: Tz) -> Result<When> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input.trim()) {
        let instant = dt.with_timezone(&Utc);
        return Ok(When {
            instant,
            local: instant.with_timezone(&tz).naive_local(),
            has_time: true,
        });
    }

    let local = fuzzydate::parse(&expand_abbreviations(input))
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{input}\""))?;

    Ok(When {
        instant: resolve_local(local, tz),
        local,
        has_time: has_time_component(input),
    })
}

/// fuzzydate only knows full day and month names.
fn expand_abbreviations(input: &str) -> String {
    const NAMES: &[&str] = &[
        "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
        "february", "march", "april", "june", "july", "august", "september", "october",
        "november", "december",
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let full = (word.len() >= 3)
                .then(|| NAMES.iter().find(|name| name.starts_with(word)))
                .flatten();
            full.map_or_else(|| word.to_string(), |name| name.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();
    if lower.contains("noon") || lower.contains("midnight") || lower.contains(':') {
        return true;
    }

    // "3pm", "11 am", "at 9"
    let words: Vec<&str> = lower.split_whitespace().collect();
    words.iter().enumerate().any(|(i, word)| {
        let digits_then_meridiem = word.ends_with("am") || word.ends_with("pm");
        let starts_numeric = word.starts_with(|c: char| c.is_ascii_digit());
        let bare_meridiem = (*word == "am" || *word == "pm")
            && i > 0
            && words[i - 1].ends_with(|c: char| c.is_ascii_digit());
        let after_at = i > 0 && words[i - 1] == "at" && starts_numeric;
        (digits_then_meridiem && starts_numeric) || bare_meridiem || after_at
    })
}

/// Build a view request from flags, falling back to config defaults.
pub fn view_request(view: &str, args: &ViewArgs, config: &SchedulerConfig) -> Result<ViewRequest> {
    let tz = time_zone(args, config)?;
    let defaults = &config.view;

    let anchor = match args.anchor.as_deref() {
        Some(input) => parse_when(input, tz)?.instant,
        None => Utc::now(),
    };

    Ok(ViewRequest {
        view_type: view.to_string(),
        anchor_date: to_iso_string(anchor),
        locale: args.locale.clone().unwrap_or_else(|| defaults.locale.clone()),
        time_zone: tz.name().to_string(),
        week_starts_on: args.week_start.unwrap_or(defaults.week_starts_on),
        day_start_hour: args.day_start.unwrap_or(defaults.day_start_hour),
        day_end_hour: args.day_end.unwrap_or(defaults.day_end_hour),
        now: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_abbreviations() {
        assert_eq!(expand_abbreviations("Next Fri"), "next friday");
        assert_eq!(expand_abbreviations("sept 3"), "september 3");
        assert_eq!(expand_abbreviations("at 3pm"), "at 3pm");
    }

    #[test]
    fn test_has_time_component() {
        assert!(has_time_component("tomorrow 3pm"));
        assert!(has_time_component("friday 11 am"));
        assert!(has_time_component("2025-03-20 15:00"));
        assert!(has_time_component("monday at 9"));
        assert!(has_time_component("noon"));
        assert!(!has_time_component("next friday"));
        assert!(!has_time_component("2025-03-20"));
    }

    #[test]
    fn test_parse_when_rfc3339() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let when = parse_when("2025-01-21T09:00:00Z", tz).unwrap();
        assert!(when.has_time);
        assert_eq!(when.local.to_string(), "2025-01-21 10:00:00");
    }

    #[test]
    fn test_view_request_uses_config_defaults() {
        let mut config = SchedulerConfig::default();
        config.view.week_starts_on = 0;
        config.view.time_zone = Some("Asia/Tokyo".to_string());
        let args = ViewArgs {
            anchor: Some("2025-01-21T09:00:00Z".to_string()),
            day_start: Some(8),
            ..ViewArgs::default()
        };

        let request = view_request("week", &args, &config).unwrap();

        assert_eq!(request.time_zone, "Asia/Tokyo");
        assert_eq!(request.week_starts_on, 0);
        assert_eq!(request.day_start_hour, 8);
        assert_eq!(request.day_end_hour, 24);
        assert_eq!(request.anchor_date, "2025-01-21T09:00:00.000Z");
    }
}
