use anyhow::{Context, Result};
use chrono::{Duration, Timelike};
use scheduler_core::event::{parse_instant, to_iso_string};
use scheduler_core::intent::{drop_on_all_day, drop_on_day, drop_on_slot};
use scheduler_core::{EventFilter, MoveIntent, SchedulerConfig, Segment, ViewModel, build_view_model};

use crate::ViewArgs;
use crate::input::{load_events, parse_when, time_zone, view_request};

/// Where the event is dropped.
pub struct Target {
    pub when: String,
    pub all_day: bool,
    pub duration: Option<String>,
}

pub fn run(
    config: &SchedulerConfig,
    events_path: &str,
    event_id: &str,
    at: Option<&str>,
    target: &Target,
    args: &ViewArgs,
) -> Result<()> {
    let events = load_events(events_path)?;
    let tz = time_zone(args, config)?;

    let event = events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or_else(|| anyhow::anyhow!("No event with id \"{event_id}\""))?;

    let occurrence_start = match at {
        Some(input) => parse_when(input, tz)?.instant,
        None => parse_instant(&event.start)?,
    };

    // Build the day of the occurrence to get the segment being dragged
    let day_args = ViewArgs {
        anchor: Some(to_iso_string(occurrence_start)),
        ..args.clone()
    };
    let request = view_request("day", &day_args, config)?;
    let output = build_view_model(
        std::slice::from_ref(event),
        &EventFilter::default(),
        &request,
        &config.layout,
    )?;

    let segment = closest_segment(&output.model, occurrence_start)
        .with_context(|| format!("Event \"{event_id}\" has no occurrence on that day"))?;

    let when = parse_when(&target.when, tz)?;
    let day = when.local.date();

    let mut intent = if target.all_day {
        drop_on_all_day(segment, day, tz)
    } else if when.has_time {
        drop_on_slot(segment, day, when.local.hour(), when.local.minute(), tz, &config.layout)
    } else {
        drop_on_day(segment, day, tz, &config.layout)
    };

    if let Some(duration) = &target.duration {
        apply_duration(&mut intent, duration)?;
    }

    println!("{}", serde_json::to_string_pretty(&intent)?);

    Ok(())
}

fn closest_segment(model: &ViewModel, instant: chrono::DateTime<chrono::Utc>) -> Option<&Segment> {
    let segments: Vec<&Segment> = match model {
        ViewModel::Day { hours, all_day } => all_day
            .iter()
            .chain(hours.iter().flat_map(|h| h.segments.iter()))
            .collect(),
        ViewModel::Month { days } | ViewModel::Week { days } => days
            .iter()
            .flat_map(|d| d.all_day_segments.iter().chain(&d.segments))
            .collect(),
    };

    segments
        .into_iter()
        .min_by_key(|s| (s.start - instant).num_seconds().abs())
}

fn apply_duration(intent: &mut MoveIntent, input: &str) -> Result<()> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{input}\""))?;
    let duration = Duration::from_std(std_dur).context("Duration too large")?;

    let start = parse_instant(&intent.new_start)?;
    intent.new_end = to_iso_string(start + duration);

    Ok(())
}
