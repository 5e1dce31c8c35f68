use anyhow::Result;
use scheduler_core::{EventFilter, SchedulerConfig, build_view_model};

use crate::ViewArgs;
use crate::input::{load_events, time_zone, view_request};
use crate::render::Render;

pub fn run(
    config: &SchedulerConfig,
    view: &str,
    events_path: &str,
    args: &ViewArgs,
    filter: &EventFilter,
    json: bool,
) -> Result<()> {
    let events = load_events(events_path)?;
    let request = view_request(view, args, config)?;

    let output = build_view_model(&events, filter, &request, &config.layout)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", output.render(time_zone(args, config)?));
    }

    Ok(())
}
