use anyhow::Result;
use chrono::Utc;
use scheduler_core::event::{parse_instant, to_iso_string};
use scheduler_core::{NavigationDirection, SchedulerConfig, ViewType, navigate};

use crate::ViewArgs;
use crate::input::{time_zone, view_request};

pub fn run(config: &SchedulerConfig, view: &str, direction: &str, args: &ViewArgs) -> Result<()> {
    let view_type: ViewType = view.parse()?;
    let direction: NavigationDirection = direction.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let tz = time_zone(args, config)?;

    let request = view_request(view, args, config)?;
    let anchor = parse_instant(&request.anchor_date)?;

    let moved = navigate(view_type, anchor, direction, Utc::now(), tz);
    println!("{}", to_iso_string(moved));

    Ok(())
}
