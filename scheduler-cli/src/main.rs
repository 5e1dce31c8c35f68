mod commands;
mod input;
mod logging;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scheduler_core::SchedulerConfig;

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(about = "Render calendar month, week and day views from a JSON event list")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// View options shared by commands that build a view.
#[derive(clap::Args, Clone, Default)]
pub struct ViewArgs {
    /// Date inside the period to show (ISO-8601 or e.g. "next friday"); defaults to now
    #[arg(short, long)]
    anchor: Option<String>,

    /// IANA time zone, e.g. "Europe/Berlin"; defaults to config, then the system zone
    #[arg(long)]
    tz: Option<String>,

    /// Locale for titles and labels, e.g. "de-DE"
    #[arg(long)]
    locale: Option<String>,

    /// First day of the week: 0 = Sunday ... 6 = Saturday
    #[arg(long)]
    week_start: Option<u8>,

    /// First hour shown in the day view
    #[arg(long)]
    day_start: Option<u32>,

    /// Hour the day view ends at (exclusive, max 24)
    #[arg(long)]
    day_end: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a month, week or day view
    Render {
        /// month, week or day
        view: String,

        /// JSON file with an array of events ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        events: String,

        #[command(flatten)]
        view_args: ViewArgs,

        /// Only events ending on or after this instant
        #[arg(long)]
        from: Option<String>,

        /// Only events starting on or before this instant
        #[arg(long)]
        to: Option<String>,

        /// Only events of this type (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,

        /// Only events whose title or description contains this text
        #[arg(short, long)]
        keyword: Option<String>,

        /// Print the view model as JSON instead of an agenda
        #[arg(long)]
        json: bool,
    },
    /// Print the anchor of the previous/next period, or today
    Navigate {
        /// month, week or day
        view: String,

        /// prev, next or today
        direction: String,

        #[command(flatten)]
        view_args: ViewArgs,
    },
    /// Compute the move intent for dropping an event somewhere else
    Move {
        /// Id of the event to move
        event_id: String,

        /// Where to drop it, e.g. "2025-03-20T15:00" or "tomorrow 3pm"; a bare date keeps the time of day
        #[arg(long)]
        to: String,

        /// JSON file with an array of events ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        events: String,

        /// Which occurrence of a recurring event (defaults to the first one)
        #[arg(long)]
        at: Option<String>,

        /// Drop into the all-day area
        #[arg(long)]
        all_day: bool,

        /// Override the duration, e.g. "90m" or "2h"
        #[arg(short, long)]
        duration: Option<String>,

        #[command(flatten)]
        view_args: ViewArgs,
    },
    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => SchedulerConfig::config_path()?,
    };

    match cli.command {
        Commands::Render {
            view,
            events,
            view_args,
            from,
            to,
            types,
            keyword,
            json,
        } => {
            let config = SchedulerConfig::load_from(&config_path)?;
            let filter = scheduler_core::EventFilter {
                from,
                to,
                types: (!types.is_empty()).then_some(types),
                keyword,
            };
            commands::view::run(&config, &view, &events, &view_args, &filter, json)
        }
        Commands::Navigate {
            view,
            direction,
            view_args,
        } => {
            let config = SchedulerConfig::load_from(&config_path)?;
            commands::navigate::run(&config, &view, &direction, &view_args)
        }
        Commands::Move {
            event_id,
            to,
            events,
            at,
            all_day,
            duration,
            view_args,
        } => {
            let config = SchedulerConfig::load_from(&config_path)?;
            let target = commands::move_event::Target {
                when: to,
                all_day,
                duration,
            };
            commands::move_event::run(&config, &events, &event_id, at.as_deref(), &target, &view_args)
        }
        Commands::Config { action } => match action {
            Some(ConfigAction::Init { force }) => commands::config::init(&config_path, force),
            None => commands::config::show(&config_path),
        },
    }
}
