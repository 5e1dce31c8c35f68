//! Calendar view computation.
//!
//! Turns a list of events and a view request into a positioned render model:
//! - `recurrence`: RRULE expansion with exception dates
//! - `segment`: clipping to the view window and per-day splitting
//! - `layout`: time-grid columns and all-day stacking
//! - `view_model`: the month/week/day pipeline tying it together
//!
//! Everything is synchronous and pure apart from [`config`] file helpers.

pub mod cache;
pub mod config;
pub mod context;
pub mod date_range;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod filter;
pub mod intent;
pub mod layout;
pub mod recurrence;
pub mod segment;
pub mod view_model;

pub use cache::ViewModelCache;
pub use config::{LayoutConfig, SchedulerConfig, ViewDefaults};
pub use context::{RenderContext, ResolvedRequest, ViewRequest};
pub use date_range::{NavigationDirection, ViewType, ViewWindow, navigate};
pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use error::{SchedulerError, SchedulerResult};
pub use event::{Event, EventColor, Occurrence};
pub use filter::EventFilter;
pub use intent::MoveIntent;
pub use layout::{StackLayout, TimeGridLayout};
pub use segment::Segment;
pub use view_model::{DayViewModel, HourViewModel, ViewModel, ViewOutput, build_view_model};
