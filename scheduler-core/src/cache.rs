//! Memoization of built view models.
//!
//! Entries are keyed by the canonical JSON of the whole input tuple and
//! stored behind an `Arc`; a stored view is never modified. Eviction only
//! costs a rebuild.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use moka::sync::Cache;
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::context::ViewRequest;
use crate::date_range::day_of;
use crate::error::{SchedulerError, SchedulerResult};
use crate::event::Event;
use crate::filter::EventFilter;
use crate::view_model::{ViewOutput, build_view_model};

const DEFAULT_CAPACITY: u64 = 64;

#[derive(Serialize)]
struct CacheKey<'a> {
    events: &'a [Event],
    filter: &'a EventFilter,
    request: ViewRequest,
    config: &'a LayoutConfig,
}

/// Thread-safe cache in front of [`build_view_model`].
#[derive(Clone)]
pub struct ViewModelCache {
    views: Cache<String, Arc<ViewOutput>>,
    config: LayoutConfig,
}

impl ViewModelCache {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_capacity(config, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(config: LayoutConfig, max_entries: u64) -> Self {
        ViewModelCache {
            views: Cache::builder().max_capacity(max_entries).build(),
            config,
        }
    }

    /// Return the cached view for these inputs, building it on a miss.
    ///
    /// Failed builds are not cached.
    pub fn get_or_build(
        &self,
        events: &[Event],
        filter: &EventFilter,
        request: &ViewRequest,
    ) -> SchedulerResult<Arc<ViewOutput>> {
        let key = self.key(events, filter, request)?;

        if let Some(view) = self.views.get(&key) {
            tracing::trace!(view = %request.view_type, "View model cache hit");
            return Ok(view);
        }

        let view = Arc::new(build_view_model(events, filter, request, &self.config)?);
        self.views.insert(key, Arc::clone(&view));

        Ok(view)
    }

    pub fn invalidate_all(&self) {
        self.views.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.views.entry_count()
    }

    /// Without an explicit `now` the output only depends on the current day
    /// in the request's zone, so the wall clock is reduced to that date before
    /// hashing.
    fn key(
        &self,
        events: &[Event],
        filter: &EventFilter,
        request: &ViewRequest,
    ) -> SchedulerResult<String> {
        let mut request = request.clone();
        if request.now.is_none() {
            request.now = Some(current_day(&request).to_string());
        }

        let key = CacheKey {
            events,
            filter,
            request,
            config: &self.config,
        };

        serde_json::to_string(&key).map_err(|e| SchedulerError::Serialization(e.to_string()))
    }
}

/// Today in the request's zone. An unknown zone fails the build anyway.
fn current_day(request: &ViewRequest) -> NaiveDate {
    match request.time_zone.trim().parse::<Tz>() {
        Ok(tz) => day_of(Utc::now(), tz),
        Err(_) => Utc::now().date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::to_iso_string;
    use crate::view_model::ViewModel;

    fn events() -> Vec<Event> {
        vec![Event::new(
            "a",
            "Standup",
            "2025-01-21T09:00:00Z",
            "2025-01-21T09:15:00Z",
        )]
    }

    fn request() -> ViewRequest {
        ViewRequest {
            now: Some("2025-01-21T12:00:00Z".to_string()),
            ..ViewRequest::new("week", "2025-01-21T09:00:00Z")
        }
    }

    #[test]
    fn test_same_inputs_share_entry() {
        let cache = ViewModelCache::new(LayoutConfig::default());

        let first = cache
            .get_or_build(&events(), &EventFilter::default(), &request())
            .expect("Should build");
        let second = cache
            .get_or_build(&events(), &EventFilter::default(), &request())
            .expect("Should build");

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_inputs_rebuild() {
        let cache = ViewModelCache::new(LayoutConfig::default());

        let week = cache
            .get_or_build(&events(), &EventFilter::default(), &request())
            .expect("Should build");

        let mut moved = events();
        moved[0].start = "2025-01-22T09:00:00Z".to_string();
        let after_move = cache
            .get_or_build(&moved, &EventFilter::default(), &request())
            .expect("Should build");

        let day = ViewRequest {
            view_type: "day".to_string(),
            ..request()
        };
        let day_view = cache
            .get_or_build(&events(), &EventFilter::default(), &day)
            .expect("Should build");

        assert!(!Arc::ptr_eq(&week, &after_move));
        assert_ne!(week.model, after_move.model);
        assert_eq!(day_view.title, "Tuesday, January 21, 2025");
    }

    #[test]
    fn test_key_follows_local_today() {
        for zone in ["Pacific/Kiritimati", "Etc/GMT+12"] {
            let live = ViewRequest {
                time_zone: zone.to_string(),
                ..ViewRequest::new("week", to_iso_string(Utc::now()))
            };

            let view = build_view_model(&[], &EventFilter::default(), &live, &LayoutConfig::default())
                .expect("Should build");
            let ViewModel::Week { days } = &view.model else {
                panic!("Expected a week model");
            };
            let today = days.iter().find(|d| d.is_today).expect("Week should contain today");

            assert_eq!(current_day(&live), today.date, "{zone}");
        }

        let east = ViewRequest {
            time_zone: "Pacific/Kiritimati".to_string(),
            ..ViewRequest::new("week", "2025-01-21T09:00:00Z")
        };
        let west = ViewRequest {
            time_zone: "Etc/GMT+12".to_string(),
            ..east.clone()
        };
        // 26 hours apart, so the two zones never share a date
        assert_ne!(current_day(&east), current_day(&west));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ViewModelCache::new(LayoutConfig::default());
        let bad = ViewRequest {
            time_zone: "Nowhere/Special".to_string(),
            ..request()
        };

        assert!(cache.get_or_build(&events(), &EventFilter::default(), &bad).is_err());
        cache.views.run_pending_tasks();
        assert_eq!(cache.entry_count(), 0);
    }
}
