//! Scheduler configuration.
//!
//! The layout constants live here rather than in code: the week/day/month
//! grids have historically disagreed about bucket granularity, minimum heights
//! and duration fallbacks, so callers get to pick them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Configuration at ~/.config/scheduler/config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub view: ViewDefaults,
    pub layout: LayoutConfig,
}

/// Defaults for view requests that don't specify a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    pub locale: String,
    /// IANA zone name; `None` means "detect from the system".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// 0 = Sunday … 6 = Saturday
    pub week_starts_on: u8,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        ViewDefaults {
            locale: "en-US".to_string(),
            time_zone: None,
            week_starts_on: 1,
            day_start_hour: 0,
            day_end_hour: 24,
        }
    }
}

/// Numeric constants used by segmentation and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Start times are rounded down to this many minutes to form overlap buckets.
    pub bucket_minutes: u32,
    /// Floor for a timed segment's rendered duration.
    pub min_duration_minutes: i64,
    /// Duration used for moved events whose own duration is zero or negative.
    pub fallback_duration_minutes: i64,
    /// Horizontal share split between the columns of one overlap bucket.
    pub usable_width_percent: f64,
    pub left_gutter_percent: f64,
    pub base_z_index: u32,
    pub hour_height_px: f64,
    pub all_day_row_height_px: f64,
    /// Segments shown per month cell before the rest collapse into an overflow count.
    pub max_per_cell: usize,
    /// Minimum padding around the view window when expanding recurrences.
    pub recurrence_buffer_days: i64,
    /// Cap on generated occurrences per recurring event.
    pub max_occurrences: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            bucket_minutes: 5,
            min_duration_minutes: 15,
            fallback_duration_minutes: 60,
            usable_width_percent: 96.0,
            left_gutter_percent: 2.0,
            base_z_index: 10,
            hour_height_px: 60.0,
            all_day_row_height_px: 24.0,
            max_per_cell: 3,
            recurrence_buffer_days: 7,
            max_occurrences: 1000,
        }
    }
}

static CONFIG_DIR_NAME: &str = "scheduler";

impl SchedulerConfig {
    pub fn config_path() -> SchedulerResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SchedulerError::Config("Could not determine config directory".into()))?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, falling back to defaults.
    pub fn load() -> SchedulerResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> SchedulerResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> SchedulerResult<Self> {
        toml::from_str(content).map_err(|e| SchedulerError::Config(e.to_string()))
    }

    pub fn save_to(&self, path: &Path) -> SchedulerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| SchedulerError::Config(e.to_string()))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SchedulerResult<()> {
        let defaults = LayoutConfig::default();
        let contents = format!(
            "\
# scheduler configuration

[view]
# locale = \"en-US\"
# time_zone = \"Europe/Berlin\"   # defaults to the system zone
# week_starts_on = 1             # 0 = Sunday
# day_start_hour = 0
# day_end_hour = 24

[layout]
# bucket_minutes = {}
# min_duration_minutes = {}
# fallback_duration_minutes = {}
# max_per_cell = {}
# hour_height_px = {}
# recurrence_buffer_days = {}
",
            defaults.bucket_minutes,
            defaults.min_duration_minutes,
            defaults.fallback_duration_minutes,
            defaults.max_per_cell,
            defaults.hour_height_px,
            defaults.recurrence_buffer_days,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SchedulerError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SchedulerError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
