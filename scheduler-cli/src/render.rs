//! Coloured terminal rendering for view models.

use chrono_tz::Tz;
use owo_colors::OwoColorize;
use scheduler_core::{DayViewModel, HourViewModel, Segment, ViewModel, ViewOutput, Warning};

/// Extension trait for terminal rendering with colours.
pub trait Render {
    fn render(&self, tz: Tz) -> String;
}

impl Render for Segment {
    fn render(&self, tz: Tz) -> String {
        let time = if self.is_all_day_for_layout() {
            format!("{:>13}", "all-day")
        } else {
            format!(
                "{:>5} - {:>5}",
                self.display_start.with_timezone(&tz).format("%H:%M"),
                self.display_end.with_timezone(&tz).format("%H:%M")
            )
        };

        let mut line = format!("{} {}", time.dimmed(), self.title);
        if self.continues_before {
            line = format!("{} {}", "<".dimmed(), line);
        }
        if self.continues_after {
            line.push_str(&format!(" {}", ">".dimmed()));
        }
        if !self.kind.is_empty() {
            line.push_str(&format!(" {}", format!("[{}]", self.kind).dimmed()));
        }
        if self.is_recurring {
            line.push_str(&format!(" {}", "↻".cyan()));
        }
        if let Some(layout) = self.layout.as_ref().filter(|l| l.column_count > 1) {
            let column = format!("(col {}/{})", layout.column_index + 1, layout.column_count);
            line.push_str(&format!(" {}", column.yellow()));
        }

        line
    }
}

impl Render for DayViewModel {
    fn render(&self, tz: Tz) -> String {
        let header = self.date.format("%a %b %-d").to_string();
        let header = if self.is_today {
            header.bold().green().to_string()
        } else if !self.is_current_period {
            header.dimmed().to_string()
        } else {
            header.bold().to_string()
        };

        let mut lines = vec![header];
        for segment in self.all_day_segments.iter().chain(&self.segments) {
            lines.push(format!("  {}", segment.render(tz)));
        }
        if self.overflow_count > 0 {
            lines.push(format!("  {}", format!("+{} more", self.overflow_count).dimmed()));
        }

        lines.join("\n")
    }
}

impl Render for HourViewModel {
    fn render(&self, tz: Tz) -> String {
        let label = format!("{:>8}", self.label).dimmed().to_string();
        if self.segments.is_empty() {
            return label;
        }

        let events: Vec<String> = self.segments.iter().map(|s| s.render(tz)).collect();
        format!("{label} {}", events.join(&format!("\n{:>8} ", "")))
    }
}

impl Render for Warning {
    fn render(&self, _tz: Tz) -> String {
        let prefix = match &self.event_id {
            Some(id) => format!("warning [{id}]:"),
            None => "warning:".to_string(),
        };
        format!("{} {}", prefix.yellow(), self.message)
    }
}

impl Render for ViewOutput {
    fn render(&self, tz: Tz) -> String {
        let mut lines = vec![self.title.bold().to_string(), String::new()];

        match &self.model {
            ViewModel::Month { days } | ViewModel::Week { days } => {
                let busy: Vec<String> = days
                    .iter()
                    .filter(|d| !d.segments.is_empty() || !d.all_day_segments.is_empty())
                    .map(|d| d.render(tz))
                    .collect();
                if busy.is_empty() {
                    lines.push("No events".dimmed().to_string());
                } else {
                    lines.push(busy.join("\n\n"));
                }
            }
            ViewModel::Day { hours, all_day } => {
                for segment in all_day {
                    lines.push(format!("{:>8} {}", "", segment.render(tz)));
                }
                lines.extend(hours.iter().map(|h| h.render(tz)));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.extend(self.warnings.iter().map(|w| w.render(tz)));
        }

        lines.join("\n")
    }
}
