//! Time-window filtering and grouping of events
//!
//! Times are rendered in UTC.

use crate::feeds::sort_newest_first;
use crate::models::DisasterEvent;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    PastHour,
    #[serde(rename = "6h")]
    PastSixHours,
    #[default]
    #[serde(rename = "24h")]
    PastDay,
    #[serde(rename = "7d")]
    PastWeek,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        match self {
            TimeWindow::PastHour => Some(Duration::hours(1)),
            TimeWindow::PastSixHours => Some(Duration::hours(6)),
            TimeWindow::PastDay => Some(Duration::hours(24)),
            TimeWindow::PastWeek => Some(Duration::days(7)),
            TimeWindow::All => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::PastHour => "Past Hour",
            TimeWindow::PastSixHours => "Past 6 Hours",
            TimeWindow::PastDay => "Past 24 Hours",
            TimeWindow::PastWeek => "Past 7 Days",
            TimeWindow::All => "All Time",
        }
    }

    /// Group key for an event time within this window
    #[must_use]
    pub fn group_key(self, date: DateTime<Utc>) -> String {
        match self {
            TimeWindow::PastHour | TimeWindow::PastSixHours => {
                format!("{}:{:02}", date.hour(), date.minute() / 15 * 15)
            }
            TimeWindow::PastDay => format!("{}:00", date.hour()),
            TimeWindow::PastWeek | TimeWindow::All => date.format("%-m/%-d/%Y").to_string(),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(TimeWindow::PastHour),
            "6h" => Ok(TimeWindow::PastSixHours),
            "24h" => Ok(TimeWindow::PastDay),
            "7d" => Ok(TimeWindow::PastWeek),
            "all" => Ok(TimeWindow::All),
            other => Err(format!(
                "unknown time window '{other}', expected one of 1h, 6h, 24h, 7d, all"
            )),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeWindow::PastHour => "1h",
            TimeWindow::PastSixHours => "6h",
            TimeWindow::PastDay => "24h",
            TimeWindow::PastWeek => "7d",
            TimeWindow::All => "all",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineGroup {
    pub key: String,
    pub events: Vec<DisasterEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub window: TimeWindow,
    pub label: &'static str,
    pub total: usize,
    /// Newest group first
    pub groups: Vec<TimelineGroup>,
}

/// Events no older than the window, newest first
#[must_use]
pub fn events_in_window(
    events: &[DisasterEvent],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<DisasterEvent> {
    let mut selected: Vec<DisasterEvent> = events
        .iter()
        .filter(|e| window.duration().is_none_or(|d| now - e.date <= d))
        .cloned()
        .collect();
    sort_newest_first(&mut selected);
    selected
}

#[must_use]
pub fn build_timeline(events: &[DisasterEvent], window: TimeWindow, now: DateTime<Utc>) -> Timeline {
    let selected = events_in_window(events, window, now);
    let total = selected.len();

    let mut groups: Vec<TimelineGroup> = Vec::new();
    for event in selected {
        let key = window.group_key(event.date);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.events.push(event),
            None => groups.push(TimelineGroup {
                key,
                events: vec![event],
            }),
        }
    }

    Timeline {
        window,
        label: window.label(),
        total,
        groups,
    }
}

/// `Just now`, `Nm ago`, `Nh ago`, `Nd ago`, then an absolute date
#[must_use]
pub fn format_relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - date).num_minutes();
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        format_date(date)
    }
}

/// e.g. `Aug 2, 2024, 09:05 AM`
#[must_use]
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y, %I:%M %p").to_string()
}
