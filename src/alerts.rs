//! Category filters and new-event notifications

use crate::models::{DisasterCategory, DisasterEvent, SeverityLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Notifications kept, newest first
pub const MAX_NOTIFICATIONS: usize = 50;

/// Per-category visibility, all enabled by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    enabled: HashMap<DisasterCategory, bool>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            enabled: DisasterCategory::ALL.into_iter().map(|c| (c, true)).collect(),
        }
    }
}

impl FilterState {
    /// Only the given categories enabled
    #[must_use]
    pub fn only(categories: &[DisasterCategory]) -> Self {
        Self {
            enabled: DisasterCategory::ALL
                .into_iter()
                .map(|c| (c, categories.contains(&c)))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self, category: DisasterCategory) -> bool {
        self.enabled.get(&category).copied().unwrap_or(true)
    }

    pub fn set(&mut self, category: DisasterCategory, enabled: bool) {
        self.enabled.insert(category, enabled);
    }

    pub fn toggle(&mut self, category: DisasterCategory) {
        let current = self.is_enabled(category);
        self.set(category, !current);
    }

    /// City weather is shown when the weather category is enabled
    #[must_use]
    pub fn weather_visible(&self) -> bool {
        self.is_enabled(DisasterCategory::Weather)
    }

    #[must_use]
    pub fn apply(&self, events: &[DisasterEvent]) -> Vec<DisasterEvent> {
        events
            .iter()
            .filter(|e| self.is_enabled(e.category))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub event: DisasterEvent,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// Whether new events notify, and from which severity up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub min_severity: SeverityLevel,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsUpdate {
    pub enabled: Option<bool>,
    pub min_severity: Option<SeverityLevel>,
}

/// Tracks event ids between polls and raises notifications for new ones
#[derive(Debug)]
pub struct NotificationCenter {
    enabled: bool,
    min_severity: SeverityLevel,
    previous_ids: HashSet<String>,
    primed: bool,
    notifications: Vec<Notification>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new(enabled: bool, min_severity: SeverityLevel) -> Self {
        Self {
            enabled,
            min_severity,
            previous_ids: HashSet::new(),
            primed: false,
            notifications: Vec::new(),
        }
    }

    pub fn set_min_severity(&mut self, min_severity: SeverityLevel) {
        self.min_severity = min_severity;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn settings(&self) -> NotificationSettings {
        NotificationSettings {
            enabled: self.enabled,
            min_severity: self.min_severity,
        }
    }

    pub fn update_settings(&mut self, update: NotificationSettingsUpdate) -> NotificationSettings {
        if let Some(enabled) = update.enabled {
            self.set_enabled(enabled);
        }
        if let Some(min_severity) = update.min_severity {
            self.set_min_severity(min_severity);
        }
        self.settings()
    }

    /// Record a poll result. Returns the notifications raised by it; the first
    /// poll only establishes the baseline.
    pub fn observe(&mut self, events: &[DisasterEvent], now: DateTime<Utc>) -> Vec<Notification> {
        let mut raised = Vec::new();

        if self.enabled && self.primed {
            raised = events
                .iter()
                .filter(|e| !self.previous_ids.contains(&e.id))
                .filter(|e| e.effective_severity() >= self.min_severity)
                .map(|event| Notification {
                    id: format!("notif-{}-{}", event.id, now.timestamp_millis()),
                    event: event.clone(),
                    timestamp: now,
                    read: false,
                })
                .collect();

            if !raised.is_empty() {
                info!("{} new events at or above {}", raised.len(), self.min_severity);
                let mut combined = raised.clone();
                combined.append(&mut self.notifications);
                combined.truncate(MAX_NOTIFICATIONS);
                self.notifications = combined;
            }
        }

        self.previous_ids = events.iter().map(|e| e.id.clone()).collect();
        self.primed = true;
        raised
    }

    /// Newest first
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, event_id: &str) {
        for notification in &mut self.notifications {
            if notification.event.id == event_id {
                notification.read = true;
            }
        }
    }

    /// Returns whether a notification was removed
    pub fn dismiss(&mut self, notification_id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != notification_id);
        self.notifications.len() != before
    }

    pub fn dismiss_all(&mut self) {
        self.notifications.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(id: &str, category: DisasterCategory, severity: Option<SeverityLevel>) -> DisasterEvent {
        let mut event = DisasterEvent::new(
            id.to_string(),
            id.to_string(),
            String::new(),
            category,
            [0.0, 0.0],
            Utc::now(),
        );
        event.severity = severity;
        event
    }

    #[test]
    fn test_filter_state() {
        let events = vec![
            event("q", DisasterCategory::Earthquakes, None),
            event("f", DisasterCategory::Floods, None),
        ];

        let mut filters = FilterState::default();
        assert_eq!(filters.apply(&events).len(), 2);

        filters.toggle(DisasterCategory::Floods);
        let visible = filters.apply(&events);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "q");

        let only = FilterState::only(&[DisasterCategory::Floods]);
        assert_eq!(only.apply(&events)[0].id, "f");
        assert!(!only.weather_visible());
    }

    #[test]
    fn test_first_poll_is_baseline() {
        let mut center = NotificationCenter::new(true, SeverityLevel::Minor);
        let raised = center.observe(&[event("a", DisasterCategory::Earthquakes, None)], Utc::now());
        assert!(raised.is_empty());
        assert!(center.notifications().is_empty());
    }

    #[test]
    fn test_new_events_above_threshold_notify() {
        let now = Utc::now();
        let mut center = NotificationCenter::new(true, SeverityLevel::Moderate);
        center.observe(&[event("a", DisasterCategory::Earthquakes, Some(SeverityLevel::Severe))], now);

        let second = vec![
            event("a", DisasterCategory::Earthquakes, Some(SeverityLevel::Severe)),
            event("b", DisasterCategory::Earthquakes, Some(SeverityLevel::Minor)),
            event("c", DisasterCategory::Floods, None),
            event("d", DisasterCategory::Earthquakes, Some(SeverityLevel::Moderate)),
        ];
        let raised = center.observe(&second, now + Duration::seconds(30));
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].event.id, "d");
        assert!(raised[0].id.starts_with("notif-d-"));
        assert_eq!(center.unread_count(), 1);

        center.mark_read("d");
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_disabled_center_tracks_ids_without_notifying() {
        let now = Utc::now();
        let mut center = NotificationCenter::new(false, SeverityLevel::Minor);
        center.observe(&[], now);
        assert!(center.observe(&[event("x", DisasterCategory::Volcanoes, None)], now).is_empty());

        center.set_enabled(true);
        // "x" is already known
        assert!(center.observe(&[event("x", DisasterCategory::Volcanoes, None)], now).is_empty());
    }

    #[test]
    fn test_notifications_capped_newest_first() {
        let mut center = NotificationCenter::new(true, SeverityLevel::Minor);
        let start = Utc::now();
        center.observe(&[], start);

        for round in 0..6 {
            let events: Vec<DisasterEvent> = (0..10)
                .map(|i| event(&format!("r{round}-{i}"), DisasterCategory::Weather, None))
                .collect();
            center.observe(&events, start + Duration::minutes(round));
        }

        assert_eq!(center.notifications().len(), MAX_NOTIFICATIONS);
        assert_eq!(center.notifications()[0].event.id, "r5-0");

        let first_id = center.notifications()[0].id.clone();
        assert!(center.dismiss(&first_id));
        assert!(!center.dismiss(&first_id));
        center.dismiss_all();
        assert!(center.notifications().is_empty());
    }

    #[test]
    fn test_raising_min_severity_silences_minor_events() {
        let now = Utc::now();
        let mut center = NotificationCenter::new(true, SeverityLevel::Minor);
        center.observe(&[], now);

        let settings = center.update_settings(NotificationSettingsUpdate {
            enabled: None,
            min_severity: Some(SeverityLevel::Severe),
        });
        assert!(settings.enabled);
        assert_eq!(settings.min_severity, SeverityLevel::Severe);

        let raised = center.observe(
            &[
                event("minor", DisasterCategory::Floods, None),
                event("big", DisasterCategory::Earthquakes, Some(SeverityLevel::Extreme)),
            ],
            now,
        );
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].event.id, "big");
    }
}
