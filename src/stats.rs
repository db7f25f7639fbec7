//! Aggregate statistics over a snapshot

use crate::models::{CityWeather, DisasterCategory, DisasterEvent, SeverityLevel};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: DisasterCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCount {
    pub severity: SeverityLevel,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterStats {
    pub total: usize,
    pub severe_count: usize,
    /// Categories with at least one event, in display order
    pub categories: Vec<CategoryCount>,
    /// Severities with at least one event, least severe first
    pub severities: Vec<SeverityCount>,
    /// Mean over events with a non-zero magnitude
    pub average_magnitude: f64,
    pub max_magnitude: f64,
    pub total_affected: u64,
}

impl DisasterStats {
    #[must_use]
    pub fn from_events(events: &[DisasterEvent]) -> Self {
        let categories = DisasterCategory::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category,
                label: category.label(),
                color: category.color(),
                count: events.iter().filter(|e| e.category == category).count(),
            })
            .filter(|c| c.count > 0)
            .collect();

        let severities = SeverityLevel::ALL
            .into_iter()
            .map(|severity| SeverityCount {
                severity,
                label: severity.label(),
                count: events.iter().filter(|e| e.severity == Some(severity)).count(),
            })
            .filter(|s| s.count > 0)
            .collect();

        let magnitudes: Vec<f64> = events
            .iter()
            .filter_map(|e| e.magnitude)
            .filter(|m| *m != 0.0)
            .collect();
        let average_magnitude = if magnitudes.is_empty() {
            0.0
        } else {
            magnitudes.iter().sum::<f64>() / magnitudes.len() as f64
        };

        let max_magnitude = events
            .iter()
            .filter(|e| e.category == DisasterCategory::Earthquakes)
            .map(|e| e.magnitude.unwrap_or(0.0))
            .fold(0.0, f64::max);

        Self {
            total: events.len(),
            severe_count: events.iter().filter(|e| e.is_severe()).count(),
            categories,
            severities,
            average_magnitude,
            max_magnitude,
            total_affected: events.iter().filter_map(|e| e.estimated_affected).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherStats {
    pub cities: usize,
    pub average_temperature: i32,
    pub min_temperature: i32,
    pub max_temperature: i32,
    pub average_humidity: u32,
    pub average_wind_speed: i32,
}

impl WeatherStats {
    #[must_use]
    pub fn from_weather(weather: &[CityWeather]) -> Self {
        if weather.is_empty() {
            return Self {
                cities: 0,
                average_temperature: 0,
                min_temperature: 0,
                max_temperature: 0,
                average_humidity: 0,
                average_wind_speed: 0,
            };
        }

        let n = weather.len() as f64;
        let mean = |f: fn(&CityWeather) -> f64| weather.iter().map(f).sum::<f64>() / n;

        Self {
            cities: weather.len(),
            average_temperature: mean(|w| f64::from(w.temperature)).round() as i32,
            min_temperature: weather.iter().map(|w| w.temperature).min().unwrap_or(0),
            max_temperature: weather.iter().map(|w| w.temperature).max().unwrap_or(0),
            average_humidity: mean(|w| f64::from(w.humidity)).round() as u32,
            average_wind_speed: mean(|w| f64::from(w.wind_speed)).round() as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudeBucket {
    pub range: &'static str,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

const MAGNITUDE_RANGES: [(&str, f64, f64); 7] = [
    ("0-2", 0.0, 2.0),
    ("2-3", 2.0, 3.0),
    ("3-4", 3.0, 4.0),
    ("4-5", 4.0, 5.0),
    ("5-6", 5.0, 6.0),
    ("6-7", 6.0, 7.0),
    ("7+", 7.0, 10.0),
];

/// Earthquakes with a non-zero magnitude, bucketed by `[min, max)`
#[must_use]
pub fn magnitude_histogram(events: &[DisasterEvent]) -> Vec<MagnitudeBucket> {
    let mut buckets: Vec<MagnitudeBucket> = MAGNITUDE_RANGES
        .iter()
        .map(|&(range, min, max)| MagnitudeBucket {
            range,
            min,
            max,
            count: 0,
        })
        .collect();

    let magnitudes = events
        .iter()
        .filter(|e| e.category == DisasterCategory::Earthquakes)
        .filter_map(|e| e.magnitude)
        .filter(|m| *m != 0.0);

    for magnitude in magnitudes {
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|b| magnitude >= b.min && magnitude < b.max)
        {
            bucket.count += 1;
        }
    }

    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyActivity {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    pub earthquakes: usize,
    pub storms: usize,
    pub wildfires: usize,
    pub floods: usize,
}

/// 24 one-hour buckets covering `(now - 24h, now]`, oldest first
#[must_use]
pub fn hourly_activity(events: &[DisasterEvent], now: DateTime<Utc>) -> Vec<HourlyActivity> {
    (0..24)
        .rev()
        .map(|i| {
            let end = now - Duration::hours(i);
            let start = end - Duration::hours(1);
            let in_hour: Vec<&DisasterEvent> = events
                .iter()
                .filter(|e| e.date > start && e.date <= end)
                .collect();
            let count_of = |category: DisasterCategory| {
                in_hour.iter().filter(|e| e.category == category).count()
            };

            HourlyActivity {
                start,
                end,
                count: in_hour.len(),
                earthquakes: count_of(DisasterCategory::Earthquakes),
                storms: count_of(DisasterCategory::SevereStorms),
                wildfires: count_of(DisasterCategory::Wildfires),
                floods: count_of(DisasterCategory::Floods),
            }
        })
        .collect()
}

/// Everything the stats endpoint returns
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub disasters: DisasterStats,
    pub weather: WeatherStats,
    pub magnitudes: Vec<MagnitudeBucket>,
    pub hourly: Vec<HourlyActivity>,
}

impl StatsReport {
    #[must_use]
    pub fn build(events: &[DisasterEvent], weather: &[CityWeather], now: DateTime<Utc>) -> Self {
        Self {
            disasters: DisasterStats::from_events(events),
            weather: WeatherStats::from_weather(weather),
            magnitudes: magnitude_histogram(events),
            hourly: hourly_activity(events, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assess_magnitude;

    fn now() -> DateTime<Utc> {
        "2024-08-02T12:00:00Z".parse().unwrap()
    }

    fn quake(id: &str, magnitude: f64, minutes_ago: i64) -> DisasterEvent {
        let mut event = DisasterEvent::new(
            id.to_string(),
            id.to_string(),
            String::new(),
            DisasterCategory::Earthquakes,
            [0.0, 0.0],
            now() - Duration::minutes(minutes_ago),
        );
        let assessment = assess_magnitude(magnitude);
        event.magnitude = Some(magnitude);
        event.severity = Some(assessment.severity);
        event.estimated_affected = Some(assessment.estimated_affected);
        event
    }

    fn other(id: &str, category: DisasterCategory, minutes_ago: i64) -> DisasterEvent {
        DisasterEvent::new(
            id.to_string(),
            id.to_string(),
            String::new(),
            category,
            [0.0, 0.0],
            now() - Duration::minutes(minutes_ago),
        )
    }

    fn sample() -> Vec<DisasterEvent> {
        vec![
            quake("a", 2.5, 10),
            quake("b", 6.5, 90),
            quake("c", 7.5, 200),
            other("fire", DisasterCategory::Wildfires, 30),
            other("storm", DisasterCategory::SevereStorms, 30),
        ]
    }

    #[test]
    fn test_disaster_stats() {
        let stats = DisasterStats::from_events(&sample());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.severe_count, 2);
        assert!((stats.average_magnitude - 5.5).abs() < 1e-9);
        assert_eq!(stats.max_magnitude, 7.5);
        assert_eq!(stats.total_affected, 100 + 100_000 + 1_000_000);

        let labels: Vec<&str> = stats.categories.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["Earthquakes", "Wildfires", "Storms"]);
        assert_eq!(stats.categories[0].count, 3);

        let severities: Vec<SeverityLevel> = stats.severities.iter().map(|s| s.severity).collect();
        assert_eq!(
            severities,
            vec![SeverityLevel::Minor, SeverityLevel::Severe, SeverityLevel::Extreme]
        );
    }

    #[test]
    fn test_empty_stats() {
        let stats = DisasterStats::from_events(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_magnitude, 0.0);
        assert_eq!(stats.max_magnitude, 0.0);
        assert!(stats.categories.is_empty());

        let weather = WeatherStats::from_weather(&[]);
        assert_eq!(weather.cities, 0);
        assert_eq!(weather.average_temperature, 0);
    }

    #[test]
    fn test_magnitude_histogram() {
        let mut events = sample();
        events.push(quake("edge", 7.0, 5));
        events.push(quake("tiny", 1.0, 5));
        events.push(quake("huge", 10.5, 5));

        let histogram = magnitude_histogram(&events);
        let counts: Vec<usize> = histogram.iter().map(|b| b.count).collect();
        // 10.5 falls outside every bucket
        assert_eq!(counts, vec![1, 1, 0, 0, 0, 1, 2]);
        assert_eq!(histogram[6].range, "7+");
    }

    #[test]
    fn test_hourly_activity() {
        let hours = hourly_activity(&sample(), now());
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[23].end, now());
        assert_eq!(hours[0].start, now() - Duration::hours(24));

        let last = &hours[23];
        assert_eq!(last.count, 3);
        assert_eq!(last.earthquakes, 1);
        assert_eq!(last.wildfires, 1);
        assert_eq!(last.storms, 1);

        assert_eq!(hours[22].earthquakes, 1);
        assert_eq!(hours.iter().map(|h| h.count).sum::<usize>(), 5);
    }
}
