//! Text and geographic search over the current snapshot

use crate::models::{CityWeather, DisasterEvent, Location};
use serde::Serialize;

/// Queries shorter than this match nothing
pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_DISASTER_RESULTS: usize = 5;
pub const MAX_WEATHER_RESULTS: usize = 3;

/// Matches for one query
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub disasters: Vec<DisasterEvent>,
    pub weather: Vec<CityWeather>,
    /// Geocoded places, filled in by callers with network access
    pub locations: Vec<Location>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disasters.is_empty() && self.weather.is_empty() && self.locations.is_empty()
    }
}

fn normalized_query(query: &str) -> Option<String> {
    let query = query.trim();
    (query.chars().count() >= MIN_QUERY_CHARS).then(|| query.to_lowercase())
}

/// Events whose title, description or nearest city contain the query
#[must_use]
pub fn search_disasters(events: &[DisasterEvent], query: &str) -> Vec<DisasterEvent> {
    let Some(needle) = normalized_query(query) else {
        return Vec::new();
    };

    events
        .iter()
        .filter(|event| {
            event.title.to_lowercase().contains(&needle)
                || event.description.to_lowercase().contains(&needle)
                || event
                    .nearest_city()
                    .is_some_and(|city| city.to_lowercase().contains(&needle))
        })
        .take(MAX_DISASTER_RESULTS)
        .cloned()
        .collect()
}

/// Cities whose name or country contain the query
#[must_use]
pub fn search_weather(weather: &[CityWeather], query: &str) -> Vec<CityWeather> {
    let Some(needle) = normalized_query(query) else {
        return Vec::new();
    };

    weather
        .iter()
        .filter(|w| {
            w.city.to_lowercase().contains(&needle) || w.country.to_lowercase().contains(&needle)
        })
        .take(MAX_WEATHER_RESULTS)
        .cloned()
        .collect()
}

#[must_use]
pub fn search(events: &[DisasterEvent], weather: &[CityWeather], query: &str) -> SearchResults {
    SearchResults {
        disasters: search_disasters(events, query),
        weather: search_weather(weather, query),
        locations: Vec::new(),
    }
}

/// Great-circle distance in km between a location and an event
#[must_use]
pub fn distance_km(center: &Location, event: &DisasterEvent) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: center.latitude,
            longitude: center.longitude,
        },
        haversine::Location {
            latitude: event.latitude(),
            longitude: event.longitude(),
        },
        haversine::Units::Kilometers,
    )
}

/// Events within `radius_km` of `center`, nearest first, with their distance
#[must_use]
pub fn events_near<'a>(
    events: &'a [DisasterEvent],
    center: &Location,
    radius_km: f64,
) -> Vec<(&'a DisasterEvent, f64)> {
    let mut nearby: Vec<(&DisasterEvent, f64)> = events
        .iter()
        .map(|event| (event, distance_km(center, event)))
        .filter(|(_, distance)| *distance <= radius_km)
        .collect();
    nearby.sort_by(|a, b| a.1.total_cmp(&b.1));
    nearby
}

/// Events whose estimated impact radius covers `point`
#[must_use]
pub fn events_affecting<'a>(events: &'a [DisasterEvent], point: &Location) -> Vec<&'a DisasterEvent> {
    events
        .iter()
        .filter(|event| {
            event
                .impact_radius
                .is_some_and(|radius| distance_km(point, event) <= f64::from(radius))
        })
        .collect()
}
