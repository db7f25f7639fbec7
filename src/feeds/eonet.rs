//! NASA EONET natural-event feed

use super::{EventFeed, parse_items};
use crate::http::HttpClient;
use crate::models::{DisasterCategory, DisasterEvent, EventSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
pub struct EonetResponse {
    /// Kept raw so one malformed event cannot sink the whole response
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct EonetEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub closed: Option<String>,
    #[serde(default)]
    pub categories: Vec<EonetCategory>,
    #[serde(default)]
    pub sources: Vec<EonetSource>,
    #[serde(default)]
    pub geometry: Vec<EonetGeometry>,
}

#[derive(Debug, Deserialize)]
pub struct EonetCategory {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct EonetSource {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct EonetGeometry {
    pub date: DateTime<Utc>,
    pub coordinates: EonetCoordinates,
}

/// `Point` geometries carry `[lon, lat]`, `Polygon` geometries a list of rings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EonetCoordinates {
    Point(Vec<f64>),
    Polygon(Vec<Vec<Vec<f64>>>),
}

impl EonetCoordinates {
    /// Representative `[lon, lat]`; polygons use the mean of the outer ring
    #[must_use]
    pub fn lon_lat(&self) -> Option<[f64; 2]> {
        match self {
            EonetCoordinates::Point(point) => match point.as_slice() {
                [lon, lat, ..] => Some([*lon, *lat]),
                _ => None,
            },
            EonetCoordinates::Polygon(rings) => {
                let ring = rings.first()?;
                let vertices: Vec<[f64; 2]> = ring
                    .iter()
                    .filter_map(|v| match v.as_slice() {
                        [lon, lat, ..] => Some([*lon, *lat]),
                        _ => None,
                    })
                    .collect();
                if vertices.is_empty() {
                    return None;
                }
                let n = vertices.len() as f64;
                let lon = vertices.iter().map(|v| v[0]).sum::<f64>() / n;
                let lat = vertices.iter().map(|v| v[1]).sum::<f64>() / n;
                Some([lon, lat])
            }
        }
    }
}

/// Map an EONET category id onto a dashboard category
#[must_use]
pub fn map_category(eonet_category: &str) -> DisasterCategory {
    match eonet_category {
        "earthquakes" | "landslides" => DisasterCategory::Earthquakes,
        "floods" => DisasterCategory::Floods,
        "wildfires" => DisasterCategory::Wildfires,
        "severeStorms" => DisasterCategory::SevereStorms,
        "volcanoes" => DisasterCategory::Volcanoes,
        // seaLakeIce, snow, dustHaze, waterColor, tempExtremes, drought
        _ => DisasterCategory::Weather,
    }
}

/// Normalize one EONET event. Events without a usable geometry yield `None`.
#[must_use]
pub fn transform_event(event: EonetEvent) -> Option<DisasterEvent> {
    let latest = event.geometry.last()?;
    let coordinates = latest.coordinates.lon_lat()?;

    let first_category = event.categories.first();
    let category = map_category(first_category.map_or("weather", |c| c.id.as_str()));
    let description = event
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| {
            format!(
                "Active {} detected",
                first_category.map_or("event", |c| c.title.as_str())
            )
        });

    let mut normalized = DisasterEvent::new(
        event.id,
        event.title,
        description,
        category,
        coordinates,
        latest.date,
    );
    normalized.sources = event
        .sources
        .into_iter()
        .map(|s| EventSource { id: s.id, url: s.url })
        .collect();
    normalized.closed = event.closed.filter(|c| !c.is_empty());

    Some(normalized)
}

/// Transform a whole response, dropping malformed events and events without geometry
#[must_use]
pub fn transform_response(response: EonetResponse) -> Vec<DisasterEvent> {
    let parsed: Vec<EonetEvent> = parse_items("EONET", response.events);
    let total = parsed.len();
    let events: Vec<DisasterEvent> = parsed.into_iter().filter_map(transform_event).collect();

    if events.len() < total {
        debug!("Dropped {} EONET events without geometry", total - events.len());
    }
    events
}

/// Client for the open-events endpoint
pub struct EonetFeed {
    client: HttpClient,
    url: String,
}

impl EonetFeed {
    #[must_use]
    pub fn new(client: HttpClient, url: String) -> Self {
        Self { client, url }
    }

    /// Fetch and normalize, propagating errors
    pub async fn try_fetch(&self) -> Result<Vec<DisasterEvent>> {
        let response: EonetResponse = self.client.get_json(&self.url).await?;
        Ok(transform_response(response))
    }
}

#[async_trait]
impl EventFeed for EonetFeed {
    fn name(&self) -> &'static str {
        "EONET"
    }

    async fn fetch(&self) -> Vec<DisasterEvent> {
        match self.try_fetch().await {
            Ok(events) => {
                info!("[EONET] {} open events", events.len());
                events
            }
            Err(e) => {
                warn!("Failed to fetch EONET events: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> EonetEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_transform_uses_latest_geometry() {
        let event = parse(json!({
            "id": "EONET_6543",
            "title": "Wildfire - Sonoma County",
            "description": null,
            "closed": null,
            "categories": [{"id": "wildfires", "title": "Wildfires"}],
            "sources": [{"id": "InciWeb", "url": "https://inciweb.example/1"}],
            "geometry": [
                {"date": "2024-08-01T00:00:00Z", "type": "Point", "coordinates": [-122.0, 38.0]},
                {"date": "2024-08-02T06:30:00Z", "type": "Point", "coordinates": [-122.5, 38.4]}
            ]
        }));

        let normalized = transform_event(event).unwrap();
        assert_eq!(normalized.coordinates, [-122.5, 38.4]);
        assert_eq!(normalized.date.to_rfc3339(), "2024-08-02T06:30:00+00:00");
        assert_eq!(normalized.category, DisasterCategory::Wildfires);
        assert_eq!(normalized.description, "Active Wildfires detected");
        assert_eq!(normalized.sources[0].id, "InciWeb");
        assert!(normalized.closed.is_none());
        assert!(normalized.magnitude.is_none());
    }

    #[test]
    fn test_transform_drops_event_without_geometry() {
        let event = parse(json!({
            "id": "EONET_1",
            "title": "Iceberg A68",
            "categories": [{"id": "seaLakeIce", "title": "Sea and Lake Ice"}],
            "geometry": []
        }));
        assert!(transform_event(event).is_none());
    }

    #[test]
    fn test_polygon_geometry_uses_ring_mean() {
        let event = parse(json!({
            "id": "EONET_2",
            "title": "Flooding",
            "description": "River flooding",
            "categories": [{"id": "floods", "title": "Floods"}],
            "geometry": [{
                "date": "2024-08-02T00:00:00Z",
                "type": "Polygon",
                "coordinates": [[[10.0, 20.0], [12.0, 20.0], [12.0, 22.0], [10.0, 22.0]]]
            }]
        }));
        let normalized = transform_event(event).unwrap();
        assert_eq!(normalized.coordinates, [11.0, 21.0]);
        assert_eq!(normalized.description, "River flooding");
    }

    #[test]
    fn test_description_fallback_without_category() {
        let event = parse(json!({
            "id": "EONET_3",
            "title": "Unknown",
            "categories": [],
            "geometry": [{"date": "2024-08-02T00:00:00Z", "coordinates": [1.0, 2.0]}]
        }));
        let normalized = transform_event(event).unwrap();
        assert_eq!(normalized.description, "Active event detected");
        assert_eq!(normalized.category, DisasterCategory::Weather);
    }

    #[test]
    fn test_malformed_event_does_not_drop_siblings() {
        let response: EonetResponse = serde_json::from_value(json!({
            "events": [
                {
                    "id": "EONET_10",
                    "title": "Wildfire - Butte County",
                    "categories": [{"id": "wildfires", "title": "Wildfires"}],
                    "geometry": [{"date": "2024-08-02T00:00:00Z", "type": "Point", "coordinates": [-121.5, 39.8]}]
                },
                {
                    "id": "EONET_11",
                    "title": "Broken geometry",
                    "categories": [{"id": "floods", "title": "Floods"}],
                    "geometry": [{"date": "2024-08-02T00:00:00Z", "type": "Point", "coordinates": null}]
                }
            ]
        }))
        .unwrap();

        let events = transform_response(response);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "EONET_10");
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(map_category("landslides"), DisasterCategory::Earthquakes);
        assert_eq!(map_category("severeStorms"), DisasterCategory::SevereStorms);
        assert_eq!(map_category("volcanoes"), DisasterCategory::Volcanoes);
        for id in ["seaLakeIce", "snow", "dustHaze", "waterColor", "tempExtremes", "drought", "manmade"] {
            assert_eq!(map_category(id), DisasterCategory::Weather);
        }
    }
}
