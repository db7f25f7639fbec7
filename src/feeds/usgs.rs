//! USGS GeoJSON earthquake feeds

use super::{EventFeed, parse_items};
use crate::http::HttpClient;
use crate::models::{
    AlertLevel, DisasterCategory, DisasterEvent, EventLocation, EventSource, assess_magnitude,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct UsgsResponse {
    /// Kept raw so one malformed feature cannot sink the whole feed
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UsgsFeature {
    pub id: String,
    pub properties: UsgsProperties,
    pub geometry: UsgsGeometry,
}

#[derive(Debug, Deserialize)]
pub struct UsgsProperties {
    pub mag: Option<f64>,
    pub place: Option<String>,
    /// Epoch milliseconds
    pub time: i64,
    #[serde(default)]
    pub url: String,
    pub felt: Option<u64>,
    pub cdi: Option<f64>,
    pub mmi: Option<f64>,
    pub alert: Option<String>,
    pub status: Option<String>,
    pub tsunami: Option<u8>,
    pub sig: Option<u32>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsgsGeometry {
    /// `[lon, lat, depth]`
    pub coordinates: Vec<f64>,
}

/// Split a place like `"12 km SSW of Ridgecrest, CA"` into the nearest city
/// and the distance in km. Places without `" of "` yield nothing.
#[must_use]
pub fn parse_place(place: &str) -> (Option<String>, Option<u32>) {
    let parts: Vec<&str> = place.split(" of ").collect();
    if parts.len() < 2 {
        return (None, None);
    }

    let distance = parse_km_distance(parts[0]);
    let nearest_city = parts.last().map(|s| (*s).to_string());
    (nearest_city, distance)
}

/// First run of digits followed by optional whitespace and `km`
fn parse_km_distance(text: &str) -> Option<u32> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let end = i;
        let mut j = end;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if text[j..].starts_with("km") {
            return text[start..end].parse().ok();
        }
    }
    None
}

/// Integer with comma thousands separators
#[must_use]
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Normalize one USGS feature
#[must_use]
pub fn transform_feature(feature: UsgsFeature) -> DisasterEvent {
    let UsgsFeature {
        id,
        properties,
        geometry,
    } = feature;

    let magnitude = properties.mag.unwrap_or(0.0);
    let coordinate = |i: usize| geometry.coordinates.get(i).copied().unwrap_or(0.0);
    let (longitude, latitude, depth) = (coordinate(0), coordinate(1), coordinate(2));

    let assessment = assess_magnitude(magnitude);
    let alert_level = properties
        .alert
        .as_deref()
        .and_then(AlertLevel::parse)
        .unwrap_or(assessment.alert_level);

    let place = properties
        .place
        .clone()
        .unwrap_or_else(|| "Unknown location".to_string());
    let (nearest_city, distance_from_city) = parse_place(&place);

    let felt = properties.felt.filter(|&n| n > 0);
    let mmi = properties.mmi.filter(|&m| m != 0.0);
    let cdi = properties.cdi.filter(|&c| c != 0.0);
    let tsunami = properties.tsunami == Some(1);

    let description = [
        format!(
            "{} earthquake with magnitude {:.1} at {:.1}km depth.",
            assessment.severity.label(),
            magnitude,
            depth
        ),
        if tsunami {
            "⚠️ TSUNAMI WARNING ISSUED.".to_string()
        } else {
            String::new()
        },
        felt.map(|n| format!("Felt by {} people.", format_thousands(n)))
            .unwrap_or_default(),
        mmi.map(|m| format!("Modified Mercalli Intensity: {m:.1}"))
            .unwrap_or_default(),
        format!("Estimated impact radius: {}km.", assessment.impact_radius_km),
        format!(
            "Potentially affecting up to {} people.",
            format_thousands(assessment.estimated_affected)
        ),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    let date = DateTime::<Utc>::from_timestamp_millis(properties.time).unwrap_or_default();

    let mut event = DisasterEvent::new(
        format!("usgs-{id}"),
        format!("M{magnitude:.1} Earthquake - {place}"),
        description,
        DisasterCategory::Earthquakes,
        [longitude, latitude],
        date,
    );
    event.sources = vec![EventSource {
        id: "USGS".to_string(),
        url: properties.url,
    }];
    event.magnitude = Some(magnitude);
    event.depth = Some(depth);
    event.severity = Some(assessment.severity);
    event.alert_level = Some(alert_level);
    event.estimated_affected = Some(assessment.estimated_affected);
    event.impact_radius = Some(assessment.impact_radius_km);
    event.location = Some(EventLocation {
        nearest_city,
        distance_from_city,
        ..EventLocation::default()
    });
    event.tsunami = Some(tsunami);
    event.felt = felt;
    event.mmi = mmi;
    event.cdi = cdi;
    event.sig = properties.sig;
    event.status = properties.status;
    event.event_type = properties.event_type;

    event
}

/// Merge feed responses in order, keeping the first occurrence of each USGS id.
/// Failed feeds (`None`) are skipped.
#[must_use]
pub fn combine_feeds(responses: Vec<Option<UsgsResponse>>) -> Vec<DisasterEvent> {
    let mut seen_ids = HashSet::new();
    let mut events = Vec::new();

    for response in responses.into_iter().flatten() {
        for feature in parse_items::<UsgsFeature>("USGS", response.features) {
            if seen_ids.insert(feature.id.clone()) {
                events.push(transform_feature(feature));
            }
        }
    }

    events
}

/// The hour, day and significant-week feeds
pub struct UsgsFeed {
    client: HttpClient,
    urls: Vec<String>,
}

impl UsgsFeed {
    /// Feeds are processed in the order given
    #[must_use]
    pub fn new(client: HttpClient, urls: Vec<String>) -> Self {
        Self { client, urls }
    }

    async fn fetch_one(&self, url: &str) -> Result<UsgsResponse> {
        self.client.get_json(url).await
    }
}

#[async_trait]
impl EventFeed for UsgsFeed {
    fn name(&self) -> &'static str {
        "USGS"
    }

    async fn fetch(&self) -> Vec<DisasterEvent> {
        let responses = futures::future::join_all(self.urls.iter().map(|url| self.fetch_one(url))).await;

        let responses: Vec<Option<UsgsResponse>> = responses
            .into_iter()
            .zip(&self.urls)
            .map(|(result, url)| match result {
                Ok(response) => {
                    info!("[USGS] {} earthquakes from {}", response.features.len(), url);
                    Some(response)
                }
                Err(e) => {
                    warn!("Failed to fetch USGS feed {}: {:#}", url, e);
                    None
                }
            })
            .collect();

        combine_feeds(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeverityLevel;
    use rstest::rstest;
    use serde_json::json;

    fn feature_json(id: &str, mag: f64, extra: serde_json::Value) -> serde_json::Value {
        let mut properties = json!({
            "mag": mag,
            "place": "12 km SSW of Ridgecrest, CA",
            "time": 1_722_556_800_000_i64,
            "url": format!("https://earthquake.usgs.gov/earthquakes/eventpage/{id}"),
            "felt": null,
            "cdi": null,
            "mmi": null,
            "alert": null,
            "status": "reviewed",
            "tsunami": 0,
            "sig": 312,
            "type": "earthquake"
        });
        if let (Some(base), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        json!({
            "type": "Feature",
            "id": id,
            "properties": properties,
            "geometry": {"type": "Point", "coordinates": [-117.6, 35.6, 8.2]}
        })
    }

    fn feature(id: &str, mag: f64, extra: serde_json::Value) -> UsgsFeature {
        serde_json::from_value(feature_json(id, mag, extra)).unwrap()
    }

    #[rstest]
    #[case("12 km SSW of Ridgecrest, CA", Some("Ridgecrest, CA"), Some(12))]
    #[case("5km N of Town", Some("Town"), Some(5))]
    #[case("South of the Fiji Islands", Some("the Fiji Islands"), None)]
    #[case("Central Mid-Atlantic Ridge", None, None)]
    #[case("", None, None)]
    fn test_parse_place(
        #[case] place: &str,
        #[case] city: Option<&str>,
        #[case] distance: Option<u32>,
    ) {
        let (nearest_city, distance_from_city) = parse_place(place);
        assert_eq!(nearest_city.as_deref(), city);
        assert_eq!(distance_from_city, distance);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(100), "100");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(10_000_000), "10,000,000");
    }

    #[test]
    fn test_transform_feature() {
        let event = transform_feature(feature("ci40000001", 6.4, json!({"felt": 1520, "mmi": 7.23})));

        assert_eq!(event.id, "usgs-ci40000001");
        assert_eq!(event.title, "M6.4 Earthquake - 12 km SSW of Ridgecrest, CA");
        assert_eq!(event.category, DisasterCategory::Earthquakes);
        assert_eq!(event.coordinates, [-117.6, 35.6]);
        assert_eq!(event.depth, Some(8.2));
        assert_eq!(event.severity, Some(SeverityLevel::Severe));
        assert_eq!(event.alert_level, Some(AlertLevel::Orange));
        assert_eq!(event.estimated_affected, Some(100_000));
        assert_eq!(event.impact_radius, Some(100));
        assert_eq!(event.nearest_city(), Some("Ridgecrest, CA"));
        assert_eq!(event.location.as_ref().unwrap().distance_from_city, Some(12));
        assert_eq!(event.felt, Some(1520));
        assert_eq!(event.sig, Some(312));
        assert_eq!(event.event_type.as_deref(), Some("earthquake"));
        assert_eq!(event.date.timestamp_millis(), 1_722_556_800_000);
        assert_eq!(
            event.description,
            "Severe earthquake with magnitude 6.4 at 8.2km depth. Felt by 1,520 people. \
             Modified Mercalli Intensity: 7.2 Estimated impact radius: 100km. \
             Potentially affecting up to 100,000 people."
        );
    }

    #[test]
    fn test_usgs_alert_overrides_derived_alert() {
        let event = transform_feature(feature("us1", 4.2, json!({"alert": "red", "tsunami": 1})));
        assert_eq!(event.severity, Some(SeverityLevel::Minor));
        assert_eq!(event.alert_level, Some(AlertLevel::Red));
        assert_eq!(event.tsunami, Some(true));
        assert!(event.description.contains("⚠️ TSUNAMI WARNING ISSUED."));
    }

    #[test]
    fn test_zero_intensities_are_omitted() {
        let event = transform_feature(feature("us2", 2.1, json!({"felt": 0, "mmi": 0.0, "cdi": 0.0})));
        assert!(event.felt.is_none());
        assert!(event.mmi.is_none());
        assert!(event.cdi.is_none());
        assert!(!event.description.contains("Felt by"));
    }

    #[test]
    fn test_null_magnitude_is_treated_as_zero() {
        let mut f = feature("us3", 0.0, json!({}));
        f.properties.mag = None;
        let event = transform_feature(f);
        assert_eq!(event.magnitude, Some(0.0));
        assert_eq!(event.title, "M0.0 Earthquake - 12 km SSW of Ridgecrest, CA");
    }

    #[test]
    fn test_combine_feeds_dedups_by_id_in_feed_order() {
        let hour = UsgsResponse {
            features: vec![feature_json("a", 1.2, json!({})), feature_json("b", 2.0, json!({}))],
        };
        let significant = UsgsResponse {
            features: vec![feature_json("b", 6.1, json!({})), feature_json("c", 7.0, json!({}))],
        };

        let events = combine_feeds(vec![Some(hour), None, Some(significant)]);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["usgs-a", "usgs-b", "usgs-c"]);
        // first occurrence wins
        assert_eq!(events[1].magnitude, Some(2.0));
    }

    #[test]
    fn test_malformed_feature_is_skipped() {
        let day = UsgsResponse {
            features: vec![
                feature_json("good", 3.1, json!({"tsunami": null})),
                json!({"type": "Feature", "id": "bad", "properties": {"mag": 2.0}, "geometry": null}),
                feature_json("also-good", 4.0, json!({})),
            ],
        };

        let events = combine_feeds(vec![Some(day)]);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["usgs-good", "usgs-also-good"]);
        assert_eq!(events[0].tsunami, Some(false));
    }
}
