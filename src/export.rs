//! JSON and CSV exports and share links

use crate::models::{CityWeather, DisasterCategory, DisasterEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CSV_HEADERS: [&str; 11] = [
    "ID",
    "Title",
    "Category",
    "Severity",
    "Magnitude",
    "Depth",
    "Latitude",
    "Longitude",
    "Date",
    "Estimated Affected",
    "Description",
];

/// Which events an export contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    #[default]
    All,
    /// Severe, extreme and catastrophic events
    Severe,
    Earthquakes,
}

impl ExportScope {
    #[must_use]
    pub fn select(self, events: &[DisasterEvent]) -> Vec<DisasterEvent> {
        events
            .iter()
            .filter(|e| match self {
                ExportScope::All => true,
                ExportScope::Severe => e.is_severe(),
                ExportScope::Earthquakes => e.category == DisasterCategory::Earthquakes,
            })
            .cloned()
            .collect()
    }
}

impl FromStr for ExportScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ExportScope::All),
            "severe" => Ok(ExportScope::Severe),
            "earthquakes" => Ok(ExportScope::Earthquakes),
            other => Err(format!(
                "unknown export scope '{other}', expected one of all, severe, earthquakes"
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub disasters: &'a [DisasterEvent],
    pub weather: &'a [CityWeather],
    pub exported_at: String,
}

/// Pretty-printed `{disasters, weather, exportedAt}`
pub fn to_json(
    disasters: &[DisasterEvent],
    weather: &[CityWeather],
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let document = ExportDocument {
        disasters,
        weather,
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    serde_json::to_string_pretty(&document).with_context(|| "Failed to serialize export")
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Missing and zero values become empty cells
fn optional_number<T: Default + PartialEq + ToString>(value: Option<T>) -> String {
    match value {
        Some(v) if v != T::default() => v.to_string(),
        _ => String::new(),
    }
}

fn csv_row(event: &DisasterEvent) -> String {
    let cells = [
        event.id.clone(),
        quoted(&event.title),
        event.category.as_str().to_string(),
        event
            .severity
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        optional_number(event.magnitude),
        optional_number(event.depth),
        event.latitude().to_string(),
        event.longitude().to_string(),
        event.date.to_rfc3339_opts(SecondsFormat::Millis, true),
        optional_number(event.estimated_affected),
        quoted(&event.description),
    ];
    cells.join(",")
}

/// Header plus one row per event, `\n` separated without a trailing newline
#[must_use]
pub fn to_csv(events: &[DisasterEvent]) -> String {
    std::iter::once(CSV_HEADERS.join(","))
        .chain(events.iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What a share link points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareTarget {
    Event(String),
    City(String),
}

impl ShareTarget {
    #[must_use]
    pub fn link(&self, origin: &str) -> String {
        match self {
            ShareTarget::Event(id) => format!("{origin}?event={id}"),
            ShareTarget::City(name) => format!("{origin}?city={}", urlencoding::encode(name)),
        }
    }

    /// Read `event` or `city` from the query part of a link or a bare query string
    #[must_use]
    pub fn parse(link: &str) -> Option<Self> {
        let query = link.split_once('?').map_or(link, |(_, q)| q);

        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = urlencoding::decode(value).ok()?.into_owned();
            if value.is_empty() {
                return None;
            }
            match key {
                "event" => Some(ShareTarget::Event(value)),
                "city" => Some(ShareTarget::City(value)),
                _ => None,
            }
        })
    }
}

impl fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareTarget::Event(id) => write!(f, "event {id}"),
            ShareTarget::City(name) => write!(f, "city {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeverityLevel;

    fn date() -> DateTime<Utc> {
        "2024-08-02T12:00:00Z".parse().unwrap()
    }

    fn quake() -> DisasterEvent {
        let mut event = DisasterEvent::new(
            "usgs-ci123".to_string(),
            "M6.5 Earthquake - 10 km N of \"Ridgecrest\"".to_string(),
            "Severe, shallow".to_string(),
            DisasterCategory::Earthquakes,
            [-117.6, 35.7],
            date(),
        );
        event.magnitude = Some(6.5);
        event.depth = Some(0.0);
        event.severity = Some(SeverityLevel::Severe);
        event.estimated_affected = Some(100_000);
        event
    }

    fn fire() -> DisasterEvent {
        DisasterEvent::new(
            "EONET_1".to_string(),
            "Park Fire".to_string(),
            "Active Wildfires detected".to_string(),
            DisasterCategory::Wildfires,
            [-121.5, 39.8],
            date(),
        )
    }

    #[test]
    fn test_csv_layout_and_quoting() {
        let csv = to_csv(&[quake(), fire()]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "ID,Title,Category,Severity,Magnitude,Depth,Latitude,Longitude,Date,Estimated Affected,Description"
        );
        assert_eq!(
            lines[1],
            "usgs-ci123,\"M6.5 Earthquake - 10 km N of \"\"Ridgecrest\"\"\",earthquakes,severe,6.5,,35.7,-117.6,2024-08-02T12:00:00.000Z,100000,\"Severe, shallow\""
        );
        assert_eq!(
            lines[2],
            "EONET_1,\"Park Fire\",wildfires,,,,39.8,-121.5,2024-08-02T12:00:00.000Z,,\"Active Wildfires detected\""
        );
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        assert_eq!(to_csv(&[]), CSV_HEADERS.join(","));
    }

    #[test]
    fn test_json_export() {
        let json = to_json(&[fire()], &[], date()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["exportedAt"], "2024-08-02T12:00:00.000Z");
        assert_eq!(value["disasters"][0]["id"], "EONET_1");
        assert!(value["weather"].as_array().unwrap().is_empty());
        assert!(json.contains("\n  "));
    }

    #[test]
    fn test_export_scopes() {
        let events = vec![quake(), fire()];
        assert_eq!(ExportScope::All.select(&events).len(), 2);
        assert_eq!(ExportScope::Severe.select(&events)[0].id, "usgs-ci123");
        assert_eq!(ExportScope::Earthquakes.select(&events).len(), 1);
        assert_eq!("severe".parse::<ExportScope>(), Ok(ExportScope::Severe));
        assert!("none".parse::<ExportScope>().is_err());
    }

    #[test]
    fn test_share_links() {
        let origin = "https://geoalert.example";
        let event = ShareTarget::Event("usgs-ci123".to_string());
        assert_eq!(event.link(origin), "https://geoalert.example?event=usgs-ci123");

        let city = ShareTarget::City("São Paulo".to_string());
        let link = city.link(origin);
        assert_eq!(link, "https://geoalert.example?city=S%C3%A3o%20Paulo");
        assert_eq!(ShareTarget::parse(&link), Some(city));
        assert_eq!(ShareTarget::parse(&event.link(origin)), Some(event));
    }

    #[test]
    fn test_share_parse_ignores_unrelated_params() {
        assert_eq!(
            ShareTarget::parse("utm=x&city=Tokyo"),
            Some(ShareTarget::City("Tokyo".to_string()))
        );
        assert_eq!(ShareTarget::parse("https://geoalert.example"), None);
        assert_eq!(ShareTarget::parse("?event="), None);
    }
}
