//! Normalized disaster events shared by every feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event categories shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisasterCategory {
    Earthquakes,
    Floods,
    Wildfires,
    SevereStorms,
    Volcanoes,
    Weather,
}

impl DisasterCategory {
    pub const ALL: [DisasterCategory; 6] = [
        DisasterCategory::Earthquakes,
        DisasterCategory::Floods,
        DisasterCategory::Wildfires,
        DisasterCategory::SevereStorms,
        DisasterCategory::Volcanoes,
        DisasterCategory::Weather,
    ];

    /// Identifier used in JSON, CSV and query strings
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DisasterCategory::Earthquakes => "earthquakes",
            DisasterCategory::Floods => "floods",
            DisasterCategory::Wildfires => "wildfires",
            DisasterCategory::SevereStorms => "severeStorms",
            DisasterCategory::Volcanoes => "volcanoes",
            DisasterCategory::Weather => "weather",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DisasterCategory::Earthquakes => "Earthquakes",
            DisasterCategory::Floods => "Floods",
            DisasterCategory::Wildfires => "Wildfires",
            DisasterCategory::SevereStorms => "Storms",
            DisasterCategory::Volcanoes => "Volcanoes",
            DisasterCategory::Weather => "Weather",
        }
    }

    /// Marker colour as a hex string
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            DisasterCategory::Earthquakes => "#ff0055",
            DisasterCategory::Floods => "#00a8ff",
            DisasterCategory::Wildfires => "#ff6600",
            DisasterCategory::SevereStorms => "#bf00ff",
            DisasterCategory::Volcanoes => "#ff3300",
            DisasterCategory::Weather => "#00f5ff",
        }
    }

    /// Parse a category identifier, accepting the label spelling as well
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| {
            category.as_str().eq_ignore_ascii_case(value) || category.label().eq_ignore_ascii_case(value)
        })
    }
}

impl fmt::Display for DisasterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an event, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Minor,
    Moderate,
    Severe,
    Extreme,
    Catastrophic,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Minor,
        SeverityLevel::Moderate,
        SeverityLevel::Severe,
        SeverityLevel::Extreme,
        SeverityLevel::Catastrophic,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Minor => "minor",
            SeverityLevel::Moderate => "moderate",
            SeverityLevel::Severe => "severe",
            SeverityLevel::Extreme => "extreme",
            SeverityLevel::Catastrophic => "catastrophic",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::Minor => "Minor",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
            SeverityLevel::Extreme => "Extreme",
            SeverityLevel::Catastrophic => "Catastrophic",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PAGER-style alert colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "green" => Some(AlertLevel::Green),
            "yellow" => Some(AlertLevel::Yellow),
            "orange" => Some(AlertLevel::Orange),
            "red" => Some(AlertLevel::Red),
            _ => None,
        }
    }
}

/// Upstream reference for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSource {
    pub id: String,
    pub url: String,
}

/// Human geography derived from the upstream place description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_city: Option<String>,
    /// Kilometres from `nearest_city`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_city: Option<u32>,
}

/// A single natural event from any feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: DisasterCategory,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    pub date: DateTime<Utc>,
    pub sources: Vec<EventSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    /// Hypocentre depth in km
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<SeverityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_level: Option<AlertLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_affected: Option<u64>,
    /// Radius in km
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<EventLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsunami: Option<bool>,
    /// Number of "did you feel it" reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub felt: Option<u64>,
    /// Modified Mercalli Intensity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmi: Option<f64>,
    /// Community Decimal Intensity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdi: Option<f64>,
    /// Significance (0-1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl DisasterEvent {
    /// Minimal event, used by feed transforms before enrichment
    #[must_use]
    pub fn new(
        id: String,
        title: String,
        description: String,
        category: DisasterCategory,
        coordinates: [f64; 2],
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            category,
            coordinates,
            date,
            sources: Vec::new(),
            closed: None,
            magnitude: None,
            depth: None,
            severity: None,
            alert_level: None,
            estimated_affected: None,
            impact_radius: None,
            location: None,
            tsunami: None,
            felt: None,
            mmi: None,
            cdi: None,
            sig: None,
            status: None,
            event_type: None,
        }
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Coordinates rounded to two decimals, used to spot the same place across feeds
    #[must_use]
    pub fn coordinate_key(&self) -> CoordinateKey {
        CoordinateKey::new(self.longitude(), self.latitude())
    }

    /// Severe, extreme or catastrophic
    #[must_use]
    pub fn is_severe(&self) -> bool {
        self.severity.is_some_and(|s| s >= SeverityLevel::Severe)
    }

    /// Severity with the dashboard's fallback for events that carry none
    #[must_use]
    pub fn effective_severity(&self) -> SeverityLevel {
        self.severity.unwrap_or(SeverityLevel::Minor)
    }

    #[must_use]
    pub fn nearest_city(&self) -> Option<&str> {
        self.location.as_ref()?.nearest_city.as_deref()
    }
}

/// Longitude/latitude rounded to two decimals.
///
/// Rounding works on the exact binary value, so 1.115 (stored just below
/// 1.115) keys as `1.11`. Exact halves round away from zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lon: String,
    lat: String,
}

impl CoordinateKey {
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            lon: two_decimals(longitude),
            lat: two_decimals(latitude),
        }
    }
}

fn two_decimals(value: f64) -> String {
    // multiples of 1/8 are the only doubles exactly halfway between hundredths
    if (value * 8.0).fract() == 0.0 {
        let magnitude = (value.abs() * 100.0).round() / 100.0;
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}{magnitude:.2}");
    }
    format!("{value:.2}")
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}

/// Impact figures derived from an earthquake magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactAssessment {
    pub severity: SeverityLevel,
    pub alert_level: AlertLevel,
    pub estimated_affected: u64,
    pub impact_radius_km: u32,
}

/// Fixed magnitude threshold table
#[must_use]
pub fn assess_magnitude(magnitude: f64) -> ImpactAssessment {
    let (severity, alert_level, estimated_affected, impact_radius_km) = if magnitude >= 8.0 {
        (SeverityLevel::Catastrophic, AlertLevel::Red, 10_000_000, 500)
    } else if magnitude >= 7.0 {
        (SeverityLevel::Extreme, AlertLevel::Red, 1_000_000, 250)
    } else if magnitude >= 6.0 {
        (SeverityLevel::Severe, AlertLevel::Orange, 100_000, 100)
    } else if magnitude >= 5.0 {
        (SeverityLevel::Moderate, AlertLevel::Yellow, 10_000, 50)
    } else if magnitude >= 4.0 {
        (SeverityLevel::Minor, AlertLevel::Yellow, 1_000, 20)
    } else {
        (SeverityLevel::Minor, AlertLevel::Green, 100, 10)
    };

    ImpactAssessment {
        severity,
        alert_level,
        estimated_affected,
        impact_radius_km,
    }
}
