//! Location lookup via the `OpenMeteo` geocoding API
//!
//! Free text is either a `lat,lon` pair, resolved locally, or a place name
//! that is geocoded upstream.

use crate::GeoAlertError;
use crate::http::HttpClient;
use crate::models::Location;
use crate::weather::open_meteo::{self, GeocodingResponse, GeocodingResult};
use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

/// Names shorter than this are not sent upstream
pub const MIN_GEOCODE_QUERY_CHARS: usize = 3;

impl From<GeocodingResult> for Location {
    fn from(geocoding: GeocodingResult) -> Self {
        let name = if let Some(state) = geocoding.admin1 {
            format!("{}, {}", geocoding.name, state)
        } else {
            geocoding.name
        };

        Location::with_country(
            geocoding.latitude,
            geocoding.longitude,
            name,
            geocoding.country.unwrap_or_default(),
        )
    }
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse location input as coordinates, falling back to a place name
    #[must_use]
    pub fn parse(input: &str) -> LocationInput {
        let input = input.trim();

        match Self::parse_coordinates(input) {
            Ok((lat, lon)) => LocationInput::Coordinates(lat, lon),
            Err(_) => LocationInput::Name(input.to_string()),
        }
    }

    /// Parse coordinates from string like "46.8182,8.2275" or "46.8182 8.2275"
    pub fn parse_coordinates(input: &str) -> Result<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(
                GeoAlertError::validation("Coordinates must be in format 'lat,lon'").into(),
            );
        }

        let lat = parts[0]
            .parse::<f64>()
            .with_context(|| format!("Invalid latitude: {}", parts[0]))?;
        let lon = parts[1]
            .parse::<f64>()
            .with_context(|| format!("Invalid longitude: {}", parts[1]))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoAlertError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            ))
            .into());
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeoAlertError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            ))
            .into());
        }

        Ok((lat, lon))
    }
}

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, region, etc.)
    Name(String),
}

/// Geocoding client
#[derive(Clone)]
pub struct Geocoder {
    client: HttpClient,
    url: String,
}

impl Geocoder {
    #[must_use]
    pub fn new(client: HttpClient, url: String) -> Self {
        Self { client, url }
    }

    /// Up to five matches for a place name, English names.
    /// Queries shorter than three characters return nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, name: &str) -> Result<Vec<Location>> {
        let name = name.trim();
        if name.chars().count() < MIN_GEOCODE_QUERY_CHARS {
            debug!("Geocoding query '{}' too short", name);
            return Ok(Vec::new());
        }

        let url = open_meteo::geocoding_url(&self.url, name);
        let response: GeocodingResponse = self.client.get_json(&url).await?;
        let locations: Vec<Location> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(Location::from)
            .collect();

        if locations.is_empty() {
            warn!("No results found for location '{}'", name);
        } else {
            info!("Found {} geocoding results for '{}'", locations.len(), name);
        }

        Ok(locations)
    }

    /// Resolve free text into a single location
    pub async fn resolve(&self, input: &str) -> Result<Location> {
        match LocationParser::parse(input) {
            LocationInput::Coordinates(lat, lon) => {
                Ok(Location::new(lat, lon, format!("{lat:.4}, {lon:.4}")))
            }
            LocationInput::Name(name) => self
                .search(&name)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| GeoAlertError::validation(format!("Location not found: {name}")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn test_location_parser_coordinates() {
        assert_eq!(
            LocationParser::parse("46.8182,8.2275"),
            LocationInput::Coordinates(46.8182, 8.2275)
        );
        assert_eq!(
            LocationParser::parse("46.8182 8.2275"),
            LocationInput::Coordinates(46.8182, 8.2275)
        );
        assert_eq!(
            LocationParser::parse("-46.8182, -8.2275"),
            LocationInput::Coordinates(-46.8182, -8.2275)
        );
    }

    #[test]
    fn test_location_parser_invalid_coordinates() {
        // out of range values are treated as names
        assert!(matches!(LocationParser::parse("91.0,8.0"), LocationInput::Name(_)));
        assert!(matches!(LocationParser::parse("46.0,-181.0"), LocationInput::Name(_)));
        assert!(matches!(LocationParser::parse("46.0"), LocationInput::Name(_)));
        assert!(matches!(LocationParser::parse("46.0,8.0,0.0"), LocationInput::Name(_)));
    }

    #[test]
    fn test_location_parser_names() {
        assert_eq!(
            LocationParser::parse("  Mexico City "),
            LocationInput::Name("Mexico City".to_string())
        );
    }

    #[test]
    fn test_geocoding_result_to_location() {
        let geocoding = GeocodingResult {
            name: "Springfield".to_string(),
            latitude: 39.8017,
            longitude: -89.6436,
            country: Some("United States".to_string()),
            admin1: Some("Illinois".to_string()),
        };

        let location: Location = geocoding.into();
        assert_eq!(location.name, "Springfield, Illinois");
        assert_eq!(location.latitude, 39.8017);
        assert_eq!(location.country.as_deref(), Some("United States"));
    }

    #[tokio::test]
    async fn test_short_queries_skip_the_network() {
        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let geocoder = Geocoder::new(client, "http://127.0.0.1:1/search".to_string());
        assert!(geocoder.search("ab").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_coordinates_is_local() {
        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let geocoder = Geocoder::new(client, "http://127.0.0.1:1/search".to_string());
        let location = geocoder.resolve("35.6762, 139.6503").await.unwrap();
        assert_eq!(location.name, "35.6762, 139.6503");
        assert_eq!(location.longitude, 139.6503);
    }
}
