//! Air-quality ranking across the monitored cities

use crate::GeoAlertError;
use crate::config::OpenMeteoConfig;
use crate::http::{HttpClient, fetch_in_batches};
use crate::models::{AirQualityReading, AqiLevel, City};
use crate::weather::open_meteo::{self, AirQualityResponse};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

fn round_u32(value: Option<f64>) -> u32 {
    value.unwrap_or(0.0).round().max(0.0) as u32
}

/// Build a reading from an air-quality response
pub fn reading_from(city: &City, response: AirQualityResponse) -> Result<AirQualityReading> {
    let current = response.current.ok_or_else(|| {
        GeoAlertError::api(format!("No current air quality data for {}", city.name))
    })?;

    let aqi = round_u32(current.us_aqi);
    Ok(AirQualityReading {
        city: city.name.clone(),
        country: city.country.clone(),
        region: city.region.clone(),
        coordinates: [city.lon, city.lat],
        aqi,
        aqi_level: AqiLevel::from_aqi(f64::from(aqi)),
        pm25: round_u32(current.pm2_5),
        pm10: round_u32(current.pm10),
        ozone: round_u32(current.ozone),
        no2: round_u32(current.nitrogen_dioxide),
        so2: round_u32(current.sulphur_dioxide),
        co: round_u32(current.carbon_monoxide),
    })
}

/// Search text and region filter for the ranking
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirQualityQuery {
    pub search: Option<String>,
    /// Region name, or `all`
    pub region: Option<String>,
}

impl AirQualityQuery {
    fn matches(&self, reading: &AirQualityReading) -> bool {
        let region_ok = match self.region.as_deref() {
            None | Some("") | Some("all") => true,
            Some(region) => reading.region == region,
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(search) => {
                let needle = search.to_lowercase();
                reading.city.to_lowercase().contains(&needle)
                    || reading.country.to_lowercase().contains(&needle)
            }
        };

        region_ok && search_ok
    }

    /// Filtered readings, worst AQI first
    #[must_use]
    pub fn apply(&self, readings: &[AirQualityReading]) -> Vec<AirQualityReading> {
        let mut filtered: Vec<AirQualityReading> =
            readings.iter().filter(|r| self.matches(r)).cloned().collect();
        filtered.sort_by(|a, b| b.aqi.cmp(&a.aqi));
        filtered
    }
}

/// Headline numbers for a set of readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualitySummary {
    pub count: usize,
    /// Rounded mean AQI
    pub average: u32,
    pub worst: Option<AirQualityReading>,
    pub best: Option<AirQualityReading>,
}

impl AirQualitySummary {
    #[must_use]
    pub fn from_readings(readings: &[AirQualityReading]) -> Self {
        if readings.is_empty() {
            return Self {
                count: 0,
                average: 0,
                worst: None,
                best: None,
            };
        }

        let total: u64 = readings.iter().map(|r| u64::from(r.aqi)).sum();
        let average = (total as f64 / readings.len() as f64).round() as u32;

        Self {
            count: readings.len(),
            average,
            worst: readings.iter().max_by_key(|r| r.aqi).cloned(),
            best: readings.iter().min_by_key(|r| r.aqi).cloned(),
        }
    }
}

/// Client for the air-quality ranking
#[derive(Clone)]
pub struct AirQualityService {
    client: HttpClient,
    config: OpenMeteoConfig,
}

impl AirQualityService {
    #[must_use]
    pub fn new(client: HttpClient, config: OpenMeteoConfig) -> Self {
        Self { client, config }
    }

    #[instrument(skip(self, city), fields(city = %city.name))]
    pub async fn fetch_city(&self, city: &City) -> Result<AirQualityReading> {
        let url = open_meteo::air_quality_url(
            &self.config.air_quality_url,
            city.lat,
            city.lon,
            open_meteo::POLLUTANT_FIELDS,
        );
        let response: AirQualityResponse = self.client.get_json(&url).await?;
        reading_from(city, response)
    }

    /// Fetch every city in batches, worst AQI first.
    /// Fails only when no city could be fetched.
    pub async fn fetch_air_quality(&self, cities: &[City]) -> Result<Vec<AirQualityReading>> {
        let mut readings = fetch_in_batches(cities, "air quality", |city| self.fetch_city(city)).await;

        if readings.is_empty() && !cities.is_empty() {
            return Err(GeoAlertError::unavailable(
                "Unable to fetch air quality data for any city",
            )
            .into());
        }

        readings.sort_by(|a, b| b.aqi.cmp(&a.aqi));
        info!("Fetched air quality for {}/{} cities", readings.len(), cities.len());
        Ok(readings)
    }
}
