//! `OpenMeteo` API response structures and request URLs

use serde::Deserialize;

/// Current fields requested from the forecast endpoint
pub const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "apparent_temperature",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "relative_humidity_2m",
    "is_day",
    "precipitation",
    "cloud_cover",
    "pressure_msl",
    "surface_pressure",
    "dew_point_2m",
];

/// Daily fields requested from the forecast endpoint
pub const DAILY_FIELDS: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "sunrise",
    "sunset",
    "uv_index_max",
    "precipitation_probability_max",
];

/// Air-quality fields attached to city weather
pub const WEATHER_AQI_FIELDS: &[&str] = &["us_aqi", "pm10", "pm2_5"];

/// Air-quality fields for the pollutant ranking
pub const POLLUTANT_FIELDS: &[&str] = &[
    "us_aqi",
    "pm10",
    "pm2_5",
    "carbon_monoxide",
    "nitrogen_dioxide",
    "sulphur_dioxide",
    "ozone",
];

#[must_use]
pub fn forecast_url(base: &str, lat: f64, lon: f64) -> String {
    format!(
        "{base}?latitude={lat}&longitude={lon}&current={}&daily={}&timezone=auto",
        CURRENT_FIELDS.join(","),
        DAILY_FIELDS.join(",")
    )
}

#[must_use]
pub fn air_quality_url(base: &str, lat: f64, lon: f64, fields: &[&str]) -> String {
    format!(
        "{base}?latitude={lat}&longitude={lon}&current={}",
        fields.join(",")
    )
}

#[must_use]
pub fn geocoding_url(base: &str, name: &str) -> String {
    format!(
        "{base}?name={}&count=5&language=en&format=json",
        urlencoding::encode(name)
    )
}

/// Forecast response; only the blocks we request are modelled
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub current: Option<CurrentData>,
    pub daily: Option<DailyData>,
}

/// Current conditions
#[derive(Debug, Deserialize)]
pub struct CurrentData {
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    #[serde(rename = "apparent_temperature")]
    pub feels_like: Option<f64>,
    pub weather_code: Option<u32>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction: Option<f64>,
    #[serde(rename = "wind_gusts_10m")]
    pub wind_gusts: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: Option<f64>,
    pub is_day: Option<u8>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub pressure_msl: Option<f64>,
    pub surface_pressure: Option<f64>,
    #[serde(rename = "dew_point_2m")]
    pub dew_point: Option<f64>,
}

/// Daily aggregates, index 0 is today
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DailyData {
    #[serde(rename = "temperature_2m_max")]
    pub temperature_max: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_min")]
    pub temperature_min: Vec<Option<f64>>,
    pub sunrise: Vec<Option<String>>,
    pub sunset: Vec<Option<String>>,
    pub uv_index_max: Vec<Option<f64>>,
    pub precipitation_probability_max: Vec<Option<f64>>,
}

impl DailyData {
    #[must_use]
    pub fn today<T: Clone>(values: &[Option<T>]) -> Option<T> {
        values.first().cloned().flatten()
    }
}

/// Air-quality response
#[derive(Debug, Deserialize)]
pub struct AirQualityResponse {
    pub current: Option<AirQualityCurrent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AirQualityCurrent {
    pub us_aqi: Option<f64>,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub sulphur_dioxide: Option<f64>,
    pub ozone: Option<f64>,
}

/// Geocoding response
#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    pub results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub admin1: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_url() {
        let url = forecast_url("https://api.open-meteo.com/v1/forecast", 51.5074, -0.1278);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=51.5074&longitude=-0.1278"));
        assert!(url.contains("current=temperature_2m,apparent_temperature,weather_code"));
        assert!(url.contains("daily=temperature_2m_max,temperature_2m_min,sunrise,sunset"));
        assert!(url.ends_with("&timezone=auto"));
    }

    #[test]
    fn test_geocoding_url_encodes_name() {
        let url = geocoding_url("https://geocoding-api.open-meteo.com/v1/search", "São Paulo");
        assert_eq!(
            url,
            "https://geocoding-api.open-meteo.com/v1/search?name=S%C3%A3o%20Paulo&count=5&language=en&format=json"
        );
    }

    #[test]
    fn test_daily_today_handles_missing_and_null() {
        let daily: DailyData = serde_json::from_str(r#"{"temperature_2m_max": [null, 20.0]}"#).unwrap();
        assert_eq!(DailyData::today(&daily.temperature_max), None);
        assert_eq!(DailyData::today(&daily.temperature_min), None);
    }
}
