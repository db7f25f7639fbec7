//! City weather from `OpenMeteo`

pub mod open_meteo;

use crate::GeoAlertError;
use crate::config::OpenMeteoConfig;
use crate::http::HttpClient;
use crate::models::{AqiLevel, City, CityWeather, weather_code_description};
use anyhow::Result;
use open_meteo::{AirQualityResponse, DailyData, ForecastResponse};
use tracing::{debug, info, instrument, warn};

/// Pressure used when the API reports neither sea-level nor surface pressure
const STANDARD_PRESSURE_HPA: f64 = 1013.0;
/// `OpenMeteo` has no visibility field
const DEFAULT_VISIBILITY_KM: u32 = 10;

fn round_i32(value: f64) -> i32 {
    value.round() as i32
}

fn round_u32(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Build a [`CityWeather`] from a forecast and an optional air-quality response
pub fn city_weather_from(
    city: &City,
    forecast: ForecastResponse,
    air_quality: Option<AirQualityResponse>,
) -> Result<CityWeather> {
    let current = forecast.current.ok_or_else(|| {
        GeoAlertError::api(format!("No current weather data available for {}", city.name))
    })?;
    let daily = forecast.daily.unwrap_or_default();
    let air = air_quality.and_then(|a| a.current).unwrap_or_default();

    let temperature = current.temperature;
    let weather_code = current.weather_code.unwrap_or(0);
    let aqi = round_u32(air.us_aqi.unwrap_or(0.0));

    Ok(CityWeather {
        city: city.name.clone(),
        country: city.country.clone(),
        coordinates: [city.lon, city.lat],
        temperature: round_i32(temperature),
        feels_like: round_i32(current.feels_like.unwrap_or(temperature)),
        temp_min: round_i32(DailyData::today(&daily.temperature_min).unwrap_or(temperature - 3.0)),
        temp_max: round_i32(DailyData::today(&daily.temperature_max).unwrap_or(temperature + 3.0)),
        weather_code,
        description: weather_code_description(weather_code).to_string(),
        wind_speed: round_i32(current.wind_speed.unwrap_or(0.0)),
        wind_direction: current.wind_direction.unwrap_or(0.0).round().rem_euclid(360.0) as u16,
        wind_gusts: round_i32(current.wind_gusts.unwrap_or(0.0)),
        humidity: round_u32(current.humidity.unwrap_or(0.0)),
        is_day: current.is_day == Some(1),
        pressure: round_i32(
            current
                .pressure_msl
                .or(current.surface_pressure)
                .unwrap_or(STANDARD_PRESSURE_HPA),
        ),
        visibility: DEFAULT_VISIBILITY_KM,
        uv_index: round_i32(DailyData::today(&daily.uv_index_max).unwrap_or(0.0)),
        cloud_cover: round_u32(current.cloud_cover.unwrap_or(0.0)),
        precipitation: current.precipitation.unwrap_or(0.0),
        precipitation_probability: round_u32(
            DailyData::today(&daily.precipitation_probability_max).unwrap_or(0.0),
        ),
        dew_point: round_i32(current.dew_point.unwrap_or(0.0)),
        air_quality_index: aqi,
        air_quality_level: AqiLevel::from_aqi(f64::from(aqi)),
        pm25: air.pm2_5.filter(|v| *v != 0.0),
        pm10: air.pm10.filter(|v| *v != 0.0),
        sunrise: DailyData::today(&daily.sunrise),
        sunset: DailyData::today(&daily.sunset),
    })
}

/// Weather client for the forecast and air-quality endpoints
#[derive(Clone)]
pub struct WeatherService {
    client: HttpClient,
    config: OpenMeteoConfig,
}

impl WeatherService {
    #[must_use]
    pub fn new(client: HttpClient, config: OpenMeteoConfig) -> Self {
        Self { client, config }
    }

    /// Current weather for one city. A failing air-quality request is tolerated.
    #[instrument(skip(self, city), fields(city = %city.name))]
    pub async fn fetch_city_weather(&self, city: &City) -> Result<CityWeather> {
        let weather_url = open_meteo::forecast_url(&self.config.forecast_url, city.lat, city.lon);
        let air_url = open_meteo::air_quality_url(
            &self.config.air_quality_url,
            city.lat,
            city.lon,
            open_meteo::WEATHER_AQI_FIELDS,
        );

        let (forecast, air_quality) = futures::join!(
            self.client.get_json::<ForecastResponse>(&weather_url),
            self.client.get_json::<AirQualityResponse>(&air_url)
        );

        let air_quality = match air_quality {
            Ok(response) => Some(response),
            Err(e) => {
                debug!("Air quality unavailable for {}: {:#}", city.name, e);
                None
            }
        };

        city_weather_from(city, forecast?, air_quality)
    }

    /// Forecast only, without the air-quality request
    #[instrument(skip(self, city), fields(city = %city.name))]
    pub async fn fetch_city_forecast(&self, city: &City) -> Result<CityWeather> {
        let url = open_meteo::forecast_url(&self.config.forecast_url, city.lat, city.lon);
        let forecast: ForecastResponse = self.client.get_json(&url).await?;
        city_weather_from(city, forecast, None)
    }

    /// Weather for every city concurrently; failed cities are skipped
    pub async fn fetch_weather_data(&self, cities: &[City]) -> Vec<CityWeather> {
        let results =
            futures::future::join_all(cities.iter().map(|city| self.fetch_city_weather(city))).await;

        let weather: Vec<CityWeather> = results
            .into_iter()
            .zip(cities)
            .filter_map(|(result, city)| match result {
                Ok(weather) => Some(weather),
                Err(e) => {
                    warn!("Failed to fetch weather for {}: {:#}", city.name, e);
                    None
                }
            })
            .collect();

        info!("Fetched weather for {}/{} cities", weather.len(), cities.len());
        weather
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn london() -> City {
        City::new("London", "UK", "Europe", 51.5074, -0.1278)
    }

    fn forecast(value: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_response() {
        let forecast = forecast(json!({
            "current": {
                "temperature_2m": 14.6,
                "apparent_temperature": 12.4,
                "weather_code": 61,
                "wind_speed_10m": 18.3,
                "wind_direction_10m": 225,
                "wind_gusts_10m": 35.7,
                "relative_humidity_2m": 81,
                "is_day": 1,
                "precipitation": 0.4,
                "cloud_cover": 90,
                "pressure_msl": 1008.6,
                "surface_pressure": 1002.1,
                "dew_point_2m": 11.2
            },
            "daily": {
                "temperature_2m_max": [16.2],
                "temperature_2m_min": [9.8],
                "sunrise": ["2024-08-02T05:20"],
                "sunset": ["2024-08-02T20:48"],
                "uv_index_max": [4.35],
                "precipitation_probability_max": [70]
            }
        }));
        let air: AirQualityResponse =
            serde_json::from_value(json!({"current": {"us_aqi": 57, "pm10": 14.2, "pm2_5": 8.1}}))
                .unwrap();

        let weather = city_weather_from(&london(), forecast, Some(air)).unwrap();
        assert_eq!(weather.city, "London");
        assert_eq!(weather.coordinates, [-0.1278, 51.5074]);
        assert_eq!(weather.temperature, 15);
        assert_eq!(weather.feels_like, 12);
        assert_eq!(weather.temp_min, 10);
        assert_eq!(weather.temp_max, 16);
        assert_eq!(weather.description, "Slight rain");
        assert_eq!(weather.wind_speed, 18);
        assert_eq!(weather.wind_direction, 225);
        assert_eq!(weather.wind_gusts, 36);
        assert!(weather.is_day);
        assert_eq!(weather.pressure, 1009);
        assert_eq!(weather.visibility, 10);
        assert_eq!(weather.uv_index, 4);
        assert_eq!(weather.precipitation_probability, 70);
        assert_eq!(weather.air_quality_index, 57);
        assert_eq!(weather.air_quality_level, AqiLevel::Moderate);
        assert_eq!(weather.pm25, Some(8.1));
        assert_eq!(weather.sunrise.as_deref(), Some("2024-08-02T05:20"));
    }

    #[test]
    fn test_fallbacks_without_daily_or_air_quality() {
        let forecast = forecast(json!({
            "current": {"temperature_2m": 20.0, "weather_code": 3, "surface_pressure": 990.4}
        }));

        let weather = city_weather_from(&london(), forecast, None).unwrap();
        assert_eq!(weather.temp_min, 17);
        assert_eq!(weather.temp_max, 23);
        assert_eq!(weather.pressure, 990);
        assert_eq!(weather.air_quality_index, 0);
        assert_eq!(weather.air_quality_level, AqiLevel::Good);
        assert!(weather.pm25.is_none());
        assert!(!weather.is_day);
        assert_eq!(weather.description, "Overcast");
    }

    #[test]
    fn test_standard_pressure_fallback() {
        let forecast = forecast(json!({"current": {"temperature_2m": 1.0}}));
        let weather = city_weather_from(&london(), forecast, None).unwrap();
        assert_eq!(weather.pressure, 1013);
    }

    #[test]
    fn test_missing_current_block_is_an_error() {
        let forecast = forecast(json!({"daily": {}}));
        assert!(city_weather_from(&london(), forecast, None).is_err());
    }
}
