//! City weather model and display helpers

use super::air_quality::AqiLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current conditions and today's outlook for one city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityWeather {
    pub city: String,
    pub country: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    /// Temperature in Celsius
    pub temperature: i32,
    pub feels_like: i32,
    pub temp_min: i32,
    pub temp_max: i32,
    /// WMO weather interpretation code
    pub weather_code: u32,
    pub description: String,
    /// Wind speed in km/h
    pub wind_speed: i32,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    pub wind_gusts: i32,
    /// Relative humidity percentage
    pub humidity: u32,
    pub is_day: bool,
    /// Atmospheric pressure in hPa
    pub pressure: i32,
    /// Visibility in kilometers
    pub visibility: u32,
    pub uv_index: i32,
    pub cloud_cover: u32,
    /// Precipitation amount in mm
    pub precipitation: f64,
    pub precipitation_probability: u32,
    pub dew_point: i32,
    pub air_quality_index: u32,
    pub air_quality_level: AqiLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    /// Local ISO time as reported upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
}

impl CityWeather {
    #[must_use]
    pub fn format_temperature(&self, unit: TemperatureUnit) -> String {
        unit.format(f64::from(self.temperature))
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        let direction = wind_direction_to_cardinal(f64::from(self.wind_direction));
        format!(
            "{} km/h {} (gusts {} km/h)",
            self.wind_speed, direction, self.wind_gusts
        )
    }
}

/// Display unit for temperatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Format a Celsius value in this unit, rounded to whole degrees
    #[must_use]
    pub fn format(self, celsius: f64) -> String {
        match self {
            TemperatureUnit::Celsius => format!("{}°C", celsius.round()),
            TemperatureUnit::Fahrenheit => format!("{}°F", (celsius * 9.0 / 5.0 + 32.0).round()),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(format!("unknown temperature unit '{other}'")),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("celsius"),
            TemperatureUnit::Fahrenheit => f.write_str("fahrenheit"),
        }
    }
}

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Convert wind direction from degrees to one of 16 compass points
#[must_use]
pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
    let index = (degrees / 22.5).round().rem_euclid(16.0) as usize;
    CARDINALS[index % 16]
}

/// Human-readable WMO weather code
#[must_use]
pub fn weather_code_description(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
