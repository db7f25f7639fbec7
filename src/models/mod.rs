//! Data models for the `GeoAlert` application
//!
//! This module contains the core domain models organized by concern:
//! - Disaster: normalized events from every feed
//! - Weather: current conditions per city
//! - Air quality: AQI bands and pollutant readings
//! - Location: coordinates and the built-in city lists

pub mod air_quality;
pub mod disaster;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use air_quality::{AirQualityReading, AqiLevel};
pub use disaster::{
    AlertLevel, CoordinateKey, DisasterCategory, DisasterEvent, EventLocation, EventSource,
    ImpactAssessment, SeverityLevel, assess_magnitude,
};
pub use location::{
    City, Location, REGIONS, air_quality_cities, dashboard_cities, world_cities,
};
pub use weather::{CityWeather, TemperatureUnit, weather_code_description, wind_direction_to_cardinal};
