//! `GeoAlert` - real-time disaster, weather and air quality aggregation
//!
//! This library polls NASA EONET, the USGS earthquake feeds and Open-Meteo,
//! normalizes everything into one event model and serves the result through
//! a CLI and a JSON API.

pub mod air_quality;
pub mod alerts;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod feeds;
pub mod geocoding;
pub mod http;
pub mod logging;
pub mod models;
pub mod search;
pub mod stats;
pub mod timeline;
pub mod weather;
pub mod web;
pub mod world;

// Re-export core types for public API
pub use config::GeoAlertConfig;
pub use dashboard::{Dashboard, Snapshot};
pub use error::GeoAlertError;
pub use feeds::{DisasterFeeds, merge_events};
pub use geocoding::{Geocoder, LocationInput, LocationParser};
pub use http::HttpClient;
pub use models::{
    AirQualityReading, City, CityWeather, DisasterCategory, DisasterEvent, Location,
    SeverityLevel, assess_magnitude,
};
pub use world::{RegionalWeather, WeatherComparison, WeatherQuery};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, GeoAlertError>;
