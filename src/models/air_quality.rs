//! US AQI levels and per-city air-quality readings

use serde::{Deserialize, Serialize};

/// US EPA AQI band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiLevel {
    /// Band for an index value; upper bounds are inclusive
    #[must_use]
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiLevel::Good
        } else if aqi <= 100.0 {
            AqiLevel::Moderate
        } else if aqi <= 150.0 {
            AqiLevel::UnhealthySensitive
        } else if aqi <= 200.0 {
            AqiLevel::Unhealthy
        } else if aqi <= 300.0 {
            AqiLevel::VeryUnhealthy
        } else {
            AqiLevel::Hazardous
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::UnhealthySensitive => "Unhealthy for Sensitive",
            AqiLevel::Unhealthy => "Unhealthy",
            AqiLevel::VeryUnhealthy => "Very Unhealthy",
            AqiLevel::Hazardous => "Hazardous",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            AqiLevel::Good => "#22c55e",
            AqiLevel::Moderate => "#eab308",
            AqiLevel::UnhealthySensitive => "#f97316",
            AqiLevel::Unhealthy => "#ef4444",
            AqiLevel::VeryUnhealthy => "#7c3aed",
            AqiLevel::Hazardous => "#991b1b",
        }
    }
}

/// Current pollutant readings for one city, all values rounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityReading {
    pub city: String,
    pub country: String,
    pub region: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    pub aqi: u32,
    pub aqi_level: AqiLevel,
    pub pm25: u32,
    pub pm10: u32,
    pub ozone: u32,
    pub no2: u32,
    pub so2: u32,
    pub co: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, AqiLevel::Good)]
    #[case(50.0, AqiLevel::Good)]
    #[case(51.0, AqiLevel::Moderate)]
    #[case(100.0, AqiLevel::Moderate)]
    #[case(150.0, AqiLevel::UnhealthySensitive)]
    #[case(151.0, AqiLevel::Unhealthy)]
    #[case(300.0, AqiLevel::VeryUnhealthy)]
    #[case(301.0, AqiLevel::Hazardous)]
    fn test_aqi_thresholds(#[case] aqi: f64, #[case] expected: AqiLevel) {
        assert_eq!(AqiLevel::from_aqi(aqi), expected);
    }

    #[test]
    fn test_aqi_level_serialization() {
        let json = serde_json::to_string(&AqiLevel::UnhealthySensitive).unwrap();
        assert_eq!(json, "\"unhealthy-sensitive\"");
        assert_eq!(AqiLevel::VeryUnhealthy.label(), "Very Unhealthy");
    }
}
