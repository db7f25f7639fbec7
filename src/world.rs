//! World weather explorer and side-by-side city comparison
//!
//! The explorer covers the 90 cities of [`world_cities`](crate::models::world_cities),
//! fetched forecast-only in rate-limited batches. The comparison view holds up
//! to [`MAX_COMPARED_CITIES`] distinct cities and derives the chart series
//! the dashboard draws for them.

use crate::GeoAlertError;
use crate::http::fetch_in_batches;
use crate::models::{City, CityWeather};
use crate::weather::WeatherService;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Cities a comparison can hold
pub const MAX_COMPARED_CITIES: usize = 4;
/// Candidates offered when adding a city to a comparison
pub const MAX_COMPARE_CANDIDATES: usize = 10;

/// City weather tagged with the region it is listed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalWeather {
    #[serde(flatten)]
    pub weather: CityWeather,
    pub region: String,
}

/// Fetch forecasts for every city in batches, keeping the table order.
/// Fails only when no city could be fetched.
#[instrument(skip(service, cities), fields(cities = cities.len()))]
pub async fn fetch_world_weather(
    service: &WeatherService,
    cities: &[City],
) -> Result<Vec<RegionalWeather>> {
    let weather = fetch_in_batches(cities, "world weather", |city| async move {
        let weather = service.fetch_city_forecast(city).await?;
        Ok::<_, anyhow::Error>(RegionalWeather {
            weather,
            region: city.region.clone(),
        })
    })
    .await;

    if weather.is_empty() && !cities.is_empty() {
        return Err(GeoAlertError::unavailable("Unable to fetch weather for any city").into());
    }

    info!("Fetched world weather for {}/{} cities", weather.len(), cities.len());
    Ok(weather)
}

/// Search text and region filter for the explorer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherQuery {
    /// Matches city or country, case-insensitive
    pub search: Option<String>,
    /// Region name, or `all`
    pub region: Option<String>,
}

impl WeatherQuery {
    #[must_use]
    pub fn matches(&self, entry: &RegionalWeather) -> bool {
        let region_ok = match self.region.as_deref() {
            None | Some("" | "all") => true,
            Some(region) => entry.region == region,
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(search) => {
                let needle = search.to_lowercase();
                entry.weather.city.to_lowercase().contains(&needle)
                    || entry.weather.country.to_lowercase().contains(&needle)
            }
        };

        region_ok && search_ok
    }

    /// Matching entries in their original order
    #[must_use]
    pub fn apply(&self, entries: &[RegionalWeather]) -> Vec<RegionalWeather> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

/// Headline figures across every fetched city
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldWeatherSummary {
    pub count: usize,
    /// Mean temperature, halves rounded up
    pub average_temperature: i32,
    /// First city with the highest temperature
    pub hottest: Option<RegionalWeather>,
    /// First city with the lowest temperature
    pub coldest: Option<RegionalWeather>,
}

impl WorldWeatherSummary {
    #[must_use]
    pub fn from_entries(entries: &[RegionalWeather]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let total: i64 = entries.iter().map(|e| i64::from(e.weather.temperature)).sum();
        let mean = total as f64 / entries.len() as f64;

        let mut hottest = &entries[0];
        let mut coldest = &entries[0];
        for entry in &entries[1..] {
            if entry.weather.temperature > hottest.weather.temperature {
                hottest = entry;
            }
            if entry.weather.temperature < coldest.weather.temperature {
                coldest = entry;
            }
        }

        Self {
            count: entries.len(),
            average_temperature: (mean + 0.5).floor() as i32,
            hottest: Some(hottest.clone()),
            coldest: Some(coldest.clone()),
        }
    }
}

/// Temperature bars for one compared city
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureBar {
    pub city: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub city: String,
    pub value: f64,
}

/// One radar axis, scaled so every metric shares a rough 0-100 range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarMetric {
    pub metric: &'static str,
    pub values: Vec<MetricValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView {
    pub cities: Vec<CityWeather>,
    pub temperatures: Vec<TemperatureBar>,
    pub radar: Vec<RadarMetric>,
}

/// Up to four distinct cities, in the order they were added
#[derive(Debug, Clone, Default)]
pub struct WeatherComparison {
    cities: Vec<CityWeather>,
}

impl WeatherComparison {
    /// Pick cities by name from `available`. Names past the cap and repeats
    /// are ignored; a name with no weather is an error.
    pub fn from_names<S: AsRef<str>>(available: &[CityWeather], names: &[S]) -> Result<Self> {
        let mut comparison = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            let weather = available
                .iter()
                .find(|w| w.city.eq_ignore_ascii_case(name))
                .ok_or_else(|| GeoAlertError::validation(format!("No weather for {name}")))?;
            comparison.add(weather.clone());
        }
        Ok(comparison)
    }

    /// Returns false when the comparison is full or already holds the city
    pub fn add(&mut self, weather: CityWeather) -> bool {
        if self.cities.len() >= MAX_COMPARED_CITIES || self.contains(&weather.city) {
            return false;
        }
        self.cities.push(weather);
        true
    }

    pub fn remove(&mut self, city: &str) -> bool {
        let before = self.cities.len();
        self.cities.retain(|w| w.city != city);
        self.cities.len() != before
    }

    #[must_use]
    pub fn contains(&self, city: &str) -> bool {
        self.cities.iter().any(|w| w.city == city)
    }

    #[must_use]
    pub fn cities(&self) -> &[CityWeather] {
        &self.cities
    }

    /// Cities not yet compared that match `search`, at most ten
    #[must_use]
    pub fn candidates<'a>(&self, available: &'a [CityWeather], search: &str) -> Vec<&'a CityWeather> {
        let needle = search.trim().to_lowercase();
        available
            .iter()
            .filter(|w| !self.contains(&w.city))
            .filter(|w| {
                needle.is_empty()
                    || w.city.to_lowercase().contains(&needle)
                    || w.country.to_lowercase().contains(&needle)
            })
            .take(MAX_COMPARE_CANDIDATES)
            .collect()
    }

    #[must_use]
    pub fn temperatures(&self) -> Vec<TemperatureBar> {
        self.cities
            .iter()
            .map(|w| TemperatureBar {
                city: w.city.clone(),
                temperature: w.temperature,
                feels_like: nonzero_or(w.feels_like, w.temperature),
                min: nonzero_or(w.temp_min, w.temperature - 3),
                max: nonzero_or(w.temp_max, w.temperature + 3),
            })
            .collect()
    }

    #[must_use]
    pub fn radar(&self) -> Vec<RadarMetric> {
        if self.cities.is_empty() {
            return Vec::new();
        }

        let axis = |metric: &'static str, scale: fn(&CityWeather) -> f64| RadarMetric {
            metric,
            values: self
                .cities
                .iter()
                .map(|w| MetricValue {
                    city: w.city.clone(),
                    value: scale(w),
                })
                .collect(),
        };

        vec![
            axis("Temperature", |w| f64::from(w.temperature + 20).max(0.0)),
            axis("Humidity", |w| f64::from(w.humidity)),
            axis("Wind Speed", |w| f64::from(w.wind_speed) * 2.0),
            axis("Pressure", |w| f64::from(nonzero_or(w.pressure, 1013) - 980) * 2.0),
            axis("Cloud Cover", |w| f64::from(w.cloud_cover)),
            axis("UV Index", |w| f64::from(w.uv_index) * 10.0),
        ]
    }

    #[must_use]
    pub fn view(&self) -> ComparisonView {
        ComparisonView {
            cities: self.cities.clone(),
            temperatures: self.temperatures(),
            radar: self.radar(),
        }
    }
}

/// Zero stands for a missing reading
fn nonzero_or(value: i32, fallback: i32) -> i32 {
    if value == 0 { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AqiLevel;

    fn weather(city: &str, country: &str, temperature: i32) -> CityWeather {
        CityWeather {
            city: city.to_string(),
            country: country.to_string(),
            coordinates: [0.0, 0.0],
            temperature,
            feels_like: temperature,
            temp_min: temperature - 2,
            temp_max: temperature + 2,
            weather_code: 0,
            description: "Clear sky".to_string(),
            wind_speed: 10,
            wind_direction: 90,
            wind_gusts: 15,
            humidity: 50,
            is_day: true,
            pressure: 1013,
            visibility: 10,
            uv_index: 3,
            cloud_cover: 0,
            precipitation: 0.0,
            precipitation_probability: 0,
            dew_point: 9,
            air_quality_index: 0,
            air_quality_level: AqiLevel::Good,
            pm25: None,
            pm10: None,
            sunrise: None,
            sunset: None,
        }
    }

    fn regional(city: &str, country: &str, region: &str, temperature: i32) -> RegionalWeather {
        RegionalWeather {
            weather: weather(city, country, temperature),
            region: region.to_string(),
        }
    }

    fn world() -> Vec<RegionalWeather> {
        vec![
            regional("Toronto", "Canada", "North America", -5),
            regional("Lima", "Peru", "South America", 22),
            regional("Oslo", "Norway", "Europe", -5),
            regional("Dubai", "UAE", "Middle East", 35),
            regional("Doha", "Qatar", "Middle East", 35),
        ]
    }

    #[test]
    fn test_query_filters_region_and_search() {
        let entries = world();

        let all = WeatherQuery {
            search: None,
            region: Some("all".to_string()),
        };
        assert_eq!(all.apply(&entries).len(), 5);

        let middle_east = WeatherQuery {
            search: None,
            region: Some("Middle East".to_string()),
        };
        let names: Vec<String> = middle_east
            .apply(&entries)
            .into_iter()
            .map(|e| e.weather.city)
            .collect();
        assert_eq!(names, vec!["Dubai", "Doha"]);

        let by_country = WeatherQuery {
            search: Some(" qatar ".to_string()),
            region: None,
        };
        assert_eq!(by_country.apply(&entries)[0].weather.city, "Doha");

        let mismatch = WeatherQuery {
            search: Some("oslo".to_string()),
            region: Some("Asia".to_string()),
        };
        assert!(mismatch.apply(&entries).is_empty());
    }

    #[test]
    fn test_summary_keeps_first_extremes() {
        let summary = WorldWeatherSummary::from_entries(&world());
        assert_eq!(summary.count, 5);
        // (-5 + 22 - 5 + 35 + 35) / 5 = 16.4
        assert_eq!(summary.average_temperature, 16);
        assert_eq!(summary.hottest.unwrap().weather.city, "Dubai");
        assert_eq!(summary.coldest.unwrap().weather.city, "Toronto");

        let empty = WorldWeatherSummary::from_entries(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.hottest.is_none());
    }

    #[test]
    fn test_summary_rounds_negative_halves_up() {
        let entries = vec![
            regional("A", "X", "Europe", -3),
            regional("B", "X", "Europe", -2),
        ];
        assert_eq!(WorldWeatherSummary::from_entries(&entries).average_temperature, -2);
    }

    #[test]
    fn test_comparison_caps_distinct_cities() {
        let mut comparison = WeatherComparison::default();
        assert!(comparison.add(weather("Tokyo", "Japan", 20)));
        assert!(!comparison.add(weather("Tokyo", "Japan", 21)));
        for city in ["London", "Paris", "Berlin"] {
            assert!(comparison.add(weather(city, "X", 10)));
        }
        assert!(!comparison.add(weather("Madrid", "Spain", 25)));
        assert_eq!(comparison.cities().len(), MAX_COMPARED_CITIES);

        assert!(comparison.remove("Paris"));
        assert!(!comparison.remove("Paris"));
        assert!(comparison.add(weather("Madrid", "Spain", 25)));
        assert_eq!(comparison.cities()[3].city, "Madrid");
    }

    #[test]
    fn test_from_names() {
        let available: Vec<CityWeather> = ["Tokyo", "London", "Paris", "Berlin", "Madrid"]
            .iter()
            .map(|c| weather(c, "X", 10))
            .collect();

        let comparison =
            WeatherComparison::from_names(&available, &["tokyo", "Tokyo", "London", "Paris", "Berlin", "Madrid"])
                .unwrap();
        let names: Vec<&str> = comparison.cities().iter().map(|w| w.city.as_str()).collect();
        assert_eq!(names, vec!["Tokyo", "London", "Paris", "Berlin"]);

        assert!(WeatherComparison::from_names(&available, &["Atlantis"]).is_err());
    }

    #[test]
    fn test_candidates_exclude_selected() {
        let available: Vec<CityWeather> = (0..15).map(|i| weather(&format!("City {i}"), "X", 10)).collect();
        let mut comparison = WeatherComparison::default();
        comparison.add(available[0].clone());

        let candidates = comparison.candidates(&available, "");
        assert_eq!(candidates.len(), MAX_COMPARE_CANDIDATES);
        assert_eq!(candidates[0].city, "City 1");

        let matched = comparison.candidates(&available, "city 1");
        // City 1 and City 10 to 14
        assert_eq!(matched.len(), 6);
    }

    #[test]
    fn test_chart_series() {
        let mut cold = weather("Oslo", "Norway", -25);
        cold.feels_like = 0;
        cold.temp_min = 0;
        cold.pressure = 0;
        let mut comparison = WeatherComparison::default();
        comparison.add(cold);

        let bars = comparison.temperatures();
        assert_eq!(bars[0].feels_like, -25);
        assert_eq!(bars[0].min, -28);
        assert_eq!(bars[0].max, -23);

        let radar = comparison.radar();
        assert_eq!(radar.len(), 6);
        assert_eq!(radar[0].metric, "Temperature");
        assert_eq!(radar[0].values[0].value, 0.0);
        assert_eq!(radar[3].metric, "Pressure");
        assert_eq!(radar[3].values[0].value, 66.0);
        assert_eq!(radar[5].values[0].value, 30.0);

        assert!(WeatherComparison::default().radar().is_empty());
    }
}
