//! Location model for geographic coordinates and the built-in city lists

use serde::{Deserialize, Serialize};

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (city, region, etc.)
    pub name: String,
    /// Country name or code
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: None,
        }
    }

    /// Create location with country
    #[must_use]
    pub fn with_country(latitude: f64, longitude: f64, name: String, country: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: Some(country),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates to the given number of decimals
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// `[longitude, latitude]`, the order events carry
    #[must_use]
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A monitored city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub region: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    #[must_use]
    pub fn new(name: &str, country: &str, region: &str, lat: f64, lon: f64) -> Self {
        Self {
            name: name.to_string(),
            country: country.to_string(),
            region: region.to_string(),
            lat,
            lon,
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        Location::with_country(self.lat, self.lon, self.name.clone(), self.country.clone())
    }
}

impl From<&Location> for City {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            country: location.country.clone().unwrap_or_default(),
            region: String::new(),
            lat: location.latitude,
            lon: location.longitude,
        }
    }
}

type CityRow = (&'static str, &'static str, &'static str, f64, f64);

const DASHBOARD_CITY_ROWS: [CityRow; 20] = [
    ("New York", "USA", "North America", 40.7128, -74.0060),
    ("Los Angeles", "USA", "North America", 34.0522, -118.2437),
    ("London", "UK", "Europe", 51.5074, -0.1278),
    ("Paris", "France", "Europe", 48.8566, 2.3522),
    ("Tokyo", "Japan", "Asia", 35.6762, 139.6503),
    ("Sydney", "Australia", "Oceania", -33.8688, 151.2093),
    ("Dubai", "UAE", "Middle East", 25.2048, 55.2708),
    ("Singapore", "Singapore", "Asia", 1.3521, 103.8198),
    ("Mumbai", "India", "Asia", 19.0760, 72.8777),
    ("São Paulo", "Brazil", "South America", -23.5505, -46.6333),
    ("Cairo", "Egypt", "Africa", 30.0444, 31.2357),
    ("Moscow", "Russia", "Europe", 55.7558, 37.6173),
    ("Beijing", "China", "Asia", 39.9042, 116.4074),
    ("Berlin", "Germany", "Europe", 52.5200, 13.4050),
    ("Cape Town", "South Africa", "Africa", -33.9249, 18.4241),
    ("Mexico City", "Mexico", "North America", 19.4326, -99.1332),
    ("Toronto", "Canada", "North America", 43.6532, -79.3832),
    ("Seoul", "South Korea", "Asia", 37.5665, 126.9780),
    ("Bangkok", "Thailand", "Asia", 13.7563, 100.5018),
    ("Lagos", "Nigeria", "Africa", 6.5244, 3.3792),
];

const AIR_QUALITY_CITY_ROWS: [CityRow; 30] = [
    ("New York", "USA", "North America", 40.7128, -74.0060),
    ("Los Angeles", "USA", "North America", 34.0522, -118.2437),
    ("Chicago", "USA", "North America", 41.8781, -87.6298),
    ("Mexico City", "Mexico", "North America", 19.4326, -99.1332),
    ("Toronto", "Canada", "North America", 43.6532, -79.3832),
    ("São Paulo", "Brazil", "South America", -23.5505, -46.6333),
    ("Buenos Aires", "Argentina", "South America", -34.6037, -58.3816),
    ("London", "UK", "Europe", 51.5074, -0.1278),
    ("Paris", "France", "Europe", 48.8566, 2.3522),
    ("Berlin", "Germany", "Europe", 52.5200, 13.4050),
    ("Madrid", "Spain", "Europe", 40.4168, -3.7038),
    ("Rome", "Italy", "Europe", 41.9028, 12.4964),
    ("Moscow", "Russia", "Europe", 55.7558, 37.6173),
    ("Istanbul", "Turkey", "Europe", 41.0082, 28.9784),
    ("Beijing", "China", "Asia", 39.9042, 116.4074),
    ("Shanghai", "China", "Asia", 31.2304, 121.4737),
    ("Tokyo", "Japan", "Asia", 35.6762, 139.6503),
    ("Seoul", "South Korea", "Asia", 37.5665, 126.9780),
    ("Delhi", "India", "Asia", 28.7041, 77.1025),
    ("Mumbai", "India", "Asia", 19.0760, 72.8777),
    ("Bangkok", "Thailand", "Asia", 13.7563, 100.5018),
    ("Singapore", "Singapore", "Asia", 1.3521, 103.8198),
    ("Jakarta", "Indonesia", "Asia", -6.2088, 106.8456),
    ("Dubai", "UAE", "Middle East", 25.2048, 55.2708),
    ("Riyadh", "Saudi Arabia", "Middle East", 24.7136, 46.6753),
    ("Cairo", "Egypt", "Africa", 30.0444, 31.2357),
    ("Lagos", "Nigeria", "Africa", 6.5244, 3.3792),
    ("Johannesburg", "South Africa", "Africa", -26.2041, 28.0473),
    ("Sydney", "Australia", "Oceania", -33.8688, 151.2093),
    ("Melbourne", "Australia", "Oceania", -37.8136, 144.9631),
];

const WORLD_CITY_ROWS: [CityRow; 90] = [
    // North America
    ("New York", "USA", "North America", 40.7128, -74.0060),
    ("Los Angeles", "USA", "North America", 34.0522, -118.2437),
    ("Chicago", "USA", "North America", 41.8781, -87.6298),
    ("Houston", "USA", "North America", 29.7604, -95.3698),
    ("Phoenix", "USA", "North America", 33.4484, -112.0740),
    ("Miami", "USA", "North America", 25.7617, -80.1918),
    ("Seattle", "USA", "North America", 47.6062, -122.3321),
    ("Denver", "USA", "North America", 39.7392, -104.9903),
    ("Toronto", "Canada", "North America", 43.6532, -79.3832),
    ("Vancouver", "Canada", "North America", 49.2827, -123.1207),
    ("Montreal", "Canada", "North America", 45.5017, -73.5673),
    ("Mexico City", "Mexico", "North America", 19.4326, -99.1332),
    ("Guadalajara", "Mexico", "North America", 20.6597, -103.3496),
    // South America
    ("São Paulo", "Brazil", "South America", -23.5505, -46.6333),
    ("Rio de Janeiro", "Brazil", "South America", -22.9068, -43.1729),
    ("Buenos Aires", "Argentina", "South America", -34.6037, -58.3816),
    ("Lima", "Peru", "South America", -12.0464, -77.0428),
    ("Bogotá", "Colombia", "South America", 4.7110, -74.0721),
    ("Santiago", "Chile", "South America", -33.4489, -70.6693),
    ("Caracas", "Venezuela", "South America", 10.4806, -66.9036),
    // Europe
    ("London", "UK", "Europe", 51.5074, -0.1278),
    ("Paris", "France", "Europe", 48.8566, 2.3522),
    ("Berlin", "Germany", "Europe", 52.5200, 13.4050),
    ("Madrid", "Spain", "Europe", 40.4168, -3.7038),
    ("Rome", "Italy", "Europe", 41.9028, 12.4964),
    ("Amsterdam", "Netherlands", "Europe", 52.3676, 4.9041),
    ("Vienna", "Austria", "Europe", 48.2082, 16.3738),
    ("Prague", "Czech Republic", "Europe", 50.0755, 14.4378),
    ("Stockholm", "Sweden", "Europe", 59.3293, 18.0686),
    ("Oslo", "Norway", "Europe", 59.9139, 10.7522),
    ("Copenhagen", "Denmark", "Europe", 55.6761, 12.5683),
    ("Helsinki", "Finland", "Europe", 60.1699, 24.9384),
    ("Dublin", "Ireland", "Europe", 53.3498, -6.2603),
    ("Lisbon", "Portugal", "Europe", 38.7223, -9.1393),
    ("Athens", "Greece", "Europe", 37.9838, 23.7275),
    ("Warsaw", "Poland", "Europe", 52.2297, 21.0122),
    ("Budapest", "Hungary", "Europe", 47.4979, 19.0402),
    ("Brussels", "Belgium", "Europe", 50.8503, 4.3517),
    ("Zurich", "Switzerland", "Europe", 47.3769, 8.5417),
    ("Moscow", "Russia", "Europe", 55.7558, 37.6173),
    ("Istanbul", "Turkey", "Europe", 41.0082, 28.9784),
    // Asia
    ("Tokyo", "Japan", "Asia", 35.6762, 139.6503),
    ("Osaka", "Japan", "Asia", 34.6937, 135.5023),
    ("Beijing", "China", "Asia", 39.9042, 116.4074),
    ("Shanghai", "China", "Asia", 31.2304, 121.4737),
    ("Hong Kong", "China", "Asia", 22.3193, 114.1694),
    ("Shenzhen", "China", "Asia", 22.5431, 114.0579),
    ("Guangzhou", "China", "Asia", 23.1291, 113.2644),
    ("Seoul", "South Korea", "Asia", 37.5665, 126.9780),
    ("Busan", "South Korea", "Asia", 35.1796, 129.0756),
    ("Singapore", "Singapore", "Asia", 1.3521, 103.8198),
    ("Bangkok", "Thailand", "Asia", 13.7563, 100.5018),
    ("Kuala Lumpur", "Malaysia", "Asia", 3.1390, 101.6869),
    ("Jakarta", "Indonesia", "Asia", -6.2088, 106.8456),
    ("Manila", "Philippines", "Asia", 14.5995, 120.9842),
    ("Ho Chi Minh City", "Vietnam", "Asia", 10.8231, 106.6297),
    ("Hanoi", "Vietnam", "Asia", 21.0278, 105.8342),
    ("Mumbai", "India", "Asia", 19.0760, 72.8777),
    ("Delhi", "India", "Asia", 28.7041, 77.1025),
    ("Bangalore", "India", "Asia", 12.9716, 77.5946),
    ("Chennai", "India", "Asia", 13.0827, 80.2707),
    ("Kolkata", "India", "Asia", 22.5726, 88.3639),
    ("Dhaka", "Bangladesh", "Asia", 23.8103, 90.4125),
    ("Karachi", "Pakistan", "Asia", 24.8607, 67.0011),
    ("Taipei", "Taiwan", "Asia", 25.0330, 121.5654),
    // Middle East
    ("Dubai", "UAE", "Middle East", 25.2048, 55.2708),
    ("Abu Dhabi", "UAE", "Middle East", 24.4539, 54.3773),
    ("Riyadh", "Saudi Arabia", "Middle East", 24.7136, 46.6753),
    ("Jeddah", "Saudi Arabia", "Middle East", 21.4858, 39.1925),
    ("Tel Aviv", "Israel", "Middle East", 32.0853, 34.7818),
    ("Doha", "Qatar", "Middle East", 25.2854, 51.5310),
    ("Kuwait City", "Kuwait", "Middle East", 29.3759, 47.9774),
    ("Muscat", "Oman", "Middle East", 23.5880, 58.3829),
    ("Tehran", "Iran", "Middle East", 35.6892, 51.3890),
    // Africa
    ("Cairo", "Egypt", "Africa", 30.0444, 31.2357),
    ("Lagos", "Nigeria", "Africa", 6.5244, 3.3792),
    ("Johannesburg", "South Africa", "Africa", -26.2041, 28.0473),
    ("Cape Town", "South Africa", "Africa", -33.9249, 18.4241),
    ("Nairobi", "Kenya", "Africa", -1.2921, 36.8219),
    ("Casablanca", "Morocco", "Africa", 33.5731, -7.5898),
    ("Accra", "Ghana", "Africa", 5.6037, -0.1870),
    ("Addis Ababa", "Ethiopia", "Africa", 8.9806, 38.7578),
    ("Dar es Salaam", "Tanzania", "Africa", -6.7924, 39.2083),
    ("Tunis", "Tunisia", "Africa", 36.8065, 10.1815),
    // Oceania
    ("Sydney", "Australia", "Oceania", -33.8688, 151.2093),
    ("Melbourne", "Australia", "Oceania", -37.8136, 144.9631),
    ("Brisbane", "Australia", "Oceania", -27.4698, 153.0251),
    ("Perth", "Australia", "Oceania", -31.9505, 115.8605),
    ("Auckland", "New Zealand", "Oceania", -36.8509, 174.7645),
    ("Wellington", "New Zealand", "Oceania", -41.2865, 174.7762),
];

/// Regions the air-quality and world weather lists are grouped by
pub const REGIONS: [&str; 7] = [
    "North America",
    "South America",
    "Europe",
    "Asia",
    "Middle East",
    "Africa",
    "Oceania",
];

fn cities_from_rows(rows: &[CityRow]) -> Vec<City> {
    rows.iter()
        .map(|&(name, country, region, lat, lon)| City::new(name, country, region, lat, lon))
        .collect()
}

/// Cities polled for the weather panel
#[must_use]
pub fn dashboard_cities() -> Vec<City> {
    cities_from_rows(&DASHBOARD_CITY_ROWS)
}

/// Cities polled for the air-quality ranking
#[must_use]
pub fn air_quality_cities() -> Vec<City> {
    cities_from_rows(&AIR_QUALITY_CITY_ROWS)
}

/// Cities covered by the world weather explorer, grouped by region
#[must_use]
pub fn world_cities() -> Vec<City> {
    cities_from_rows(&WORLD_CITY_ROWS)
}
