//! `GeoAlert` command line interface
//!
//! One-shot queries against the live feeds, exports, and the `serve`
//! command that keeps polling and exposes the JSON API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast;
use tracing::{error, info};

use geoalert::air_quality::{AirQualityQuery, AirQualityService, AirQualitySummary};
use geoalert::export::{self, ExportScope};
use geoalert::models::{City, TemperatureUnit, air_quality_cities, dashboard_cities, world_cities};
use geoalert::stats::StatsReport;
use geoalert::timeline::{self, TimeWindow};
use geoalert::weather::WeatherService;
use geoalert::world::{self, WeatherComparison, WeatherQuery, WorldWeatherSummary};
use geoalert::{
    Dashboard, DisasterCategory, DisasterFeeds, GeoAlertConfig, GeoAlertError, Geocoder,
    HttpClient, logging, search, web,
};

#[derive(Parser, Debug)]
#[command(name = "geoalert", version)]
#[command(about = "Real-time disaster, weather and air quality monitor")]
struct Cli {
    /// Configuration file (defaults to ~/.config/geoalert/config.toml)
    #[arg(short, long, env = "GEOALERT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List current disaster events, newest first
    Disasters {
        /// Only this category (earthquakes, floods, wildfires, severeStorms, volcanoes, weather)
        #[arg(long)]
        category: Option<String>,

        /// Only events near a place name or `lat,lon`
        #[arg(long)]
        near: Option<String>,

        /// Search radius in km for --near
        #[arg(long, default_value_t = 500.0)]
        radius: f64,

        /// Maximum number of events to print
        #[arg(short, long, default_value_t = 25)]
        limit: usize,
    },

    /// Current weather for the dashboard cities, one place, or the world list
    Weather {
        /// City name or `lat,lon`
        #[arg(long, conflicts_with_all = ["world", "compare"])]
        city: Option<String>,

        /// celsius or fahrenheit (overrides the config)
        #[arg(long)]
        unit: Option<TemperatureUnit>,

        /// Explore the 90-city world list instead of the dashboard cities
        #[arg(long, conflicts_with = "compare")]
        world: bool,

        /// Region filter for --world (e.g. Europe, "Middle East", all)
        #[arg(long, requires = "world")]
        region: Option<String>,

        /// City or country filter for --world
        #[arg(long, requires = "world")]
        search: Option<String>,

        /// Compare up to four dashboard cities side by side
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        compare: Vec<String>,
    },

    /// Air quality ranking, worst first
    AirQuality {
        #[arg(long)]
        region: Option<String>,

        /// Match on city or country
        #[arg(long)]
        search: Option<String>,
    },

    /// Search events, city weather and places
    Search { query: String },

    /// Aggregate statistics for the current events
    Stats,

    /// Events grouped over a time window
    Timeline {
        /// 1h, 6h, 24h, 7d or all
        #[arg(long, default_value = "24h")]
        window: TimeWindow,
    },

    /// Export the current data as JSON or CSV
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// all, severe or earthquakes
        #[arg(long, default_value = "all")]
        scope: ExportScope,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Poll continuously and serve the JSON API
    Serve {
        /// Port (overrides the config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GeoAlertConfig::load_from_path(cli.config.clone())
        .with_context(|| "Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    let result = run(cli.command, &mut config).await;
    if let Err(e) = &result {
        match e.downcast_ref::<GeoAlertError>() {
            Some(app_error) => error!("{}", app_error.user_message()),
            None => error!("{:#}", e),
        }
    }
    result
}

async fn run(command: Commands, config: &mut GeoAlertConfig) -> Result<()> {
    match command {
        Commands::Disasters {
            category,
            near,
            radius,
            limit,
        } => disasters(config, category, near, radius, limit).await,
        Commands::Weather {
            city,
            unit,
            world,
            region,
            search,
            compare,
        } => {
            let unit = temperature_unit(config, unit)?;
            if world {
                world_weather(config, unit, WeatherQuery { search, region }).await
            } else if !compare.is_empty() {
                compare_weather(config, unit, &compare).await
            } else {
                weather(config, city, unit).await
            }
        }
        Commands::AirQuality { region, search } => air_quality(config, region, search).await,
        Commands::Search { query } => search_all(config, &query).await,
        Commands::Stats => stats(config).await,
        Commands::Timeline { window } => show_timeline(config, window).await,
        Commands::Export {
            format,
            scope,
            output,
        } => export_data(config, format, scope, output).await,
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
    }
}

async fn disasters(
    config: &GeoAlertConfig,
    category: Option<String>,
    near: Option<String>,
    radius: f64,
    limit: usize,
) -> Result<()> {
    let client = HttpClient::new(&config.http)?;
    let feeds = DisasterFeeds::new(client.clone(), &config.feeds);
    let mut events = feeds.fetch_disaster_events().await;

    if let Some(category) = category {
        let category = DisasterCategory::parse(&category).ok_or_else(|| {
            GeoAlertError::validation(format!("Unknown category '{category}'"))
        })?;
        events.retain(|e| e.category == category);
    }

    let now = Utc::now();
    if let Some(near) = near {
        let geocoder = Geocoder::new(client, config.open_meteo.geocoding_url.clone());
        let center = geocoder.resolve(&near).await?;
        let nearby = search::events_near(&events, &center, radius);
        println!("{} events within {} km of {}", nearby.len(), radius, center.name);
        for (event, distance) in nearby.into_iter().take(limit) {
            println!(
                "  {:>7.1} km  {:<12} {}  ({})",
                distance,
                event.effective_severity().label(),
                event.title,
                timeline::format_relative_time(event.date, now)
            );
        }
        return Ok(());
    }

    println!("{} events", events.len());
    for event in events.iter().take(limit) {
        println!(
            "  [{}] {:<12} {}  ({})",
            event.category.label(),
            event.effective_severity().label(),
            event.title,
            timeline::format_relative_time(event.date, now)
        );
    }
    Ok(())
}

fn temperature_unit(config: &GeoAlertConfig, unit: Option<TemperatureUnit>) -> Result<TemperatureUnit> {
    match unit {
        Some(unit) => Ok(unit),
        None => Ok(config
            .dashboard
            .temperature_unit
            .parse()
            .map_err(GeoAlertError::config)?),
    }
}

async fn weather(config: &GeoAlertConfig, city: Option<String>, unit: TemperatureUnit) -> Result<()> {
    let client = HttpClient::new(&config.http)?;
    let service = WeatherService::new(client.clone(), config.open_meteo.clone());

    let cities: Vec<City> = match city {
        Some(name) => {
            let known = dashboard_cities()
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(name.trim()));
            match known {
                Some(city) => vec![city],
                None => {
                    let geocoder = Geocoder::new(client, config.open_meteo.geocoding_url.clone());
                    let location = geocoder.resolve(&name).await?;
                    vec![City::from(&location)]
                }
            }
        }
        None => dashboard_cities(),
    };

    let weather = service.fetch_weather_data(&cities).await;
    if weather.is_empty() {
        return Err(GeoAlertError::unavailable("No weather data could be fetched").into());
    }

    for w in &weather {
        println!(
            "{:<16} {:>6}  {:<24} humidity {:>3}%  wind {}  AQI {} ({})",
            w.city,
            w.format_temperature(unit),
            w.description,
            w.humidity,
            w.format_wind(),
            w.air_quality_index,
            w.air_quality_level.label()
        );
    }
    Ok(())
}

async fn world_weather(config: &GeoAlertConfig, unit: TemperatureUnit, query: WeatherQuery) -> Result<()> {
    let client = HttpClient::new(&config.http)?;
    let service = WeatherService::new(client, config.open_meteo.clone());
    let entries = world::fetch_world_weather(&service, &world_cities()).await?;

    let summary = WorldWeatherSummary::from_entries(&entries);
    println!(
        "{} cities, average {}",
        summary.count,
        unit.format(f64::from(summary.average_temperature))
    );
    if let (Some(hottest), Some(coldest)) = (&summary.hottest, &summary.coldest) {
        println!(
            "Hottest: {} ({}), coldest: {} ({})",
            hottest.weather.city,
            hottest.weather.format_temperature(unit),
            coldest.weather.city,
            coldest.weather.format_temperature(unit)
        );
    }

    for entry in query.apply(&entries) {
        let w = &entry.weather;
        println!(
            "  {:<18} {:<14} {:<14} {:>6}  {:<24} humidity {:>3}%  wind {}",
            w.city,
            w.country,
            entry.region,
            w.format_temperature(unit),
            w.description,
            w.humidity,
            w.format_wind()
        );
    }
    Ok(())
}

async fn compare_weather(config: &GeoAlertConfig, unit: TemperatureUnit, names: &[String]) -> Result<()> {
    let client = HttpClient::new(&config.http)?;
    let service = WeatherService::new(client, config.open_meteo.clone());
    let weather = service.fetch_weather_data(&dashboard_cities()).await;
    if weather.is_empty() {
        return Err(GeoAlertError::unavailable("No weather data could be fetched").into());
    }

    let comparison = WeatherComparison::from_names(&weather, names)?;
    for w in comparison.cities() {
        println!(
            "{:<16} {:>6} (feels {:>6})  humidity {:>3}%  wind {:>3} km/h  {:>4} hPa  UV {}  clouds {}%",
            w.city,
            w.format_temperature(unit),
            unit.format(f64::from(w.feels_like)),
            w.humidity,
            w.wind_speed,
            w.pressure,
            w.uv_index,
            w.cloud_cover
        );
    }
    Ok(())
}

async fn air_quality(
    config: &GeoAlertConfig,
    region: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let client = HttpClient::new(&config.http)?;
    let service = AirQualityService::new(client, config.open_meteo.clone());
    let readings = service.fetch_air_quality(&air_quality_cities()).await?;

    let readings = AirQualityQuery { search, region }.apply(&readings);
    let summary = AirQualitySummary::from_readings(&readings);
    println!("{} cities, average AQI {}", summary.count, summary.average);

    for reading in &readings {
        println!(
            "  {:>4}  {:<28} {:<16} {:<14} PM2.5 {:>3}  PM10 {:>3}",
            reading.aqi,
            reading.aqi_level.label(),
            reading.city,
            reading.country,
            reading.pm25,
            reading.pm10
        );
    }
    Ok(())
}

/// One full fetch cycle for the commands that need disasters and weather
async fn fetch_snapshot(config: &GeoAlertConfig) -> Result<Dashboard> {
    let dashboard = Dashboard::new(config)?;
    dashboard.refresh().await?;
    Ok(dashboard)
}

async fn search_all(config: &GeoAlertConfig, query: &str) -> Result<()> {
    let dashboard = fetch_snapshot(config).await?;
    let snapshot = dashboard.snapshot().await;

    let mut results = search::search(&snapshot.disasters, &snapshot.weather, query);
    results.locations = dashboard.geocoder().search(query).await.unwrap_or_default();

    if results.is_empty() {
        println!("No results for '{query}'");
        return Ok(());
    }

    for event in &results.disasters {
        println!("event     {}  {}", event.id, event.title);
    }
    for w in &results.weather {
        println!("weather   {}, {}  {}  {}", w.city, w.country, w.temperature, w.description);
    }
    for location in &results.locations {
        println!("place     {}  {}", location.name, location.format_coordinates());
    }
    Ok(())
}

async fn stats(config: &GeoAlertConfig) -> Result<()> {
    let dashboard = fetch_snapshot(config).await?;
    let snapshot = dashboard.snapshot().await;
    let report = StatsReport::build(&snapshot.disasters, &snapshot.weather, Utc::now());

    let d = &report.disasters;
    println!("Events: {} total, {} severe or worse", d.total, d.severe_count);
    println!(
        "Magnitude: average {:.1}, max {:.1}; estimated affected {}",
        d.average_magnitude, d.max_magnitude, d.total_affected
    );
    for category in &d.categories {
        println!("  {:<12} {}", category.label, category.count);
    }

    let w = &report.weather;
    println!(
        "Weather: {} cities, avg {}°C (min {}, max {}), humidity {}%, wind {} km/h",
        w.cities,
        w.average_temperature,
        w.min_temperature,
        w.max_temperature,
        w.average_humidity,
        w.average_wind_speed
    );

    println!("Magnitudes:");
    for bucket in &report.magnitudes {
        println!("  {:<4} {}", bucket.range, bucket.count);
    }
    Ok(())
}

async fn show_timeline(config: &GeoAlertConfig, window: TimeWindow) -> Result<()> {
    let dashboard = fetch_snapshot(config).await?;
    let snapshot = dashboard.snapshot().await;
    let now = Utc::now();
    let timeline = timeline::build_timeline(&snapshot.disasters, window, now);

    println!("{}: {} events", timeline.label, timeline.total);
    for group in &timeline.groups {
        println!("{}", group.key);
        for event in &group.events {
            println!(
                "  {:<10} {}",
                timeline::format_relative_time(event.date, now),
                event.title
            );
        }
    }
    Ok(())
}

async fn export_data(
    config: &GeoAlertConfig,
    format: ExportFormat,
    scope: ExportScope,
    output: Option<PathBuf>,
) -> Result<()> {
    let dashboard = fetch_snapshot(config).await?;
    let snapshot = dashboard.snapshot().await;
    let disasters = scope.select(&snapshot.disasters);

    let body = match format {
        ExportFormat::Json => export::to_json(&disasters, &snapshot.weather, Utc::now())?,
        ExportFormat::Csv => export::to_csv(&disasters),
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, body)
                .await
                .map_err(GeoAlertError::from)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Exported {} events to {}", disasters.len(), path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

async fn serve(config: &GeoAlertConfig) -> Result<()> {
    let dashboard = Arc::new(Dashboard::new(config)?);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_tx.send(()).ok();
    });

    if config.dashboard.auto_refresh {
        let poller = dashboard.clone();
        let interval = Duration::from_secs(config.dashboard.refresh_interval_seconds);
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            poller.run_forever(interval, shutdown).await;
        });
    } else if let Err(e) = dashboard.refresh().await {
        error!(error = %e, "Initial refresh failed");
    }

    web::run(&config.server, dashboard, shutdown_tx.subscribe()).await
}
