//! Polling loop and the latest snapshot
//!
//! Each cycle fetches disasters and city weather together and swaps in a new
//! [`Snapshot`]. A failed cycle keeps the previous snapshot and records the
//! error. Only one cycle runs at a time; a cycle requested while another is in
//! flight is skipped.

use crate::GeoAlertError;
use crate::air_quality::AirQualityService;
use crate::alerts::{
    FilterState, Notification, NotificationCenter, NotificationSettings, NotificationSettingsUpdate,
};
use crate::config::GeoAlertConfig;
use crate::feeds::DisasterFeeds;
use crate::geocoding::Geocoder;
use crate::http::HttpClient;
use crate::models::{
    City, CityWeather, DisasterEvent, air_quality_cities, dashboard_cities, world_cities,
};
use crate::weather::WeatherService;
use crate::world::{self, RegionalWeather};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, error, info, instrument, warn};

/// Result of one successful poll cycle
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub disasters: Vec<DisasterEvent>,
    pub weather: Vec<CityWeather>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Updated {
        disasters: usize,
        cities: usize,
        notifications: Vec<Notification>,
    },
    /// Another cycle was already running
    Skipped,
}

/// World weather is refetched at most this often
pub const WORLD_WEATHER_TTL: Duration = Duration::from_secs(30 * 60);

/// The last world weather fetch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldWeather {
    pub last_updated: DateTime<Utc>,
    pub cities: Arc<Vec<RegionalWeather>>,
    #[serde(skip)]
    fetched_at: Instant,
}

pub struct Dashboard {
    feeds: DisasterFeeds,
    weather: WeatherService,
    air_quality: AirQualityService,
    geocoder: Geocoder,
    cities: Vec<City>,
    air_quality_cities: Vec<City>,
    world_cities: Vec<City>,
    world_weather: Mutex<Option<WorldWeather>>,
    public_origin: String,
    snapshot: RwLock<Arc<Snapshot>>,
    last_error: RwLock<Option<String>>,
    notifications: Mutex<NotificationCenter>,
    filters: RwLock<FilterState>,
    refresh_guard: Mutex<()>,
}

impl Dashboard {
    /// Wire every service to one shared HTTP client
    pub fn new(config: &GeoAlertConfig) -> Result<Self> {
        let client = HttpClient::new(&config.http)?;

        Ok(Self {
            feeds: DisasterFeeds::new(client.clone(), &config.feeds),
            weather: WeatherService::new(client.clone(), config.open_meteo.clone()),
            air_quality: AirQualityService::new(client.clone(), config.open_meteo.clone()),
            geocoder: Geocoder::new(client, config.open_meteo.geocoding_url.clone()),
            cities: dashboard_cities(),
            air_quality_cities: air_quality_cities(),
            world_cities: world_cities(),
            world_weather: Mutex::new(None),
            public_origin: config.server.public_origin.clone(),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            last_error: RwLock::new(None),
            notifications: Mutex::new(NotificationCenter::new(
                config.dashboard.notifications_enabled,
                config.dashboard.min_severity_notification,
            )),
            filters: RwLock::new(FilterState::default()),
            refresh_guard: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn with_feeds(mut self, feeds: DisasterFeeds) -> Self {
        self.feeds = feeds;
        self
    }

    #[must_use]
    pub fn with_cities(mut self, cities: Vec<City>, air_quality_cities: Vec<City>) -> Self {
        self.cities = cities;
        self.air_quality_cities = air_quality_cities;
        self
    }

    #[must_use]
    pub fn with_world_cities(mut self, cities: Vec<City>) -> Self {
        self.world_cities = cities;
        self
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    #[must_use]
    pub fn public_origin(&self) -> &str {
        &self.public_origin
    }

    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    #[must_use]
    pub fn air_quality_service(&self) -> &AirQualityService {
        &self.air_quality
    }

    #[must_use]
    pub fn air_quality_cities(&self) -> &[City] {
        &self.air_quality_cities
    }

    pub async fn filters(&self) -> FilterState {
        self.filters.read().await.clone()
    }

    pub async fn set_filters(&self, filters: FilterState) {
        *self.filters.write().await = filters;
    }

    /// Snapshot events passing the current category filters
    pub async fn visible_disasters(&self) -> Vec<DisasterEvent> {
        let snapshot = self.snapshot().await;
        self.filters.read().await.apply(&snapshot.disasters)
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().await.notifications().to_vec()
    }

    /// Mark notifications for an event as read, as happens when it is opened
    pub async fn select_event(&self, event_id: &str) -> Option<DisasterEvent> {
        self.notifications.lock().await.mark_read(event_id);
        self.snapshot()
            .await
            .disasters
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
    }

    pub async fn dismiss_notification(&self, notification_id: &str) -> bool {
        self.notifications.lock().await.dismiss(notification_id)
    }

    pub async fn dismiss_all_notifications(&self) {
        self.notifications.lock().await.dismiss_all();
    }

    pub async fn notification_settings(&self) -> NotificationSettings {
        self.notifications.lock().await.settings()
    }

    pub async fn update_notification_settings(
        &self,
        update: NotificationSettingsUpdate,
    ) -> NotificationSettings {
        self.notifications.lock().await.update_settings(update)
    }

    /// World weather, served from cache while it is younger than
    /// [`WORLD_WEATHER_TTL`]. A failed fetch leaves the cache untouched.
    pub async fn world_weather(&self) -> Result<WorldWeather> {
        let mut cache = self.world_weather.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < WORLD_WEATHER_TTL {
                debug!("Serving cached world weather from {}", cached.last_updated);
                return Ok(cached.clone());
            }
        }

        let cities = world::fetch_world_weather(&self.weather, &self.world_cities).await?;
        let fresh = WorldWeather {
            last_updated: Utc::now(),
            cities: Arc::new(cities),
            fetched_at: Instant::now(),
        };
        *cache = Some(fresh.clone());
        Ok(fresh)
    }

    async fn fetch_weather(&self) -> Result<Vec<CityWeather>> {
        let weather = self.weather.fetch_weather_data(&self.cities).await;
        if weather.is_empty() && !self.cities.is_empty() {
            return Err(GeoAlertError::unavailable("No city weather could be fetched").into());
        }
        Ok(weather)
    }

    /// Run one fetch cycle unless one is already in flight
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Ok(_guard) = self.refresh_guard.try_lock() else {
            info!("Refresh already in progress, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let fetched = tokio::try_join!(
            async { Ok::<_, anyhow::Error>(self.feeds.fetch_disaster_events().await) },
            self.fetch_weather()
        );

        let (disasters, weather) = match fetched {
            Ok(data) => data,
            Err(e) => {
                warn!("Refresh failed, keeping previous data: {:#}", e);
                *self.last_error.write().await = Some(e.to_string());
                return Err(e);
            }
        };

        let now = Utc::now();
        let notifications = self.notifications.lock().await.observe(&disasters, now);
        let outcome = RefreshOutcome::Updated {
            disasters: disasters.len(),
            cities: weather.len(),
            notifications,
        };

        *self.snapshot.write().await = Arc::new(Snapshot {
            disasters,
            weather,
            last_updated: Some(now),
        });
        *self.last_error.write().await = None;

        info!("Dashboard refreshed at {}", now);
        Ok(outcome)
    }

    /// Refresh every `interval` until shutdown is signalled
    pub async fn run_forever(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        info!("Refreshing every {}s", interval.as_secs());

        loop {
            if let Err(e) = self.refresh().await {
                error!(error = %e, "Scheduled refresh failed");
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutting down refresh loop");
                    break;
                }
                () = tokio::time::sleep(interval) => {}
            }
        }
    }
}
