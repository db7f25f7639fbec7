//! JSON API served under `/api`

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{
    GeoAlertError,
    air_quality::{AirQualityQuery, AirQualitySummary},
    alerts::{FilterState, Notification, NotificationSettings, NotificationSettingsUpdate},
    dashboard::{Dashboard, RefreshOutcome, Snapshot},
    export::{self, ExportScope, ShareTarget},
    geocoding::LocationParser,
    models::{AirQualityReading, CityWeather, DisasterCategory, DisasterEvent, Location},
    search::{self, SearchResults},
    stats::StatsReport,
    timeline::{self, TimeWindow, Timeline},
    world::{ComparisonView, RegionalWeather, WeatherComparison, WeatherQuery, WorldWeatherSummary},
};

/// Radius used by `?near=` when none is given
pub const DEFAULT_NEAR_RADIUS_KM: f64 = 500.0;

pub type AppState = Arc<Dashboard>;

/// Error body `{"error": ...}` with a status derived from the error kind
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = match err.downcast_ref::<GeoAlertError>() {
            Some(GeoAlertError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Some(GeoAlertError::Unavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Some(GeoAlertError::Api { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match err.downcast_ref::<GeoAlertError>() {
            Some(e) => e.user_message(),
            None => format!("{err:#}"),
        };
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/disasters", get(get_disasters))
        .route("/weather", get(get_weather))
        .route("/weather/world", get(get_world_weather))
        .route("/weather/compare", get(compare_weather))
        .route("/air-quality", get(get_air_quality))
        .route("/stats", get(get_stats))
        .route("/timeline", get(get_timeline))
        .route("/search", get(get_search))
        .route("/notifications", get(get_notifications).delete(dismiss_all_notifications))
        .route(
            "/notifications/settings",
            get(get_notification_settings).put(update_notification_settings),
        )
        .route("/notifications/{id}", delete(dismiss_notification))
        .route("/filters", get(get_filters))
        .route("/filters/{category}", post(toggle_filter))
        .route("/export.json", get(export_json))
        .route("/export.csv", get(export_csv))
        .route("/share", get(get_share_link))
        .route("/geocode", get(geocode))
        .route("/refresh", post(refresh))
        .with_state(state)
}

/// The current snapshot, or 503 when no poll has succeeded yet and the last one failed
async fn current_snapshot(dashboard: &Dashboard) -> ApiResult<Arc<Snapshot>> {
    let snapshot = dashboard.snapshot().await;
    if snapshot.last_updated.is_none() {
        if let Some(error) = dashboard.last_error().await {
            return Err(anyhow::Error::from(GeoAlertError::unavailable(error)).into());
        }
    }
    Ok(snapshot)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    last_updated: Option<chrono::DateTime<Utc>>,
    last_error: Option<String>,
}

async fn health(State(dashboard): State<AppState>) -> Json<HealthResponse> {
    let last_error = dashboard.last_error().await;
    Json(HealthResponse {
        status: if last_error.is_some() { "degraded" } else { "ok" },
        version: crate::VERSION,
        last_updated: dashboard.snapshot().await.last_updated,
        last_error,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct DisasterQuery {
    pub category: Option<String>,
    pub event: Option<String>,
    /// `lat,lon`
    pub near: Option<String>,
    pub radius: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterEntry {
    #[serde(flatten)]
    pub event: DisasterEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisastersResponse {
    pub total: usize,
    pub last_updated: Option<chrono::DateTime<Utc>>,
    pub events: Vec<DisasterEntry>,
}

async fn get_disasters(
    State(dashboard): State<AppState>,
    Query(query): Query<DisasterQuery>,
) -> ApiResult<Json<DisastersResponse>> {
    let snapshot = current_snapshot(&dashboard).await?;

    if let Some(id) = query.event.as_deref() {
        let event = dashboard
            .select_event(id)
            .await
            .ok_or_else(|| ApiError::not_found(format!("No event with id {id}")))?;
        return Ok(Json(DisastersResponse {
            total: 1,
            last_updated: snapshot.last_updated,
            events: vec![DisasterEntry {
                event,
                distance_km: None,
            }],
        }));
    }

    let mut events = dashboard.visible_disasters().await;
    if let Some(category) = query.category.as_deref() {
        let category = DisasterCategory::parse(category)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown category '{category}'")))?;
        events.retain(|e| e.category == category);
    }

    let entries: Vec<DisasterEntry> = match query.near.as_deref() {
        Some(near) => {
            let (lat, lon) = LocationParser::parse_coordinates(near)
                .map_err(|e| ApiError::bad_request(format!("{e:#}")))?;
            let center = Location::new(lat, lon, near.to_string());
            let radius = query.radius.unwrap_or(DEFAULT_NEAR_RADIUS_KM);
            search::events_near(&events, &center, radius)
                .into_iter()
                .map(|(event, distance)| DisasterEntry {
                    event: event.clone(),
                    distance_km: Some(distance),
                })
                .collect()
        }
        None => events
            .into_iter()
            .map(|event| DisasterEntry {
                event,
                distance_km: None,
            })
            .collect(),
    };

    Ok(Json(DisastersResponse {
        total: entries.len(),
        last_updated: snapshot.last_updated,
        events: entries,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct CityWeatherQuery {
    pub city: Option<String>,
}

async fn get_weather(
    State(dashboard): State<AppState>,
    Query(query): Query<CityWeatherQuery>,
) -> ApiResult<Json<Vec<CityWeather>>> {
    let snapshot = current_snapshot(&dashboard).await?;

    match query.city.as_deref() {
        Some(city) => {
            let found = snapshot
                .weather
                .iter()
                .find(|w| w.city.eq_ignore_ascii_case(city))
                .cloned()
                .ok_or_else(|| ApiError::not_found(format!("No weather for {city}")))?;
            Ok(Json(vec![found]))
        }
        None => Ok(Json(snapshot.weather.clone())),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorldWeatherResponse {
    total: usize,
    last_updated: DateTime<Utc>,
    /// Over every fetched city, not just the filtered ones
    summary: WorldWeatherSummary,
    cities: Vec<RegionalWeather>,
}

async fn get_world_weather(
    State(dashboard): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Json<WorldWeatherResponse>> {
    let world = dashboard.world_weather().await?;
    let cities = query.apply(&world.cities);

    Ok(Json(WorldWeatherResponse {
        total: cities.len(),
        last_updated: world.last_updated,
        summary: WorldWeatherSummary::from_entries(&world.cities),
        cities,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated city names
    pub cities: Option<String>,
}

async fn compare_weather(
    State(dashboard): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<Json<ComparisonView>> {
    let snapshot = current_snapshot(&dashboard).await?;
    let names: Vec<&str> = query
        .cities
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    let comparison = WeatherComparison::from_names(&snapshot.weather, &names)?;
    Ok(Json(comparison.view()))
}

#[derive(Serialize)]
struct AirQualityResponse {
    summary: AirQualitySummary,
    readings: Vec<AirQualityReading>,
}

async fn get_air_quality(
    State(dashboard): State<AppState>,
    Query(query): Query<AirQualityQuery>,
) -> ApiResult<Json<AirQualityResponse>> {
    let readings = dashboard
        .air_quality_service()
        .fetch_air_quality(dashboard.air_quality_cities())
        .await?;
    let readings = query.apply(&readings);

    Ok(Json(AirQualityResponse {
        summary: AirQualitySummary::from_readings(&readings),
        readings,
    }))
}

async fn get_stats(State(dashboard): State<AppState>) -> ApiResult<Json<StatsReport>> {
    let snapshot = current_snapshot(&dashboard).await?;
    let events = dashboard.visible_disasters().await;
    Ok(Json(StatsReport::build(&events, &snapshot.weather, Utc::now())))
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub window: Option<String>,
}

async fn get_timeline(
    State(dashboard): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> ApiResult<Json<Timeline>> {
    current_snapshot(&dashboard).await?;
    let window = match query.window.as_deref() {
        Some(window) => window
            .parse::<TimeWindow>()
            .map_err(ApiError::bad_request)?,
        None => TimeWindow::default(),
    };
    let events = dashboard.visible_disasters().await;
    Ok(Json(timeline::build_timeline(&events, window, Utc::now())))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

async fn get_search(
    State(dashboard): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResults>> {
    let snapshot = current_snapshot(&dashboard).await?;
    let q = query.q.unwrap_or_default();

    let mut results = search::search(&snapshot.disasters, &snapshot.weather, &q);
    match dashboard.geocoder().search(&q).await {
        Ok(locations) => results.locations = locations,
        Err(e) => warn!("Geocoding '{}' failed: {:#}", q, e),
    }

    Ok(Json(results))
}

#[derive(Serialize)]
struct NotificationsResponse {
    unread: usize,
    notifications: Vec<Notification>,
}

async fn get_notifications(State(dashboard): State<AppState>) -> Json<NotificationsResponse> {
    let notifications = dashboard.notifications().await;
    Json(NotificationsResponse {
        unread: notifications.iter().filter(|n| !n.read).count(),
        notifications,
    })
}

async fn dismiss_notification(
    State(dashboard): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if dashboard.dismiss_notification(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("No notification with id {id}")))
    }
}

async fn dismiss_all_notifications(State(dashboard): State<AppState>) -> StatusCode {
    dashboard.dismiss_all_notifications().await;
    StatusCode::NO_CONTENT
}

async fn get_notification_settings(State(dashboard): State<AppState>) -> Json<NotificationSettings> {
    Json(dashboard.notification_settings().await)
}

async fn update_notification_settings(
    State(dashboard): State<AppState>,
    Json(update): Json<NotificationSettingsUpdate>,
) -> Json<NotificationSettings> {
    Json(dashboard.update_notification_settings(update).await)
}

async fn get_filters(State(dashboard): State<AppState>) -> Json<FilterState> {
    Json(dashboard.filters().await)
}

async fn toggle_filter(
    State(dashboard): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<FilterState>> {
    let category = DisasterCategory::parse(&category)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown category '{category}'")))?;
    let mut filters = dashboard.filters().await;
    filters.toggle(category);
    dashboard.set_filters(filters.clone()).await;
    Ok(Json(filters))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub scope: Option<ExportScope>,
}

async fn export_json(
    State(dashboard): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let snapshot = current_snapshot(&dashboard).await?;
    let disasters = query.scope.unwrap_or_default().select(&snapshot.disasters);
    let body = export::to_json(&disasters, &snapshot.weather, Utc::now())?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"geoalert-data.json\""),
        ],
        body,
    )
        .into_response())
}

async fn export_csv(
    State(dashboard): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let snapshot = current_snapshot(&dashboard).await?;
    let disasters = query.scope.unwrap_or_default().select(&snapshot.disasters);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"geoalert-disasters.csv\""),
        ],
        export::to_csv(&disasters),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareQuery {
    pub event: Option<String>,
    pub city: Option<String>,
}

async fn get_share_link(
    State(dashboard): State<AppState>,
    Query(query): Query<ShareQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let target = match (query.event, query.city) {
        (Some(event), _) => ShareTarget::Event(event),
        (None, Some(city)) => ShareTarget::City(city),
        (None, None) => return Err(ApiError::bad_request("Expected an event or city parameter")),
    };
    Ok(Json(json!({ "link": target.link(dashboard.public_origin()) })))
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeQuery {
    pub name: Option<String>,
}

async fn geocode(
    State(dashboard): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<Json<Vec<Location>>> {
    let name = query
        .name
        .ok_or_else(|| ApiError::bad_request("Missing name parameter"))?;
    Ok(Json(dashboard.geocoder().search(&name).await?))
}

async fn refresh(State(dashboard): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    match dashboard.refresh().await? {
        RefreshOutcome::Updated {
            disasters,
            cities,
            notifications,
        } => Ok(Json(json!({
            "status": "updated",
            "disasters": disasters,
            "cities": cities,
            "notifications": notifications.len(),
        }))),
        RefreshOutcome::Skipped => Ok(Json(json!({ "status": "skipped" }))),
    }
}
