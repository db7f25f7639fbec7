//! Disaster feed aggregation
//!
//! Fetches the EONET and USGS feeds concurrently, normalizes them into
//! [`DisasterEvent`]s, removes duplicate earthquakes reported by both sources
//! and sorts the result newest first.

pub mod eonet;
pub mod usgs;

use crate::config::FeedsConfig;
use crate::http::HttpClient;
use crate::models::{CoordinateKey, DisasterCategory, DisasterEvent};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

pub use eonet::EonetFeed;
pub use usgs::UsgsFeed;

/// A source of normalized events. Implementations log and swallow their own
/// failures, returning an empty list.
#[async_trait]
pub trait EventFeed: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Vec<DisasterEvent>;
}

/// The configured EONET and USGS feeds
pub struct DisasterFeeds {
    usgs: Box<dyn EventFeed>,
    eonet: Box<dyn EventFeed>,
}

impl DisasterFeeds {
    #[must_use]
    pub fn new(client: HttpClient, config: &FeedsConfig) -> Self {
        let usgs_urls = vec![
            config.usgs_hour_url.clone(),
            config.usgs_day_url.clone(),
            config.usgs_significant_url.clone(),
        ];
        Self {
            usgs: Box::new(UsgsFeed::new(client.clone(), usgs_urls)),
            eonet: Box::new(EonetFeed::new(client, config.eonet_url.clone())),
        }
    }

    /// Build from arbitrary feeds, USGS-like source first
    #[must_use]
    pub fn from_feeds(usgs: Box<dyn EventFeed>, eonet: Box<dyn EventFeed>) -> Self {
        Self { usgs, eonet }
    }

    /// Fetch every feed concurrently and merge the results
    #[instrument(skip(self))]
    pub async fn fetch_disaster_events(&self) -> Vec<DisasterEvent> {
        let (usgs_events, eonet_events) = futures::join!(self.usgs.fetch(), self.eonet.fetch());

        info!(
            "Fetched {} events from {} and {} from {}",
            usgs_events.len(),
            self.usgs.name(),
            eonet_events.len(),
            self.eonet.name()
        );

        let merged = merge_events(usgs_events, eonet_events);
        info!("{} events after deduplication", merged.len());
        merged
    }
}

/// Deserialize feed items one by one, skipping those that do not fit `T`
pub(crate) fn parse_items<T: DeserializeOwned>(feed: &str, items: Vec<serde_json::Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("[{}] Skipping malformed item: {}", feed, e);
                None
            }
        })
        .collect()
}

fn claims_location(event: &DisasterEvent) -> bool {
    event.id.starts_with("usgs-") || event.category == DisasterCategory::Earthquakes
}

/// Merge USGS and EONET events.
///
/// USGS events and earthquake-category events claim their coordinate key and
/// are dropped when the key is already claimed. Other EONET events always
/// pass. The result is sorted by date, newest first, with ties kept in input
/// order.
#[must_use]
pub fn merge_events(usgs: Vec<DisasterEvent>, eonet: Vec<DisasterEvent>) -> Vec<DisasterEvent> {
    let mut claimed: HashSet<CoordinateKey> = HashSet::new();
    let mut merged = Vec::with_capacity(usgs.len() + eonet.len());

    for event in usgs.into_iter().chain(eonet) {
        if claims_location(&event) && !claimed.insert(event.coordinate_key()) {
            continue;
        }
        merged.push(event);
    }

    sort_newest_first(&mut merged);
    merged
}

/// Stable sort by date descending
pub fn sort_newest_first(events: &mut [DisasterEvent]) {
    events.sort_by(|a, b| b.date.cmp(&a.date));
}
