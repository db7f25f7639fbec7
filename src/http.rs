//! Shared HTTP client for every upstream feed
//!
//! Wraps `reqwest` in `reqwest-middleware` so transient failures (connection
//! errors, 5xx, 429) are retried with exponential backoff before a request is
//! reported as failed.

use crate::GeoAlertError;
use crate::config::HttpConfig;
use crate::models::City;
use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Cities fetched concurrently per batch
pub const BATCH_SIZE: usize = 5;
/// Pause between batches, keeps the free Open-Meteo tier from throttling us
pub const BATCH_PAUSE: Duration = Duration::from_millis(200);

/// Cloneable handle around one connection pool
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ClientWithMiddleware,
}

impl HttpClient {
    /// Build the client from the `[http]` configuration section
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.clone())
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let mut builder = ClientBuilder::new(inner);
        if config.max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            client: builder.build(),
        })
    }

    /// GET a URL and decode the JSON body. Non-success statuses are errors.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeoAlertError::api(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoAlertError::api(format!(
                "Request to {url} failed with status: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ))
            .into());
        }

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))?;

        let total_duration = start_time.elapsed();
        debug!("GET {} completed in {:.3}s", url, total_duration.as_secs_f64());
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s for {}",
                total_duration.as_secs_f64(),
                url
            );
        }

        Ok(body)
    }
}

/// Fetch per-city data a batch at a time, pausing between batches.
/// Failed cities are logged and skipped; results keep the input order.
pub async fn fetch_in_batches<'a, T, F, Fut>(cities: &'a [City], what: &str, fetch: F) -> Vec<T>
where
    F: Fn(&'a City) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut fetched = Vec::with_capacity(cities.len());

    let batch_count = cities.len().div_ceil(BATCH_SIZE);
    for (index, batch) in cities.chunks(BATCH_SIZE).enumerate() {
        let results = futures::future::join_all(batch.iter().map(&fetch)).await;

        for (result, city) in results.into_iter().zip(batch.iter()) {
            match result {
                Ok(item) => fetched.push(item),
                Err(e) => warn!("Failed to fetch {} for {}: {:#}", what, city.name, e),
            }
        }

        debug!("{} batch {}/{} done", what, index + 1, batch_count);
        if index + 1 < batch_count {
            tokio::time::sleep(BATCH_PAUSE).await;
        }
    }

    fetched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_and_without_retries() {
        let mut config = HttpConfig::default();
        assert!(HttpClient::new(&config).is_ok());

        config.max_retries = 0;
        assert!(HttpClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let config = HttpConfig {
            timeout_seconds: 1,
            max_retries: 0,
            user_agent: "test".to_string(),
        };
        let client = HttpClient::new(&config).unwrap();
        let result: Result<serde_json::Value> = client.get_json("http://127.0.0.1:1/none").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_batches_skip_failures_and_keep_order() {
        let cities: Vec<City> = (0..7)
            .map(|i| City::new(&format!("City {i}"), "X", "Europe", 0.0, f64::from(i)))
            .collect();

        let names = fetch_in_batches(&cities, "test data", |city| async move {
            if city.name == "City 3" {
                anyhow::bail!("upstream error");
            }
            Ok::<_, anyhow::Error>(city.name.clone())
        })
        .await;

        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "City 0");
        assert_eq!(names[3], "City 4");
        assert_eq!(names[5], "City 6");
    }
}
