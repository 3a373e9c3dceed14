//! Cache-first forecast acquisition.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::cache::{is_stale, ForecastCache, DEFAULT_TTL};
use crate::client::ForecastClient;
use crate::types::{Coordinate, ForecastSnapshot, WeatherError};

/// Serves the cached snapshot while it is fresh and refreshes it otherwise.
///
/// A failed refresh never surfaces as an error: the last cached snapshot
/// (fresh or not) is returned instead, or `None` when there is none.
pub struct ForecastProvider {
    client: ForecastClient,
    cache: ForecastCache,
    ttl: Duration,
}

impl ForecastProvider {
    pub fn new(client: ForecastClient, cache: ForecastCache) -> Self {
        Self::with_ttl(client, cache, DEFAULT_TTL)
    }

    pub fn with_ttl(client: ForecastClient, cache: ForecastCache, ttl: Duration) -> Self {
        Self { client, cache, ttl }
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    pub async fn get_forecast(&self, coord: Coordinate) -> Option<ForecastSnapshot> {
        self.get_forecast_at(coord, Utc::now()).await
    }

    /// Like [`Self::get_forecast`], with an explicit clock reading.
    ///
    /// `now` decides staleness and becomes the stored fetch time.
    #[instrument(skip(self), level = "info")]
    pub async fn get_forecast_at(
        &self,
        coord: Coordinate,
        now: DateTime<Utc>,
    ) -> Option<ForecastSnapshot> {
        let cached = self.cache.read().await;

        if !is_stale(cached.as_ref(), now, self.ttl) {
            tracing::debug!("Serving forecast from cache");
            return cached.map(|entry| entry.snapshot);
        }

        tracing::debug!(
            "Forecast cache {}, fetching",
            if cached.is_some() { "stale" } else { "empty" }
        );

        match self.client.fetch(coord).await {
            Ok(Some(snapshot)) => {
                if let Err(e) = self.cache.write(&snapshot, now).await {
                    tracing::warn!("Failed to cache forecast: {}", e);
                }
                Some(snapshot)
            }
            Ok(None) => {
                tracing::debug!("No usable location, falling back to cache");
                cached.map(|entry| entry.snapshot)
            }
            Err(e) => {
                tracing::warn!("Forecast refresh failed, using cached data: {}", e);
                cached.map(|entry| entry.snapshot)
            }
        }
    }

    /// Drop the cached snapshot so the next request hits the network.
    pub async fn clear_cache(&self) -> Result<(), WeatherError> {
        self.cache.clear().await
    }
}
