//! Persistent single-entry forecast cache.
//!
//! Stores the last snapshot as JSON together with the millisecond instant it
//! was fetched, under two fixed keys. The entry is not keyed by coordinate.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::store::{KeyValueStore, MemoryStore, StoreError};
use crate::types::{ForecastSnapshot, WeatherError};

pub const CACHE_PAYLOAD_KEY: &str = "weather_cache";
pub const CACHE_TIMESTAMP_KEY: &str = "weather_cache_time";

/// How long a cached snapshot counts as fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// A stored snapshot and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub snapshot: ForecastSnapshot,
    /// Milliseconds since the Unix epoch. Zero when the timestamp was lost.
    pub fetched_at_ms: i64,
}

/// True when there is no entry, or the entry is older than `ttl` at `now`.
///
/// An entry exactly `ttl` old is still fresh.
pub fn is_stale(entry: Option<&CacheEntry>, now: DateTime<Utc>, ttl: Duration) -> bool {
    match entry {
        None => true,
        Some(entry) => {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            now.timestamp_millis().saturating_sub(entry.fetched_at_ms) > ttl_ms
        }
    }
}

#[derive(Clone)]
pub struct ForecastCache {
    store: Arc<Mutex<Box<dyn KeyValueStore>>>,
}

impl ForecastCache {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Run a blocking store operation off the async runtime.
    async fn with_store<F, T>(&self, f: F) -> Result<T, WeatherError>
    where
        F: FnOnce(&dyn KeyValueStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let guard = store.lock();
            f(&**guard)
        })
        .await
        .map_err(|e| WeatherError::Cache(format!("Task join error: {}", e)))?
        .map_err(|e| WeatherError::Cache(e.to_string()))
    }

    /// Read the stored entry.
    ///
    /// Never fails: unreadable storage or a corrupt payload reads as no
    /// entry. A missing or unparseable timestamp reads as the epoch, which
    /// keeps the payload usable as a fallback while marking it stale.
    pub async fn read(&self) -> Option<CacheEntry> {
        let raw = self
            .with_store(|store| {
                let payload = store.get(CACHE_PAYLOAD_KEY)?;
                let timestamp = store.get(CACHE_TIMESTAMP_KEY)?;
                Ok((payload, timestamp))
            })
            .await;

        let (payload, timestamp) = match raw {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("Failed to read forecast cache: {}", e);
                return None;
            }
        };

        let payload = payload?;
        let snapshot: ForecastSnapshot = match serde_json::from_str(&payload) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("Ignoring corrupt cached forecast: {}", e);
                return None;
            }
        };

        let fetched_at_ms = match timestamp.as_deref().map(str::parse::<i64>) {
            Some(Ok(ms)) => ms,
            Some(Err(e)) => {
                tracing::debug!("Ignoring unparseable cache timestamp: {}", e);
                0
            }
            None => 0,
        };

        Some(CacheEntry {
            snapshot,
            fetched_at_ms,
        })
    }

    /// Replace the stored entry; payload and timestamp are written together.
    pub async fn write(
        &self,
        snapshot: &ForecastSnapshot,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), WeatherError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| WeatherError::Cache(format!("Serialize error: {}", e)))?;
        let timestamp = fetched_at.timestamp_millis().to_string();

        self.with_store(move |store| {
            store.set_many(&[
                (CACHE_PAYLOAD_KEY, payload.as_str()),
                (CACHE_TIMESTAMP_KEY, timestamp.as_str()),
            ])
        })
        .await?;

        tracing::debug!("Cached forecast at {}", fetched_at);
        Ok(())
    }

    /// Remove both keys.
    pub async fn clear(&self) -> Result<(), WeatherError> {
        self.with_store(|store| store.remove_many(&[CACHE_PAYLOAD_KEY, CACHE_TIMESTAMP_KEY]))
            .await?;
        tracing::info!("Forecast cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{CurrentReading, DailySeries, HourlySeries};
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, s).unwrap()
    }

    fn snapshot() -> ForecastSnapshot {
        ForecastSnapshot {
            latitude: 52.5,
            longitude: 13.25,
            elevation: 38.0,
            utc_offset_seconds: 0,
            current: CurrentReading {
                time: at(14, 0, 0),
                temperature: 21.5,
                weather_code: 2,
            },
            hourly: HourlySeries {
                time: vec![at(14, 0, 0), at(15, 0, 0)],
                temperature: vec![Some(21.5), None],
                weather_code: vec![Some(2), Some(3)],
            },
            daily: DailySeries {
                time: vec![at(0, 0, 0)],
                temperature_max: vec![Some(24.75)],
                temperature_min: vec![Some(18.25)],
                weather_code: vec![Some(61)],
            },
        }
    }

    fn entry_at(ms: i64) -> CacheEntry {
        CacheEntry {
            snapshot: snapshot(),
            fetched_at_ms: ms,
        }
    }

    #[test]
    fn test_missing_entry_is_stale() {
        assert!(is_stale(None, at(12, 0, 0), DEFAULT_TTL));
    }

    #[test]
    fn test_staleness_boundary() {
        let fetched = at(12, 0, 0).timestamp_millis();
        let entry = entry_at(fetched);

        assert!(!is_stale(Some(&entry), at(12, 30, 0), DEFAULT_TTL));
        assert!(!is_stale(Some(&entry), at(13, 0, 0), DEFAULT_TTL));

        let just_over = at(13, 0, 0) + chrono::Duration::milliseconds(1);
        assert!(is_stale(Some(&entry), just_over, DEFAULT_TTL));
        assert!(is_stale(Some(&entry), at(14, 0, 0), DEFAULT_TTL));
    }

    #[test]
    fn test_lost_timestamp_is_stale() {
        assert!(is_stale(Some(&entry_at(0)), at(12, 0, 0), DEFAULT_TTL));
    }

    #[tokio::test]
    async fn test_empty_cache_reads_none() {
        let cache = ForecastCache::in_memory();
        assert!(cache.read().await.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let cache = ForecastCache::new(Box::new(SqliteStore::in_memory().unwrap()));
        let fetched = at(12, 0, 0);

        cache.write(&snapshot(), fetched).await.unwrap();
        let entry = cache.read().await.unwrap();

        assert_eq!(entry.snapshot, snapshot());
        assert_eq!(entry.fetched_at_ms, fetched.timestamp_millis());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_entry() {
        let cache = ForecastCache::in_memory();
        cache.write(&snapshot(), at(10, 0, 0)).await.unwrap();

        let mut newer = snapshot();
        newer.current.temperature = 25.0;
        cache.write(&newer, at(11, 0, 0)).await.unwrap();

        let entry = cache.read().await.unwrap();
        assert_eq!(entry.snapshot.current.temperature, 25.0);
        assert_eq!(entry.fetched_at_ms, at(11, 0, 0).timestamp_millis());
    }

    #[tokio::test]
    async fn test_missing_timestamp_reads_as_epoch() {
        let store = MemoryStore::new();
        store
            .set(CACHE_PAYLOAD_KEY, &serde_json::to_string(&snapshot()).unwrap())
            .unwrap();
        let cache = ForecastCache::new(Box::new(store));

        let entry = cache.read().await.unwrap();
        assert_eq!(entry.fetched_at_ms, 0);
        assert!(is_stale(Some(&entry), at(12, 0, 0), DEFAULT_TTL));
    }

    #[tokio::test]
    async fn test_corrupt_payload_reads_none() {
        let store = MemoryStore::new();
        store.set(CACHE_PAYLOAD_KEY, "{not json").unwrap();
        store.set(CACHE_TIMESTAMP_KEY, "1710072000000").unwrap();
        let cache = ForecastCache::new(Box::new(store));

        assert!(cache.read().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let cache = ForecastCache::in_memory();
        cache.write(&snapshot(), at(12, 0, 0)).await.unwrap();

        cache.clear().await.unwrap();
        assert!(cache.read().await.is_none());

        // Clearing an empty cache is fine
        cache.clear().await.unwrap();
    }
}
