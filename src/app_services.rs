//! Process-wide services: the forecast client, cache and provider.
//!
//! Built once from the loaded [`Config`] and torn down explicitly on exit.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use skycast_core::{AppError, Config};
use skycast_weather::{
    get_current_location, Coordinate, ForecastCache, ForecastClient, ForecastProvider,
    ForecastView, LocationSettings, RetryConfig, SqliteStore,
};

use crate::error_mapping::IntoAppError;

pub struct AppServices {
    config: Config,
    provider: ForecastProvider,
    location: LocationSettings,
    shutdown: CancellationToken,
}

impl AppServices {
    /// Open the cache database and build the provider.
    ///
    /// `overrides` (from the command line) win over the configured location.
    pub fn build(config: Config, overrides: LocationSettings) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.config_dir)?;

        let cache_path = config.cache_path();
        let store = SqliteStore::new(&cache_path).map_err(IntoAppError::into_app_error)?;
        tracing::debug!("Forecast cache at {}", cache_path.display());

        let retry = RetryConfig {
            max_retries: config.weather.max_retries,
            ..RetryConfig::default()
        };
        let client =
            ForecastClient::with_base_url(&config.weather.api_url, config.weather.timeout(), retry)
                .map_err(IntoAppError::into_app_error)?;

        let provider = ForecastProvider::with_ttl(
            client,
            ForecastCache::new(Box::new(store)),
            config.weather.cache_ttl(),
        );

        let location = LocationSettings::new(config.location.latitude, config.location.longitude)
            .overridden_by(overrides);

        tracing::info!("AppServices initialized");

        Ok(Self {
            config,
            provider,
            location,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn current_location(&self) -> Result<Coordinate, AppError> {
        get_current_location(&self.location)
            .await
            .map_err(IntoAppError::into_app_error)
    }

    /// Resolve the location, get a forecast and project it at `now`.
    ///
    /// An empty view means neither the network nor the cache had data.
    pub async fn load_view(&self, now: DateTime<Utc>) -> Result<ForecastView, AppError> {
        let coord = self.current_location().await?;
        let snapshot = self.provider.get_forecast_at(coord, now).await;

        let mut view = ForecastView::new();
        view.update_snapshot(snapshot, now);
        Ok(view)
    }

    /// Refresh an existing view in place, keeping it when no data comes back.
    pub async fn refresh_view(
        &self,
        view: &mut ForecastView,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let coord = self.current_location().await?;
        match self.provider.get_forecast_at(coord, now).await {
            Some(snapshot) => view.update_snapshot(Some(snapshot), now),
            None => view.on_tick(now),
        }
        Ok(())
    }

    pub async fn clear_cache(&self) -> Result<(), AppError> {
        self.provider
            .clear_cache()
            .await
            .map_err(IntoAppError::into_app_error)
    }

    /// Token cancelled on shutdown; background jobs should watch it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");
        self.shutdown.cancel();
    }
}
