//! Weather forecast pipeline for Skycast
//!
//! Fetches current, hourly and daily forecasts from the Open-Meteo API,
//! keeps the last result in a one-hour persistent cache, and projects it
//! into display rows.

pub mod cache;
pub mod catalog;
pub mod client;
pub mod location;
pub mod projection;
pub mod provider;
pub mod retry;
pub mod schedule;
pub mod store;
pub mod types;
pub mod view;

pub use cache::{is_stale, CacheEntry, ForecastCache};
pub use catalog::{icon_category_of, label_of, IconCategory};
pub use client::ForecastClient;
pub use location::{get_current_location, LocationSettings};
pub use projection::{project_daily, project_hourly};
pub use provider::ForecastProvider;
pub use retry::RetryConfig;
pub use schedule::HourlyTicker;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use types::*;
pub use view::ForecastView;
