//! Open-Meteo forecast client.
//!
//! Requests exactly three variable groups and decodes them by name, so a
//! response missing a requested variable fails loudly instead of shifting
//! columns.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{
    Coordinate, CurrentReading, DailySeries, ForecastSnapshot, HourlySeries, WeatherError,
};

pub const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const CURRENT_VARIABLES: [&str; 2] = ["temperature_2m", "weather_code"];
pub const HOURLY_VARIABLES: [&str; 2] = ["temperature_2m", "weather_code"];
pub const DAILY_VARIABLES: [&str; 3] = ["temperature_2m_max", "temperature_2m_min", "weather_code"];

#[derive(Debug, Deserialize)]
struct RawForecast {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    elevation: f64,
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<RawCurrent>,
    hourly: Option<RawSeries>,
    daily: Option<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    time: i64,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    time: Vec<i64>,
    #[serde(flatten)]
    columns: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawApiError {
    reason: String,
}

pub struct ForecastClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl ForecastClient {
    /// Client for the public Open-Meteo endpoint.
    pub fn new(timeout: Duration, retry: RetryConfig) -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_METEO_FORECAST_URL, timeout, retry)
    }

    /// Client for a custom endpoint (self-hosted Open-Meteo, tests).
    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Fetch current, hourly and daily forecast for a coordinate.
    ///
    /// Returns `Ok(None)` without any network traffic when the coordinate
    /// has a zero component.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, coord: Coordinate) -> Result<Option<ForecastSnapshot>, WeatherError> {
        if !coord.is_usable() {
            tracing::debug!("Skipping forecast request for unusable coordinate");
            return Ok(None);
        }

        let params = [
            ("latitude", coord.latitude.to_string()),
            ("longitude", coord.longitude.to_string()),
            ("current", CURRENT_VARIABLES.join(",")),
            ("hourly", HOURLY_VARIABLES.join(",")),
            ("daily", DAILY_VARIABLES.join(",")),
            ("timeformat", "unixtime".to_string()),
        ];

        let response = with_retry(&self.retry, || {
            self.client.get(&self.base_url).query(&params).send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RawApiError>(&body)
                .map(|e| e.reason)
                .unwrap_or(body);
            tracing::warn!("Forecast request failed with {}: {}", status, message);
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawForecast = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))?;

        let snapshot = decode(raw)?;
        tracing::info!(
            "Fetched forecast: {} hourly, {} daily entries",
            snapshot.hourly.time.len(),
            snapshot.daily.time.len()
        );
        Ok(Some(snapshot))
    }
}

fn decode(raw: RawForecast) -> Result<ForecastSnapshot, WeatherError> {
    let offset = i64::from(raw.utc_offset_seconds);

    let current = raw.current.ok_or_else(|| missing_group("current"))?;
    let hourly = raw.hourly.ok_or_else(|| missing_group("hourly"))?;
    let daily = raw.daily.ok_or_else(|| missing_group("daily"))?;

    let current = CurrentReading {
        time: instant(current.time, offset)?,
        temperature: current_value(&current.values, "temperature_2m")? as f32,
        weather_code: to_code(current_value(&current.values, "weather_code")?),
    };

    let hourly_time = instants(&hourly.time, offset)?;
    let hourly = HourlySeries {
        temperature: to_temperatures(take_column("hourly", &hourly, "temperature_2m")?),
        weather_code: to_codes(take_column("hourly", &hourly, "weather_code")?),
        time: hourly_time,
    };

    let daily_time = instants(&daily.time, offset)?;
    let daily = DailySeries {
        temperature_max: to_temperatures(take_column("daily", &daily, "temperature_2m_max")?),
        temperature_min: to_temperatures(take_column("daily", &daily, "temperature_2m_min")?),
        weather_code: to_codes(take_column("daily", &daily, "weather_code")?),
        time: daily_time,
    };

    Ok(ForecastSnapshot {
        latitude: raw.latitude,
        longitude: raw.longitude,
        elevation: raw.elevation,
        utc_offset_seconds: raw.utc_offset_seconds,
        current,
        hourly,
        daily,
    })
}

fn missing_group(group: &'static str) -> WeatherError {
    WeatherError::VariableMismatch {
        group,
        detail: "group missing from response".to_string(),
    }
}

fn instant(seconds: i64, offset: i64) -> Result<DateTime<Utc>, WeatherError> {
    seconds
        .checked_add(offset)
        .and_then(|shifted| DateTime::from_timestamp(shifted, 0))
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {}", seconds)))
}

fn instants(times: &[i64], offset: i64) -> Result<Vec<DateTime<Utc>>, WeatherError> {
    times.iter().map(|&t| instant(t, offset)).collect()
}

fn current_value(values: &HashMap<String, Value>, name: &str) -> Result<f64, WeatherError> {
    match values.get(name) {
        Some(value) => value.as_f64().ok_or_else(|| WeatherError::VariableMismatch {
            group: "current",
            detail: format!("{} is not a number", name),
        }),
        None => Err(WeatherError::VariableMismatch {
            group: "current",
            detail: format!("{} missing", name),
        }),
    }
}

/// Column `name` of `series`, checked to line up with its time axis.
fn take_column(
    group: &'static str,
    series: &RawSeries,
    name: &str,
) -> Result<Vec<Option<f64>>, WeatherError> {
    let items = series
        .columns
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| WeatherError::VariableMismatch {
            group,
            detail: format!("{} missing", name),
        })?;

    if items.len() != series.time.len() {
        return Err(WeatherError::VariableMismatch {
            group,
            detail: format!(
                "{} has {} values for {} timestamps",
                name,
                items.len(),
                series.time.len()
            ),
        });
    }

    items
        .iter()
        .map(|item| match item {
            Value::Null => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| {
                WeatherError::Parse(format!("{} {} contains a non-numeric value", group, name))
            }),
        })
        .collect()
}

fn to_code(value: f64) -> i32 {
    value.round() as i32
}

fn to_codes(values: Vec<Option<f64>>) -> Vec<Option<i32>> {
    values.into_iter().map(|v| v.map(to_code)).collect()
}

fn to_temperatures(values: Vec<Option<f64>>) -> Vec<Option<f32>> {
    values.into_iter().map(|v| v.map(|t| t as f32)).collect()
}
