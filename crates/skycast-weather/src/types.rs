use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate of the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// A zero (or non-finite) component means "no location".
    pub fn is_usable(&self) -> bool {
        self.latitude != 0.0
            && self.longitude != 0.0
            && self.latitude.is_finite()
            && self.longitude.is_finite()
    }
}

/// Conditions at the time of the fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReading {
    pub time: DateTime<Utc>,
    pub temperature: f32,
    pub weather_code: i32,
}

/// Hourly columns, index-aligned with `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<DateTime<Utc>>,
    pub temperature: Vec<Option<f32>>,
    pub weather_code: Vec<Option<i32>>,
}

/// Daily columns, index-aligned with `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<DateTime<Utc>>,
    pub temperature_max: Vec<Option<f32>>,
    pub temperature_min: Vec<Option<f32>>,
    pub weather_code: Vec<Option<i32>>,
}

/// One complete forecast result as returned by a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub utc_offset_seconds: i32,
    pub current: CurrentReading,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub time: DateTime<Utc>,
    pub temperature: Option<f32>,
    pub weather_code: Option<i32>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySample {
    pub time: DateTime<Utc>,
    pub temperature_max: Option<f32>,
    pub temperature_min: Option<f32>,
    pub weather_code: Option<i32>,
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Permission to access location was denied")]
    PermissionDenied,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unexpected {group} variables: {detail}")]
    VariableMismatch { group: &'static str, detail: String },
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Api { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again later.".to_string()
            }
            Self::Api { message, .. } => {
                format!("Weather service rejected the request: {}", message)
            }
            Self::Parse(_) | Self::VariableMismatch { .. } => {
                "Received unexpected weather data.".to_string()
            }
            Self::Cache(_) => "Local weather cache error".to_string(),
            Self::Location(e) => e.to_string(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }
}
