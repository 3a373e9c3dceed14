//! Maps weather pipeline errors into [`AppError`].

use skycast_core::error::ReqwestErrorExt;
use skycast_core::{AppError, NetworkError, StorageError, WeatherError as AppWeatherError};
use skycast_weather::{LocationError, StoreError, WeatherError};

/// Conversion into the application error type.
///
/// Both sides are foreign to this crate, hence a trait instead of `From`.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Api { status, message } if status >= 500 => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            WeatherError::Api { message, .. } => {
                AppError::Weather(AppWeatherError::ApiError(message))
            }
            e @ (WeatherError::Parse(_) | WeatherError::VariableMismatch { .. }) => {
                AppError::Weather(AppWeatherError::InvalidData(e.to_string()))
            }
            WeatherError::Cache(s) => AppError::Storage(StorageError::OperationFailed(s)),
            WeatherError::Location(e) => e.into_app_error(),
        }
    }
}

impl IntoAppError for LocationError {
    fn into_app_error(self) -> AppError {
        match self {
            LocationError::PermissionDenied => AppError::Weather(AppWeatherError::LocationDenied),
            other => AppError::Weather(AppWeatherError::LocationUnavailable(other.to_string())),
        }
    }
}

impl IntoAppError for StoreError {
    fn into_app_error(self) -> AppError {
        AppError::Storage(StorageError::Unavailable(self.to_string()))
    }
}
