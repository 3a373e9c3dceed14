use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Name of the directory under the platform config dir.
pub const APP_DIR_NAME: &str = "skycast";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CACHE_FILE_NAME: &str = "weather_cache.db";

/// Prefix for environment overrides, e.g. `SKYCAST_WEATHER__TIMEOUT_SECS`.
pub const ENV_PREFIX: &str = "SKYCAST";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A loaded config plus what happened while loading it.
///
/// Loading runs before logging is set up, so diagnostics are kept here and
/// emitted later through [`LoadedConfig::log_diagnostics`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub validation: ValidationResult,
    /// Set when the file did not exist and defaults were written to it.
    pub created: Option<PathBuf>,
}

impl LoadedConfig {
    pub fn log_diagnostics(&self) {
        if let Some(path) = &self.created {
            tracing::info!("Created default config at {}", path.display());
        }
        for warning in &self.validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the config file and the forecast cache
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient upstream failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How long a cached forecast is served without refetching
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,
}

fn default_api_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_cache_ttl_minutes() -> u64 {
    60
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }
}

/// Granted device location. Unset means permission was not given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location, creating it with defaults if missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, creating it with defaults if missing.
    ///
    /// A freshly created file keeps its cache next to it.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load from `path` (or the default location) and reject configurations
    /// with validation errors.
    pub fn load_validated(path: Option<&Path>) -> std::result::Result<LoadedConfig, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path().map_err(|_| ConfigError::NoConfigDir)?,
        };
        Self::load_validated_with_env(&path, None)
    }

    fn load_validated_with_env(
        path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> std::result::Result<LoadedConfig, ConfigError> {
        let created = (!path.exists()).then(|| path.to_path_buf());
        let config = Self::load_with_env(path, env)
            .map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;

        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        Ok(LoadedConfig {
            config,
            validation,
            created,
        })
    }

    /// `env` replaces the process environment when given.
    fn load_with_env(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
        }

        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path.to_path_buf())
                    .required(false)
                    .format(::config::FileFormat::Toml),
            )
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }

        if self.weather.cache_ttl_minutes == 0 {
            result.add_error(
                "weather.cache_ttl_minutes",
                "Cache lifetime must be greater than 0",
            );
        }

        if self.weather.max_retries > 5 {
            result.add_warning(
                "weather.max_retries",
                format!(
                    "{} retries may delay a response by a long time",
                    self.weather.max_retries
                ),
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within -90..90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", "Longitude must be within -180..180");
                }
                if lat == 0.0 || lon == 0.0 {
                    result.add_warning(
                        "location",
                        "A zero coordinate is treated as no location",
                    );
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                result.add_warning(
                    "location",
                    "Only one coordinate is set; supply the other with --lat/--lon",
                );
            }
            (None, None) => {}
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(
                "logging.level",
                format!(
                    "Unknown log level '{}', expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// SQLite file holding the forecast cache.
    pub fn cache_path(&self) -> PathBuf {
        self.config_dir.join(CACHE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.weather.api_url, "https://api.open-meteo.com/v1/forecast");
        assert_eq!(config.weather.timeout(), Duration::from_secs(10));
        assert_eq!(config.weather.max_retries, 2);
        assert_eq!(config.weather.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.location, LocationConfig::default());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.api_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.api_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.api_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_and_ttl() {
        let mut config = Config::default();
        config.weather.timeout_secs = 0;
        config.weather.cache_ttl_minutes = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "weather.timeout_secs"));
        assert!(result.errors.iter().any(|e| e.field == "weather.cache_ttl_minutes"));
    }

    #[test]
    fn test_location_validation() {
        let mut config = Config::default();
        config.location = LocationConfig {
            latitude: Some(91.0),
            longitude: Some(13.41),
        };
        assert!(config
            .validate()
            .errors
            .iter()
            .any(|e| e.field == "location.latitude"));

        config.location = LocationConfig {
            latitude: Some(52.52),
            longitude: None,
        };
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "location"));

        config.location = LocationConfig {
            latitude: Some(0.0),
            longitude: Some(13.41),
        };
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.message.contains("zero")));
    }

    #[test]
    fn test_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(!config.validate().is_valid());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_many_retries_is_warning() {
        let mut config = Config::default();
        config.weather.max_retries = 9;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.max_retries"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        assert_eq!(result.error_summary(), "");
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        assert_eq!(result.error_summary(), "field1: error1; field2: error2");
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skycast").join(CONFIG_FILE_NAME);

        let config = Config::load_with_env(&path, env(&[])).unwrap();

        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path().join("skycast"));
        assert_eq!(config.cache_path(), dir.path().join("skycast").join(CACHE_FILE_NAME));
        assert_eq!(config.weather, WeatherConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.config_dir = dir.path().to_path_buf();
        config.location = LocationConfig {
            latitude: Some(52.5),
            longitude: Some(13.25),
        };
        config.weather.max_retries = 4;
        config.save_to(&path).unwrap();

        let loaded = Config::load_with_env(&path, env(&[])).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let loaded = Config::load_with_env(&path, env(&[])).unwrap();
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.weather, WeatherConfig::default());
        assert_eq!(loaded.location, LocationConfig::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        Config::default().save_to(&path).unwrap();

        let loaded = Config::load_with_env(
            &path,
            env(&[
                ("SKYCAST_WEATHER__TIMEOUT_SECS", "3"),
                ("SKYCAST_LOCATION__LATITUDE", "48.85"),
                ("SKYCAST_LOCATION__LONGITUDE", "2.35"),
            ]),
        )
        .unwrap();

        assert_eq!(loaded.weather.timeout_secs, 3);
        assert_eq!(loaded.location.latitude, Some(48.85));
        assert_eq!(loaded.location.longitude, Some(2.35));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[weather\ntimeout_secs = ").unwrap();

        assert!(Config::load_with_env(&path, env(&[])).is_err());
    }

    #[test]
    fn test_load_validated_reports_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let first = Config::load_validated_with_env(&path, env(&[])).unwrap();
        assert_eq!(first.created, Some(path.clone()));
        assert!(first.validation.is_valid());

        let second = Config::load_validated_with_env(&path, env(&[])).unwrap();
        assert!(second.created.is_none());
        assert_eq!(second.config, first.config);
    }

    #[test]
    fn test_load_validated_keeps_warnings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let loaded = Config::load_validated_with_env(
            &path,
            env(&[("SKYCAST_LOCATION__LATITUDE", "52.52")]),
        )
        .unwrap();

        let warning = loaded
            .validation
            .warnings
            .iter()
            .find(|w| w.field == "location")
            .unwrap();
        assert!(warning.message.contains("--lat/--lon"));
    }

    #[test]
    fn test_load_validated_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[weather\ntimeout_secs = ").unwrap();

        let err = Config::load_validated_with_env(&path, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_validated_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[weather]\ntimeout_secs = 0\n").unwrap();

        match Config::load_validated_with_env(&path, env(&[])) {
            Err(ConfigError::Invalid(summary)) => {
                assert!(summary.contains("weather.timeout_secs"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
