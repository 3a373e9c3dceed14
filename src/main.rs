//! Skycast: current, hourly and daily weather for your location.
//!
//! Forecasts come from Open-Meteo and are cached for an hour in the config
//! directory, so repeated runs stay offline-friendly.

mod app_services;
mod error_mapping;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use skycast_core::{AppError, Config, ConfigError, LoadedConfig, WeatherError as AppWeatherError};
use skycast_weather::{HourlyTicker, LocationSettings};

use crate::app_services::AppServices;
use crate::render::{render_view, CACHE_CLEARED, LOCATION_HINT};

/// Weather forecast for your location
#[derive(Parser)]
#[command(name = "skycast", version, about = "Current, hourly and daily weather forecast")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Latitude, overrides the configured location
    #[arg(long, global = true, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude, overrides the configured location
    #[arg(long, global = true, allow_hyphen_values = true)]
    lon: Option<f64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
    /// Show the forecast once (default)
    Show,
    /// Show the forecast and refresh it every hour until Ctrl-C
    Watch,
    /// Remove the cached forecast
    ClearCache,
    /// Print config and cache locations
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            if is_location_error(&e) {
                eprintln!("{}", LOCATION_HINT);
            }
            ExitCode::FAILURE
        }
    }
}

fn is_location_error(e: &AppError) -> bool {
    matches!(
        e,
        AppError::Weather(
            AppWeatherError::LocationDenied | AppWeatherError::LocationUnavailable(_)
        )
    )
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let loaded = Config::load_validated(cli.config.as_deref())?;

    skycast_core::init(&loaded.config.logging.level)?;
    loaded.log_diagnostics();
    let LoadedConfig { config, validation, .. } = loaded;

    let command = cli.command.unwrap_or(Command::Show);
    tracing::debug!("Running {:?}", command);

    if command == Command::Config {
        let path = match cli.config {
            Some(path) => path,
            None => Config::config_path().map_err(|_| ConfigError::NoConfigDir)?,
        };
        println!("Config file: {}", path.display());
        println!("Cache:       {}", config.cache_path().display());
        println!("Log level:   {}", config.logging.level);
        for warning in &validation.warnings {
            println!("Warning:     {}", warning);
        }
        return Ok(());
    }

    let overrides = LocationSettings::new(cli.lat, cli.lon);
    let services = AppServices::build(config, overrides)?;

    let result = match command {
        Command::ClearCache => clear_cache(&services).await,
        Command::Watch => watch(&services).await,
        Command::Show | Command::Config => show(&services).await,
    };

    services.shutdown();
    result
}

async fn show(services: &AppServices) -> Result<(), AppError> {
    let now = Utc::now();
    let view = services.load_view(now).await?;
    println!("{}", render_view(&view, &Local, now));
    Ok(())
}

async fn clear_cache(services: &AppServices) -> Result<(), AppError> {
    services.clear_cache().await?;
    println!("{}", CACHE_CLEARED);
    Ok(())
}

async fn watch(services: &AppServices) -> Result<(), AppError> {
    let now = Utc::now();
    let mut view = services.load_view(now).await?;
    println!("{}", render_view(&view, &Local, now));

    let mut ticker = HourlyTicker::spawn_with_token(services.shutdown_token().child_token());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
            tick = ticker.tick() => {
                let Some(boundary) = tick else { break };
                tracing::debug!("Hourly tick at {}", boundary);

                let now = Utc::now();
                services.refresh_view(&mut view, now).await?;
                println!("\n{}", render_view(&view, &Local, now));
            }
        }
    }

    ticker.cancel();
    Ok(())
}
