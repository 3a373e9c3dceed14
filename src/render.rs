//! Plain-text rendering of a [`ForecastView`].

use std::fmt::Write;

use chrono::{DateTime, TimeZone, Utc};
use skycast_weather::catalog::PLACEHOLDER_LABEL;
use skycast_weather::{
    icon_category_of, label_of, DailySample, ForecastView, HourlySample, IconCategory,
};

pub const FOOTER: &str = "Weather data by Open-Meteo.com";
pub const NO_DATA: &str = "No weather data available";
pub const CACHE_CLEARED: &str = "Cache cleared!";
pub const LOCATION_HINT: &str =
    "Grant location access with --lat/--lon or the [location] section of the config file.";

pub fn icon_glyph(category: IconCategory) -> &'static str {
    match category {
        IconCategory::Clear => "☀",
        IconCategory::PartlyCloudy => "⛅",
        IconCategory::Overcast => "☁",
        IconCategory::Fog => "🌫",
        IconCategory::Drizzle | IconCategory::RainShowers => "🌦",
        IconCategory::FreezingDrizzle | IconCategory::Rain => "🌧",
        IconCategory::FreezingRain | IconCategory::SnowShowers => "🌨",
        IconCategory::Snow | IconCategory::SnowGrains => "❄",
        IconCategory::Thunderstorm => "⛈",
        IconCategory::Unknown => "",
    }
}

/// Whole degrees, without a negative zero.
fn whole_degrees(value: f32) -> String {
    let rounded = value.round();
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.0}", rounded)
}

fn degrees(value: Option<f32>) -> String {
    value.map_or_else(|| PLACEHOLDER_LABEL.to_string(), |v| format!("{}°", whole_degrees(v)))
}

fn icon(code: Option<i32>) -> &'static str {
    icon_glyph(icon_category_of(code))
}

/// `text` preceded by the code's icon, if it has one.
fn with_icon(code: Option<i32>, text: &str) -> String {
    match icon(code) {
        "" => text.to_string(),
        glyph => format!("{} {}", glyph, text),
    }
}

/// Current conditions and today's date.
pub fn render_current<Tz: TimeZone>(view: &ForecastView, tz: &Tz, now: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let Some(snapshot) = view.snapshot() else {
        return NO_DATA.to_string();
    };

    let current = &snapshot.current;
    let code = Some(current.weather_code);
    let _ = writeln!(
        out,
        "{}℃  {}",
        whole_degrees(current.temperature),
        with_icon(code, label_of(code))
    );
    let _ = write!(out, "{}", now.with_timezone(tz).format("%d/%m/%Y"));
    out
}

pub fn render_hourly<Tz: TimeZone>(rows: &[HourlySample], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    rows.iter()
        .map(|row| {
            format!(
                "{}  {}",
                row.time.with_timezone(tz).format("%H:%M"),
                with_icon(row.weather_code, &degrees(row.temperature))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Daily rows; the row falling on `now`'s date reads "Today".
pub fn render_daily<Tz: TimeZone>(rows: &[DailySample], tz: &Tz, now: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let today = now.with_timezone(tz).date_naive();
    rows.iter()
        .map(|row| {
            let local = row.time.with_timezone(tz);
            let day = if local.date_naive() == today {
                "Today".to_string()
            } else {
                local.format("%A").to_string()
            };
            let temps = format!(
                "{}/{}",
                degrees(row.temperature_max),
                degrees(row.temperature_min)
            );
            format!("{:<10} {}", day, with_icon(row.weather_code, &temps))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full screen: current, hourly, daily and the attribution footer.
pub fn render_view<Tz: TimeZone>(view: &ForecastView, tz: &Tz, now: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if view.is_empty() {
        return format!("{}\n\n{}", NO_DATA, FOOTER);
    }

    let mut out = render_current(view, tz, now);
    if !view.hourly().is_empty() {
        let _ = write!(out, "\n\nHourly\n{}", render_hourly(view.hourly(), tz));
    }
    if !view.daily().is_empty() {
        let _ = write!(out, "\n\nDaily\n{}", render_daily(view.daily(), tz, now));
    }
    let _ = write!(out, "\n\n{}", FOOTER);
    out
}
