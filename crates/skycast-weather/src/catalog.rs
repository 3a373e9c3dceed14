//! WMO weather interpretation codes.
//!
//! Maps the integer classification code reported by Open-Meteo to a display
//! label and an icon category. Drawing the category is left to the caller.
//! See: https://open-meteo.com/en/docs#weathervariables

use serde::{Deserialize, Serialize};

/// Label shown for absent or unknown codes.
pub const PLACEHOLDER_LABEL: &str = "--";

/// Icon categories; several adjacent codes share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IconCategory {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    FreezingDrizzle,
    Rain,
    FreezingRain,
    Snow,
    SnowGrains,
    RainShowers,
    SnowShowers,
    Thunderstorm,
    #[default]
    Unknown,
}

impl IconCategory {
    /// Stable tag, as used in serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Overcast => "overcast",
            Self::Fog => "fog",
            Self::Drizzle => "drizzle",
            Self::FreezingDrizzle => "freezing-drizzle",
            Self::Rain => "rain",
            Self::FreezingRain => "freezing-rain",
            Self::Snow => "snow",
            Self::SnowGrains => "snow-grains",
            Self::RainShowers => "rain-showers",
            Self::SnowShowers => "snow-showers",
            Self::Thunderstorm => "thunderstorm",
            Self::Unknown => "unknown",
        }
    }
}

/// A known WMO code with its label and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherCodeEntry {
    pub code: i32,
    pub label: &'static str,
    pub icon: IconCategory,
}

const fn entry(code: i32, label: &'static str, icon: IconCategory) -> WeatherCodeEntry {
    WeatherCodeEntry { code, label, icon }
}

/// The fixed code table, ascending by code.
pub const WEATHER_CODES: [WeatherCodeEntry; 28] = [
    entry(0, "Clear sky", IconCategory::Clear),
    entry(1, "Mainly clear", IconCategory::Clear),
    entry(2, "Partly cloudy", IconCategory::PartlyCloudy),
    entry(3, "Overcast", IconCategory::Overcast),
    entry(45, "Fog", IconCategory::Fog),
    entry(48, "Depositing rime fog", IconCategory::Fog),
    entry(51, "Light drizzle", IconCategory::Drizzle),
    entry(53, "Moderate drizzle", IconCategory::Drizzle),
    entry(55, "Dense drizzle", IconCategory::Drizzle),
    entry(56, "Light freezing drizzle", IconCategory::FreezingDrizzle),
    entry(57, "Heavy freezing drizzle", IconCategory::FreezingDrizzle),
    entry(61, "Slight rain", IconCategory::Rain),
    entry(63, "Moderate rain", IconCategory::Rain),
    entry(65, "Heavy rain", IconCategory::Rain),
    entry(66, "Light freezing rain", IconCategory::FreezingRain),
    entry(67, "Heavy freezing rain", IconCategory::FreezingRain),
    entry(71, "Slight snow fall", IconCategory::Snow),
    entry(73, "Moderate snow fall", IconCategory::Snow),
    entry(75, "Heavy snow fall", IconCategory::Snow),
    entry(77, "Snow grains", IconCategory::SnowGrains),
    entry(80, "Slight rain showers", IconCategory::RainShowers),
    entry(81, "Moderate rain showers", IconCategory::RainShowers),
    entry(82, "Violent rain showers", IconCategory::RainShowers),
    entry(85, "Slight snow showers", IconCategory::SnowShowers),
    entry(86, "Heavy snow showers", IconCategory::SnowShowers),
    entry(95, "Slight thunderstorm", IconCategory::Thunderstorm),
    entry(96, "Moderate thunderstorm", IconCategory::Thunderstorm),
    entry(99, "Heavy thunderstorm", IconCategory::Thunderstorm),
];

/// Look up a code in the table.
pub fn lookup(code: i32) -> Option<&'static WeatherCodeEntry> {
    WEATHER_CODES
        .binary_search_by_key(&code, |e| e.code)
        .ok()
        .map(|idx| &WEATHER_CODES[idx])
}

/// Label for a code, or [`PLACEHOLDER_LABEL`] when absent or unknown.
pub fn label_of(code: Option<i32>) -> &'static str {
    code.and_then(lookup).map_or(PLACEHOLDER_LABEL, |e| e.label)
}

/// Icon category for a code; unknown codes get [`IconCategory::Unknown`].
pub fn icon_category_of(code: Option<i32>) -> IconCategory {
    code.and_then(lookup).map_or(IconCategory::Unknown, |e| e.icon)
}
