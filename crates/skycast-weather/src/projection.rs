//! Projections of a snapshot into display rows.

use chrono::{DateTime, Utc};

use crate::types::{DailySample, ForecastSnapshot, HourlySample};

/// Maximum number of hourly rows shown.
pub const HOURLY_WINDOW: usize = 24;

const SECONDS_PER_HOUR: i64 = 3600;

/// The first whole hour strictly after `reference`.
///
/// 14:05 and 14:00 both give 15:00.
pub fn next_full_hour(reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let secs = reference.timestamp();
    let hour_start = secs - secs.rem_euclid(SECONDS_PER_HOUR);
    DateTime::from_timestamp(hour_start + SECONDS_PER_HOUR, 0)
}

/// Up to [`HOURLY_WINDOW`] hourly rows starting at the next full hour.
///
/// Empty when no hourly time reaches the next full hour.
pub fn project_hourly(snapshot: &ForecastSnapshot, reference: DateTime<Utc>) -> Vec<HourlySample> {
    let Some(next_hour) = next_full_hour(reference) else {
        return Vec::new();
    };

    let hourly = &snapshot.hourly;
    let Some(start) = hourly.time.iter().position(|t| *t >= next_hour) else {
        return Vec::new();
    };

    hourly.time[start..]
        .iter()
        .take(HOURLY_WINDOW)
        .enumerate()
        .map(|(offset, &time)| {
            let i = start + offset;
            HourlySample {
                time,
                temperature: hourly.temperature.get(i).copied().flatten(),
                weather_code: hourly.weather_code.get(i).copied().flatten(),
            }
        })
        .collect()
}

/// One row per daily time, in order.
pub fn project_daily(snapshot: &ForecastSnapshot) -> Vec<DailySample> {
    let daily = &snapshot.daily;
    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, &time)| DailySample {
            time,
            temperature_max: daily.temperature_max.get(i).copied().flatten(),
            temperature_min: daily.temperature_min.get(i).copied().flatten(),
            weather_code: daily.weather_code.get(i).copied().flatten(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::types::{CurrentReading, DailySeries, HourlySeries};
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    fn snapshot_with_hours(count: i64) -> ForecastSnapshot {
        let start = at(0, 0);
        let time: Vec<_> = (0..count).map(|h| start + Duration::hours(h)).collect();
        let temperature = (0..count).map(|h| Some(h as f32)).collect();
        let weather_code = (0..count).map(|h| Some((h % 4) as i32)).collect();

        ForecastSnapshot {
            latitude: 52.52,
            longitude: 13.41,
            elevation: 38.0,
            utc_offset_seconds: 0,
            current: CurrentReading {
                time: start,
                temperature: 0.0,
                weather_code: 0,
            },
            hourly: HourlySeries {
                time,
                temperature,
                weather_code,
            },
            daily: DailySeries::default(),
        }
    }

    #[test]
    fn test_next_full_hour() {
        assert_eq!(next_full_hour(at(14, 5)), Some(at(15, 0)));
        assert_eq!(next_full_hour(at(14, 0)), Some(at(15, 0)));
        assert_eq!(next_full_hour(at(23, 59)), Some(at(0, 0) + Duration::days(1)));
    }

    #[test]
    fn test_hourly_window_truncated_by_series_end() {
        let snapshot = snapshot_with_hours(24);
        let rows = project_hourly(&snapshot, at(14, 5));

        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].time, at(15, 0));
        assert_eq!(rows[0].temperature, Some(15.0));
        assert_eq!(rows[8].time, at(23, 0));
    }

    #[test]
    fn test_hourly_window_capped() {
        let snapshot = snapshot_with_hours(48);
        let rows = project_hourly(&snapshot, at(14, 5));

        assert_eq!(rows.len(), HOURLY_WINDOW);
        assert_eq!(rows[0].time, at(15, 0));
        assert_eq!(rows[23].time, at(14, 0) + Duration::days(1));
        assert_eq!(rows[23].weather_code, Some(38 % 4));
    }

    #[test]
    fn test_hourly_on_the_hour_skips_current_hour() {
        let snapshot = snapshot_with_hours(48);
        let rows = project_hourly(&snapshot, at(14, 0));
        assert_eq!(rows[0].time, at(15, 0));
    }

    #[test]
    fn test_hourly_empty_when_series_ends_before_window() {
        let snapshot = snapshot_with_hours(10);
        assert!(project_hourly(&snapshot, at(14, 5)).is_empty());
    }

    #[test]
    fn test_hourly_missing_values_stay_absent() {
        let mut snapshot = snapshot_with_hours(48);
        snapshot.hourly.temperature[15] = None;
        snapshot.hourly.weather_code.truncate(16);

        let rows = project_hourly(&snapshot, at(14, 5));
        assert_eq!(rows[0].temperature, None);
        assert_eq!(rows[0].weather_code, Some(15 % 4));
        assert_eq!(rows[1].weather_code, None);
    }

    #[test]
    fn test_daily_projection() {
        let mut snapshot = snapshot_with_hours(1);
        let day = at(0, 0);
        snapshot.daily = DailySeries {
            time: vec![day, day + Duration::days(1), day + Duration::days(2)],
            temperature_max: vec![Some(14.0), Some(16.5), None],
            temperature_min: vec![Some(4.5), Some(6.0), Some(3.0)],
            weather_code: vec![Some(61), Some(95), Some(0)],
        };

        let rows = project_daily(&snapshot);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].time, day + Duration::days(1));
        assert_eq!(rows[1].temperature_max, Some(16.5));
        assert_eq!(rows[1].weather_code, Some(95));
        assert_eq!(rows[2].temperature_max, None);
        assert_eq!(rows[2].temperature_min, Some(3.0));
    }

    #[test]
    fn test_daily_empty() {
        assert!(project_daily(&snapshot_with_hours(1)).is_empty());
    }
}
