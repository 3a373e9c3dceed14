//! Display state derived from the latest snapshot.

use chrono::{DateTime, Utc};

use crate::projection::{project_daily, project_hourly};
use crate::types::{DailySample, ForecastSnapshot, HourlySample};

/// The snapshot on screen plus its hourly and daily rows.
///
/// Hourly rows depend on the clock and are recomputed on every hour tick;
/// daily rows only change with the snapshot.
#[derive(Debug, Clone, Default)]
pub struct ForecastView {
    snapshot: Option<ForecastSnapshot>,
    hourly: Vec<HourlySample>,
    daily: Vec<DailySample>,
}

impl ForecastView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot and recompute both projections.
    pub fn update_snapshot(&mut self, snapshot: Option<ForecastSnapshot>, now: DateTime<Utc>) {
        self.snapshot = snapshot;
        self.daily = self.snapshot.as_ref().map(project_daily).unwrap_or_default();
        self.refresh_hourly(now);
    }

    /// Recompute the hourly window for a new wall-clock hour.
    pub fn on_tick(&mut self, now: DateTime<Utc>) {
        self.refresh_hourly(now);
    }

    fn refresh_hourly(&mut self, now: DateTime<Utc>) {
        self.hourly = self
            .snapshot
            .as_ref()
            .map(|s| project_hourly(s, now))
            .unwrap_or_default();
    }

    pub fn snapshot(&self) -> Option<&ForecastSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn hourly(&self) -> &[HourlySample] {
        &self.hourly
    }

    pub fn daily(&self) -> &[DailySample] {
        &self.daily
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none()
    }
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

    fn snapshot() -> ForecastSnapshot {
        let start = at(0, 0);
        let time: Vec<_> = (0..48).map(|h| start + Duration::hours(h)).collect();
        ForecastSnapshot {
            latitude: 52.52,
            longitude: 13.41,
            elevation: 38.0,
            utc_offset_seconds: 0,
            current: CurrentReading {
                time: start,
                temperature: 9.0,
                weather_code: 1,
            },
            hourly: HourlySeries {
                temperature: vec![Some(9.0); time.len()],
                weather_code: vec![Some(1); time.len()],
                time,
            },
            daily: DailySeries {
                time: vec![start, start + Duration::days(1)],
                temperature_max: vec![Some(12.0), Some(13.0)],
                temperature_min: vec![Some(2.0), Some(3.0)],
                weather_code: vec![Some(1), Some(2)],
            },
        }
    }

    #[test]
    fn test_empty_view() {
        let mut view = ForecastView::new();
        view.update_snapshot(None, at(10, 0));
        assert!(view.is_empty());
        assert!(view.hourly().is_empty());
        assert!(view.daily().is_empty());
    }

    #[test]
    fn test_update_computes_projections() {
        let mut view = ForecastView::new();
        view.update_snapshot(Some(snapshot()), at(10, 30));

        assert_eq!(view.hourly().len(), 24);
        assert_eq!(view.hourly()[0].time, at(11, 0));
        assert_eq!(view.daily().len(), 2);
    }

    #[test]
    fn test_tick_moves_hourly_window() {
        let mut view = ForecastView::new();
        view.update_snapshot(Some(snapshot()), at(10, 30));

        view.on_tick(at(11, 0));
        assert_eq!(view.hourly()[0].time, at(12, 0));
        assert_eq!(view.daily().len(), 2);
    }
}
