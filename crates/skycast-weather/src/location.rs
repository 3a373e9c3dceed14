//! Device location.
//!
//! There is no platform geolocation here; the location is whatever the user
//! granted through configuration or the command line. Nothing granted reads
//! as a denied permission.

use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, LocationError};

/// Coordinates the user has made available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSettings {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationSettings {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Settings with `overrides` taking precedence per component.
    pub fn overridden_by(self, overrides: LocationSettings) -> Self {
        Self {
            latitude: overrides.latitude.or(self.latitude),
            longitude: overrides.longitude.or(self.longitude),
        }
    }
}

/// Resolve the current location.
///
/// A granted coordinate may still have a zero component; that is left for
/// the forecast client to treat as "no location".
pub async fn get_current_location(
    settings: &LocationSettings,
) -> Result<Coordinate, LocationError> {
    match (settings.latitude, settings.longitude) {
        (Some(latitude), Some(longitude)) => {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(LocationError::Other(format!(
                    "latitude {} out of range -90..90",
                    latitude
                )));
            }
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(LocationError::Other(format!(
                    "longitude {} out of range -180..180",
                    longitude
                )));
            }
            tracing::debug!("Using location {:.4}, {:.4}", latitude, longitude);
            Ok(Coordinate::new(latitude, longitude))
        }
        (None, None) => Err(LocationError::PermissionDenied),
        _ => Err(LocationError::Other(
            "latitude and longitude must both be set".to_string(),
        )),
    }
}
