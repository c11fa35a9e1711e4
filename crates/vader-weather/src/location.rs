//! Device location lookup.
//!
//! There is no platform geolocation backend; a configured home location
//! stands in for it, and its absence is reported as an unavailable service
//! so callers fall back to the default city.

use vader_core::HomeLocation;

use crate::types::{Location, LocationError};

pub async fn get_current_location(home: Option<HomeLocation>) -> Result<Location, LocationError> {
    match home {
        Some(home) => {
            tracing::debug!("Using configured home location {}, {}", home.lat, home.lon);
            Ok(Location {
                latitude: home.lat,
                longitude: home.lon,
                accuracy_meters: None,
                city_name: None,
            })
        }
        None => Err(LocationError::ServiceUnavailable),
    }
}
