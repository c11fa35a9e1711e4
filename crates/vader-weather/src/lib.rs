//! Weather data for Vader
//!
//! Provider snapshot types, the HTTP client for current conditions, forecasts
//! and place suggestions, and the coordinate-keyed weather cache.

pub mod cache;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use cache::{WeatherCacheStore, CACHE_STORAGE_KEY};
pub use provider::{WeatherProvider, WeatherSource};
pub use types::*;
pub use vader_core::UnitSystem;
