use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two coordinates closer than this (in degrees, per axis) are the same place.
pub const SAME_PLACE_TOLERANCE: f64 = 1e-4;

/// Cache index derived from a coordinate pair at fixed 4-decimal precision.
///
/// Only used to look up cache entries; place identity uses [`Place::same_place`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateKey(String);

impl CoordinateKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self(format!("{},{}", fixed4(lat), fixed4(lon)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `value` at 4 decimals, matching JavaScript's `toFixed(4)`.
///
/// Exact ties round away from zero (`{:.4}` would round them to even) and
/// negative zero prints as `0.0000`.
fn fixed4(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    // A tie at the 4th decimal is an odd multiple of 1/20000; representable
    // ones are whole multiples of 1/32.
    let thirty_seconds = value.abs() * 32.0;
    let twenty_thousandths = thirty_seconds * 625.0;
    if thirty_seconds.fract() == 0.0
        && twenty_thousandths < 9.0e15
        && twenty_thousandths % 2.0 == 1.0
    {
        let rounded = (twenty_thousandths as u64 + 1) / 2;
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{}{}.{:04}", sign, rounded / 10_000, rounded % 10_000);
    }
    format!("{:.4}", value)
}

/// A named geographic point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }

    /// Coordinate equality within [`SAME_PLACE_TOLERANCE`]; names are ignored.
    pub fn same_place(&self, other: &Place) -> bool {
        (self.lat - other.lat).abs() < SAME_PLACE_TOLERANCE
            && (self.lon - other.lon).abs() < SAME_PLACE_TOLERANCE
    }

    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::new(self.lat, self.lon)
    }
}

/// `same_place` lifted over optional places; absent never matches.
pub fn same_place(a: Option<&Place>, b: Option<&Place>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_place(b),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// Condition description block (`weather[]` in provider payloads)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: Option<f64>,
    pub gust: Option<f64>,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: Option<f64>,
}

/// Precipitation volume in mm over the last 1h/3h
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

impl Precipitation {
    pub fn amount(&self) -> Option<f64> {
        self.one_hour.or(self.three_hours)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SysInfo {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Current conditions as returned by the weather provider.
///
/// Stored verbatim in the cache, so every field the panel needs is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coord: Coord,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub main: Readings,
    pub visibility: Option<f64>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    pub rain: Option<Precipitation>,
    pub snow: Option<Precipitation>,
    #[serde(default)]
    pub sys: SysInfo,
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub name: String,
    pub dt: Option<i64>,
}

impl WeatherSnapshot {
    /// Display label: `"Name, CC"`, or just the name when no country is known.
    pub fn label(&self) -> String {
        match self.sys.country.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.weather.first().map(|c| c.description.as_str())
    }

    pub fn precipitation_mm(&self) -> Option<f64> {
        self.rain.as_ref().and_then(Precipitation::amount)
    }

    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility.map(|v| v / 1000.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Interval start, unix seconds (UTC)
    pub dt: i64,
    #[serde(default)]
    pub main: Readings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    /// Probability of precipitation, 0..1
    pub pop: Option<f64>,
    pub rain: Option<Precipitation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: i64,
    pub coord: Option<Coord>,
}

/// 3-hour interval forecast as returned by the forecast provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    #[serde(default)]
    pub city: ForecastCity,
}

impl ForecastSnapshot {
    fn local_date(&self, unix_seconds: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(unix_seconds + self.city.timezone, 0).map(|dt| dt.date_naive())
    }

    /// Min/max temperature over the entries falling on the location's local
    /// calendar day that contains `now` (unix seconds).
    pub fn local_day_range(&self, now: i64) -> Option<(f64, f64)> {
        let today = self.local_date(now)?;
        self.list
            .iter()
            .filter(|entry| self.local_date(entry.dt) == Some(today))
            .filter_map(|entry| Some((entry.main.temp_min?, entry.main.temp_max?)))
            .fold(None, |acc, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((min, max)) => Some((f64::min(min, lo), f64::max(max, hi))),
            })
    }
}

/// Weather and forecast fetched together for one coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub weather: WeatherSnapshot,
    pub forecast: ForecastSnapshot,
}

/// Autocomplete candidate from the geocoding provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    /// Region or state, when the provider has one
    pub state: Option<String>,
    /// ISO country code
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Suggestion {
    /// `"Name, Region, CC"` with absent parts left out
    pub fn label(&self) -> String {
        [
            Some(self.name.as_str()),
            self.state.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Geographic location reported by the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub city_name: Option<String>,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// Non-success response from the current-weather endpoint
    #[error("Place not found: {0}")]
    NotFound(String),
    #[error("Forecast unavailable: {0}")]
    ForecastUnavailable(String),
    #[error("Suggestions unavailable: {0}")]
    SuggestionsUnavailable(String),
    /// The request was superseded before it completed
    #[error("Request aborted")]
    Aborted,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// Banner text for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "City not found",
            Self::ForecastUnavailable(_) => "Could not fetch forecast",
            Self::SuggestionsUnavailable(_) => "Could not fetch suggestions",
            Self::Aborted => "Request cancelled",
            Self::Network(_) => "Unable to connect. Check your internet connection.",
            Self::Location(_) => "Your location could not be determined.",
            Self::Parse(_) => "Received an unexpected response from the weather service.",
        }
    }

    /// Errors that are recovered internally and never shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl From<WeatherError> for vader_core::AppError {
    fn from(e: WeatherError) -> Self {
        vader_core::AppError::Weather {
            user_message: e.user_message(),
            message: e.to_string(),
        }
    }
}
