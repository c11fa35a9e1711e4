use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::ConfigError;

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

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory (also holds persisted state)
    pub config_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Carousel, search and map tuning
    #[serde(default)]
    pub carousel: CarouselConfig,
}

/// Measurement system requested from the provider.
///
/// The provider converts values; the client never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Query parameter value understood by the provider
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    pub fn wind_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "m/s",
            Self::Imperial => "mph",
        }
    }
}

/// Fixed device location, used when no geolocation service is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the weather, forecast and geocoding API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API key (defaults to OPENWEATHER_API_KEY from the environment)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Language for condition descriptions
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub units: UnitSystem,

    /// City used when the device location is unavailable
    #[serde(default = "default_city")]
    pub default_city: String,

    #[serde(default)]
    pub home: Option<HomeLocation>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_api_key() -> String {
    std::env::var("OPENWEATHER_API_KEY").unwrap_or_default()
}

fn default_language() -> String {
    "sv".to_string()
}

fn default_city() -> String {
    "Stockholm".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: default_api_key(),
            language: default_language(),
            units: UnitSystem::default(),
            default_city: default_city(),
            home: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Quiet period after the last keystroke before suggestions are fetched
    pub suggest_debounce_ms: u64,
    /// Queries shorter than this (after trimming) clear suggestions
    pub suggest_min_chars: usize,
    pub suggest_limit: usize,
    /// Quiet period after the last scroll tick before the carousel settles
    pub settle_ms: u64,
    pub saved_capacity: usize,
    pub map_zoom: u8,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            suggest_debounce_ms: 300,
            suggest_min_chars: 2,
            suggest_limit: 5,
            settle_ms: 120,
            saved_capacity: 8,
            map_zoom: 3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vader");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            carousel: CarouselConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_base_url, "weather.api_base_url", &mut result);

        if self.weather.api_key.trim().is_empty() {
            result.add_warning(
                "weather.api_key",
                "No API key configured - set OPENWEATHER_API_KEY",
            );
        }

        if self.weather.default_city.trim().is_empty() {
            result.add_error("weather.default_city", "Default city must not be empty");
        }

        if let Some(home) = self.weather.home {
            if !(-90.0..=90.0).contains(&home.lat) || !(-180.0..=180.0).contains(&home.lon) {
                result.add_error("weather.home", "Home coordinates are out of range");
            }
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error("weather.request_timeout_secs", "Timeout must be greater than 0");
        }

        let carousel = &self.carousel;
        if carousel.suggest_limit == 0 {
            result.add_error("carousel.suggest_limit", "Suggestion limit must be greater than 0");
        }
        if carousel.saved_capacity == 0 {
            result.add_error("carousel.saved_capacity", "Saved capacity must be greater than 0");
        }
        if carousel.suggest_min_chars == 0 {
            result.add_warning(
                "carousel.suggest_min_chars",
                "Suggestions will be requested for empty queries",
            );
        }
        if carousel.map_zoom > 19 {
            result.add_warning("carousel.map_zoom", "Map zoom is beyond tile maximum (19)");
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
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Directory holding the persisted carousel state
    pub fn state_dir(&self) -> PathBuf {
        self.config_dir.join("state")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("vader");

        Ok(config_dir.join("config.toml"))
    }
}
