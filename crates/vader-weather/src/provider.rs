//! HTTP client for the current-weather and forecast endpoints.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;
use vader_core::{UnitSystem, WeatherConfig};

use crate::types::{ForecastSnapshot, Suggestion, WeatherError, WeatherSnapshot};

/// Everything the carousel engine needs from a weather backend.
///
/// Implemented by [`WeatherProvider`] for the real API; tests substitute
/// scripted sources.
pub trait WeatherSource: Send + Sync + 'static {
    /// Current conditions for a free-text place name.
    fn current_by_name(
        &self,
        name: &str,
        units: UnitSystem,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;

    /// Current conditions for a coordinate pair.
    fn current_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;

    /// 3-hour interval forecast for a coordinate pair.
    fn forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> impl Future<Output = Result<ForecastSnapshot, WeatherError>> + Send;

    /// Up to `limit` place candidates for free text, in provider order.
    fn suggest(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Suggestion>, WeatherError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    pub(crate) client: Arc<Client>,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    language: String,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    /// Client against an arbitrary base URL (mock servers, proxies).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: "sv".to_string(),
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn weather_by_name(
        &self,
        name: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("q", name),
                ("units", units.as_query()),
                ("lang", self.language.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        decode(response, WeatherError::NotFound).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn weather_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&self.coordinate_query(lat, lon, units))
            .send()
            .await?;

        decode(response, WeatherError::NotFound).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<ForecastSnapshot, WeatherError> {
        let response = self
            .client
            .get(format!("{}/data/2.5/forecast", self.base_url))
            .query(&self.coordinate_query(lat, lon, units))
            .send()
            .await?;

        decode(response, WeatherError::ForecastUnavailable).await
    }

    fn coordinate_query(&self, lat: f64, lon: f64, units: UnitSystem) -> Vec<(&'static str, String)> {
        vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", units.as_query().to_string()),
            ("lang", self.language.clone()),
            ("appid", self.api_key.clone()),
        ]
    }
}

/// Parse a success body as `T`, or map a non-success status with `on_status`.
pub(crate) async fn decode<T, F>(response: reqwest::Response, on_status: F) -> Result<T, WeatherError>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> WeatherError,
{
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::debug!("Provider returned {}: {}", status, text);
        return Err(on_status(format!("{}: {}", status, text)));
    }

    response
        .json()
        .await
        .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))
}

impl WeatherSource for WeatherProvider {
    async fn current_by_name(
        &self,
        name: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.weather_by_name(name, units).await
    }

    async fn current_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.weather_by_coords(lat, lon, units).await
    }

    async fn forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<ForecastSnapshot, WeatherError> {
        self.forecast(lat, lon, units).await
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, WeatherError> {
        self.direct_geocode(query, limit).await
    }
}
