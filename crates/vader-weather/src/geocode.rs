//! Direct geocoding: free text to candidate places, for search autocomplete.

use serde::Deserialize;
use tracing::instrument;

use crate::provider::{decode, WeatherProvider};
use crate::types::{Suggestion, WeatherError};

/// Upper bound the provider accepts for `limit`
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Deserialize)]
struct GeocodeItem {
    name: String,
    state: Option<String>,
    country: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<GeocodeItem> for Suggestion {
    fn from(item: GeocodeItem) -> Self {
        Self {
            name: item.name,
            state: item.state,
            country: item.country,
            lat: item.lat,
            lon: item.lon,
        }
    }
}

impl WeatherProvider {
    /// Look up candidate places for `query`, in provider order.
    #[instrument(skip(self), level = "debug")]
    pub async fn direct_geocode(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Suggestion>, WeatherError> {
        let limit = limit.min(MAX_SUGGESTIONS);
        let response = self
            .client
            .get(format!("{}/geo/1.0/direct", self.base_url))
            .query(&[
                ("q", query.trim().to_string()),
                ("limit", limit.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let items: Vec<GeocodeItem> = decode(response, WeatherError::SuggestionsUnavailable).await?;

        let suggestions: Vec<Suggestion> = items
            .into_iter()
            .take(limit)
            .map(Suggestion::from)
            .collect();

        tracing::debug!("Geocoded {:?} to {} candidates", query, suggestions.len());
        Ok(suggestions)
    }
}
