//! Wires user events to the carousel controllers.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use vader_core::{AppError, Config, KeyValueStore, UnitSystem};
use vader_weather::{
    CacheEntry, CoordinateKey, Location, Place, Suggestion, WeatherCacheStore, WeatherSource,
};

use crate::carousel::{CarouselCursor, CarouselSurface, CarouselSyncController, ScrollMetrics};
use crate::fetcher::{FetchOptions, PlaceFetcher};
use crate::map::{MapHost, MapMarkerController};
use crate::places::SavedPlaces;
use crate::restore::SessionRestoreController;
use crate::state::{PlacePanel, SharedState, ViewSnapshot, ViewState};
use crate::suggest::SuggestionEngine;

/// The weather carousel engine.
///
/// All methods may be called from any task; the view state is guarded by a
/// single lock that is never held across an await.
pub struct WeatherApp<S: WeatherSource> {
    state: SharedState,
    cache: Arc<Mutex<WeatherCacheStore>>,
    fetcher: Arc<PlaceFetcher<S>>,
    suggestions: Arc<SuggestionEngine<S>>,
    carousel: Arc<CarouselSyncController<S>>,
    restore: SessionRestoreController,
    map: Arc<MapMarkerController>,
    default_city: String,
}

impl<S: WeatherSource> WeatherApp<S> {
    /// Load persisted state from `store` and assemble the controllers.
    pub fn new(source: S, store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let source = Arc::new(source);
        let carousel_config = &config.carousel;

        let saved = SavedPlaces::load(store.clone(), carousel_config.saved_capacity);
        let state = ViewState::new(saved, config.weather.units).shared();
        let cache = Arc::new(Mutex::new(WeatherCacheStore::load(store.clone())));
        let restore = SessionRestoreController::load(store.as_ref());
        let map = Arc::new(MapMarkerController::new(carousel_config.map_zoom));
        let cursor = Arc::new(CarouselCursor::new(state.clone(), store));

        let fetcher = Arc::new(PlaceFetcher::new(
            source.clone(),
            cache.clone(),
            state.clone(),
            cursor.clone(),
            map.clone(),
        ));
        let suggestions = Arc::new(SuggestionEngine::new(
            source,
            state.clone(),
            carousel_config,
        ));
        let carousel = Arc::new(CarouselSyncController::new(
            cursor,
            fetcher.clone(),
            state.clone(),
            Duration::from_millis(carousel_config.settle_ms),
        ));

        Self {
            state,
            cache,
            fetcher,
            suggestions,
            carousel,
            restore,
            map,
            default_city: config.weather.default_city.clone(),
        }
    }

    /// Resolve the current place, then restore the previous session's place.
    ///
    /// Without a device location the default city is used. The restore runs
    /// even when the boot fetch fails.
    pub async fn boot(&self, location: Option<Location>) -> Result<(), AppError> {
        let result = match &location {
            Some(location) => {
                tracing::info!(
                    "Booting at device location {}, {}",
                    location.latitude,
                    location.longitude
                );
                self.fetcher
                    .fetch_by_coordinates(
                        location.latitude,
                        location.longitude,
                        location.city_name.as_deref(),
                        FetchOptions::current(),
                    )
                    .await
            }
            None => {
                tracing::info!("No device location, booting at {}", self.default_city);
                self.fetcher
                    .fetch_by_name(&self.default_city, FetchOptions::current())
                    .await
            }
        };

        self.restore_session().await;
        result.map(|_| ()).map_err(AppError::from)
    }

    /// Fetch the previous session's place if it still qualifies.
    ///
    /// Safe to call repeatedly; each qualifying situation fetches once.
    pub async fn restore_session(&self) {
        let (current, active) = {
            let state = self.state.lock();
            (state.current.clone(), state.active.clone())
        };

        let Some(place) = self.restore.evaluate(current.as_ref(), active.as_ref()) else {
            return;
        };
        let result = self
            .fetcher
            .fetch_by_coordinates(place.lat, place.lon, Some(&place.name), FetchOptions::background())
            .await;
        if let Err(e) = result {
            tracing::warn!("Could not restore {}: {}", place.name, e);
        }
    }

    /// Search box edited.
    pub fn set_query(&self, text: &str) {
        self.state.lock().query = text.to_string();
        self.suggestions.on_query_changed(text);
    }

    /// Search submitted. Blank text does nothing.
    pub async fn search(&self, text: &str) -> Result<(), AppError> {
        if text.trim().is_empty() {
            return Ok(());
        }

        self.suggestions.clear();
        self.state.lock().query.clear();
        self.fetcher
            .fetch_by_name(text, FetchOptions::background())
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    /// Autocomplete entry picked.
    pub async fn select_suggestion(&self, suggestion: &Suggestion) -> Result<(), AppError> {
        self.suggestions.clear();
        self.state.lock().query.clear();

        let label = suggestion.label();
        self.fetcher
            .fetch_by_coordinates(
                suggestion.lat,
                suggestion.lon,
                Some(&label),
                FetchOptions::background(),
            )
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    /// Carousel dot (or other explicit control) selected.
    pub async fn select_index(&self, index: usize) {
        self.carousel.select(index).await;
    }

    /// Forward a scroll tick from the carousel container.
    pub fn on_scroll(&self, metrics: ScrollMetrics) {
        self.carousel.on_scroll(metrics);
    }

    /// Returns `false` if the place was already saved.
    pub fn save_place(&self, place: Place) -> bool {
        let saved = self.state.lock().saved.save(place);
        if saved {
            self.carousel.cursor().reconcile(true);
        }
        saved
    }

    pub fn remove_place(&self, place: &Place) -> bool {
        let removed = self.state.lock().saved.remove(place);
        if removed {
            self.carousel.cursor().reconcile(true);
        }
        removed
    }

    /// Switch unit system and refetch the displayed place in it.
    pub async fn set_units(&self, units: UnitSystem) -> Result<(), AppError> {
        let displayed = {
            let mut state = self.state.lock();
            if state.units == units {
                return Ok(());
            }
            state.units = units;
            state
                .displayed
                .as_ref()
                .map(|d| (d.weather.coord, state.city.clone()))
        };

        let Some((coord, label)) = displayed else {
            return Ok(());
        };
        tracing::info!("Units changed to {:?}, refreshing {}", units, label);
        self.fetcher
            .fetch_by_coordinates(coord.lat, coord.lon, Some(&label), FetchOptions::background())
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    pub fn attach_surface(&self, surface: Arc<dyn CarouselSurface>) {
        self.carousel.cursor().attach_surface(surface);
    }

    pub fn attach_map_host(&self, host: Arc<dyn MapHost>) {
        self.map.attach_host(host);
    }

    pub fn map(&self) -> &MapMarkerController {
        &self.map
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot::from(&*self.state.lock())
    }

    /// One panel per carousel entry, with whatever is cached for it.
    pub fn panels(&self) -> Vec<PlacePanel> {
        let (places, active_index, saved) = {
            let state = self.state.lock();
            (
                state.carousel(),
                state.active_index,
                state.saved.as_slice().to_vec(),
            )
        };
        let cache = self.cache.lock();

        places
            .into_iter()
            .enumerate()
            .map(|(index, entry)| PlacePanel {
                cached: cache.get(&entry.place.key()).cloned(),
                is_saved: saved.iter().any(|p| p.same_place(&entry.place)),
                is_active: index == active_index,
                entry,
            })
            .collect()
    }

    /// Cached weather for a coordinate, if it has been fetched before.
    pub fn cached(&self, lat: f64, lon: f64) -> Option<CacheEntry> {
        self.cache.lock().get(&CoordinateKey::new(lat, lon)).cloned()
    }
}
