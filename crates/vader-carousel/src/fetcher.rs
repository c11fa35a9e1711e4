//! Resolves a place to weather plus forecast, updating the view and cache.
//!
//! Fetches for different places are not serialized and may complete out of
//! order. Each call takes a generation number; only the most recently
//! started call may update the displayed panel, the active place, the query,
//! the error banner and the map. Every call that completes both requests
//! writes its cache entry regardless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use vader_weather::{
    CacheEntry, CoordinateKey, Place, UnitSystem, WeatherCacheStore, WeatherError, WeatherSnapshot,
    WeatherSource,
};

use crate::carousel::CarouselCursor;
use crate::map::MapMarkerController;
use crate::state::{DisplayedWeather, LoadingGuard, SharedState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Also make the resolved place the current place (and clear the
    /// transient active place)
    pub set_as_current: bool,
    /// Write the resolved label into the search box
    pub update_query: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            set_as_current: false,
            update_query: true,
        }
    }
}

impl FetchOptions {
    /// Navigation fetch: leaves the search box alone.
    pub fn background() -> Self {
        Self {
            set_as_current: false,
            update_query: false,
        }
    }

    /// Boot fetch for the device location or default city.
    pub fn current() -> Self {
        Self {
            set_as_current: true,
            update_query: false,
        }
    }
}

pub struct PlaceFetcher<S: WeatherSource> {
    source: Arc<S>,
    cache: Arc<Mutex<WeatherCacheStore>>,
    state: SharedState,
    cursor: Arc<CarouselCursor>,
    map: Arc<MapMarkerController>,
    generation: AtomicU64,
}

impl<S: WeatherSource> PlaceFetcher<S> {
    pub fn new(
        source: Arc<S>,
        cache: Arc<Mutex<WeatherCacheStore>>,
        state: SharedState,
        cursor: Arc<CarouselCursor>,
        map: Arc<MapMarkerController>,
    ) -> Self {
        Self {
            source,
            cache,
            state,
            cursor,
            map,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch by free-text place name.
    ///
    /// A blank name fails with `NotFound` before any request or state change.
    pub async fn fetch_by_name(
        &self,
        name: &str,
        options: FetchOptions,
    ) -> Result<CacheEntry, WeatherError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherError::NotFound("empty place name".to_string()));
        }

        let generation = self.begin();
        let _loading = LoadingGuard::acquire(&self.state);
        let units = self.state.lock().units;
        tracing::debug!("Fetching weather for {:?} (generation {})", name, generation);

        let result = match self.source.current_by_name(name, units).await {
            Ok(weather) => self.complete(generation, weather, None, options, units).await,
            Err(e) => Err(e),
        };
        self.report(generation, result)
    }

    /// Fetch by coordinates, showing any cached entry for them immediately
    /// while the request runs.
    ///
    /// `label` names the place; without one the provider's `"Name, CC"` is
    /// used.
    pub async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
        label: Option<&str>,
        options: FetchOptions,
    ) -> Result<CacheEntry, WeatherError> {
        let generation = self.begin();
        let _loading = LoadingGuard::acquire(&self.state);

        let cached = self.cache.lock().get(&CoordinateKey::new(lat, lon)).cloned();
        if let Some(entry) = cached {
            tracing::debug!("Showing cached weather for {},{}", lat, lon);
            let city = place_label(label, &entry.weather);
            self.show(
                DisplayedWeather {
                    weather: entry.weather,
                    forecast: Some(entry.forecast),
                },
                &city,
            );
        }

        let units = self.state.lock().units;
        let result = match self.source.current_by_coords(lat, lon, units).await {
            Ok(weather) => self.complete(generation, weather, label, options, units).await,
            Err(e) => Err(e),
        };
        self.report(generation, result)
    }

    /// Whether `generation` belongs to the most recently started fetch.
    pub fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().error = None;
        generation
    }

    async fn complete(
        &self,
        generation: u64,
        weather: WeatherSnapshot,
        label: Option<&str>,
        options: FetchOptions,
        units: UnitSystem,
    ) -> Result<CacheEntry, WeatherError> {
        let place = Place::new(
            place_label(label, &weather),
            weather.coord.lat,
            weather.coord.lon,
        );

        let latest = self.is_latest(generation);
        if latest {
            self.show(
                DisplayedWeather {
                    weather: weather.clone(),
                    forecast: None,
                },
                &place.name,
            );
        }
        self.resolve_place(&place, options, latest);

        let forecast = self
            .source
            .forecast_by_coords(place.lat, place.lon, units)
            .await?;

        let entry = CacheEntry {
            weather: weather.clone(),
            forecast,
        };
        self.cache.lock().put(place.key(), entry.clone());
        tracing::debug!("Cached weather for {} under {}", place.name, place.key());

        if self.is_latest(generation) {
            {
                let mut state = self.state.lock();
                if let Some(displayed) = state.displayed.as_mut() {
                    if displayed.weather == weather {
                        displayed.forecast = Some(entry.forecast.clone());
                    }
                }
            }
            self.map.retarget(place.lat, place.lon);
        } else {
            tracing::debug!("Fetch generation {} superseded, panel left as is", generation);
        }

        Ok(entry)
    }

    /// Put weather on the main panel under the label `city`.
    fn show(&self, displayed: DisplayedWeather, city: &str) {
        {
            let mut state = self.state.lock();
            state.city = city.to_string();
            state.displayed = Some(displayed);
        }
        self.map.ensure();
    }

    fn resolve_place(&self, place: &Place, options: FetchOptions, latest: bool) {
        {
            let mut state = self.state.lock();
            if latest {
                if options.update_query {
                    state.query = place.name.clone();
                }
                state.active = Some(place.clone());
            }
            if options.set_as_current {
                tracing::info!("Current place is {}", place.name);
                state.current = Some(place.clone());
                if latest {
                    state.active = None;
                }
            }
        }
        self.cursor.reconcile(latest);
    }

    fn report(
        &self,
        generation: u64,
        result: Result<CacheEntry, WeatherError>,
    ) -> Result<CacheEntry, WeatherError> {
        if let Err(e) = &result {
            if e.is_silent() {
                tracing::debug!("Fetch generation {} aborted", generation);
            } else if self.is_latest(generation) {
                tracing::warn!("Weather fetch failed: {}", e);
                self.state.lock().error = Some(e.user_message().to_string());
            } else {
                tracing::debug!("Superseded fetch generation {} failed: {}", generation, e);
            }
        }
        result
    }
}

/// The caller's label when it has one, else the provider's `"Name, CC"`.
fn place_label(label: Option<&str>, weather: &WeatherSnapshot) -> String {
    label
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| weather.label())
}
