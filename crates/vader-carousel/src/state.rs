//! View state shared by every controller.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use vader_core::UnitSystem;
use vader_weather::{CacheEntry, ForecastSnapshot, Place, Suggestion, WeatherSnapshot};

use crate::places::{build_carousel, CarouselEntry, PlaceRole, SavedPlaces};

pub type SharedState = Arc<Mutex<ViewState>>;

/// Weather currently shown in the main panel.
///
/// `forecast` is `None` while a fresh forecast is still being fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedWeather {
    pub weather: WeatherSnapshot,
    pub forecast: Option<ForecastSnapshot>,
}

#[derive(Debug)]
pub struct ViewState {
    pub current: Option<Place>,
    pub active: Option<Place>,
    pub saved: SavedPlaces,
    pub active_index: usize,
    pub displayed: Option<DisplayedWeather>,
    /// Label of the displayed place
    pub city: String,
    /// Search box text
    pub query: String,
    /// Error banner, replaced by each failing fetch
    pub error: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub suggesting: bool,
    /// Fetches in flight
    pub loading: usize,
    pub units: UnitSystem,
}

impl ViewState {
    pub fn new(saved: SavedPlaces, units: UnitSystem) -> Self {
        Self {
            current: None,
            active: None,
            saved,
            active_index: 0,
            displayed: None,
            city: String::new(),
            query: String::new(),
            error: None,
            suggestions: Vec::new(),
            suggesting: false,
            loading: 0,
            units,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn carousel(&self) -> Vec<CarouselEntry> {
        build_carousel(
            self.current.as_ref(),
            self.active.as_ref(),
            self.saved.as_slice(),
        )
    }
}

/// Read-only copy of everything a renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub places: Vec<CarouselEntry>,
    pub active_index: usize,
    pub displayed: Option<DisplayedWeather>,
    pub city: String,
    pub query: String,
    pub error: Option<String>,
    pub loading: bool,
    pub suggestions: Vec<Suggestion>,
    pub suggesting: bool,
    pub units: UnitSystem,
}

impl From<&ViewState> for ViewSnapshot {
    fn from(state: &ViewState) -> Self {
        Self {
            places: state.carousel(),
            active_index: state.active_index,
            displayed: state.displayed.clone(),
            city: state.city.clone(),
            query: state.query.clone(),
            error: state.error.clone(),
            loading: state.loading > 0,
            suggestions: state.suggestions.clone(),
            suggesting: state.suggesting,
            units: state.units,
        }
    }
}

/// One carousel card.
///
/// `cached` is `None` until the place has been fetched at least once; the
/// renderer shows a loading card in that case.
#[derive(Debug, Clone, Serialize)]
pub struct PlacePanel {
    pub entry: CarouselEntry,
    pub cached: Option<CacheEntry>,
    pub is_saved: bool,
    pub is_active: bool,
}

impl PlacePanel {
    /// The current place is never offered for saving.
    pub fn can_save(&self) -> bool {
        self.entry.role != PlaceRole::Current && !self.is_saved
    }
}

/// Decrements the in-flight fetch count when dropped.
pub(crate) struct LoadingGuard {
    state: SharedState,
}

impl LoadingGuard {
    pub(crate) fn acquire(state: &SharedState) -> Self {
        state.lock().loading += 1;
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.loading = state.loading.saturating_sub(1);
    }
}
