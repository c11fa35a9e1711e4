//! Keeps the carousel's scroll position, active index and fetches in step.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use vader_core::{save_record, KeyValueStore};
use vader_weather::{Place, WeatherSource};

use crate::fetcher::{FetchOptions, PlaceFetcher};
use crate::restore::LAST_ACTIVE_STORAGE_KEY;
use crate::state::SharedState;

/// The scrollable container showing one card per carousel entry.
pub trait CarouselSurface: Send + Sync {
    /// Smooth-scroll the card at `index` to the leading edge. Fire and forget.
    fn scroll_to(&self, index: usize);
}

/// Child layout of the scroll container at one instant, in pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub client_width: f64,
    /// `(offset_left, width)` per card, in list order
    pub children: Vec<(f64, f64)>,
}

impl ScrollMetrics {
    pub fn center(&self) -> f64 {
        self.scroll_left + self.client_width / 2.0
    }

    /// Index of the card whose center is closest to the viewport center.
    ///
    /// On an exact tie the earlier card wins.
    pub fn nearest_index(&self) -> Option<usize> {
        let center = self.center();
        let mut nearest: Option<(usize, f64)> = None;
        for (index, (offset, width)) in self.children.iter().enumerate() {
            let distance = (offset + width / 2.0 - center).abs();
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((index, distance)),
            }
        }
        nearest.map(|(index, _)| index)
    }
}

/// Owns `active_index` transitions.
///
/// Every change is persisted as the last active place and mirrored to the
/// attached surface.
pub struct CarouselCursor {
    state: SharedState,
    store: Arc<dyn KeyValueStore>,
    surface: Mutex<Option<Arc<dyn CarouselSurface>>>,
    persisted: Mutex<Option<Place>>,
}

impl CarouselCursor {
    pub fn new(state: SharedState, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state,
            store,
            surface: Mutex::new(None),
            persisted: Mutex::new(None),
        }
    }

    pub fn attach_surface(&self, surface: Arc<dyn CarouselSurface>) {
        *self.surface.lock() = Some(surface);
    }

    /// Move to `index`. Returns the place there, `None` if out of range.
    pub fn set_index(&self, index: usize) -> Option<Place> {
        let (place, changed) = {
            let mut state = self.state.lock();
            let place = state.carousel().into_iter().nth(index)?.place;
            let changed = state.active_index != index;
            state.active_index = index;
            (place, changed)
        };

        if changed {
            self.scroll_to(index);
        }
        self.remember(&place);
        Some(place)
    }

    /// Re-align the index after the list or the active place changed.
    ///
    /// With `follow` set, the index moves to the entry matching the active
    /// place. An index past the end of a non-empty list resets to 0.
    pub fn reconcile(&self, follow: bool) {
        let target = {
            let mut state = self.state.lock();
            let places = state.carousel();
            if places.is_empty() {
                state.active_index = 0;
                return;
            }

            let followed = if follow {
                state
                    .active
                    .as_ref()
                    .and_then(|active| places.iter().position(|e| e.place.same_place(active)))
            } else {
                None
            };

            match followed {
                Some(index) => index,
                None if state.active_index >= places.len() => 0,
                None => state.active_index,
            }
        };

        self.set_index(target);
    }

    fn scroll_to(&self, index: usize) {
        let surface = self.surface.lock().clone();
        if let Some(surface) = surface {
            surface.scroll_to(index);
        }
    }

    fn remember(&self, place: &Place) {
        let mut persisted = self.persisted.lock();
        if persisted.as_ref() == Some(place) {
            return;
        }
        match save_record(self.store.as_ref(), LAST_ACTIVE_STORAGE_KEY, place) {
            Ok(()) => *persisted = Some(place.clone()),
            Err(e) => tracing::warn!("Failed to persist last active place: {}", e),
        }
    }
}

/// Turns selection and scroll events into index changes and fetches.
pub struct CarouselSyncController<S: WeatherSource> {
    cursor: Arc<CarouselCursor>,
    fetcher: Arc<PlaceFetcher<S>>,
    state: SharedState,
    settle: Duration,
    settle_timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: WeatherSource> CarouselSyncController<S> {
    pub fn new(
        cursor: Arc<CarouselCursor>,
        fetcher: Arc<PlaceFetcher<S>>,
        state: SharedState,
        settle: Duration,
    ) -> Self {
        Self {
            cursor,
            fetcher,
            state,
            settle,
            settle_timer: Mutex::new(None),
        }
    }

    pub fn cursor(&self) -> &Arc<CarouselCursor> {
        &self.cursor
    }

    /// Explicit selection (dot click). Always refetches the selected place;
    /// a cached copy is shown while the request runs.
    pub async fn select(&self, index: usize) {
        let Some(place) = self.cursor.set_index(index) else {
            tracing::debug!("Ignoring selection of index {} outside the carousel", index);
            return;
        };
        self.fetch(&place).await;
    }

    /// Record a scroll tick. The carousel settles once no tick has arrived
    /// for the settle period.
    pub fn on_scroll(self: &Arc<Self>, metrics: ScrollMetrics) {
        let this = Arc::clone(self);
        let settle = self.settle;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            if let Some(place) = this.settle(&metrics) {
                // A later tick aborts only the timer, never this fetch.
                tokio::spawn(async move { this.fetch(&place).await });
            }
        });

        if let Some(previous) = self.settle_timer.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Snap to the card nearest the viewport center.
    ///
    /// Returns the newly active place if the index moved; the caller is
    /// expected to fetch it.
    pub fn settle(&self, metrics: &ScrollMetrics) -> Option<Place> {
        let nearest = metrics.nearest_index()?;
        let current = self.state.lock().active_index;
        if nearest == current {
            return None;
        }

        tracing::debug!("Carousel settled on index {}", nearest);
        self.cursor.set_index(nearest)
    }

    async fn fetch(&self, place: &Place) {
        let result = self
            .fetcher
            .fetch_by_coordinates(place.lat, place.lon, Some(&place.name), FetchOptions::background())
            .await;
        if let Err(e) = result {
            tracing::debug!("Fetch for {} failed: {}", place.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scroll_left: f64, client_width: f64, centers: &[f64]) -> ScrollMetrics {
        ScrollMetrics {
            scroll_left,
            client_width,
            children: centers.iter().map(|c| (c - 50.0, 100.0)).collect(),
        }
    }

    #[test]
    fn test_nearest_index_picks_closest_center() {
        let m = metrics(300.0, 100.0, &[50.0, 150.0, 250.0, 350.0, 450.0]);
        assert_eq!(m.center(), 350.0);
        assert_eq!(m.nearest_index(), Some(3));
    }

    #[test]
    fn test_nearest_index_tie_prefers_first() {
        let m = metrics(100.0, 100.0, &[100.0, 200.0]);
        assert_eq!(m.center(), 150.0);
        assert_eq!(m.nearest_index(), Some(0));
    }

    #[test]
    fn test_nearest_index_empty() {
        assert_eq!(ScrollMetrics::default().nearest_index(), None);
    }
}
