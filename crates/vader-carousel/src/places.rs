//! Carousel list derivation and the persisted saved-places list.

use std::sync::Arc;

use serde::Serialize;
use vader_core::{load_record, save_record, KeyValueStore};
use vader_weather::{same_place, Place};

/// Storage key of the saved-places list
pub const SAVED_PLACES_STORAGE_KEY: &str = "savedPlaces";

/// Why a place is in the carousel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceRole {
    /// Resolved from the device location (or the default city) at boot
    Current,
    Saved,
    /// Last search result that is neither current nor saved
    Transient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselEntry {
    #[serde(flatten)]
    pub place: Place,
    pub role: PlaceRole,
}

impl CarouselEntry {
    fn new(place: &Place, role: PlaceRole) -> Self {
        Self {
            place: place.clone(),
            role,
        }
    }
}

/// Derive the carousel from its three sources.
///
/// Current comes first, then saved places not equal to current. A transient
/// active place that matches nothing already listed is slotted in right after
/// the first entry.
pub fn build_carousel(
    current: Option<&Place>,
    active: Option<&Place>,
    saved: &[Place],
) -> Vec<CarouselEntry> {
    let mut list: Vec<CarouselEntry> = current
        .map(|place| CarouselEntry::new(place, PlaceRole::Current))
        .into_iter()
        .collect();

    list.extend(
        saved
            .iter()
            .filter(|place| !same_place(Some(*place), current))
            .map(|place| CarouselEntry::new(place, PlaceRole::Saved)),
    );

    if let Some(active) = active {
        if !list.iter().any(|entry| entry.place.same_place(active)) {
            let at = list.len().min(1);
            list.insert(at, CarouselEntry::new(active, PlaceRole::Transient));
        }
    }

    list
}

/// User-saved places, newest first, unique by coordinates.
///
/// Every mutation is written through to the store.
pub struct SavedPlaces {
    places: Vec<Place>,
    capacity: usize,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SavedPlaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedPlaces")
            .field("places", &self.places)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl SavedPlaces {
    pub fn load(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let mut places: Vec<Place> = load_record(store.as_ref(), SAVED_PLACES_STORAGE_KEY);
        places.truncate(capacity);
        Self {
            places,
            capacity,
            store,
        }
    }

    pub fn as_slice(&self) -> &[Place] {
        &self.places
    }

    pub fn contains(&self, place: &Place) -> bool {
        self.places.iter().any(|p| p.same_place(place))
    }

    /// Prepend `place`, dropping the oldest entry when full.
    ///
    /// Returns `false` without touching the list if the place is already saved.
    pub fn save(&mut self, place: Place) -> bool {
        if self.contains(&place) {
            return false;
        }
        self.places.insert(0, place);
        self.places.truncate(self.capacity);
        self.persist();
        true
    }

    /// Remove every entry at the same coordinates as `place`.
    pub fn remove(&mut self, place: &Place) -> bool {
        let before = self.places.len();
        self.places.retain(|p| !p.same_place(place));
        let removed = self.places.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    fn persist(&self) {
        if let Err(e) = save_record(self.store.as_ref(), SAVED_PLACES_STORAGE_KEY, &self.places) {
            tracing::warn!("Failed to persist saved places: {}", e);
        }
    }
}
