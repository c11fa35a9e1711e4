//! Brings back the place that was on screen when the last session ended.

use std::collections::HashSet;

use parking_lot::Mutex;
use vader_core::{load_record, KeyValueStore};
use vader_weather::{same_place, CoordinateKey, Place};

/// Storage key of the last active place
pub const LAST_ACTIVE_STORAGE_KEY: &str = "lastActivePlace";

/// Decides whether the previous session's place needs fetching at boot.
///
/// The persisted value is read once, at construction; later index changes
/// overwrite the stored record but not this snapshot.
#[derive(Debug)]
pub struct SessionRestoreController {
    last_active: Option<Place>,
    fired: Mutex<HashSet<(CoordinateKey, CoordinateKey)>>,
}

impl SessionRestoreController {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let last_active: Option<Place> = load_record(store, LAST_ACTIVE_STORAGE_KEY);
        if let Some(place) = &last_active {
            tracing::debug!("Last session ended on {}", place.name);
        }
        Self {
            last_active,
            fired: Mutex::new(HashSet::new()),
        }
    }

    pub fn last_active(&self) -> Option<&Place> {
        self.last_active.as_ref()
    }

    /// The place to fetch, if any.
    ///
    /// Nothing is returned until the current place is known, when the last
    /// place is the current one, or when the active place already matches
    /// it. Each (current, last) pair is returned at most once.
    pub fn evaluate(&self, current: Option<&Place>, active: Option<&Place>) -> Option<Place> {
        let last = self.last_active.as_ref()?;
        let current = current?;

        if last.same_place(current) || same_place(active, Some(last)) {
            return None;
        }

        if !self.fired.lock().insert((current.key(), last.key())) {
            return None;
        }

        tracing::info!("Restoring last viewed place {}", last.name);
        Some(last.clone())
    }
}
