//! Place carousel and weather cache synchronization.
//!
//! [`WeatherApp`] owns the view state and routes user events (typing,
//! searching, selecting, scrolling, saving, unit changes) to the
//! controllers. Rendering is left to the caller, which reads
//! [`ViewSnapshot`] and [`PlacePanel`]s and implements [`CarouselSurface`]
//! and [`MapHost`] for its widgets.

pub mod app;
pub mod carousel;
pub mod fetcher;
pub mod map;
pub mod places;
pub mod restore;
pub mod state;
pub mod suggest;

pub use app::WeatherApp;
pub use carousel::{CarouselCursor, CarouselSurface, CarouselSyncController, ScrollMetrics};
pub use fetcher::{FetchOptions, PlaceFetcher};
pub use map::{MapHost, MapMarkerController, MapTarget, MapWidget, MarkerId, SurfaceId};
pub use places::{build_carousel, CarouselEntry, PlaceRole, SavedPlaces, SAVED_PLACES_STORAGE_KEY};
pub use restore::{SessionRestoreController, LAST_ACTIVE_STORAGE_KEY};
pub use state::{DisplayedWeather, PlacePanel, ViewSnapshot, ViewState};
pub use suggest::SuggestionEngine;
