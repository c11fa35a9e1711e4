//! Single static map showing a marker at the displayed place.

use std::sync::Arc;

use parking_lot::Mutex;

/// Where the map initially looks before any place has been resolved
const INITIAL_VIEW: MapTarget = MapTarget {
    lat: 59.3293,
    lon: 18.0686,
};

/// Identifier of a surface the map can be mounted on.
pub type SurfaceId = u64;

/// Handle to a marker inside a [`MapWidget`].
pub type MarkerId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapTarget {
    pub lat: f64,
    pub lon: f64,
}

/// A live, non-interactive map instance bound to one surface.
pub trait MapWidget: Send {
    fn add_marker(&mut self, lat: f64, lon: f64) -> MarkerId;
    fn remove_marker(&mut self, marker: MarkerId);
    fn set_view(&mut self, lat: f64, lon: f64, zoom: u8);
    /// Release the widget's resources. Called before it is dropped.
    fn teardown(&mut self);
}

/// The element the map is embedded in.
///
/// The host may replace its surface at any time (e.g. on re-mount); the
/// controller notices through [`MapHost::surface`].
pub trait MapHost: Send + Sync {
    /// Currently mounted surface, `None` while nothing is mounted.
    fn surface(&self) -> Option<SurfaceId>;
    fn create_widget(&self, surface: SurfaceId) -> Box<dyn MapWidget>;
}

struct MountedMap {
    surface: SurfaceId,
    widget: Box<dyn MapWidget>,
    marker: Option<MarkerId>,
}

#[derive(Default)]
struct MapState {
    host: Option<Arc<dyn MapHost>>,
    mounted: Option<MountedMap>,
    /// Latest target requested while no widget was available
    pending: Option<MapTarget>,
    target: Option<MapTarget>,
    /// Set once there is something to show; no widget is built before that
    wanted: bool,
}

pub struct MapMarkerController {
    zoom: u8,
    inner: Mutex<MapState>,
}

impl std::fmt::Debug for MapMarkerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MapMarkerController")
            .field("zoom", &self.zoom)
            .field("mounted", &inner.mounted.as_ref().map(|m| m.surface))
            .field("pending", &inner.pending)
            .field("target", &inner.target)
            .finish()
    }
}

impl MapMarkerController {
    pub fn new(zoom: u8) -> Self {
        Self {
            zoom,
            inner: Mutex::new(MapState::default()),
        }
    }

    /// Attach (or replace) the host.
    ///
    /// Mounts only if a weather result has already asked for the map.
    pub fn attach_host(&self, host: Arc<dyn MapHost>) {
        let mut inner = self.inner.lock();
        inner.host = Some(host);
        self.ensure_locked(&mut inner);
    }

    /// Make sure a widget exists on the host's current surface.
    ///
    /// Called when weather is displayed. Recreates the widget if the surface
    /// was replaced, and applies any pending target once a widget is up.
    pub fn ensure(&self) {
        let mut inner = self.inner.lock();
        inner.wanted = true;
        self.ensure_locked(&mut inner);
    }

    /// Move the single marker to `(lat, lon)` and center on it.
    ///
    /// Queued (latest wins) when no widget can be created yet.
    pub fn retarget(&self, lat: f64, lon: f64) {
        let mut inner = self.inner.lock();
        inner.wanted = true;
        self.ensure_locked(&mut inner);

        let target = MapTarget { lat, lon };
        match inner.mounted.as_mut() {
            Some(mounted) => {
                self.place_marker(mounted, target);
                inner.target = Some(target);
            }
            None => {
                tracing::debug!("Map not mounted, queueing marker at {}, {}", lat, lon);
                inner.pending = Some(target);
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.lock().mounted.is_some()
    }

    /// Where the marker currently is, if it has been placed.
    pub fn target(&self) -> Option<MapTarget> {
        self.inner.lock().target
    }

    pub fn pending(&self) -> Option<MapTarget> {
        self.inner.lock().pending
    }

    fn ensure_locked(&self, inner: &mut MapState) {
        let surface = inner.host.as_ref().and_then(|host| host.surface());

        let stale = matches!(
            (&inner.mounted, surface),
            (Some(mounted), current) if Some(mounted.surface) != current
        );
        if stale {
            if let Some(mut old) = inner.mounted.take() {
                tracing::debug!("Map surface {} replaced, tearing down widget", old.surface);
                old.widget.teardown();
            }
            if let Some(target) = inner.target.take() {
                inner.pending.get_or_insert(target);
            }
        }

        if inner.mounted.is_some() || !inner.wanted {
            return;
        }
        let (Some(host), Some(surface)) = (inner.host.clone(), surface) else {
            return;
        };

        let mut widget = host.create_widget(surface);
        widget.set_view(INITIAL_VIEW.lat, INITIAL_VIEW.lon, self.zoom);
        let mut mounted = MountedMap {
            surface,
            widget,
            marker: None,
        };
        tracing::debug!("Map widget created on surface {}", surface);

        if let Some(target) = inner.pending.take() {
            self.place_marker(&mut mounted, target);
            inner.target = Some(target);
        }
        inner.mounted = Some(mounted);
    }

    fn place_marker(&self, mounted: &mut MountedMap, target: MapTarget) {
        if let Some(previous) = mounted.marker.take() {
            mounted.widget.remove_marker(previous);
        }
        mounted.marker = Some(mounted.widget.add_marker(target.lat, target.lon));
        mounted.widget.set_view(target.lat, target.lon, self.zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Create(SurfaceId),
        AddMarker(SurfaceId, MarkerId),
        RemoveMarker(SurfaceId, MarkerId),
        SetView(SurfaceId, u8),
        Teardown(SurfaceId),
    }

    #[derive(Default)]
    struct FakeHost {
        surface: Mutex<Option<SurfaceId>>,
        ops: Arc<Mutex<Vec<Op>>>,
    }

    struct FakeWidget {
        surface: SurfaceId,
        next_marker: MarkerId,
        ops: Arc<Mutex<Vec<Op>>>,
    }

    impl MapWidget for FakeWidget {
        fn add_marker(&mut self, _lat: f64, _lon: f64) -> MarkerId {
            self.next_marker += 1;
            self.ops.lock().push(Op::AddMarker(self.surface, self.next_marker));
            self.next_marker
        }

        fn remove_marker(&mut self, marker: MarkerId) {
            self.ops.lock().push(Op::RemoveMarker(self.surface, marker));
        }

        fn set_view(&mut self, _lat: f64, _lon: f64, zoom: u8) {
            self.ops.lock().push(Op::SetView(self.surface, zoom));
        }

        fn teardown(&mut self) {
            self.ops.lock().push(Op::Teardown(self.surface));
        }
    }

    impl MapHost for FakeHost {
        fn surface(&self) -> Option<SurfaceId> {
            *self.surface.lock()
        }

        fn create_widget(&self, surface: SurfaceId) -> Box<dyn MapWidget> {
            self.ops.lock().push(Op::Create(surface));
            Box::new(FakeWidget {
                surface,
                next_marker: 0,
                ops: self.ops.clone(),
            })
        }
    }

    fn host(surface: Option<SurfaceId>) -> Arc<FakeHost> {
        let host = FakeHost::default();
        *host.surface.lock() = surface;
        Arc::new(host)
    }

    #[test]
    fn test_marker_is_replaced_not_added() {
        let host = host(Some(1));
        let map = MapMarkerController::new(3);
        map.attach_host(host.clone());

        map.retarget(59.33, 18.07);
        map.retarget(55.6, 13.0);

        let ops = host.ops.lock().clone();
        assert_eq!(
            ops,
            vec![
                Op::Create(1),
                Op::SetView(1, 3),
                Op::AddMarker(1, 1),
                Op::SetView(1, 3),
                Op::RemoveMarker(1, 1),
                Op::AddMarker(1, 2),
                Op::SetView(1, 3),
            ]
        );
        assert_eq!(map.target(), Some(MapTarget { lat: 55.6, lon: 13.0 }));
    }

    #[test]
    fn test_pending_target_latest_wins() {
        let host = host(None);
        let map = MapMarkerController::new(3);
        map.attach_host(host.clone());

        map.retarget(59.33, 18.07);
        map.retarget(57.7, 11.97);
        assert!(!map.is_mounted());
        assert_eq!(map.pending(), Some(MapTarget { lat: 57.7, lon: 11.97 }));

        *host.surface.lock() = Some(7);
        map.ensure();

        assert!(map.is_mounted());
        assert_eq!(map.pending(), None);
        assert_eq!(map.target(), Some(MapTarget { lat: 57.7, lon: 11.97 }));
        let markers = host
            .ops
            .lock()
            .iter()
            .filter(|op| matches!(op, Op::AddMarker(..)))
            .count();
        assert_eq!(markers, 1);
    }

    #[test]
    fn test_replaced_surface_recreates_widget() {
        let host = host(Some(1));
        let map = MapMarkerController::new(3);
        map.attach_host(host.clone());
        map.retarget(59.33, 18.07);

        *host.surface.lock() = Some(2);
        map.ensure();

        let ops = host.ops.lock().clone();
        assert!(ops.contains(&Op::Teardown(1)));
        assert!(ops.contains(&Op::Create(2)));
        // The marker is restored on the new surface.
        assert!(ops.contains(&Op::AddMarker(2, 1)));
        assert_eq!(map.target(), Some(MapTarget { lat: 59.33, lon: 18.07 }));
    }

    #[test]
    fn test_attach_alone_does_not_mount() {
        let host = host(Some(1));
        let map = MapMarkerController::new(3);
        map.attach_host(host.clone());

        assert!(!map.is_mounted());
        assert!(host.ops.lock().is_empty());

        map.ensure();
        assert!(map.is_mounted());
        assert_eq!(*host.ops.lock(), vec![Op::Create(1), Op::SetView(1, 3)]);
    }

    #[test]
    fn test_unmounted_surface_tears_down() {
        let host = host(Some(1));
        let map = MapMarkerController::new(3);
        map.attach_host(host.clone());
        map.ensure();

        *host.surface.lock() = None;
        map.ensure();

        assert!(!map.is_mounted());
        assert!(host.ops.lock().contains(&Op::Teardown(1)));
    }

    #[test]
    fn test_without_host_everything_is_pending() {
        let map = MapMarkerController::new(3);
        map.ensure();
        map.retarget(59.33, 18.07);
        assert!(!map.is_mounted());
        assert_eq!(map.pending(), Some(MapTarget { lat: 59.33, lon: 18.07 }));
    }
}
