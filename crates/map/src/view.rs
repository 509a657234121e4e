use std::rc::Rc;

use cluster::{ClusterId, Clusterer};
use foundation::ids::PointId;
use foundation::math::Coordinate;
use foundation::points::GeoPoint;
use layers::{CategoryFilter, LocationLayer, MarkerHandler, MarkerLayer};
use runtime::{Event, Frame};
use serde::Serialize;
use viewport::{
    Applied, Authority, CameraEvent, CameraHost, CameraIntent, FollowState, PositionOptions,
    PositionSource, RequestToken, Viewport, ViewportController, WatchSubscription,
};

use crate::config::{ConfigError, MapConfig};
use crate::host::MapHost;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub viewport: Viewport,
    pub authority: Authority,
    pub follow: FollowState,
    pub style: String,
    pub markers: MarkerLayer,
    pub location: LocationLayer,
}

/// Shown in place of the map when the engine cannot start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationErrorView {
    pub title: &'static str,
    pub message: String,
    pub remediation: Vec<&'static str>,
}

impl ConfigurationErrorView {
    pub fn from_error(err: &ConfigError) -> Self {
        Self {
            title: "Map Configuration Error",
            message: err.to_string(),
            remediation: vec![
                "Sign up at https://account.mapbox.com/",
                "Copy your access token",
                "Set MAP_ACCESS_TOKEN in your environment or .env file",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderOutput {
    Map(MapFrame),
    ConfigurationError(ConfigurationErrorView),
}

enum Activation {
    Cluster(ClusterId, Coordinate),
    Point(PointId),
}

#[derive(Default)]
struct CaptureActivation(Option<Activation>);

impl MarkerHandler for CaptureActivation {
    fn on_cluster_activated(&mut self, cluster: ClusterId, position: Coordinate) {
        self.0 = Some(Activation::Cluster(cluster, position));
    }

    fn on_point_selected(&mut self, point: &PointId) {
        self.0 = Some(Activation::Point(point.clone()));
    }
}

/// The mounted map: camera authority, clustering and markers for one mount.
///
/// Holds the location watch for as long as it is alive; dropping the view
/// clears it.
pub struct MapView<P: PositionSource> {
    controller: ViewportController,
    clusterer: Clusterer,
    markers: MarkerLayer,
    style: String,
    config_error: Option<ConfigError>,
    watch: Option<WatchSubscription<P>>,
}

impl<P: PositionSource> MapView<P> {
    /// Mounts at `initial` (or the configured fallback) and starts watching
    /// the position. A watch that cannot start leaves the view in manual mode.
    pub fn mount(config: &MapConfig, initial: Option<Viewport>, source: &Rc<P>) -> Self {
        let config_error = config.validated_token().err();
        if let Some(err) = &config_error {
            tracing::error!(%err, "map engine not configured");
        }
        let watch = match WatchSubscription::start(source.clone(), PositionOptions::watch()) {
            Ok(w) => Some(w),
            Err(err) => {
                tracing::warn!(%err, "position watch unavailable");
                None
            }
        };
        Self {
            controller: ViewportController::new(config.controller_config(), initial),
            clusterer: Clusterer::new(config.cluster_options()),
            markers: MarkerLayer::default(),
            style: config.style.clone(),
            config_error,
            watch,
        }
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn clusterer(&self) -> &Clusterer {
        &self.clusterer
    }

    pub fn viewport(&self) -> Viewport {
        self.controller.viewport()
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn set_frame(&mut self, frame: Frame) {
        self.controller.set_frame(frame);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.controller.drain_events()
    }

    pub fn apply(
        &mut self,
        intent: CameraIntent,
        camera: &mut dyn CameraHost,
        host: &mut dyn MapHost,
    ) -> Applied {
        let applied = self.controller.apply(intent, camera);
        self.notify(host);
        applied
    }

    pub fn on_camera_event(
        &mut self,
        event: CameraEvent,
        camera: &mut dyn CameraHost,
        host: &mut dyn MapHost,
    ) -> Applied {
        let applied = self.controller.on_camera_event(event, camera);
        self.notify(host);
        applied
    }

    pub fn position_unavailable(&mut self) {
        self.controller.position_unavailable();
    }

    /// Center-on-point request whose flight has ended.
    pub fn take_consumed_request(&mut self) -> Option<RequestToken> {
        self.controller.take_consumed_request()
    }

    /// Clusters the filtered snapshot for the current viewport.
    pub fn render(
        &mut self,
        points: &[GeoPoint],
        filter: &CategoryFilter,
        position: Option<Coordinate>,
    ) -> RenderOutput {
        if let Some(err) = &self.config_error {
            return RenderOutput::ConfigurationError(ConfigurationErrorView::from_error(err));
        }
        let visible = filter.apply(points);
        let viewport = self.controller.viewport();
        let nodes = self
            .clusterer
            .cluster(&visible, viewport.center(), viewport.zoom);
        self.markers = MarkerLayer::from_nodes(&nodes, &visible);

        RenderOutput::Map(MapFrame {
            viewport,
            authority: self.controller.authority(),
            follow: self.controller.follow().state(),
            style: self.style.clone(),
            markers: self.markers.clone(),
            location: LocationLayer::from_position(position),
        })
    }

    /// Activates a marker from the last render. Clusters expand, pins are
    /// reported to the host. Returns false for unknown keys.
    pub fn activate_marker(
        &mut self,
        key: &str,
        camera: &mut dyn CameraHost,
        host: &mut dyn MapHost,
    ) -> bool {
        let mut capture = CaptureActivation::default();
        if !self.markers.activate(key, &mut capture) {
            return false;
        }
        match capture.0 {
            Some(Activation::Cluster(id, position)) => {
                let ceiling = self.controller.config().max_zoom as u8;
                let Some(zoom) = self.clusterer.expansion_zoom(id, ceiling) else {
                    tracing::warn!(cluster = %id, "cluster not in current index");
                    return false;
                };
                self.apply(
                    CameraIntent::ClusterExpand {
                        position,
                        zoom: zoom as f64,
                    },
                    camera,
                    host,
                );
            }
            Some(Activation::Point(point)) => host.on_point_selected(&point),
            None => return false,
        }
        true
    }

    fn notify(&mut self, host: &mut dyn MapHost) {
        if let Some(viewport) = self.controller.take_committed() {
            host.on_viewport_change(viewport);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use foundation::ids::PointId;
    use foundation::math::Coordinate;
    use foundation::points::{Category, GeoPoint};
    use layers::{CategoryFilter, Marker};
    use pretty_assertions::assert_eq;
    use runtime::Frame;
    use viewport::{
        Authority, CameraIntent, FALLBACK_VIEWPORT, ScriptedPositionSource, SimulatedCamera,
        Viewport,
    };

    use super::{MapView, RenderOutput};
    use crate::config::MapConfig;
    use crate::host::RecordingHost;

    fn config() -> MapConfig {
        MapConfig::default().with_access_token("pk.test")
    }

    fn five_near(center: Coordinate) -> Vec<GeoPoint> {
        (0..5)
            .map(|i| {
                GeoPoint::new(
                    format!("p{i}"),
                    center.offset_m(10.0 * i as f64, 0.0),
                    Category::Chanterelle,
                )
            })
            .collect()
    }

    fn settle(
        view: &mut MapView<ScriptedPositionSource>,
        cam: &mut SimulatedCamera,
        host: &mut RecordingHost,
    ) {
        let mut frame = Frame::first();
        for _ in 0..100 {
            frame = frame.advance(0.1);
            view.set_frame(frame);
            for ev in cam.advance(frame) {
                view.on_camera_event(ev, cam, host);
            }
            if !cam.is_animating() {
                break;
            }
        }
    }

    fn expect_map(out: RenderOutput) -> super::MapFrame {
        match out {
            RenderOutput::Map(frame) => frame,
            RenderOutput::ConfigurationError(v) => panic!("unexpected error view: {v:?}"),
        }
    }

    #[test]
    fn missing_token_renders_error_view() {
        let source = Rc::new(ScriptedPositionSource::new());
        let mut view = MapView::mount(&MapConfig::default(), None, &source);
        let out = view.render(&[], &CategoryFilter::default(), None);
        let RenderOutput::ConfigurationError(err) = out else {
            panic!("expected configuration error, got {out:?}");
        };
        assert_eq!(err.title, "Map Configuration Error");
        assert_eq!(err.remediation.len(), 3);
    }

    #[test]
    fn close_points_form_one_cluster_at_zoom_ten() {
        let source = Rc::new(ScriptedPositionSource::new());
        let center = Coordinate::new(56.0, 10.0);
        let mut view = MapView::mount(&config(), Some(Viewport::new(center, 10.0)), &source);
        let frame = expect_map(view.render(&five_near(center), &CategoryFilter::default(), None));
        assert_eq!(frame.markers.len(), 1);
        let c = frame.markers.clusters().next().expect("cluster");
        assert_eq!(c.count, 5);
        assert_eq!(frame.location.marker, None);
    }

    #[test]
    fn close_points_split_at_zoom_twenty() {
        let source = Rc::new(ScriptedPositionSource::new());
        let center = Coordinate::new(56.0, 10.0);
        let mut view = MapView::mount(&config(), Some(Viewport::new(center, 20.0)), &source);
        let frame = expect_map(view.render(&five_near(center), &CategoryFilter::default(), None));
        assert_eq!(frame.markers.pins().count(), 5);
    }

    #[test]
    fn cluster_activation_zooms_to_expansion() {
        let source = Rc::new(ScriptedPositionSource::new());
        let center = Coordinate::new(56.0, 10.0);
        let points = five_near(center);
        let mut view = MapView::mount(&config(), Some(Viewport::new(center, 8.0)), &source);
        let mut cam = SimulatedCamera::new(view.viewport());
        let mut host = RecordingHost::default();

        let frame = expect_map(view.render(&points, &CategoryFilter::default(), None));
        let key = frame.markers.clusters().next().expect("cluster").key.clone();
        assert!(view.activate_marker(&key, &mut cam, &mut host));
        assert_eq!(view.controller().authority(), Authority::ClusterExpansion);
        settle(&mut view, &mut cam, &mut host);

        let z = view.viewport().zoom;
        assert!(z > 8.0 && z <= 20.0);
        let after = expect_map(view.render(&points, &CategoryFilter::default(), None));
        assert!(after.markers.len() > 1, "cluster should split at zoom {z}");

        // One level shallower the points still collapse.
        let mut shallower = MapView::mount(&config(), Some(Viewport::new(center, z - 1.0)), &source);
        let before = expect_map(shallower.render(&points, &CategoryFilter::default(), None));
        assert_eq!(before.markers.len(), 1);
        assert!(!host.viewports.is_empty());
    }

    #[test]
    fn pin_activation_reaches_host() {
        let source = Rc::new(ScriptedPositionSource::new());
        let center = Coordinate::new(56.0, 10.0);
        let mut view = MapView::mount(&config(), Some(Viewport::new(center, 20.0)), &source);
        let mut cam = SimulatedCamera::new(view.viewport());
        let mut host = RecordingHost::default();
        view.render(&five_near(center), &CategoryFilter::default(), None);
        assert!(view.activate_marker("p3", &mut cam, &mut host));
        assert_eq!(host.selected, vec![PointId::new("p3")]);
        assert!(cam.requests().is_empty());
    }

    #[test]
    fn filter_hides_inactive_categories() {
        let source = Rc::new(ScriptedPositionSource::new());
        let center = Coordinate::new(56.0, 10.0);
        let mut points = five_near(center);
        points[0].category = Category::Blueberry;
        let mut filter = CategoryFilter::default();
        filter.set(Category::Chanterelle, false);
        let mut view = MapView::mount(&config(), Some(Viewport::new(center, 20.0)), &source);
        let frame = expect_map(view.render(&points, &filter, None));
        let keys: Vec<&str> = frame.markers.markers.iter().map(Marker::key).collect();
        assert_eq!(keys, vec!["p0"]);
    }

    #[test]
    fn gestures_notify_host() {
        let source = Rc::new(ScriptedPositionSource::new());
        let mut view = MapView::mount(&config(), None, &source);
        let mut cam = SimulatedCamera::new(view.viewport());
        let mut host = RecordingHost::default();
        let moved = Viewport { zoom: 7.0, ..FALLBACK_VIEWPORT };
        view.apply(CameraIntent::Gesture(moved), &mut cam, &mut host);
        assert_eq!(host.viewports, vec![moved]);
    }

    #[test]
    fn watch_lives_with_the_view() {
        let source = Rc::new(ScriptedPositionSource::new());
        let view = MapView::mount(&config(), None, &source);
        assert!(view.is_watching());
        assert_eq!(source.active_watches(), 1);
        drop(view);
        assert_eq!(source.active_watches(), 0);

        let unsupported = Rc::new(ScriptedPositionSource::unsupported());
        let view = MapView::mount(&config(), None, &unsupported);
        assert!(!view.is_watching());
    }
}
