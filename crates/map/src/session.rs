use std::rc::Rc;

use foundation::ids::PointId;
use foundation::math::Coordinate;
use foundation::points::GeoPoint;
use layers::CategoryFilter;
use runtime::{Event, EventBus, Frame};
use serde::{Deserialize, Serialize};
use viewport::{
    Applied, CameraEvent, CameraHost, CameraIntent, PositionError, PositionOptions, PositionSource,
    RequestToken, Viewport,
};

use crate::config::MapConfig;
use crate::host::MapHost;
use crate::view::{MapView, RenderOutput};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Map,
    List,
}

/// "View on map" request waiting for its flight to end.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterRequest {
    pub token: RequestToken,
    pub point_id: PointId,
    pub target: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListFrame {
    pub points: Vec<PointId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Map(RenderOutput),
    List(ListFrame),
}

enum Mounted<P: PositionSource> {
    Map(MapView<P>),
    List,
}

/// Keeps the persisted viewport in step with the mounted map.
struct Relay<'a, H: MapHost> {
    viewport: &'a mut Viewport,
    host: &'a mut H,
}

impl<H: MapHost> MapHost for Relay<'_, H> {
    fn on_viewport_change(&mut self, viewport: Viewport) {
        *self.viewport = viewport;
        self.host.on_viewport_change(viewport);
    }

    fn on_point_selected(&mut self, point: &PointId) {
        self.host.on_point_selected(point);
    }
}

/// App-level owner of the map screen.
///
/// Outlives map mounts: the viewport, the last known position, the category
/// filter and any pending "view on map" request survive switching to the list
/// and back. Each mount gets a fresh controller and location watch.
pub struct MapSession<P: PositionSource, H: MapHost> {
    config: MapConfig,
    source: Rc<P>,
    host: H,
    mounted: Mounted<P>,
    viewport: Viewport,
    position_initialized: bool,
    current_position: Option<Coordinate>,
    filter: CategoryFilter,
    pending_center: Option<CenterRequest>,
    next_token: u64,
    frame: Frame,
    bus: EventBus,
}

impl<P: PositionSource, H: MapHost> MapSession<P, H> {
    /// Opens on the map at the fallback viewport and asks for a first fix.
    pub fn new(config: MapConfig, source: Rc<P>, host: H) -> Self {
        source.request_current(PositionOptions::initial_fix());
        let viewport = config.fallback;
        let view = MapView::mount(&config, Some(viewport), &source);
        Self {
            config,
            source,
            host,
            mounted: Mounted::Map(view),
            viewport,
            position_initialized: false,
            current_position: None,
            filter: CategoryFilter::default(),
            pending_center: None,
            next_token: 0,
            frame: Frame::first(),
            bus: EventBus::new(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn mode(&self) -> ViewMode {
        match self.mounted {
            Mounted::Map(_) => ViewMode::Map,
            Mounted::List => ViewMode::List,
        }
    }

    pub fn view(&self) -> Option<&MapView<P>> {
        match &self.mounted {
            Mounted::Map(view) => Some(view),
            Mounted::List => None,
        }
    }

    /// Last committed map viewport; restored on the next mount.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn current_position(&self) -> Option<Coordinate> {
        self.current_position
    }

    pub fn pending_center(&self) -> Option<&CenterRequest> {
        self.pending_center.as_ref()
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.mode() {
            return;
        }
        self.mounted = match mode {
            ViewMode::Map => Mounted::Map(MapView::mount(
                &self.config,
                Some(self.viewport),
                &self.source,
            )),
            ViewMode::List => Mounted::List,
        };
        self.bus
            .emit(self.frame, "session", format!("view mode {mode:?}"));
    }

    /// Advances the session clock and issues pending work against the
    /// mounted camera.
    pub fn tick(&mut self, frame: Frame, camera: &mut dyn CameraHost) {
        self.frame = frame;
        if let Mounted::Map(view) = &mut self.mounted {
            view.set_frame(frame);
        }
        if let Some(req) = self.pending_center.clone() {
            self.with_view(|view, host| {
                view.apply(
                    CameraIntent::CenterOnPoint {
                        token: req.token,
                        target: req.target,
                    },
                    camera,
                    host,
                )
            });
        }
    }

    /// Answer to the one-shot position request made at startup.
    pub fn on_initial_fix(
        &mut self,
        result: Result<Coordinate, PositionError>,
        camera: &mut dyn CameraHost,
    ) {
        let first = !self.position_initialized;
        self.position_initialized = true;
        match result {
            Ok(position) => {
                self.current_position = Some(position);
                if !first {
                    return;
                }
                let target = Viewport::new(position, self.config.initial_fix_zoom);
                self.bus
                    .emit(self.frame, "session", "initial fix; recentering");
                match self.user_has_moved() {
                    Some(true) => {}
                    Some(false) => {
                        self.with_view(|view, host| {
                            view.apply(CameraIntent::Sync(target), camera, host)
                        });
                    }
                    None => self.viewport = target,
                }
            }
            Err(err) => {
                tracing::warn!(%err, "initial position unavailable; using fallback view");
                self.current_position = None;
                self.bus
                    .emit(self.frame, "session", format!("no initial fix: {err}"));
                let fallback = self.config.fallback;
                if let Mounted::Map(view) = &mut self.mounted {
                    view.position_unavailable();
                }
                if self.user_has_moved() == Some(false) {
                    self.with_view(|view, host| {
                        view.apply(CameraIntent::Sync(fallback), camera, host)
                    });
                }
            }
        }
    }

    /// Live sample from the location watch.
    pub fn on_position(&mut self, sample: Coordinate, camera: &mut dyn CameraHost) -> Option<Applied> {
        self.current_position = Some(sample);
        self.with_view(|view, host| view.apply(CameraIntent::Follow(sample), camera, host))
    }

    /// Watch errors keep the last good position.
    pub fn on_watch_error(&mut self, err: PositionError) {
        tracing::warn!(%err, "position watch error");
    }

    pub fn on_camera_event(
        &mut self,
        event: CameraEvent,
        camera: &mut dyn CameraHost,
    ) -> Option<Applied> {
        self.with_view(|view, host| view.on_camera_event(event, camera, host))
    }

    pub fn locate_me(&mut self, camera: &mut dyn CameraHost) -> Option<Applied> {
        self.with_view(|view, host| view.apply(CameraIntent::LocateMe, camera, host))
    }

    /// Shows `point` on the map, switching to the map if needed. The flight
    /// starts on the next [`tick`](Self::tick) and runs once per call.
    pub fn request_center_on_point(&mut self, point: &GeoPoint) -> RequestToken {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.pending_center = Some(CenterRequest {
            token,
            point_id: point.id.clone(),
            target: point.coordinate,
        });
        self.bus
            .emit(self.frame, "session", format!("center on {}", point.id));
        self.set_view_mode(ViewMode::Map);
        token
    }

    pub fn activate_marker(&mut self, key: &str, camera: &mut dyn CameraHost) -> bool {
        self.with_view(|view, host| view.activate_marker(key, camera, host))
            .unwrap_or(false)
    }

    pub fn render(&mut self, points: &[GeoPoint]) -> Screen {
        match &mut self.mounted {
            Mounted::Map(view) => Screen::Map(view.render(points, &self.filter, self.current_position)),
            Mounted::List => Screen::List(ListFrame {
                points: self.filter.apply(points).into_iter().map(|p| p.id).collect(),
            }),
        }
    }

    /// Session and camera events since the last drain, by frame.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = self.bus.drain();
        if let Mounted::Map(view) = &mut self.mounted {
            events.extend(view.drain_events());
        }
        events.sort_by_key(|e| e.frame_index);
        events
    }

    /// Whether the user has taken the mounted camera elsewhere; `None` when unmounted.
    fn user_has_moved(&self) -> Option<bool> {
        self.view()
            .map(|view| view.controller().follow().manual_override())
    }

    fn with_view<R>(&mut self, f: impl FnOnce(&mut MapView<P>, &mut dyn MapHost) -> R) -> Option<R> {
        let Mounted::Map(view) = &mut self.mounted else {
            return None;
        };
        let mut relay = Relay {
            viewport: &mut self.viewport,
            host: &mut self.host,
        };
        let out = f(view, &mut relay);

        if let Some(token) = view.take_consumed_request() {
            if self.pending_center.as_ref().is_some_and(|r| r.token == token) {
                self.pending_center = None;
                self.bus
                    .emit(self.frame, "session", format!("center request {} done", token.0));
            }
        }
        Some(out)
    }
}
