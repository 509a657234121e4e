use std::rc::Rc;

use foundation::ids::PointId;
use foundation::math::Coordinate;
use foundation::points::GeoPoint;
use map::{MapConfig, MapSession, RecordingHost, Screen, ViewMode};
use runtime::{Event, Frame};
use serde::{Deserialize, Serialize};
use viewport::{CameraHost, PositionError, ScriptedPositionSource, SimulatedCamera, Viewport};

/// One scripted input, applied once the replay clock reaches `at_ms`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceStep {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub input: TraceInput,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceInput {
    InitialFix { latitude: f64, longitude: f64 },
    InitialFixError { error: PositionError },
    Position { latitude: f64, longitude: f64 },
    WatchError { error: PositionError },
    Gesture { viewport: Viewport },
    LocateMe,
    CenterOnPoint { point_id: PointId },
    ActivateMarker { key: String },
    ViewMode { mode: ViewMode },
    Render,
}

#[derive(Debug)]
pub enum ReplayError {
    UnknownPoint(PointId),
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::UnknownPoint(id) => write!(f, "trace refers to unknown point {id}"),
        }
    }
}

impl std::error::Error for ReplayError {}

#[derive(Debug, Clone, Serialize)]
pub struct RenderRecord {
    pub at_ms: u64,
    pub frame: u64,
    pub output: Screen,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub renders: Vec<RenderRecord>,
    pub events: Vec<Event>,
    pub final_viewport: Viewport,
    pub selected: Vec<PointId>,
    pub viewport_changes: usize,
    pub camera_requests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOptions {
    pub frame_ms: u64,
    /// Extra time after the last step for animations to land.
    pub settle_ms: u64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame_ms: 50,
            settle_ms: 3000,
        }
    }
}

/// Replays `steps` against a fresh session on a simulated camera.
///
/// Steps are applied in order at the first frame whose time reaches their
/// `at_ms`; a new camera is created at the persisted viewport whenever the map
/// is (re)mounted.
pub fn replay(
    config: MapConfig,
    points: &[GeoPoint],
    steps: &[TraceStep],
    options: ReplayOptions,
) -> Result<ReplayReport, ReplayError> {
    let source = Rc::new(ScriptedPositionSource::new());
    let mut session = MapSession::new(config, source, RecordingHost::default());
    let mut camera = SimulatedCamera::new(session.viewport());
    let mut camera_requests = 0;

    let frame_ms = options.frame_ms.max(1);
    let end_ms = steps.iter().map(|s| s.at_ms).max().unwrap_or(0) + options.settle_ms;

    let mut frame = Frame::first();
    let mut now_ms = 0;
    let mut next = 0;
    let mut renders = Vec::new();

    loop {
        session.tick(frame, &mut camera);
        while let Some(step) = steps.get(next).filter(|s| s.at_ms <= now_ms) {
            next += 1;
            let before = session.mode();
            if let Some(record) = apply_step(&mut session, &mut camera, points, step, frame)? {
                renders.push(record);
            }
            if before == ViewMode::List && session.mode() == ViewMode::Map {
                camera_requests += camera.requests().len();
                camera = SimulatedCamera::new(session.viewport());
                session.tick(frame, &mut camera);
            }
        }
        for event in camera.advance(frame) {
            session.on_camera_event(event, &mut camera);
        }

        if now_ms >= end_ms && next >= steps.len() && !camera.is_animating() {
            break;
        }
        now_ms += frame_ms;
        frame = frame.advance(frame_ms as f64 / 1000.0);
    }

    camera_requests += camera.requests().len();
    let events = session.drain_events();
    let host = session.host();
    Ok(ReplayReport {
        renders,
        events,
        final_viewport: session.viewport(),
        selected: host.selected.clone(),
        viewport_changes: host.viewports.len(),
        camera_requests,
    })
}

fn apply_step(
    session: &mut MapSession<ScriptedPositionSource, RecordingHost>,
    camera: &mut SimulatedCamera,
    points: &[GeoPoint],
    step: &TraceStep,
    frame: Frame,
) -> Result<Option<RenderRecord>, ReplayError> {
    tracing::debug!(at_ms = step.at_ms, input = ?step.input, "trace step");
    match &step.input {
        TraceInput::InitialFix { latitude, longitude } => {
            session.on_initial_fix(Ok(Coordinate::new(*latitude, *longitude)), camera);
        }
        TraceInput::InitialFixError { error } => session.on_initial_fix(Err(*error), camera),
        TraceInput::Position { latitude, longitude } => {
            session.on_position(Coordinate::new(*latitude, *longitude), camera);
        }
        TraceInput::WatchError { error } => session.on_watch_error(*error),
        TraceInput::Gesture { viewport } => {
            let event = camera.gesture(*viewport);
            session.on_camera_event(event, camera);
        }
        TraceInput::LocateMe => {
            session.locate_me(camera);
        }
        TraceInput::CenterOnPoint { point_id } => {
            let point = points
                .iter()
                .find(|p| &p.id == point_id)
                .ok_or_else(|| ReplayError::UnknownPoint(point_id.clone()))?;
            session.request_center_on_point(point);
        }
        TraceInput::ActivateMarker { key } => {
            if !session.activate_marker(key, camera) {
                tracing::warn!(key, "no such marker in the last render");
            }
        }
        TraceInput::ViewMode { mode } => session.set_view_mode(*mode),
        TraceInput::Render => {
            return Ok(Some(RenderRecord {
                at_ms: step.at_ms,
                frame: frame.index,
                output: session.render(points),
            }));
        }
    }
    Ok(None)
}
