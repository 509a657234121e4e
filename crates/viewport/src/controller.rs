use std::time::Duration;

use foundation::math::{Coordinate, planar_distance_m};
use runtime::{Event, EventBus, Frame};
use serde::Serialize;

use crate::camera::{AnimationId, CameraEvent, CameraHost, Easing, FlyTo};
use crate::follow::{FollowMode, FollowTransition};
use crate::viewport::{FALLBACK_VIEWPORT, Viewport};

/// Tuning for [`ViewportController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Viewport used until a position or persisted viewport is known.
    pub fallback: Viewport,
    /// Live samples closer than this to the camera center are ignored (meters).
    pub follow_threshold_m: f64,
    pub follow_zoom: f64,
    pub follow_duration: Duration,
    pub center_zoom: f64,
    pub center_duration: Duration,
    pub expansion_duration: Duration,
    /// Cluster expansion never zooms past this.
    pub max_zoom: f64,
    pub sync_duration: Duration,
    /// Pushed viewports closer than this (degrees / zoom levels) are ignored.
    pub sync_min_delta_deg: f64,
    pub sync_min_delta_zoom: f64,
}

impl Default for ControllerConfig {
    /// Defaults:
    /// - fallback: lon 10.0, lat 56.0, zoom 6
    /// - following: 10 m threshold, 1000 ms ease to zoom 15
    /// - center on point: 1500 ms flight to zoom 15
    /// - cluster expansion: 1000 ms, capped at zoom 20
    /// - host sync: 2000 ms when moved > 0.01° or > 1 zoom level
    fn default() -> Self {
        Self {
            fallback: FALLBACK_VIEWPORT,
            follow_threshold_m: 10.0,
            follow_zoom: 15.0,
            follow_duration: Duration::from_millis(1000),
            center_zoom: 15.0,
            center_duration: Duration::from_millis(1500),
            expansion_duration: Duration::from_millis(1000),
            max_zoom: 20.0,
            sync_duration: Duration::from_millis(2000),
            sync_min_delta_deg: 0.01,
            sync_min_delta_zoom: 1.0,
        }
    }
}

/// Identifies one "center on point" request. Reissuing the same token is a no-op.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

/// Every way the camera can be asked to move.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraIntent {
    /// User pan/zoom; the host has already moved.
    Gesture(Viewport),
    /// Live position sample.
    Follow(Coordinate),
    CenterOnPoint {
        token: RequestToken,
        target: Coordinate,
    },
    ClusterExpand {
        position: Coordinate,
        zoom: f64,
    },
    LocateMe,
    /// Viewport pushed by the host.
    Sync(Viewport),
}

/// Who currently owns the camera.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Authority {
    Manual,
    Following,
    TransitionToPoint { token: RequestToken },
    ClusterExpansion,
    HostSync,
}

impl Authority {
    fn name(&self) -> &'static str {
        match self {
            Authority::Manual => "manual",
            Authority::Following => "following",
            Authority::TransitionToPoint { .. } => "transition_to_point",
            Authority::ClusterExpansion => "cluster_expansion",
            Authority::HostSync => "host_sync",
        }
    }

    fn is_flight(&self) -> bool {
        matches!(
            self,
            Authority::TransitionToPoint { .. } | Authority::ClusterExpansion | Authority::HostSync
        )
    }
}

/// Result of one [`ViewportController::apply`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Viewport overwritten in place.
    Committed,
    Animating(AnimationId),
    Ignored(&'static str),
}

/// Single owner of the camera.
///
/// Ordering contract: intents and camera events are processed in arrival
/// order. The newest animation wins; completions of superseded animations are
/// dropped.
#[derive(Debug)]
pub struct ViewportController {
    config: ControllerConfig,
    viewport: Viewport,
    authority: Authority,
    follow: FollowMode,
    last_position: Option<Coordinate>,
    in_flight: Option<AnimationId>,
    next_animation: u64,
    honored_token: Option<RequestToken>,
    consumed_token: Option<RequestToken>,
    dirty: bool,
    frame: Frame,
    bus: EventBus,
}

impl ViewportController {
    /// Starts at `initial`, or at the configured fallback.
    pub fn new(config: ControllerConfig, initial: Option<Viewport>) -> Self {
        Self {
            viewport: initial.unwrap_or(config.fallback),
            config,
            authority: Authority::Manual,
            follow: FollowMode::new(),
            last_position: None,
            in_flight: None,
            next_animation: 0,
            honored_token: None,
            consumed_token: None,
            dirty: false,
            frame: Frame::first(),
            bus: EventBus::new(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn follow(&self) -> &FollowMode {
        &self.follow
    }

    pub fn last_position(&self) -> Option<Coordinate> {
        self.last_position
    }

    pub fn in_flight(&self) -> Option<AnimationId> {
        self.in_flight
    }

    /// Frame used to tag traced events.
    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    pub fn events(&self) -> &[Event] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    /// Committed viewport since the last call, if it changed.
    pub fn take_committed(&mut self) -> Option<Viewport> {
        std::mem::take(&mut self.dirty).then_some(self.viewport)
    }

    /// Center-on-point request whose flight ended (landed or interrupted).
    pub fn take_consumed_request(&mut self) -> Option<RequestToken> {
        self.consumed_token.take()
    }

    pub fn apply(&mut self, intent: CameraIntent, camera: &mut dyn CameraHost) -> Applied {
        match intent {
            CameraIntent::Gesture(viewport) => self.on_gesture(viewport),
            CameraIntent::Follow(sample) => self.on_sample(sample, camera),
            CameraIntent::CenterOnPoint { token, target } => self.on_center(token, target, camera),
            CameraIntent::ClusterExpand { position, zoom } => {
                let zoom = zoom.min(self.config.max_zoom).max(self.viewport.zoom);
                let id = self.fly(camera, position, zoom, self.config.expansion_duration, Easing::Fly);
                self.set_authority(Authority::ClusterExpansion);
                Applied::Animating(id)
            }
            CameraIntent::LocateMe => self.on_locate_me(camera),
            CameraIntent::Sync(target) => {
                if !self.viewport.differs_significantly(
                    &target,
                    self.config.sync_min_delta_deg,
                    self.config.sync_min_delta_zoom,
                ) {
                    return Applied::Ignored("pushed viewport too close");
                }
                let id = self.fly(camera, target.center(), target.zoom, self.config.sync_duration, Easing::Fly);
                self.set_authority(Authority::HostSync);
                Applied::Animating(id)
            }
        }
    }

    /// Feeds camera motion reported by the host.
    pub fn on_camera_event(&mut self, event: CameraEvent, camera: &mut dyn CameraHost) -> Applied {
        match event {
            CameraEvent::Moved {
                viewport,
                user_driven: true,
            } => self.apply(CameraIntent::Gesture(viewport), camera),
            CameraEvent::Moved {
                viewport,
                user_driven: false,
            } => {
                self.commit(viewport);
                Applied::Committed
            }
            CameraEvent::AnimationFinished { id } => self.on_finished(id),
        }
    }

    /// The one-shot fix failed: no position is known.
    pub fn position_unavailable(&mut self) {
        self.last_position = None;
        let t = self.follow.on_position_lost();
        self.log_follow(t);
        if self.authority == Authority::Following {
            self.set_authority(Authority::Manual);
        }
    }

    fn on_gesture(&mut self, viewport: Viewport) -> Applied {
        if let Some(id) = self.in_flight.take() {
            self.bus.emit(self.frame, "camera", format!("{id} interrupted by gesture"));
        }
        let t = self.follow.on_manual_gesture();
        self.log_follow(t);
        self.set_authority(Authority::Manual);
        self.commit(viewport);
        Applied::Committed
    }

    fn on_sample(&mut self, sample: Coordinate, camera: &mut dyn CameraHost) -> Applied {
        self.last_position = Some(sample);
        let t = self.follow.on_position_available();
        self.log_follow(t);

        if !self.follow.is_enabled() {
            return Applied::Ignored("follow disabled");
        }
        if self.authority.is_flight() {
            return Applied::Ignored("flight in progress");
        }
        self.set_authority(Authority::Following);

        let distance = planar_distance_m(camera.center(), sample);
        if distance <= self.config.follow_threshold_m {
            tracing::debug!(distance, "position sample within follow threshold");
            return Applied::Ignored("within follow threshold");
        }
        let id = self.fly(camera, sample, self.config.follow_zoom, self.config.follow_duration, Easing::Ease);
        Applied::Animating(id)
    }

    fn on_center(&mut self, token: RequestToken, target: Coordinate, camera: &mut dyn CameraHost) -> Applied {
        if self.honored_token == Some(token) {
            return Applied::Ignored("request already honored");
        }
        self.honored_token = Some(token);
        let t = self.follow.on_center_on_point();
        self.log_follow(t);
        let id = self.fly(camera, target, self.config.center_zoom, self.config.center_duration, Easing::Fly);
        self.set_authority(Authority::TransitionToPoint { token });
        Applied::Animating(id)
    }

    fn on_locate_me(&mut self, camera: &mut dyn CameraHost) -> Applied {
        let t = self.follow.on_locate_me();
        self.log_follow(t);
        let Some(position) = self.last_position else {
            return Applied::Ignored("no position yet");
        };
        let id = self.fly(camera, position, self.config.follow_zoom, self.config.follow_duration, Easing::Ease);
        self.set_authority(Authority::Following);
        Applied::Animating(id)
    }

    fn on_finished(&mut self, id: AnimationId) -> Applied {
        if self.in_flight != Some(id) {
            return Applied::Ignored("superseded animation");
        }
        self.in_flight = None;
        self.bus.emit(self.frame, "camera", format!("{id} finished"));
        match self.authority {
            Authority::TransitionToPoint { .. } => self.set_authority(Authority::Manual),
            Authority::ClusterExpansion | Authority::HostSync => {
                let next = if self.follow.is_enabled() {
                    Authority::Following
                } else {
                    Authority::Manual
                };
                self.set_authority(next);
            }
            Authority::Manual | Authority::Following => {}
        }
        Applied::Committed
    }

    fn fly(
        &mut self,
        camera: &mut dyn CameraHost,
        center: Coordinate,
        zoom: f64,
        duration: Duration,
        easing: Easing,
    ) -> AnimationId {
        self.next_animation += 1;
        let id = AnimationId(self.next_animation);
        if let Some(previous) = self.in_flight.replace(id) {
            self.bus.emit(self.frame, "camera", format!("{previous} superseded by {id}"));
        }
        camera.fly_to(FlyTo {
            id,
            center,
            zoom,
            bearing: None,
            duration,
            easing,
        });
        self.bus.emit(
            self.frame,
            "camera",
            format!(
                "{id} to ({:.5}, {:.5}) z{zoom:.2} in {}ms",
                center.latitude,
                center.longitude,
                duration.as_millis()
            ),
        );
        id
    }

    fn commit(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.dirty = true;
    }

    /// Leaving `TransitionToPoint` by any route consumes its request.
    fn set_authority(&mut self, next: Authority) {
        if self.authority != next {
            if let Authority::TransitionToPoint { token } = self.authority {
                self.consumed_token = Some(token);
            }
            self.bus.emit(
                self.frame,
                "authority",
                format!("{} -> {}", self.authority.name(), next.name()),
            );
            self.authority = next;
        }
    }

    fn log_follow(&mut self, t: FollowTransition) {
        match t {
            FollowTransition::Enabled => self.bus.emit(self.frame, "follow", "enabled"),
            FollowTransition::Disabled => self.bus.emit(self.frame, "follow", "disabled"),
            FollowTransition::Unchanged => {}
        }
    }
}
