use std::time::Duration;

use foundation::math::{Coordinate, Vec2, project, unproject};
use foundation::time::{Time, TimeSpan};
use runtime::Frame;
use serde::Serialize;

use crate::viewport::Viewport;

/// Identifies one programmatic camera animation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnimationId(pub u64);

impl std::fmt::Display for AnimationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anim-{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Short ease-out pan, used while following.
    Ease,
    /// Longer flight with ease-in-out.
    Fly,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Ease => 1.0 - (1.0 - t).powi(3),
            Easing::Fly => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Animated camera move request.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FlyTo {
    pub id: AnimationId,
    pub center: Coordinate,
    pub zoom: f64,
    /// `None` keeps the current bearing.
    pub bearing: Option<f64>,
    #[serde(serialize_with = "serialize_ms")]
    pub duration: Duration,
    pub easing: Easing,
}

fn serialize_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// The map widget, seen from the controller.
///
/// A new `fly_to` replaces any animation still in flight. Hosts report camera
/// motion back as [`CameraEvent`]s.
pub trait CameraHost {
    fn fly_to(&mut self, request: FlyTo);
    fn center(&self) -> Coordinate;
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CameraEvent {
    Moved { viewport: Viewport, user_driven: bool },
    AnimationFinished { id: AnimationId },
}

#[derive(Debug, Clone)]
struct Flight {
    request: FlyTo,
    from: Viewport,
    span: TimeSpan,
}

/// Frame-driven camera used by tests and the replay tool.
///
/// Flights interpolate in Web Mercator space so that a straight line on
/// screen stays straight.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    viewport: Viewport,
    now: Time,
    flight: Option<Flight>,
    requests: Vec<FlyTo>,
    replaced: Vec<AnimationId>,
}

impl SimulatedCamera {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            now: Time(0.0),
            flight: None,
            requests: Vec::new(),
            replaced: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_animating(&self) -> bool {
        self.flight.is_some()
    }

    pub fn in_flight(&self) -> Option<AnimationId> {
        self.flight.as_ref().map(|f| f.request.id)
    }

    /// Every `fly_to` received, oldest first.
    pub fn requests(&self) -> &[FlyTo] {
        &self.requests
    }

    /// Animations that were cut short by a newer request or a gesture.
    pub fn replaced(&self) -> &[AnimationId] {
        &self.replaced
    }

    /// User pan/zoom. Interrupts any programmatic flight.
    pub fn gesture(&mut self, viewport: Viewport) -> CameraEvent {
        if let Some(f) = self.flight.take() {
            self.replaced.push(f.request.id);
        }
        self.viewport = viewport;
        CameraEvent::Moved {
            viewport,
            user_driven: true,
        }
    }

    /// Samples the active flight at `frame.time`.
    pub fn advance(&mut self, frame: Frame) -> Vec<CameraEvent> {
        self.now = frame.time;
        let Some(flight) = self.flight.as_ref() else {
            return Vec::new();
        };

        let t = flight.span.progress(self.now);
        let k = flight.request.easing.apply(t);
        let from = flight.from;
        let req = flight.request;

        let a = project(from.center());
        let b = project(req.center);
        let p = Vec2::new(a[0], a[1]).lerp(Vec2::new(b[0], b[1]), k);
        let center = unproject([p.x, p.y]);
        let to_bearing = req.bearing.unwrap_or(from.bearing);

        self.viewport = Viewport {
            longitude: center.longitude,
            latitude: center.latitude,
            zoom: from.zoom + (req.zoom - from.zoom) * k,
            bearing: from.bearing + (to_bearing - from.bearing) * k,
        };

        let mut events = vec![CameraEvent::Moved {
            viewport: self.viewport,
            user_driven: false,
        }];
        if t >= 1.0 {
            // Land exactly on the target; interpolation through the projection drifts.
            self.viewport = Viewport {
                longitude: req.center.longitude,
                latitude: req.center.latitude,
                zoom: req.zoom,
                bearing: to_bearing,
            };
            events[0] = CameraEvent::Moved {
                viewport: self.viewport,
                user_driven: false,
            };
            events.push(CameraEvent::AnimationFinished { id: req.id });
            self.flight = None;
        }
        events
    }
}

impl CameraHost for SimulatedCamera {
    fn fly_to(&mut self, request: FlyTo) {
        if let Some(f) = self.flight.take() {
            self.replaced.push(f.request.id);
        }
        self.requests.push(request);
        self.flight = Some(Flight {
            request,
            from: self.viewport,
            span: TimeSpan::starting_at(self.now, request.duration),
        });
    }

    fn center(&self) -> Coordinate {
        self.viewport.center()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use foundation::math::Coordinate;
    use runtime::Frame;

    use super::{AnimationId, CameraEvent, CameraHost, Easing, FlyTo, SimulatedCamera};
    use crate::viewport::{FALLBACK_VIEWPORT, Viewport};

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} vs {b} (eps={eps})");
    }

    fn fly(id: u64, lat: f64, lon: f64, zoom: f64, ms: u64) -> FlyTo {
        FlyTo {
            id: AnimationId(id),
            center: Coordinate::new(lat, lon),
            zoom,
            bearing: None,
            duration: Duration::from_millis(ms),
            easing: Easing::Fly,
        }
    }

    #[test]
    fn easing_endpoints() {
        for e in [Easing::Ease, Easing::Fly] {
            assert_close(e.apply(0.0), 0.0, 1e-12);
            assert_close(e.apply(1.0), 1.0, 1e-12);
            assert!(e.apply(0.5) > 0.0 && e.apply(0.5) < 1.0);
        }
    }

    #[test]
    fn flight_lands_on_target_and_reports_completion() {
        let mut cam = SimulatedCamera::new(FALLBACK_VIEWPORT);
        cam.fly_to(fly(1, 55.7, 12.5, 15.0, 1000));

        let f = Frame::first().advance(0.5);
        let mid = cam.advance(f);
        assert_eq!(mid.len(), 1);
        assert!(cam.is_animating());
        let z = cam.viewport().zoom;
        assert!(z > 6.0 && z < 15.0);

        let done = cam.advance(f.advance(0.6));
        assert_eq!(done.last(), Some(&CameraEvent::AnimationFinished { id: AnimationId(1) }));
        assert!(!cam.is_animating());
        assert_eq!(cam.viewport().zoom, 15.0);
        assert_eq!(cam.center(), Coordinate::new(55.7, 12.5));
    }

    #[test]
    fn new_request_replaces_flight() {
        let mut cam = SimulatedCamera::new(FALLBACK_VIEWPORT);
        cam.fly_to(fly(1, 55.7, 12.5, 15.0, 1000));
        cam.fly_to(fly(2, 57.0, 9.9, 12.0, 1000));
        assert_eq!(cam.replaced(), &[AnimationId(1)]);
        assert_eq!(cam.in_flight(), Some(AnimationId(2)));
        assert_eq!(cam.requests().len(), 2);
    }

    #[test]
    fn gesture_interrupts_flight() {
        let mut cam = SimulatedCamera::new(FALLBACK_VIEWPORT);
        cam.fly_to(fly(1, 55.7, 12.5, 15.0, 1000));
        let target = Viewport { zoom: 9.0, ..FALLBACK_VIEWPORT };
        let ev = cam.gesture(target);
        assert_eq!(
            ev,
            CameraEvent::Moved {
                viewport: target,
                user_driven: true
            }
        );
        assert!(!cam.is_animating());
        assert!(cam.advance(Frame::first().advance(2.0)).is_empty());
    }

    #[test]
    fn zero_duration_completes_on_next_frame() {
        let mut cam = SimulatedCamera::new(FALLBACK_VIEWPORT);
        cam.fly_to(fly(7, 56.1, 10.2, 8.0, 0));
        let ev = cam.advance(Frame::first());
        assert_eq!(ev.len(), 2);
        assert_eq!(cam.viewport().zoom, 8.0);
    }
}
