use foundation::math::Coordinate;
use serde::{Deserialize, Serialize};

/// Camera position: center, zoom and bearing (degrees clockwise from north).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub bearing: f64,
}

/// Whole-country view used before any position is known (Denmark).
pub const FALLBACK_VIEWPORT: Viewport = Viewport {
    longitude: 10.0,
    latitude: 56.0,
    zoom: 6.0,
    bearing: 0.0,
};

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64) -> Self {
        Self {
            longitude: center.longitude,
            latitude: center.latitude,
            zoom,
            bearing: 0.0,
        }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn with_center(self, center: Coordinate) -> Self {
        Self {
            longitude: center.longitude,
            latitude: center.latitude,
            ..self
        }
    }

    /// True when `other` is far enough away to be worth animating to.
    pub fn differs_significantly(&self, other: &Viewport, max_deg: f64, max_zoom: f64) -> bool {
        (self.longitude - other.longitude).abs() > max_deg
            || (self.latitude - other.latitude).abs() > max_deg
            || (self.zoom - other.zoom).abs() > max_zoom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        FALLBACK_VIEWPORT
    }
}
