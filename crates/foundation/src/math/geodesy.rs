use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Offset by a local east/north displacement in meters.
    ///
    /// Uses the same equirectangular approximation as [`planar_distance_m`], so
    /// `planar_distance_m(c, c.offset_m(e, n))` is `hypot(e, n)` up to rounding.
    pub fn offset_m(self, east_m: f64, north_m: f64) -> Self {
        let dlat = (north_m / WGS84_A).to_degrees();
        let mean_lat = (self.latitude + dlat * 0.5).to_radians();
        let dlon = (east_m / (WGS84_A * mean_lat.cos())).to_degrees();
        Self::new(self.latitude + dlat, self.longitude + dlon)
    }
}

/// Planar (equirectangular) distance in meters.
///
/// Accurate to well under a meter at the ~10 m scale used for GPS jitter gating;
/// not intended for long distances.
pub fn planar_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let mean_lat = ((a.latitude + b.latitude) * 0.5).to_radians();
    let mut dlon = b.longitude - a.longitude;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let x = dlon.to_radians() * mean_lat.cos();
    let y = (b.latitude - a.latitude).to_radians();
    (x * x + y * y).sqrt() * WGS84_A
}
