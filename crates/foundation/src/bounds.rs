use crate::math::Coordinate;

/// Axis-aligned bounding box in degrees: `min = [west, south]`, `max = [east, north]`.
///
/// `west > east` is allowed and means the box crosses the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    /// Web Mercator world: latitudes past ±85° are not representable.
    pub const WORLD: Aabb2 = Aabb2 {
        min: [-180.0, -85.0],
        max: [180.0, 85.0],
    };

    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Square box of `padding_deg` degrees around `center` in each direction.
    pub fn around(center: Coordinate, padding_deg: f64) -> Self {
        Aabb2::new(
            [center.longitude - padding_deg, center.latitude - padding_deg],
            [center.longitude + padding_deg, center.latitude + padding_deg],
        )
    }

    pub fn west(&self) -> f64 {
        self.min[0]
    }

    pub fn south(&self) -> f64 {
        self.min[1]
    }

    pub fn east(&self) -> f64 {
        self.max[0]
    }

    pub fn north(&self) -> f64 {
        self.max[1]
    }

    pub fn lon_span(&self) -> f64 {
        self.max[0] - self.min[0]
    }
}
