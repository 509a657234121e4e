//! Web Mercator projection to the unit square.
//!
//! `x` grows east from 0 at -180° to 1 at +180°; `y` grows south from 0 at the
//! northern limit to 1 at the southern limit. At zoom `z` the world is
//! `tile_extent * 2^z` pixels wide.

use super::Coordinate;

pub fn lng_to_unit_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

pub fn lat_to_unit_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / std::f64::consts::PI;
    // Poles project to ±inf.
    y.clamp(0.0, 1.0)
}

pub fn unit_x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn unit_y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0).to_radians();
    360.0 * y2.exp().atan() / std::f64::consts::PI - 90.0
}

pub fn project(c: Coordinate) -> [f64; 2] {
    [lng_to_unit_x(c.longitude), lat_to_unit_y(c.latitude)]
}

pub fn unproject(p: [f64; 2]) -> Coordinate {
    Coordinate::new(unit_y_to_lat(p[1]), unit_x_to_lng(p[0]))
}

/// A pixel distance at `zoom` expressed in unit-square distance.
pub fn pixels_to_unit(pixels: f64, tile_extent: f64, zoom: f64) -> f64 {
    pixels / (tile_extent * 2f64.powf(zoom))
}

#[cfg(test)]
mod tests {
    use super::{lat_to_unit_y, pixels_to_unit, project, unproject};
    use crate::math::Coordinate;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_projects_to_center() {
        let p = project(Coordinate::new(0.0, 0.0));
        assert_close(p[0], 0.5, 1e-12);
        assert_close(p[1], 0.5, 1e-12);
    }

    #[test]
    fn round_trip() {
        let c = Coordinate::new(56.25, 10.125);
        let back = unproject(project(c));
        assert_close(back.latitude, c.latitude, 1e-9);
        assert_close(back.longitude, c.longitude, 1e-9);
    }

    #[test]
    fn poles_are_clamped() {
        assert_eq!(lat_to_unit_y(90.0), 0.0);
        assert_eq!(lat_to_unit_y(-90.0), 1.0);
    }

    #[test]
    fn pixel_radius_halves_per_zoom() {
        let r10 = pixels_to_unit(75.0, 512.0, 10.0);
        let r11 = pixels_to_unit(75.0, 512.0, 11.0);
        assert_close(r10, 2.0 * r11, 1e-15);
    }
}
