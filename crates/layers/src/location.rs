use foundation::math::Coordinate;
use serde::Serialize;

use crate::symbology::{Color, LOCATION_BLUE};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LocationMarker {
    pub position: Coordinate,
    pub color: Color,
    pub pulsing: bool,
}

/// Current-position dot. Empty until a live position is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationLayer {
    pub marker: Option<LocationMarker>,
}

impl LocationLayer {
    pub fn from_position(position: Option<Coordinate>) -> Self {
        Self {
            marker: position.map(|position| LocationMarker {
                position,
                color: LOCATION_BLUE,
                pulsing: true,
            }),
        }
    }
}
