/// Clustering parameters.
///
/// Defaults: 75 px radius on 512 px tiles, clusters of at least two points,
/// clustering from zoom 0 up to and including zoom 20.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterOptions {
    /// Grouping radius in screen pixels. Constant across zoom levels.
    pub radius_px: f64,
    /// Tile extent in pixels the radius is measured against.
    pub extent: f64,
    pub min_zoom: u8,
    /// Highest zoom at which points are still grouped. Above it every point
    /// renders on its own.
    pub max_zoom: u8,
    pub min_points: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius_px: 75.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 20,
            min_points: 2,
        }
    }
}

impl ClusterOptions {
    /// The raw, unclustered level sits one above `max_zoom`.
    pub fn raw_level(&self) -> u8 {
        self.max_zoom + 1
    }
}
