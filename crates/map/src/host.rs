use foundation::ids::PointId;
use viewport::Viewport;

/// Callbacks from the map to the surrounding app.
pub trait MapHost {
    /// Fired on every committed camera update, animation frames included.
    fn on_viewport_change(&mut self, viewport: Viewport);
    fn on_point_selected(&mut self, point: &PointId);
}

/// Host that just keeps what it was told.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingHost {
    pub viewports: Vec<Viewport>,
    pub selected: Vec<PointId>,
}

impl MapHost for RecordingHost {
    fn on_viewport_change(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }

    fn on_point_selected(&mut self, point: &PointId) {
        self.selected.push(point.clone());
    }
}
