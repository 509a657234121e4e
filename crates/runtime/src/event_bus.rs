use serde::Serialize;

use crate::frame::Frame;

/// One traced event: which component said what, on which frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub frame_index: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Append-only event log for camera-authority transitions.
///
/// Every emitted event is also forwarded to `tracing` at debug level so the
/// log and the subscriber output stay in step.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(frame = frame.index, kind, "{message}");
        self.events.push(Event {
            frame_index: frame.index,
            kind,
            message,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::Frame;

    #[test]
    fn records_events_with_frame_index() {
        let mut bus = EventBus::new();
        let f = Frame::first().advance(0.1).advance(0.1);
        bus.emit(f, "follow", "enabled");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
    }

    #[test]
    fn drain_empties_the_log() {
        let mut bus = EventBus::new();
        bus.emit(Frame::first(), "camera", "fly");
        bus.emit(Frame::first(), "follow", "disabled");
        bus.emit(Frame::first(), "camera", "finished");
        assert_eq!(bus.events()[2].message, "finished");

        let drained = bus.drain();
        assert_eq!(drained.len(), 3);
        assert!(bus.events().is_empty());
    }
}
