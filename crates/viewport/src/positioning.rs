use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    PermissionDenied,
    Timeout,
    PositionUnavailable,
    Unsupported,
}

impl std::fmt::Display for PositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionError::PermissionDenied => write!(f, "location permission denied"),
            PositionError::Timeout => write!(f, "timed out waiting for a position fix"),
            PositionError::PositionUnavailable => write!(f, "position unavailable"),
            PositionError::Unsupported => write!(f, "positioning is not supported on this device"),
        }
    }
}

impl std::error::Error for PositionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the platform may hand back.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// One-shot fix requested when the app starts.
    pub fn initial_fix() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }

    /// Continuous updates while the map is on screen.
    pub fn watch() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(pub u32);

/// Device positioning, shared by handle like the platform geolocation object.
///
/// Results arrive asynchronously: the one-shot answer and every watch sample
/// are fed back to the session by the host, not returned from these calls.
pub trait PositionSource {
    fn request_current(&self, options: PositionOptions);
    fn watch(&self, options: PositionOptions) -> Result<WatchId, PositionError>;
    fn clear_watch(&self, id: WatchId);
}

/// Active watch that is cleared when dropped.
pub struct WatchSubscription<P: PositionSource> {
    source: Rc<P>,
    id: Option<WatchId>,
}

impl<P: PositionSource> WatchSubscription<P> {
    pub fn start(source: Rc<P>, options: PositionOptions) -> Result<Self, PositionError> {
        let id = source.watch(options)?;
        tracing::debug!(watch = id.0, "position watch started");
        Ok(Self {
            source,
            id: Some(id),
        })
    }

    pub fn id(&self) -> Option<WatchId> {
        self.id
    }
}

impl<P: PositionSource> Drop for WatchSubscription<P> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.source.clear_watch(id);
            tracing::debug!(watch = id.0, "position watch cleared");
        }
    }
}

impl<P: PositionSource> std::fmt::Debug for WatchSubscription<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription").field("id", &self.id).finish()
    }
}

/// In-memory source for tests and trace replay. Tracks live watches.
#[derive(Debug, Default)]
pub struct ScriptedPositionSource {
    unsupported: bool,
    next_watch: Cell<u32>,
    active: RefCell<BTreeSet<WatchId>>,
    requests: RefCell<Vec<PositionOptions>>,
}

impl ScriptedPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    pub fn active_watches(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn requests(&self) -> Vec<PositionOptions> {
        self.requests.borrow().clone()
    }
}

impl PositionSource for ScriptedPositionSource {
    fn request_current(&self, options: PositionOptions) {
        self.requests.borrow_mut().push(options);
    }

    fn watch(&self, _options: PositionOptions) -> Result<WatchId, PositionError> {
        if self.unsupported {
            return Err(PositionError::Unsupported);
        }
        let id = WatchId(self.next_watch.get() + 1);
        self.next_watch.set(id.0);
        self.active.borrow_mut().insert(id);
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        self.active.borrow_mut().remove(&id);
    }
}
