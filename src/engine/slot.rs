//! Latest-result cell between the classifier and the decision loop
//!
//! The classifier runs asynchronously and may deliver results from any
//! thread. Only the newest result matters, so the slot holds one observation
//! and each delivery replaces the previous one.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::gesture::FrameObservation;

#[derive(Debug, Default)]
struct SlotInner {
    latest: Mutex<Option<Arc<FrameObservation>>>,
}

/// Read side, owned by the engine
#[derive(Debug, Clone, Default)]
pub struct ObservationSlot {
    inner: Arc<SlotInner>,
}

/// Write side, handed to the classifier as its result callback
#[derive(Debug, Clone)]
pub struct ObservationSink {
    inner: Arc<SlotInner>,
}

impl ObservationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> ObservationSink {
        ObservationSink {
            inner: Arc::clone(&self.inner),
        }
    }

    /// The most recent observation, if any has arrived
    pub fn latest(&self) -> Option<Arc<FrameObservation>> {
        self.inner.latest.lock().clone()
    }

    pub fn clear(&self) {
        *self.inner.latest.lock() = None;
    }
}

impl ObservationSink {
    /// Publish a classifier result, replacing whatever was there
    pub fn deliver(&self, observation: FrameObservation) {
        *self.inner.latest.lock() = Some(Arc::new(observation));
    }
}
