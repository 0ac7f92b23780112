//! Camera and classifier seams
//!
//! The engine is generic over where frames come from and what classifies
//! them. Production wires a camera and a gesture model; tests and the replay
//! driver plug in scripted implementations.

/// Error type returned by collaborator constructors
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Something that yields frames, e.g. a camera
pub trait FrameSource {
    type Frame;

    /// Next frame, or `None` when no frame is available (or the source ended)
    fn read_frame(&mut self) -> Option<Self::Frame>;

    /// Release the underlying device. Called exactly once.
    fn release(&mut self);
}

/// Asynchronous gesture classifier
///
/// Results are not returned from `submit`; they are delivered later through
/// the [`ObservationSink`](super::ObservationSink) given to the classifier when it was created.
pub trait GestureClassifier<F> {
    /// Hand a frame over for classification without blocking
    fn submit(&mut self, frame: &F, timestamp_ms: u64);

    /// Stop classifying and free the model. Called exactly once.
    fn close(&mut self);
}

