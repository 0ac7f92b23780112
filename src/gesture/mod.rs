//! Per-frame gesture observations
//!
//! The classifier is an external collaborator. It reports, for every frame it
//! has processed, zero or more hands. Each hand carries the classifier's ranked
//! gesture candidates and the 21 hand landmarks it was computed from.
//!
//! Two pure stages run over an observation before the debounce machine sees it:
//!
//! 1. [`pointing`] derives a `Pointing_Up` / `Pointing_Down` pseudo-label from
//!    index-finger geometry (the classifier has no "pointing down" category).
//! 2. [`resolver`] turns the observation plus the binding table into at most one
//!    candidate action for the frame.

pub mod pointing;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use pointing::{infer_pointing_direction, PointingDirection};
pub use resolver::{display_label, resolve_command};

/// Number of landmarks in a full hand skeleton
pub const HAND_LANDMARK_COUNT: usize = 21;

/// A single classified gesture candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureDetection {
    /// Classifier category name (e.g. "Thumb_Up")
    pub label: String,
    /// Confidence in [0, 1]
    pub score: f32,
}

impl GestureDetection {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A hand landmark in normalised image coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Everything the classifier reported for one hand
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandObservation {
    /// Gesture candidates, best first
    #[serde(default)]
    pub detections: Vec<GestureDetection>,
    /// Hand skeleton, empty when the classifier did not report landmarks
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl HandObservation {
    /// A hand with a single detection and no landmarks
    pub fn with_detection(label: impl Into<String>, score: f32) -> Self {
        Self {
            detections: vec![GestureDetection::new(label, score)],
            landmarks: Vec::new(),
        }
    }

    /// Returns the classifier's top-ranked detection for this hand
    pub fn top(&self) -> Option<&GestureDetection> {
        self.detections.first()
    }
}

/// The full detection set for one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameObservation {
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

impl FrameObservation {
    pub fn new(hands: Vec<HandObservation>) -> Self {
        Self { hands }
    }

    /// An observation with no hands
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convenience constructor: one hand per `(label, score)` pair
    pub fn from_detections<'a>(detections: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
        Self {
            hands: detections
                .into_iter()
                .map(|(label, score)| HandObservation::with_detection(label, score))
                .collect(),
        }
    }

    /// Returns true if no hand reported anything
    pub fn is_empty(&self) -> bool {
        self.hands.iter().all(|h| h.detections.is_empty())
    }

    /// All detections across all hands, in detection order
    pub fn detections(&self) -> impl Iterator<Item = &GestureDetection> {
        self.hands.iter().flat_map(|h| h.detections.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_observation() {
        assert!(FrameObservation::empty().is_empty());
        let hand_without_detections = FrameObservation::new(vec![HandObservation::default()]);
        assert!(hand_without_detections.is_empty());
    }

    #[test]
    fn test_detections_flatten_hands_in_order() {
        let obs = FrameObservation::new(vec![
            HandObservation {
                detections: vec![
                    GestureDetection::new("Victory", 0.8),
                    GestureDetection::new("Open_Palm", 0.1),
                ],
                landmarks: Vec::new(),
            },
            HandObservation::with_detection("Thumb_Up", 0.7),
        ]);

        let labels: Vec<&str> = obs.detections().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Victory", "Open_Palm", "Thumb_Up"]);
        assert_eq!(obs.hands[0].top().unwrap().label, "Victory");
    }

    #[test]
    fn test_observation_deserialises_with_missing_fields() {
        let json = r#"{"hands": [{"detections": [{"label": "Thumb_Up", "score": 0.9}]}]}"#;
        let obs: FrameObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.hands.len(), 1);
        assert!(obs.hands[0].landmarks.is_empty());

        let landmark: Landmark = serde_json::from_str(r#"{"x": 0.5, "y": 0.25}"#).unwrap();
        assert_eq!(landmark, Landmark::new(0.5, 0.25));
    }
}
