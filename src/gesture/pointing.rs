//! Index-finger pointing direction from hand geometry
//!
//! The classifier only knows `Pointing_Up`. This module looks at the index
//! finger of each hand and, when the finger is straight, classifies it as
//! pointing up or down from the vertical offset between the fingertip and the
//! base joint.

use super::{HandObservation, Landmark, HAND_LANDMARK_COUNT};

/// Minimum |tip.y - mcp.y| (normalised units) for a direction to count
pub const ORIENTATION_THRESHOLD: f32 = 0.05;

/// Cosine between the MCP→PIP and PIP→DIP segments at or below which the
/// finger counts as straight
pub const STRAIGHT_COSINE: f32 = -0.85;

const INDEX_MCP: usize = 5;
const INDEX_PIP: usize = 6;
const INDEX_DIP: usize = 7;
const INDEX_TIP: usize = 8;

/// Direction of a straight index finger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointingDirection {
    Up,
    Down,
}

impl PointingDirection {
    /// The pseudo-label used as a binding key
    pub fn label(&self) -> &'static str {
        match self {
            PointingDirection::Up => "Pointing_Up",
            PointingDirection::Down => "Pointing_Down",
        }
    }
}

/// Cosine of the angle between two 2D vectors.
///
/// A zero-length vector yields 1.0 so that degenerate input never reads as
/// straight.
fn cos_between(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let na = ax.hypot(ay);
    let nb = bx.hypot(by);
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    (ax * bx + ay * by) / (na * nb)
}

/// Returns true if the index finger is extended.
///
/// Compares the base segment (MCP→PIP) with the middle segment (PIP→DIP);
/// the finger counts as straight when they point in opposite directions.
pub fn index_is_straight(landmarks: &[Landmark]) -> bool {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return false;
    }
    let mcp = landmarks[INDEX_MCP];
    let pip = landmarks[INDEX_PIP];
    let dip = landmarks[INDEX_DIP];

    let cos = cos_between(pip.x - mcp.x, pip.y - mcp.y, dip.x - pip.x, dip.y - pip.y);
    cos <= STRAIGHT_COSINE
}

/// Classify a single hand. `None` when the finger is bent, the skeleton is
/// incomplete, or the vertical offset is inside the dead zone.
pub fn hand_pointing_direction(landmarks: &[Landmark]) -> Option<PointingDirection> {
    if !index_is_straight(landmarks) {
        return None;
    }
    let dy = landmarks[INDEX_TIP].y - landmarks[INDEX_MCP].y;
    if dy < -ORIENTATION_THRESHOLD {
        Some(PointingDirection::Up)
    } else if dy > ORIENTATION_THRESHOLD {
        Some(PointingDirection::Down)
    } else {
        None
    }
}

/// Pointing direction of the first qualifying hand, in detection order
pub fn infer_pointing_direction(hands: &[HandObservation]) -> Option<PointingDirection> {
    hands
        .iter()
        .find_map(|hand| hand_pointing_direction(&hand.landmarks))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a 21-point skeleton whose index finger runs through the given
    /// MCP, PIP, DIP and tip positions. Other joints sit at the wrist.
    pub(crate) fn hand_with_index(points: [(f32, f32); 4]) -> Vec<Landmark> {
        let mut landmarks = vec![Landmark::new(0.5, 0.8); HAND_LANDMARK_COUNT];
        for (offset, (x, y)) in points.iter().enumerate() {
            landmarks[INDEX_MCP + offset] = Landmark::new(*x, *y);
        }
        landmarks
    }

    pub(crate) fn pointing_down_hand() -> Vec<Landmark> {
        hand_with_index([(0.5, 0.40), (0.5, 0.45), (0.5, 0.42), (0.5, 0.50)])
    }

    #[test]
    fn test_straight_finger_pointing_down() {
        let hand = pointing_down_hand();
        assert!(index_is_straight(&hand));
        assert_eq!(
            hand_pointing_direction(&hand),
            Some(PointingDirection::Down)
        );
    }

    #[test]
    fn test_straight_finger_pointing_up() {
        let hand = hand_with_index([(0.5, 0.60), (0.5, 0.55), (0.5, 0.58), (0.5, 0.45)]);
        assert!(index_is_straight(&hand));
        assert_eq!(hand_pointing_direction(&hand), Some(PointingDirection::Up));
    }

    #[test]
    fn test_horizontal_finger_is_ambiguous() {
        let hand = hand_with_index([(0.40, 0.50), (0.45, 0.50), (0.42, 0.50), (0.55, 0.52)]);
        assert!(index_is_straight(&hand));
        assert_eq!(hand_pointing_direction(&hand), None);
    }

    #[test]
    fn test_collinear_segments_are_not_straight() {
        // MCP->PIP and PIP->DIP run the same way: cosine +1
        let hand = hand_with_index([(0.5, 0.40), (0.5, 0.43), (0.5, 0.47), (0.5, 0.50)]);
        assert!(!index_is_straight(&hand));
        assert_eq!(hand_pointing_direction(&hand), None);
    }

    #[test]
    fn test_bent_finger_is_not_straight() {
        // MCP->PIP goes down, PIP->DIP goes sideways: 90 degree bend
        let hand = hand_with_index([(0.5, 0.40), (0.5, 0.45), (0.55, 0.45), (0.6, 0.45)]);
        assert!(!index_is_straight(&hand));
        assert_eq!(hand_pointing_direction(&hand), None);
    }

    #[test]
    fn test_degenerate_segment_is_not_straight() {
        let hand = hand_with_index([(0.5, 0.40), (0.5, 0.40), (0.5, 0.47), (0.5, 0.50)]);
        assert!(!index_is_straight(&hand));
        assert_eq!(cos_between(0.0, 0.0, 1.0, 0.0), 1.0);
    }

    #[test]
    fn test_incomplete_skeleton_is_skipped() {
        let mut hand = pointing_down_hand();
        hand.truncate(9);
        assert_eq!(hand_pointing_direction(&hand), None);
    }

    #[test]
    fn test_first_qualifying_hand_wins() {
        let ambiguous = HandObservation {
            detections: Vec::new(),
            landmarks: hand_with_index([(0.40, 0.50), (0.45, 0.50), (0.42, 0.50), (0.55, 0.50)]),
        };
        let up = HandObservation {
            detections: Vec::new(),
            landmarks: hand_with_index([(0.5, 0.60), (0.5, 0.55), (0.5, 0.58), (0.5, 0.45)]),
        };
        let down = HandObservation {
            detections: Vec::new(),
            landmarks: pointing_down_hand(),
        };

        assert_eq!(
            infer_pointing_direction(&[ambiguous.clone(), up.clone(), down.clone()]),
            Some(PointingDirection::Up)
        );
        assert_eq!(
            infer_pointing_direction(&[ambiguous, down, up]),
            Some(PointingDirection::Down)
        );
        assert_eq!(infer_pointing_direction(&[]), None);
    }

    #[test]
    fn test_direction_labels() {
        assert_eq!(PointingDirection::Up.label(), "Pointing_Up");
        assert_eq!(PointingDirection::Down.label(), "Pointing_Down");
    }
}
