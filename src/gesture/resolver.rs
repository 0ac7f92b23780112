//! Frame observation → candidate action

use super::pointing::{infer_pointing_direction, PointingDirection};
use super::FrameObservation;
use crate::actions::ActionSpec;
use crate::bindings::BindingTable;

/// Resolve at most one candidate action for a frame.
///
/// A straight index finger pointing down overrides the classifier's labels
/// when `Pointing_Down` is bound. Otherwise the highest-scoring bound detection
/// at or above `min_score` wins; on equal scores the first one seen is kept.
/// Unbound labels are ignored.
pub fn resolve_command(
    observation: Option<&FrameObservation>,
    bindings: &BindingTable,
    min_score: f32,
) -> Option<ActionSpec> {
    let observation = observation?;

    if infer_pointing_direction(&observation.hands) == Some(PointingDirection::Down) {
        if let Some(action) = bindings.get(PointingDirection::Down.label()) {
            return Some(action.clone());
        }
    }

    let mut best: Option<(&ActionSpec, f32)> = None;
    for detection in observation.detections() {
        if detection.score < min_score {
            continue;
        }
        let Some(action) = bindings.get(&detection.label) else {
            continue;
        };
        if best.map_or(true, |(_, score)| detection.score > score) {
            best = Some((action, detection.score));
        }
    }

    best.map(|(action, _)| action.clone())
}

/// Label for display: the first hand whose top detection clears `min_score`,
/// formatted as `"Thumb_Up 0.93"`
pub fn display_label(observation: Option<&FrameObservation>, min_score: f32) -> Option<String> {
    observation?
        .hands
        .iter()
        .filter_map(|hand| hand.top())
        .find(|top| top.score >= min_score)
        .map(|top| format!("{} {:.2}", top.label, top.score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::pointing::tests::pointing_down_hand;
    use crate::gesture::{GestureDetection, HandObservation};

    const MIN_SCORE: f32 = 0.6;

    fn bindings() -> BindingTable {
        BindingTable::empty()
            .with("Thumb_Up", "VOL_UP")
            .with("Victory", "OPEN_LAUNCHPAD")
            .with("Open_Palm", "START_SCREENSAVER")
    }

    #[test]
    fn test_no_observation_has_no_candidate() {
        assert_eq!(resolve_command(None, &bindings(), MIN_SCORE), None);
        let empty = FrameObservation::empty();
        assert_eq!(resolve_command(Some(&empty), &bindings(), MIN_SCORE), None);
    }

    #[test]
    fn test_highest_score_wins_regardless_of_order() {
        let forward = FrameObservation::from_detections([("Thumb_Up", 0.9), ("Victory", 0.95)]);
        let reverse = FrameObservation::from_detections([("Victory", 0.95), ("Thumb_Up", 0.9)]);

        for obs in [forward, reverse] {
            let cmd = resolve_command(Some(&obs), &bindings(), MIN_SCORE).unwrap();
            assert_eq!(cmd.as_str(), "OPEN_LAUNCHPAD");
        }
    }

    #[test]
    fn test_equal_scores_keep_first_encountered() {
        let obs = FrameObservation::from_detections([("Open_Palm", 0.8), ("Thumb_Up", 0.8)]);
        let cmd = resolve_command(Some(&obs), &bindings(), MIN_SCORE).unwrap();
        assert_eq!(cmd.as_str(), "START_SCREENSAVER");
    }

    #[test]
    fn test_low_confidence_is_ignored() {
        let obs = FrameObservation::from_detections([("Thumb_Up", 0.59), ("Victory", 0.2)]);
        assert_eq!(resolve_command(Some(&obs), &bindings(), MIN_SCORE), None);

        // Exactly at the threshold qualifies
        let obs = FrameObservation::from_detections([("Thumb_Up", 0.6)]);
        assert!(resolve_command(Some(&obs), &bindings(), MIN_SCORE).is_some());
    }

    #[test]
    fn test_unbound_label_does_not_shadow_bound_one() {
        let obs = FrameObservation::from_detections([("Closed_Fist", 0.99), ("Thumb_Up", 0.7)]);
        let cmd = resolve_command(Some(&obs), &bindings(), MIN_SCORE).unwrap();
        assert_eq!(cmd.as_str(), "VOL_UP");
    }

    #[test]
    fn test_scans_all_detections_of_each_hand() {
        let obs = FrameObservation::new(vec![HandObservation {
            detections: vec![
                GestureDetection::new("None", 0.7),
                GestureDetection::new("Victory", 0.65),
            ],
            landmarks: Vec::new(),
        }]);
        let cmd = resolve_command(Some(&obs), &bindings(), MIN_SCORE).unwrap();
        assert_eq!(cmd.as_str(), "OPEN_LAUNCHPAD");
    }

    #[test]
    fn test_pointing_down_overrides_classifier_labels() {
        let table = bindings().with("Pointing_Down", "VOL_DOWN");
        let obs = FrameObservation::new(vec![
            HandObservation::with_detection("Victory", 0.99),
            HandObservation {
                detections: vec![GestureDetection::new("Pointing_Up", 0.4)],
                landmarks: pointing_down_hand(),
            },
        ]);

        let cmd = resolve_command(Some(&obs), &table, MIN_SCORE).unwrap();
        assert_eq!(cmd.as_str(), "VOL_DOWN");
    }

    #[test]
    fn test_pointing_down_without_binding_falls_through() {
        let obs = FrameObservation::new(vec![HandObservation {
            detections: vec![GestureDetection::new("Thumb_Up", 0.8)],
            landmarks: pointing_down_hand(),
        }]);

        let cmd = resolve_command(Some(&obs), &bindings(), MIN_SCORE).unwrap();
        assert_eq!(cmd.as_str(), "VOL_UP");
    }

    #[test]
    fn test_bound_to_unknown_action_still_resolves() {
        let table = BindingTable::empty().with("Thumb_Up", "");
        let obs = FrameObservation::from_detections([("Thumb_Up", 0.9)]);
        let cmd = resolve_command(Some(&obs), &table, MIN_SCORE).unwrap();
        assert_eq!(cmd.as_str(), "");
    }

    #[test]
    fn test_display_label() {
        let obs = FrameObservation::from_detections([("Victory", 0.3), ("Thumb_Up", 0.934)]);
        assert_eq!(
            display_label(Some(&obs), MIN_SCORE),
            Some("Thumb_Up 0.93".to_string())
        );
        assert_eq!(display_label(Some(&FrameObservation::empty()), MIN_SCORE), None);
        assert_eq!(display_label(None, MIN_SCORE), None);
    }
}
