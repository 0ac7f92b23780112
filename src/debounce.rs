//! Debounce / cooldown state machine
//!
//! Consumes one candidate action (or none) per frame and decides whether to
//! fire it. A gesture fires once it has been the resolved candidate for
//! `stable_frames` consecutive frames, the machine is armed, and the cooldown
//! since the previous fire has elapsed.
//!
//! ```text
//!            stable streak + cooldown elapsed
//!   ┌───────┐ ─────────── fire ───────────► ┌────────────┐
//!   │ ARMED │                               │ REFRACTORY │
//!   └───────┘ ◄── stable_frames empty ───── └────────────┘
//!                      frames in a row
//! ```
//!
//! Holding a gesture keeps the machine refractory: the hand has to leave the
//! frame (or stop being classified) for `stable_frames` frames before the same
//! gesture can fire again. The re-arm does not wait for the cooldown.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::actions::ActionSpec;

/// Debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DebounceState {
    /// Ready to fire
    #[default]
    Armed,
    /// Recently fired, withholding until an empty gap re-arms
    Refractory,
}

impl DebounceState {
    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            DebounceState::Armed => "Ready for a gesture",
            DebounceState::Refractory => "Waiting for the hand to be released",
        }
    }
}

/// Tuning for the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceConfig {
    /// Consecutive identical frames required before firing; also the length
    /// of the empty gap that re-arms
    pub stable_frames: u32,
    /// Minimum interval between two fires
    pub cooldown: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            stable_frames: 3,
            cooldown: Duration::from_millis(500),
        }
    }
}

/// A decision to run an action
#[derive(Debug, Clone, PartialEq)]
pub struct FireEvent {
    pub action: ActionSpec,
    pub fired_at: Instant,
}

/// Serialisable view of the machine's memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceSnapshot {
    pub state: DebounceState,
    pub previous_command: Option<String>,
    pub same_command_streak: u32,
    pub no_detection_streak: u32,
    /// Milliseconds since the last fire, if any
    pub since_last_fire_ms: Option<u64>,
}

/// The debounce state machine
pub struct DebounceStateMachine {
    config: DebounceConfig,
    state: DebounceState,
    previous_command: Option<ActionSpec>,
    same_command_streak: u32,
    no_detection_streak: u32,
    last_fire: Option<Instant>,
}

impl DebounceStateMachine {
    /// Creates a new armed state machine
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: DebounceState::Armed,
            previous_command: None,
            same_command_streak: 0,
            no_detection_streak: 0,
            last_fire: None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    pub fn is_armed(&self) -> bool {
        self.state == DebounceState::Armed
    }

    pub fn previous_command(&self) -> Option<&ActionSpec> {
        self.previous_command.as_ref()
    }

    pub fn same_command_streak(&self) -> u32 {
        self.same_command_streak
    }

    pub fn no_detection_streak(&self) -> u32 {
        self.no_detection_streak
    }

    pub fn last_fire(&self) -> Option<Instant> {
        self.last_fire
    }

    /// Advance one frame.
    ///
    /// Returns the fire event when this frame completes a stable streak.
    pub fn tick(&mut self, candidate: Option<&ActionSpec>, now: Instant) -> Option<FireEvent> {
        let Some(command) = candidate else {
            self.no_detection_streak = self.no_detection_streak.saturating_add(1);
            if self.no_detection_streak >= self.config.stable_frames
                && self.state == DebounceState::Refractory
            {
                self.state = DebounceState::Armed;
                tracing::debug!(
                    "Debounce re-armed after {} empty frames",
                    self.no_detection_streak
                );
            }
            self.same_command_streak = 0;
            self.previous_command = None;
            return None;
        };

        self.no_detection_streak = 0;
        if self.previous_command.as_ref() == Some(command) {
            self.same_command_streak = self.same_command_streak.saturating_add(1);
        } else {
            self.same_command_streak = 1;
            self.previous_command = Some(command.clone());
        }

        if self.state != DebounceState::Armed
            || self.same_command_streak < self.config.stable_frames
            || !self.cooldown_elapsed(now)
        {
            return None;
        }

        self.last_fire = Some(now);
        self.state = DebounceState::Refractory;
        tracing::info!(
            "Gesture fired: {} (after {} stable frames)",
            command,
            self.same_command_streak
        );

        Some(FireEvent {
            action: command.clone(),
            fired_at: now,
        })
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.last_fire
            .map_or(true, |last| now.saturating_duration_since(last) >= self.config.cooldown)
    }

    /// Snapshot of the machine's memory for status reporting
    pub fn snapshot(&self, now: Instant) -> DebounceSnapshot {
        DebounceSnapshot {
            state: self.state,
            previous_command: self.previous_command.as_ref().map(|c| c.to_string()),
            same_command_streak: self.same_command_streak,
            no_detection_streak: self.no_detection_streak,
            since_last_fire_ms: self
                .last_fire
                .map(|last| now.saturating_duration_since(last).as_millis() as u64),
        }
    }

    /// Forget all history and return to Armed
    pub fn reset(&mut self) {
        self.state = DebounceState::Armed;
        self.previous_command = None;
        self.same_command_streak = 0;
        self.no_detection_streak = 0;
        self.last_fire = None;
        tracing::info!("Debounce state machine reset to Armed");
    }
}

impl Default for DebounceStateMachine {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(33);

    /// Feeds a sequence of candidates, one frame apart, and returns the frame
    /// indices that fired along with the clock after the last frame.
    fn run(
        sm: &mut DebounceStateMachine,
        start: Instant,
        frames: &[Option<&str>],
    ) -> (Vec<(usize, String)>, Instant) {
        let mut now = start;
        let mut fired = Vec::new();
        for (i, frame) in frames.iter().enumerate() {
            let spec = frame.map(ActionSpec::from);
            if let Some(event) = sm.tick(spec.as_ref(), now) {
                fired.push((i, event.action.to_string()));
            }
            now += FRAME;
        }
        (fired, now)
    }

    #[test]
    fn test_initial_state_is_armed() {
        let sm = DebounceStateMachine::default();
        assert_eq!(sm.state(), DebounceState::Armed);
        assert!(sm.last_fire().is_none());
    }

    #[test]
    fn test_fires_on_third_stable_frame() {
        let mut sm = DebounceStateMachine::default();
        let (fired, _) = run(
            &mut sm,
            Instant::now(),
            &[Some("VOL_UP"), Some("VOL_UP"), Some("VOL_UP")],
        );
        assert_eq!(fired, vec![(2, "VOL_UP".to_string())]);
        assert_eq!(sm.state(), DebounceState::Refractory);
    }

    #[test]
    fn test_held_gesture_fires_once() {
        let mut sm = DebounceStateMachine::default();
        let frames = vec![Some("VOL_UP"); 120];
        let (fired, _) = run(&mut sm, Instant::now(), &frames);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 2);
        assert_eq!(sm.same_command_streak(), 120);
    }

    #[test]
    fn test_single_frame_noise_does_not_fire() {
        let mut sm = DebounceStateMachine::default();
        let (fired, _) = run(
            &mut sm,
            Instant::now(),
            &[
                Some("VOL_UP"),
                Some("VOL_UP"),
                Some("OPEN_MAPS"),
                Some("VOL_UP"),
                Some("VOL_UP"),
                None,
                Some("VOL_UP"),
            ],
        );
        assert!(fired.is_empty());
        assert!(sm.is_armed());
    }

    #[test]
    fn test_command_change_restarts_streak() {
        let mut sm = DebounceStateMachine::default();
        let start = Instant::now();
        sm.tick(Some(&"VOL_UP".into()), start);
        sm.tick(Some(&"VOL_UP".into()), start);
        sm.tick(Some(&"OPEN_MAPS".into()), start);
        assert_eq!(sm.same_command_streak(), 1);
        assert_eq!(sm.previous_command().unwrap().as_str(), "OPEN_MAPS");
    }

    #[test]
    fn test_empty_gap_rearms() {
        let mut sm = DebounceStateMachine::default();
        let start = Instant::now();
        let (fired, now) = run(&mut sm, start, &[Some("VOL_UP"); 3]);
        assert_eq!(fired.len(), 1);

        // Two empty frames are not enough
        let (_, now) = run(&mut sm, now, &[None, None]);
        assert_eq!(sm.state(), DebounceState::Refractory);

        let (_, _) = run(&mut sm, now, &[None]);
        assert_eq!(sm.state(), DebounceState::Armed);
        assert_eq!(sm.same_command_streak(), 0);
        assert!(sm.previous_command().is_none());
    }

    #[test]
    fn test_distinct_gestures_with_short_gap_do_not_both_fire() {
        let mut sm = DebounceStateMachine::default();
        let (fired, _) = run(
            &mut sm,
            Instant::now(),
            &[
                Some("VOL_UP"),
                Some("VOL_UP"),
                Some("VOL_UP"),
                None,
                None,
                Some("OPEN_MAPS"),
                Some("OPEN_MAPS"),
                Some("OPEN_MAPS"),
                Some("OPEN_MAPS"),
            ],
        );
        assert_eq!(fired, vec![(2, "VOL_UP".to_string())]);
    }

    #[test]
    fn test_distinct_gestures_with_rearm_and_cooldown_both_fire() {
        let mut sm = DebounceStateMachine::default();
        let start = Instant::now();
        let (first, now) = run(&mut sm, start, &[Some("VOL_UP"); 3]);
        let (_, now) = run(&mut sm, now, &[None; 3]);

        // Let the cooldown expire before the next gesture
        let later = now + Duration::from_millis(600);
        let (second, _) = run(&mut sm, later, &[Some("OPEN_MAPS"); 3]);

        assert_eq!(first.len(), 1);
        assert_eq!(second, vec![(2, "OPEN_MAPS".to_string())]);
    }

    #[test]
    fn test_cooldown_blocks_fire_until_elapsed() {
        let mut sm = DebounceStateMachine::default();
        let start = Instant::now();
        let (_, now) = run(&mut sm, start, &[Some("VOL_UP"); 3]);
        // Re-armed within 6 frames (~200ms), well inside the 500ms cooldown
        let (_, now) = run(&mut sm, now, &[None; 3]);
        assert!(sm.is_armed());

        let (fired, now) = run(&mut sm, now, &[Some("VOL_UP"); 5]);
        assert!(fired.is_empty(), "cooldown must hold back the second fire");

        // Still armed and the streak keeps growing, so the fire happens as
        // soon as the cooldown has passed
        let (fired, _) = run(&mut sm, now + Duration::from_millis(300), &[Some("VOL_UP")]);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn test_rearm_does_not_wait_for_cooldown() {
        let config = DebounceConfig {
            stable_frames: 3,
            cooldown: Duration::from_secs(60),
        };
        let mut sm = DebounceStateMachine::new(config);
        let start = Instant::now();
        let (_, now) = run(&mut sm, start, &[Some("VOL_UP"); 3]);
        let (_, _) = run(&mut sm, now, &[None; 3]);
        assert_eq!(sm.state(), DebounceState::Armed);
    }

    #[test]
    fn test_custom_stable_frames() {
        let config = DebounceConfig {
            stable_frames: 5,
            cooldown: Duration::ZERO,
        };
        let mut sm = DebounceStateMachine::new(config);
        let (fired, _) = run(&mut sm, Instant::now(), &[Some("MUTE_TOGGLE"); 6]);
        assert_eq!(fired, vec![(4, "MUTE_TOGGLE".to_string())]);
    }

    #[test]
    fn test_snapshot_and_reset() {
        let mut sm = DebounceStateMachine::default();
        let start = Instant::now();
        let (_, now) = run(&mut sm, start, &[Some("VOL_UP"); 4]);

        let snapshot = sm.snapshot(now);
        assert_eq!(snapshot.state, DebounceState::Refractory);
        assert_eq!(snapshot.previous_command.as_deref(), Some("VOL_UP"));
        assert_eq!(snapshot.same_command_streak, 4);
        assert!(snapshot.since_last_fire_ms.is_some());

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"refractory\""));

        sm.reset();
        assert_eq!(sm.state(), DebounceState::Armed);
        assert!(sm.last_fire().is_none());
    }

    #[test]
    fn test_state_descriptions() {
        assert_eq!(DebounceState::Armed.description(), "Ready for a gesture");
        assert_eq!(
            DebounceState::Refractory.description(),
            "Waiting for the hand to be released"
        );
    }
}
