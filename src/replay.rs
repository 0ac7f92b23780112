//! Scripted frame replay
//!
//! Drives the engine without a camera or model. A script is a JSON-lines file
//! where each line describes the classifier output for one frame:
//!
//! ```text
//! {"hands": [{"detections": [{"label": "Thumb_Up", "score": 0.93}]}], "repeat": 5}
//! {"gestures": [["Victory", 0.88]], "repeat": 4}
//! null
//! ```
//!
//! `null` or a blank line is a frame with no hands. `repeat` (default 1)
//! duplicates the line. `gestures` is shorthand for one hand per
//! `[label, score]` pair. Lines starting with `#` are comments.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::engine::{FrameSource, GestureClassifier, ObservationSink};
use crate::gesture::FrameObservation;

/// Errors from loading a replay script
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read replay script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid replay script at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ScriptLine {
    #[serde(flatten)]
    observation: FrameObservation,
    #[serde(default)]
    gestures: Vec<(String, f32)>,
    #[serde(default = "default_repeat")]
    repeat: usize,
}

fn default_repeat() -> usize {
    1
}

/// A parsed replay script
#[derive(Debug, Clone, Default)]
pub struct ReplayScript {
    frames: Vec<FrameObservation>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let contents = fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let script = Self::parse(&contents)?;
        tracing::info!(
            "Loaded replay script {} ({} frames)",
            path.display(),
            script.len()
        );
        Ok(script)
    }

    pub fn parse(contents: &str) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.starts_with('#') {
                continue;
            }
            if line.is_empty() || line == "null" {
                frames.push(FrameObservation::empty());
                continue;
            }

            let parsed: ScriptLine =
                serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                    line: index + 1,
                    source,
                })?;

            let mut observation = parsed.observation;
            observation.hands.extend(
                FrameObservation::from_detections(
                    parsed.gestures.iter().map(|(label, score)| (label.as_str(), *score)),
                )
                .hands,
            );

            frames.extend(std::iter::repeat(observation).take(parsed.repeat));
        }

        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[FrameObservation] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Frame source that plays a script back, optionally paced in real time
pub struct ReplaySource {
    frames: std::vec::IntoIter<FrameObservation>,
    interval: Duration,
    next_due: Option<Instant>,
    released: bool,
}

impl ReplaySource {
    /// `interval` of zero plays frames back as fast as they are read
    pub fn new(script: ReplayScript, interval: Duration) -> Self {
        Self {
            frames: script.frames.into_iter(),
            interval,
            next_due: None,
            released: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    type Frame = FrameObservation;

    fn read_frame(&mut self) -> Option<FrameObservation> {
        if self.released {
            return None;
        }
        let frame = self.frames.next()?;

        if !self.interval.is_zero() {
            let now = Instant::now();
            if let Some(due) = self.next_due.filter(|due| *due > now) {
                std::thread::sleep(due - now);
            }
            self.next_due = Some(self.next_due.unwrap_or(now).max(now) + self.interval);
        }

        Some(frame)
    }

    fn release(&mut self) {
        tracing::debug!("Replay source released ({} frames unplayed)", self.remaining());
        self.released = true;
    }
}

/// Classifier that reports each scripted frame as its own result
pub struct ReplayClassifier {
    sink: ObservationSink,
    closed: bool,
}

impl ReplayClassifier {
    pub fn new(sink: ObservationSink) -> Self {
        Self { sink, closed: false }
    }
}

impl GestureClassifier<FrameObservation> for ReplayClassifier {
    fn submit(&mut self, frame: &FrameObservation, timestamp_ms: u64) {
        if self.closed {
            return;
        }
        tracing::trace!("Replaying frame at {}ms", timestamp_ms);
        self.sink.deliver(frame.clone());
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ObservationSlot;

    #[test]
    fn test_parse_repeat_and_empty_frames() {
        let script = ReplayScript::parse(
            r#"{"gestures": [["Thumb_Up", 0.93]], "repeat": 3}
null

{"hands": [{"detections": [{"label": "Victory", "score": 0.8}]}]}"#,
        )
        .unwrap();

        assert_eq!(script.len(), 6);
        assert_eq!(
            script.frames()[2].detections().next().unwrap().label,
            "Thumb_Up"
        );
        assert!(script.frames()[3].is_empty());
        assert!(script.frames()[4].is_empty());
        assert_eq!(
            script.frames()[5].detections().next().unwrap().label,
            "Victory"
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let script = ReplayScript::parse("# warm-up\nnull\n").unwrap();
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = ReplayScript::parse("null\n{not json}").unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_source_stops_after_release() {
        let script = ReplayScript::parse("null\nnull\nnull").unwrap();
        let mut source = ReplaySource::new(script, Duration::ZERO);
        assert!(source.read_frame().is_some());
        source.release();
        assert!(source.read_frame().is_none());
    }

    #[test]
    fn test_classifier_echoes_frames() {
        let slot = ObservationSlot::new();
        let mut classifier = ReplayClassifier::new(slot.sink());
        let frame = FrameObservation::from_detections([("Open_Palm", 0.7)]);

        classifier.submit(&frame, 0);
        assert_eq!(slot.latest().as_deref(), Some(&frame));

        slot.clear();
        classifier.close();
        classifier.submit(&frame, 1);
        assert!(slot.latest().is_none());
    }
}
