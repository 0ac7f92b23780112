//! Gesture engine
//!
//! Ties the pieces together: frames go from a [`FrameSource`] to an
//! asynchronous [`GestureClassifier`], whose latest result feeds the command
//! resolver and the debounce state machine. Fired actions are handed to the
//! [`ActionDispatcher`] and never executed on the frame loop.
//!
//! The engine owns the camera, the classifier and the dispatcher worker and
//! releases each of them exactly once, in [`GestureEngine::close`] or on drop.

pub mod slot;
pub mod sources;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::actions::ActionSpec;
use crate::bindings::{BindingTable, SharedBindings};
use crate::config::{CameraConfig, Config, ConfigError};
use crate::debounce::{DebounceSnapshot, DebounceStateMachine, FireEvent};
use crate::dispatch::{ActionDispatcher, NoticeBoard, UrlResolver};
use crate::gesture::{display_label, resolve_command};
use crate::platform::ActionExecutor;

pub use slot::{ObservationSink, ObservationSlot};
pub use sources::{FrameSource, GestureClassifier, SourceError};

/// Weight of the previous FPS estimate in the moving average
const FPS_SMOOTHING: f32 = 0.9;

/// Engine construction errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Gesture model not found at {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to create gesture classifier: {0}")]
    Classifier(#[source] SourceError),

    #[error("Failed to open camera {index}: {source}")]
    Camera {
        index: u32,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Runtime switches shared with whatever drives the UI
///
/// Clones share state; every method is safe to call from any thread while
/// the engine is running.
#[derive(Debug, Clone)]
pub struct EngineControls {
    active: Arc<AtomicBool>,
    bindings: SharedBindings,
}

impl EngineControls {
    pub fn new(bindings: BindingTable, active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
            bindings: SharedBindings::new(bindings),
        }
    }

    /// Enable or disable gesture control. Classification keeps running while
    /// disabled; only the decision step is skipped.
    pub fn set_active(&self, active: bool) {
        let was = self.active.swap(active, Ordering::SeqCst);
        if was != active {
            tracing::info!(
                "Gesture control {}",
                if active { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Replace the whole binding table. Takes effect from the next tick.
    pub fn set_bindings(&self, table: BindingTable) {
        self.bindings.replace(table);
    }

    pub fn bind(&self, label: &str, action: ActionSpec) {
        let label = label.to_string();
        self.bindings.update(move |table| {
            table.bind(label, action);
        });
    }

    pub fn unbind(&self, label: &str) {
        self.bindings.update(|table| {
            table.unbind(label);
        });
    }

    /// Current binding snapshot
    pub fn bindings(&self) -> Arc<BindingTable> {
        self.bindings.snapshot()
    }
}

/// What one frame step produced, for a presentation layer
#[derive(Debug)]
pub struct FrameReport<F> {
    pub frame: F,
    /// Smoothed frames per second
    pub fps: f32,
    /// Top detection, e.g. "Thumb_Up 0.93"
    pub label: Option<String>,
    /// Current notice text, if one is showing
    pub notice: Option<String>,
    /// Action fired on this frame, if any
    pub fired: Option<ActionSpec>,
}

/// Serialisable engine snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub active: bool,
    pub debounce: DebounceSnapshot,
    pub label: Option<String>,
    pub fps: f32,
    pub pending_actions: usize,
    pub bindings: usize,
    pub notice: Option<String>,
}

/// The running gesture engine
pub struct GestureEngine<S, C>
where
    S: FrameSource,
    C: GestureClassifier<S::Frame>,
{
    source: Option<S>,
    classifier: Option<C>,
    dispatcher: Option<ActionDispatcher>,
    slot: ObservationSlot,
    debounce: DebounceStateMachine,
    controls: EngineControls,
    notices: NoticeBoard,
    min_score: f32,
    shutdown_grace: Duration,
    started_at: Instant,
    last_frame_at: Instant,
    last_timestamp_ms: Option<u64>,
    fps: f32,
    last_label: Option<String>,
}

impl<S, C> GestureEngine<S, C>
where
    S: FrameSource,
    C: GestureClassifier<S::Frame>,
{
    /// Build an engine from its collaborators
    ///
    /// Order matters: the model file is checked first, then the classifier
    /// is created, then the camera is opened. If the camera fails the
    /// classifier is closed before the error is returned.
    pub fn open<FC, FS, E>(
        config: &Config,
        open_classifier: FC,
        open_camera: FS,
        executor: E,
        urls: Arc<dyn UrlResolver>,
    ) -> Result<Self, EngineError>
    where
        FC: FnOnce(&Path, ObservationSink) -> Result<C, SourceError>,
        FS: FnOnce(&CameraConfig) -> Result<S, SourceError>,
        E: ActionExecutor + 'static,
    {
        config.validate()?;

        let model_path = config.model_path();
        if !model_path.exists() {
            tracing::error!("Gesture model not found at {}", model_path.display());
            return Err(EngineError::ModelNotFound(model_path));
        }

        let slot = ObservationSlot::new();
        let mut classifier =
            open_classifier(&model_path, slot.sink()).map_err(EngineError::Classifier)?;
        tracing::info!("Gesture classifier loaded from {}", model_path.display());

        let source = match open_camera(&config.camera) {
            Ok(source) => source,
            Err(source) => {
                tracing::error!("Failed to open camera {}: {}", config.camera.index, source);
                classifier.close();
                return Err(EngineError::Camera {
                    index: config.camera.index,
                    source,
                });
            }
        };
        tracing::info!(
            "Camera {} opened ({}x{})",
            config.camera.index,
            config.camera.width,
            config.camera.height
        );

        let notices = NoticeBoard::new();
        let dispatcher = ActionDispatcher::start(
            executor,
            urls,
            notices.clone(),
            config.notice_durations(),
        );

        let controls = EngineControls::new(config.binding_table(), config.engine.start_active);
        let now = Instant::now();

        tracing::info!(
            "Gesture engine ready ({} bindings, min_score {}, stable_frames {}, cooldown {}ms)",
            controls.bindings().len(),
            config.engine.min_score,
            config.engine.stable_frames,
            config.engine.cooldown_ms
        );

        Ok(Self {
            source: Some(source),
            classifier: Some(classifier),
            dispatcher: Some(dispatcher),
            slot,
            debounce: DebounceStateMachine::new(config.debounce_config()),
            controls,
            notices,
            min_score: config.engine.min_score,
            shutdown_grace: config.shutdown_grace(),
            started_at: now,
            last_frame_at: now,
            last_timestamp_ms: None,
            fps: 0.0,
            last_label: None,
        })
    }

    pub fn controls(&self) -> EngineControls {
        self.controls.clone()
    }

    pub fn notices(&self) -> NoticeBoard {
        self.notices.clone()
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Process the next frame
    pub fn step(&mut self) -> Option<FrameReport<S::Frame>> {
        self.step_at(Instant::now())
    }

    /// Process the next frame as if it arrived at `now`
    ///
    /// Returns `None` when the source has no frame (or the engine is closed).
    pub fn step_at(&mut self, now: Instant) -> Option<FrameReport<S::Frame>> {
        let frame = self.source.as_mut()?.read_frame()?;

        self.update_fps(now);
        let timestamp_ms = self.next_timestamp(now);
        if let Some(classifier) = self.classifier.as_mut() {
            classifier.submit(&frame, timestamp_ms);
        }

        let fired = if self.controls.is_active() {
            self.decide_at(now).map(|event| event.action)
        } else {
            None
        };

        let observation = self.slot.latest();
        self.last_label = display_label(observation.as_deref(), self.min_score);

        Some(FrameReport {
            frame,
            fps: self.fps,
            label: self.last_label.clone(),
            notice: self.notices.current(now).map(|notice| notice.message),
            fired,
        })
    }

    /// One decision tick on the latest observation
    ///
    /// Resolves a candidate against the current binding snapshot, advances
    /// the debounce state machine and queues the action if it fires.
    pub fn decide_at(&mut self, now: Instant) -> Option<FireEvent> {
        let bindings = self.controls.bindings();
        let observation = self.slot.latest();
        let candidate = resolve_command(observation.as_deref(), &bindings, self.min_score);

        let event = self.debounce.tick(candidate.as_ref(), now)?;
        tracing::debug!("Queueing {}", event.action);

        match self.dispatcher.as_ref() {
            Some(dispatcher) => {
                dispatcher.dispatch(event.clone());
            }
            None => tracing::warn!("Engine closed, dropping {}", event.action),
        }
        Some(event)
    }

    pub fn status(&self) -> EngineStatus {
        let now = Instant::now();
        EngineStatus {
            active: self.controls.is_active(),
            debounce: self.debounce.snapshot(now),
            label: self.last_label.clone(),
            fps: self.fps,
            pending_actions: self.dispatcher.as_ref().map_or(0, |d| d.pending()),
            bindings: self.controls.bindings().len(),
            notice: self.notices.current(now).map(|notice| notice.message),
        }
    }

    /// Stop the engine and release every resource
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn close(&mut self) {
        if self.source.is_none() && self.classifier.is_none() && self.dispatcher.is_none() {
            return;
        }
        tracing::info!("Closing gesture engine");
        self.controls.set_active(false);

        if let Some(mut classifier) = self.classifier.take() {
            classifier.close();
        }
        if let Some(mut source) = self.source.take() {
            source.release();
        }
        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.shutdown(self.shutdown_grace).is_none() {
                tracing::warn!("Some queued actions were abandoned on shutdown");
            }
        }
        self.slot.clear();
        tracing::info!("Gesture engine closed");
    }

    fn update_fps(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_frame_at).as_secs_f32();
        if dt > 0.0 {
            self.fps = FPS_SMOOTHING * self.fps + (1.0 - FPS_SMOOTHING) * (1.0 / dt);
        }
        self.last_frame_at = now;
    }

    /// Milliseconds since start, strictly increasing across calls
    fn next_timestamp(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_millis() as u64;
        let timestamp = match self.last_timestamp_ms {
            Some(last) if elapsed <= last => last + 1,
            _ => elapsed,
        };
        self.last_timestamp_ms = Some(timestamp);
        timestamp
    }
}

impl<S, C> Drop for GestureEngine<S, C>
where
    S: FrameSource,
    C: GestureClassifier<S::Frame>,
{
    fn drop(&mut self) {
        self.close();
    }
}
