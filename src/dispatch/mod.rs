//! Action dispatcher
//!
//! Fired actions are queued on a channel and executed one at a time, in FIFO
//! order, by a dedicated worker thread. The decision loop only ever pushes to
//! the queue, so a slow platform call delays later actions but never a frame.
//!
//! Indirect `OPEN_URL:<name>` actions are resolved here, at execution time,
//! through a [`UrlResolver`]. Every dispatched action posts a notice to the
//! [`NoticeBoard`], whatever its outcome.

pub mod notice;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::actions::{Action, ActionSpec};
use crate::debounce::FireEvent;
use crate::platform::{ActionExecutor, SystemAction};

pub use notice::{Notice, NoticeBoard, NoticeDurations};

/// Name → URL lookup for indirect actions
pub trait UrlResolver: Send + Sync {
    /// URL stored under a preset name
    fn lookup(&self, name: &str) -> Option<String>;

    /// URL of the currently selected preset, used by plain `OPEN_URL`
    fn active_url(&self) -> Option<String> {
        None
    }
}

impl UrlResolver for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<T: UrlResolver + ?Sized> UrlResolver for Arc<T> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }

    fn active_url(&self) -> Option<String> {
        (**self).active_url()
    }
}

/// What happened to one dispatched action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The platform action ran
    Performed { label: String },
    /// The platform action returned an error
    Failed { label: String, error: String },
    /// `OPEN_URL:<preset>` named a preset that does not exist
    UrlNotFound { preset: String },
    /// Plain `OPEN_URL` with no active preset available
    NoActiveUrl,
    /// The action string is not one we know
    Noop { spec: String },
}

impl DispatchOutcome {
    /// Notice text and lifetime for this outcome
    pub fn notice(&self, durations: &NoticeDurations) -> (String, Duration) {
        match self {
            DispatchOutcome::Performed { label } => (label.clone(), durations.action),
            DispatchOutcome::Failed { label, .. } => {
                (format!("⚠️ {} failed", label), durations.action)
            }
            DispatchOutcome::UrlNotFound { preset } => (
                format!("⚠️ URL preset not found: {}", preset),
                durations.not_found,
            ),
            DispatchOutcome::NoActiveUrl => {
                ("⚠️ No active URL preset".to_string(), durations.not_found)
            }
            DispatchOutcome::Noop { spec } => (format!("(noop) {}", spec), durations.noop),
        }
    }
}

/// Resolve and run a single action spec
pub fn execute_action<E, R>(executor: &mut E, urls: &R, spec: &ActionSpec) -> DispatchOutcome
where
    E: ActionExecutor + ?Sized,
    R: UrlResolver + ?Sized,
{
    let (system_action, label) = match spec.parse() {
        Action::Platform(action) => (
            SystemAction::Platform(action),
            action.notice_label().to_string(),
        ),
        Action::OpenUrl { preset } => match urls.lookup(&preset) {
            Some(url) => (SystemAction::OpenUrl(url), format!("🌐 Open URL: {}", preset)),
            None => {
                tracing::warn!("URL preset not found: {}", preset);
                return DispatchOutcome::UrlNotFound { preset };
            }
        },
        Action::OpenActiveUrl => match urls.active_url() {
            Some(url) => (SystemAction::OpenUrl(url), "🌐 Open URL".to_string()),
            None => {
                tracing::warn!("No active URL preset to open");
                return DispatchOutcome::NoActiveUrl;
            }
        },
        Action::Unrecognized(spec) => {
            tracing::debug!("Ignoring unrecognised action {:?}", spec);
            return DispatchOutcome::Noop { spec };
        }
    };

    match executor.perform(&system_action) {
        Ok(()) => {
            tracing::info!("Performed {}", system_action);
            DispatchOutcome::Performed { label }
        }
        Err(e) => {
            tracing::warn!("Action {} failed: {}", system_action, e);
            DispatchOutcome::Failed {
                label,
                error: e.to_string(),
            }
        }
    }
}

/// Counters reported when the dispatcher shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Platform actions that ran successfully
    pub performed: usize,
    /// Platform actions that failed (or panicked)
    pub failed: usize,
    /// No-ops and unresolved URL presets
    pub skipped: usize,
    /// Queued actions dropped because shutdown ran out of time
    pub abandoned: usize,
}

impl DispatchStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Performed { .. } => self.performed += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
            _ => self.skipped += 1,
        }
    }
}

/// Single-consumer action queue with its worker thread
pub struct ActionDispatcher {
    sender: Option<Sender<FireEvent>>,
    finished: Receiver<DispatchStats>,
    abandon: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
    notices: NoticeBoard,
    worker: Option<JoinHandle<()>>,
}

impl ActionDispatcher {
    /// Start the worker thread
    pub fn start<E>(
        executor: E,
        urls: Arc<dyn UrlResolver>,
        notices: NoticeBoard,
        durations: NoticeDurations,
    ) -> Self
    where
        E: ActionExecutor + 'static,
    {
        let (sender, receiver) = unbounded::<FireEvent>();
        let (finished_tx, finished) = bounded::<DispatchStats>(1);
        let abandon = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = {
            let abandon = Arc::clone(&abandon);
            let pending = Arc::clone(&pending);
            let notices = notices.clone();
            std::thread::Builder::new()
                .name("gesture-actions".to_string())
                .spawn(move || {
                    let stats = run_worker(
                        executor, urls, notices, durations, receiver, abandon, pending,
                    );
                    let _ = finished_tx.send(stats);
                })
        };

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to spawn action worker: {}", e);
                None
            }
        };

        Self {
            sender: Some(sender),
            finished,
            abandon,
            pending,
            notices,
            worker,
        }
    }

    /// Queue a fired action. Returns false if the dispatcher is shut down.
    pub fn dispatch(&self, event: FireEvent) -> bool {
        let Some(sender) = self.sender.as_ref().filter(|_| self.worker.is_some()) else {
            tracing::warn!("Dispatcher is not running, dropping {}", event.action);
            return false;
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        match sender.send(event) {
            Ok(()) => true,
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!("Action queue closed, dropping {}", e.0.action);
                false
            }
        }
    }

    /// Actions queued but not yet picked up by the worker
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Close the queue and let the worker drain it for up to `grace`.
    ///
    /// Anything still queued after that is abandoned and the worker thread is
    /// detached. Returns `None` if the worker did not finish in time.
    pub fn shutdown(mut self, grace: Duration) -> Option<DispatchStats> {
        self.shutdown_inner(grace)
    }

    fn shutdown_inner(&mut self, grace: Duration) -> Option<DispatchStats> {
        // Dropping the sender disconnects the channel once it is drained
        self.sender.take()?;
        let worker = self.worker.take()?;

        match self.finished.recv_timeout(grace) {
            Ok(stats) => {
                let _ = worker.join();
                tracing::info!(
                    "Action dispatcher stopped (performed: {}, failed: {}, skipped: {}, abandoned: {})",
                    stats.performed,
                    stats.failed,
                    stats.skipped,
                    stats.abandoned
                );
                Some(stats)
            }
            Err(_) => {
                self.abandon.store(true, Ordering::SeqCst);
                tracing::warn!(
                    "Action worker still busy after {}ms, abandoning {} queued action(s)",
                    grace.as_millis(),
                    self.pending()
                );
                None
            }
        }
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        self.shutdown_inner(Duration::ZERO);
    }
}

fn run_worker<E: ActionExecutor>(
    mut executor: E,
    urls: Arc<dyn UrlResolver>,
    notices: NoticeBoard,
    durations: NoticeDurations,
    receiver: Receiver<FireEvent>,
    abandon: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
) -> DispatchStats {
    tracing::debug!("Action worker started");
    let mut stats = DispatchStats::default();

    for event in receiver.iter() {
        pending.fetch_sub(1, Ordering::SeqCst);
        if abandon.load(Ordering::SeqCst) {
            stats.abandoned += 1;
            continue;
        }

        let queued_for = event.fired_at.elapsed();
        tracing::debug!(
            "Executing {} (queued for {}ms)",
            event.action,
            queued_for.as_millis()
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            execute_action(&mut executor, urls.as_ref(), &event.action)
        }))
        .unwrap_or_else(|_| {
            tracing::error!("Action {} panicked", event.action);
            DispatchOutcome::Failed {
                label: event.action.to_string(),
                error: "panicked".to_string(),
            }
        });

        stats.record(&outcome);
        let (message, duration) = outcome.notice(&durations);
        notices.post(message, duration);
    }

    tracing::debug!("Action worker exiting");
    stats
}
