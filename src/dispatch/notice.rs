//! Short-lived status notices
//!
//! Every dispatched action posts a notice (e.g. "🔊 Volume +") with an expiry.
//! A presentation layer polls [`NoticeBoard::current`] each frame; the core
//! never renders anything itself.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long each kind of notice stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeDurations {
    /// Action ran (or was attempted)
    pub action: Duration,
    /// Unrecognised action string
    pub noop: Duration,
    /// URL preset missing
    pub not_found: Duration,
}

impl Default for NoticeDurations {
    fn default() -> Self {
        Self {
            action: Duration::from_millis(700),
            noop: Duration::from_millis(400),
            not_found: Duration::from_millis(1200),
        }
    }
}

/// A user-visible status message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub message: String,
    /// Wall-clock time the notice was posted
    pub posted_at: DateTime<Local>,
    #[serde(skip)]
    pub expires_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Holds the most recent notice. Cloning shares the board.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    latest: Arc<Mutex<Option<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current notice
    pub fn post(&self, message: impl Into<String>, duration: Duration) {
        let message = message.into();
        tracing::debug!("Notice: {} ({}ms)", message, duration.as_millis());
        *self.latest.lock() = Some(Notice {
            message,
            posted_at: Local::now(),
            expires_at: Instant::now() + duration,
        });
    }

    /// The latest notice, if it has not expired yet
    pub fn current(&self, now: Instant) -> Option<Notice> {
        self.latest
            .lock()
            .as_ref()
            .filter(|notice| !notice.is_expired(now))
            .cloned()
    }

    /// The latest notice regardless of expiry
    pub fn last(&self) -> Option<Notice> {
        self.latest.lock().clone()
    }

    pub fn clear(&self) {
        *self.latest.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let board = NoticeBoard::new();
        assert!(board.current(Instant::now()).is_none());
        assert!(board.last().is_none());
    }

    #[test]
    fn test_notice_visible_until_expiry() {
        let board = NoticeBoard::new();
        board.post("🔊 Volume +", Duration::from_millis(700));

        let now = Instant::now();
        assert_eq!(board.current(now).unwrap().message, "🔊 Volume +");
        assert!(board.current(now + Duration::from_secs(1)).is_none());
        // Still retrievable for history
        assert!(board.last().is_some());
    }

    #[test]
    fn test_newer_notice_replaces_older() {
        let board = NoticeBoard::new();
        board.post("first", Duration::from_secs(5));
        board.post("second", Duration::from_secs(5));
        assert_eq!(board.current(Instant::now()).unwrap().message, "second");
    }

    #[test]
    fn test_clones_share_board() {
        let board = NoticeBoard::new();
        let reader = board.clone();
        board.post("shared", Duration::from_secs(1));
        assert!(reader.current(Instant::now()).is_some());
        reader.clear();
        assert!(board.last().is_none());
    }

    #[test]
    fn test_default_durations() {
        let durations = NoticeDurations::default();
        assert_eq!(durations.action, Duration::from_millis(700));
        assert_eq!(durations.noop, Duration::from_millis(400));
        assert_eq!(durations.not_found, Duration::from_millis(1200));
    }
}
