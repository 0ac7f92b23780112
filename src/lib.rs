//! gesture-ctrl - Hand gestures to system actions
//!
//! Classifier results are resolved against a binding table, debounced and
//! rate-limited, then executed off the frame loop by a single worker.
//! Runs on macOS and Linux; other platforms log what they would do.

pub mod actions;
pub mod bindings;
pub mod config;
pub mod database;
pub mod debounce;
pub mod dispatch;
pub mod engine;
pub mod gesture;
pub mod platform;
pub mod replay;

/// Set up logging to stdout and `~/.gesture-ctrl/logs/gesture-ctrl.log`
///
/// Honours `RUST_LOG`, defaulting to `info`. If the log file cannot be
/// opened, logs go to stdout only. Calling this more than once is harmless.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let log_dir = config::get_app_dir().join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("gesture-ctrl.log"))
        .ok();

    let installed = if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);
        tracing_subscriber::registry()
            .with(env_filter())
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_timer(LocalTimer)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!("Logging to {}", log_dir.display());
    }
}
