//! Platform action execution
//!
//! The dispatcher hands a concrete [`SystemAction`] to an [`ActionExecutor`].
//! Executors are synchronous; the dispatcher's worker thread is what keeps
//! them off the frame loop.

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub mod linux;

use std::fmt;
use std::process::{Command, ExitStatus, Stdio};

use crate::actions::PlatformAction;
use crate::config::PlatformConfig;

/// A fully resolved side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemAction {
    Platform(PlatformAction),
    OpenUrl(String),
}

impl fmt::Display for SystemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemAction::Platform(action) => write!(f, "{}", action),
            SystemAction::OpenUrl(url) => write!(f, "OPEN_URL({})", url),
        }
    }
}

/// Errors from running a platform action
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("{0}")]
    Other(String),
}

/// Performs platform side effects
pub trait ActionExecutor: Send {
    fn perform(&mut self, action: &SystemAction) -> Result<(), ExecutorError>;
}

impl<T: ActionExecutor + ?Sized> ActionExecutor for Box<T> {
    fn perform(&mut self, action: &SystemAction) -> Result<(), ExecutorError> {
        (**self).perform(action)
    }
}

/// Run a command to completion with its output discarded
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<(), ExecutorError> {
    let status = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| ExecutorError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ExecutorError::Failed {
            program: program.to_string(),
            status,
        })
    }
}

/// Executor that only logs what it would do
///
/// Used on platforms without an implementation and for dry runs.
#[derive(Debug, Default)]
pub struct LoggingExecutor;

impl ActionExecutor for LoggingExecutor {
    fn perform(&mut self, action: &SystemAction) -> Result<(), ExecutorError> {
        tracing::info!("[{}] stub", action);
        Ok(())
    }
}

/// The executor for the current platform
pub struct SystemController {
    inner: Box<dyn ActionExecutor>,
}

impl SystemController {
    /// Picks the native implementation for this OS, falling back to logging
    pub fn new(config: &PlatformConfig) -> Self {
        #[cfg(target_os = "macos")]
        let inner: Box<dyn ActionExecutor> = Box::new(macos::MacActions::new(config));

        #[cfg(target_os = "linux")]
        let inner: Box<dyn ActionExecutor> = Box::new(linux::LinuxActions::new(config));

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        let inner: Box<dyn ActionExecutor> = {
            let _ = config;
            Box::new(LoggingExecutor)
        };

        Self { inner }
    }

    /// A controller that never touches the system
    pub fn dry_run() -> Self {
        Self {
            inner: Box::new(LoggingExecutor),
        }
    }
}

impl ActionExecutor for SystemController {
    fn perform(&mut self, action: &SystemAction) -> Result<(), ExecutorError> {
        self.inner.perform(action)
    }
}
