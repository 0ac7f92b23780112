//! Linux action implementations
//!
//! Volume goes through PulseAudio/PipeWire (`pactl`), URLs through
//! `xdg-open`. Actions with no desktop-neutral equivalent are logged as stubs.

use super::{run_command, ActionExecutor, ExecutorError, SystemAction};
use crate::actions::PlatformAction;
use crate::config::PlatformConfig;

const DEFAULT_SINK: &str = "@DEFAULT_SINK@";

/// `pactl` argument for a relative volume change, e.g. `+6%`
pub fn volume_delta_arg(delta: f32) -> String {
    format!("{:+}%", delta.round() as i32)
}

pub struct LinuxActions {
    volume_step: f32,
}

impl LinuxActions {
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            volume_step: config.volume_step,
        }
    }

    fn set_volume(&self, delta: f32) -> Result<(), ExecutorError> {
        let arg = volume_delta_arg(delta);
        run_command("pactl", &["set-sink-volume", DEFAULT_SINK, arg.as_str()])
    }
}

impl ActionExecutor for LinuxActions {
    fn perform(&mut self, action: &SystemAction) -> Result<(), ExecutorError> {
        match action {
            SystemAction::Platform(PlatformAction::VolumeUp) => self.set_volume(self.volume_step),
            SystemAction::Platform(PlatformAction::VolumeDown) => {
                self.set_volume(-self.volume_step)
            }
            SystemAction::Platform(PlatformAction::MuteToggle) => {
                run_command("pactl", &["set-sink-mute", DEFAULT_SINK, "toggle"])
            }
            SystemAction::OpenUrl(url) => run_command("xdg-open", &[url.as_str()]),
            SystemAction::Platform(other) => {
                tracing::info!("[{}] stub (not implemented on Linux)", other);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_delta_arg() {
        assert_eq!(volume_delta_arg(6.25), "+6%");
        assert_eq!(volume_delta_arg(-6.25), "-6%");
        assert_eq!(volume_delta_arg(10.0), "+10%");
    }

    #[test]
    fn test_unimplemented_actions_are_stubs() {
        let mut actions = LinuxActions::new(&PlatformConfig::default());
        assert!(actions
            .perform(&SystemAction::Platform(PlatformAction::OpenLaunchpad))
            .is_ok());
    }
}
