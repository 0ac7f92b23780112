//! macOS action implementations
//!
//! Everything goes through system commands (`osascript`, `open`, `pmset`,
//! `networksetup`, `blueutil`); no keystrokes are synthesised.

use std::path::Path;

use super::{run_command, ActionExecutor, ExecutorError, SystemAction};
use crate::actions::PlatformAction;
use crate::config::PlatformConfig;

/// Applications opened by name, with the bundle path tried if `open -a` fails
const APPS: &[(PlatformAction, &str, Option<&str>)] = &[
    (PlatformAction::OpenCalculator, "Calculator", Some("/System/Applications/Calculator.app")),
    (PlatformAction::OpenClock, "Clock", Some("/System/Applications/Clock.app")),
    (PlatformAction::OpenNotes, "Notes", Some("/System/Applications/Notes.app")),
    (PlatformAction::OpenCalendar, "Calendar", Some("/System/Applications/Calendar.app")),
    (PlatformAction::OpenReminders, "Reminders", Some("/System/Applications/Reminders.app")),
    (PlatformAction::OpenSafari, "Safari", Some("/System/Applications/Safari.app")),
    (PlatformAction::OpenMail, "Mail", Some("/System/Applications/Mail.app")),
    (PlatformAction::OpenMaps, "Maps", Some("/System/Applications/Maps.app")),
    (PlatformAction::OpenPhotos, "Photos", Some("/System/Applications/Photos.app")),
    (PlatformAction::OpenMusic, "Music", Some("/System/Applications/Music.app")),
    (PlatformAction::OpenLaunchpad, "Launchpad", None),
    (PlatformAction::StartScreensaver, "ScreenSaverEngine", None),
];

const MUTE_TOGGLE_SCRIPT: &str = r#"
set omuted to output muted of (get volume settings)
if omuted then
    set volume without output muted
else
    set volume with output muted
end if"#;

const DARK_MODE_TOGGLE_SCRIPT: &str = r#"
tell application "System Events"
    tell appearance preferences
        set dark mode to not dark mode
    end tell
end tell"#;

/// AppleScript that moves output volume by `delta` percent, clamped to 0..=100
pub fn volume_step_script(delta: f32) -> String {
    format!(
        r#"
set ovol to output volume of (get volume settings)
set nvol to ovol + ({delta})
if nvol > 100 then set nvol to 100
if nvol < 0 then set nvol to 0
set volume output volume nvol"#
    )
}

pub struct MacActions {
    volume_step: f32,
    wifi_service: String,
}

impl MacActions {
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            volume_step: config.volume_step,
            wifi_service: config.wifi_service.clone(),
        }
    }

    fn osascript(script: &str) -> Result<(), ExecutorError> {
        run_command("osascript", &["-e", script])
    }

    fn open_app(name: &str, fallback: Option<&str>) -> Result<(), ExecutorError> {
        match run_command("open", &["-a", name]) {
            Ok(()) => Ok(()),
            Err(e) => match fallback.filter(|p| Path::new(p).exists()) {
                Some(path) => {
                    tracing::debug!("open -a {} failed ({}), trying {}", name, e, path);
                    run_command("open", &[path])
                }
                None => Err(e),
            },
        }
    }

    fn perform_platform(&self, action: PlatformAction) -> Result<(), ExecutorError> {
        if let Some((_, name, fallback)) = APPS.iter().find(|(a, _, _)| *a == action) {
            return Self::open_app(name, *fallback);
        }

        match action {
            PlatformAction::VolumeUp => Self::osascript(&volume_step_script(self.volume_step)),
            PlatformAction::VolumeDown => Self::osascript(&volume_step_script(-self.volume_step)),
            PlatformAction::MuteToggle => Self::osascript(MUTE_TOGGLE_SCRIPT),
            PlatformAction::DarkModeToggle => Self::osascript(DARK_MODE_TOGGLE_SCRIPT),
            PlatformAction::DisplaySleep => run_command("pmset", &["displaysleepnow"]),
            PlatformAction::WifiOn => run_command(
                "networksetup",
                &["-setairportpower", self.wifi_service.as_str(), "on"],
            ),
            PlatformAction::WifiOff => run_command(
                "networksetup",
                &["-setairportpower", self.wifi_service.as_str(), "off"],
            ),
            // Requires `brew install blueutil`
            PlatformAction::BluetoothOn => run_command("blueutil", &["--power", "1"]),
            PlatformAction::BluetoothOff => run_command("blueutil", &["--power", "0"]),
            other => Err(ExecutorError::Other(format!(
                "No macOS implementation for {}",
                other
            ))),
        }
    }
}

impl ActionExecutor for MacActions {
    fn perform(&mut self, action: &SystemAction) -> Result<(), ExecutorError> {
        match action {
            SystemAction::Platform(platform) => self.perform_platform(*platform),
            SystemAction::OpenUrl(url) => run_command("open", &[url.as_str()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_script_contains_delta() {
        let script = volume_step_script(-6.25);
        assert!(script.contains("ovol + (-6.25)"));
        assert!(script.contains("set volume output volume nvol"));
    }

    #[test]
    fn test_every_app_action_is_in_catalogue() {
        for (action, name, _) in APPS {
            assert!(PlatformAction::from_name(action.name()).is_some());
            assert!(!name.is_empty());
        }
    }
}
