//! Action catalogue
//!
//! An [`ActionSpec`] is the string a gesture is bound to. It is parsed into an
//! [`Action`] only at dispatch time, so an `OPEN_URL:<name>` binding follows
//! whatever URL the preset currently points at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of indirect URL actions (`OPEN_URL:<preset name>`)
pub const OPEN_URL_PREFIX: &str = "OPEN_URL:";

/// Plain URL action: opens the URL store's active preset
pub const OPEN_ACTIVE_URL: &str = "OPEN_URL";

/// Gesture labels the classifier can produce, plus the geometric `Pointing_Down`
pub const GESTURE_LABELS: &[&str] = &[
    "Thumb_Up",
    "Thumb_Down",
    "Open_Palm",
    "Pointing_Up",
    "Pointing_Down",
    "Closed_Fist",
    "Victory",
    "ILoveYou",
];

/// The action string a gesture is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSpec(String);

impl ActionSpec {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    /// Spec for an indirect URL action
    pub fn open_url(preset: &str) -> Self {
        Self(format!("{}{}", OPEN_URL_PREFIX, preset))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into the action variant this spec names
    pub fn parse(&self) -> Action {
        Action::parse(&self.0)
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionSpec {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActionSpec {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Direct platform actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformAction {
    VolumeUp,
    VolumeDown,
    MuteToggle,
    OpenCalculator,
    OpenClock,
    OpenNotes,
    OpenCalendar,
    OpenReminders,
    OpenSafari,
    OpenMail,
    OpenMaps,
    OpenPhotos,
    OpenMusic,
    OpenLaunchpad,
    StartScreensaver,
    DisplaySleep,
    WifiOn,
    WifiOff,
    BluetoothOn,
    BluetoothOff,
    DarkModeToggle,
}

/// Name, action and notice label for every platform action
const PLATFORM_ACTIONS: &[(&str, PlatformAction, &str)] = &[
    ("VOL_UP", PlatformAction::VolumeUp, "🔊 Volume +"),
    ("VOL_DOWN", PlatformAction::VolumeDown, "🔉 Volume −"),
    ("MUTE_TOGGLE", PlatformAction::MuteToggle, "🔇 Mute"),
    ("OPEN_CALCULATOR", PlatformAction::OpenCalculator, "🧮 Calculator"),
    ("OPEN_CLOCK", PlatformAction::OpenClock, "⏰ Clock"),
    ("OPEN_NOTES", PlatformAction::OpenNotes, "📝 Notes"),
    ("OPEN_CALENDAR", PlatformAction::OpenCalendar, "📅 Calendar"),
    ("OPEN_REMINDERS", PlatformAction::OpenReminders, "✅ Reminders"),
    ("OPEN_SAFARI", PlatformAction::OpenSafari, "🧭 Safari"),
    ("OPEN_MAIL", PlatformAction::OpenMail, "✉️ Mail"),
    ("OPEN_MAPS", PlatformAction::OpenMaps, "🗺 Maps"),
    ("OPEN_PHOTOS", PlatformAction::OpenPhotos, "🖼 Photos"),
    ("OPEN_MUSIC", PlatformAction::OpenMusic, "🎵 Music"),
    ("OPEN_LAUNCHPAD", PlatformAction::OpenLaunchpad, "🟦 Launchpad"),
    ("START_SCREENSAVER", PlatformAction::StartScreensaver, "🛡 Screensaver"),
    ("DISPLAY_SLEEP", PlatformAction::DisplaySleep, "🌙 Display sleep"),
    ("WIFI_ON", PlatformAction::WifiOn, "📶 Wi-Fi ON"),
    ("WIFI_OFF", PlatformAction::WifiOff, "📶 Wi-Fi OFF"),
    ("BT_ON", PlatformAction::BluetoothOn, "🅱️ Bluetooth ON"),
    ("BT_OFF", PlatformAction::BluetoothOff, "🅱️ Bluetooth OFF"),
    ("DARKMODE_TOGGLE", PlatformAction::DarkModeToggle, "🌗 Dark Mode"),
];

impl PlatformAction {
    /// Look up an action by its binding name (e.g. "VOL_UP")
    pub fn from_name(name: &str) -> Option<Self> {
        PLATFORM_ACTIONS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, action, _)| *action)
    }

    fn entry(&self) -> &'static (&'static str, PlatformAction, &'static str) {
        PLATFORM_ACTIONS
            .iter()
            .find(|(_, action, _)| action == self)
            .unwrap_or(&PLATFORM_ACTIONS[0])
    }

    /// The binding name of this action
    pub fn name(&self) -> &'static str {
        self.entry().0
    }

    /// Short user-facing label shown when the action runs
    pub fn notice_label(&self) -> &'static str {
        self.entry().2
    }

    /// Every platform action, in catalogue order
    pub fn all() -> impl Iterator<Item = PlatformAction> {
        PLATFORM_ACTIONS.iter().map(|(_, action, _)| *action)
    }
}

impl fmt::Display for PlatformAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed form of an [`ActionSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A direct platform side effect
    Platform(PlatformAction),
    /// Open the URL stored under a preset name
    OpenUrl { preset: String },
    /// Open the URL store's active preset
    OpenActiveUrl,
    /// Anything else (including the empty string); dispatched as a no-op
    Unrecognized(String),
}

impl Action {
    pub fn parse(spec: &str) -> Self {
        if let Some(action) = PlatformAction::from_name(spec) {
            return Action::Platform(action);
        }
        if let Some(preset) = spec.strip_prefix(OPEN_URL_PREFIX) {
            return Action::OpenUrl {
                preset: preset.trim().to_string(),
            };
        }
        if spec == OPEN_ACTIVE_URL {
            return Action::OpenActiveUrl;
        }
        Action::Unrecognized(spec.to_string())
    }
}

/// Bindable action strings: every platform action followed by one
/// `OPEN_URL:<name>` entry per URL preset
pub fn action_choices<'a>(preset_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    PlatformAction::all()
        .map(|a| a.name().to_string())
        .chain(
            preset_names
                .into_iter()
                .map(|name| ActionSpec::open_url(name).0),
        )
        .collect()
}
