//! Configuration management for gesture-ctrl
//!
//! Provides persistent settings storage with schema versioning and migrations.
//! Configuration is stored in `~/.gesture-ctrl/config.json`. Missing sections
//! and fields fall back to their defaults, so a partial file is always valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bindings::BindingTable;
use crate::debounce::DebounceConfig;
use crate::dispatch::NoticeDurations;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Name of the per-user data directory under `$HOME`
const APP_DIR: &str = ".gesture-ctrl";

/// Errors from loading, saving or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown config version: {0}")]
    UnknownVersion(u32),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Decision loop settings
    pub engine: EngineConfig,
    /// Gesture label → action string
    pub bindings: BTreeMap<String, String>,
    /// Camera settings
    pub camera: CameraConfig,
    /// Gesture model settings
    pub model: ModelConfig,
    /// Notice lifetimes
    pub notices: NoticeConfig,
    /// Action queue settings
    pub dispatch: DispatchConfig,
    /// Platform action tuning
    pub platform: PlatformConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            engine: EngineConfig::default(),
            bindings: BindingTable::default().to_map(),
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
            notices: NoticeConfig::default(),
            dispatch: DispatchConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl Config {
    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.engine.min_score) {
            return Err(ConfigError::Invalid(format!(
                "engine.min_score must be within [0, 1], got {}",
                self.engine.min_score
            )));
        }
        if self.engine.stable_frames == 0 {
            return Err(ConfigError::Invalid(
                "engine.stable_frames must be at least 1".to_string(),
            ));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "camera resolution {}x{} is not usable",
                self.camera.width, self.camera.height
            )));
        }
        Ok(())
    }

    /// Initial binding table
    pub fn binding_table(&self) -> BindingTable {
        BindingTable::from(&self.bindings)
    }

    pub fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig {
            stable_frames: self.engine.stable_frames,
            cooldown: Duration::from_millis(self.engine.cooldown_ms),
        }
    }

    pub fn notice_durations(&self) -> NoticeDurations {
        NoticeDurations {
            action: Duration::from_millis(self.notices.action_ms),
            noop: Duration::from_millis(self.notices.noop_ms),
            not_found: Duration::from_millis(self.notices.not_found_ms),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.dispatch.shutdown_grace_ms)
    }

    /// Model path, or the default location in the data directory
    pub fn model_path(&self) -> PathBuf {
        self.model.path.clone().unwrap_or_else(default_model_path)
    }
}

/// Decision loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum classifier confidence for a detection to count
    pub min_score: f32,
    /// Consecutive frames required before firing (and to re-arm)
    pub stable_frames: u32,
    /// Minimum time between two fires in milliseconds
    pub cooldown_ms: u64,
    /// Whether gesture control starts enabled
    pub start_active: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_score: 0.60,
            stable_frames: 3,
            cooldown_ms: 500,
            start_active: false,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
        }
    }
}

/// Gesture model configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model file (None for `~/.gesture-ctrl/models/gesture_recognizer.task`)
    pub path: Option<PathBuf>,
}

/// Notice lifetimes in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub action_ms: u64,
    pub noop_ms: u64,
    pub not_found_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            action_ms: 700,
            noop_ms: 400,
            not_found_ms: 1200,
        }
    }
}

/// Action queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How long shutdown waits for queued actions before abandoning them
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 2000,
        }
    }
}

/// Platform action tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Volume change per VOL_UP/VOL_DOWN, in percent
    pub volume_step: f32,
    /// macOS network service toggled by WIFI_ON/WIFI_OFF
    pub wifi_service: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            volume_step: 6.25,
            wifi_service: "Wi-Fi".to_string(),
        }
    }
}

/// Get the path to the data directory (~/.gesture-ctrl)
pub fn get_app_dir() -> PathBuf {
    home_dir_or_fallback().join(APP_DIR)
}

/// Get the path to the config file (~/.gesture-ctrl/config.json)
pub fn get_config_path() -> PathBuf {
    get_app_dir().join("config.json")
}

/// Default gesture model location
pub fn default_model_path() -> PathBuf {
    get_app_dir().join("models").join("gesture_recognizer.task")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Load configuration from the default path
pub fn load() -> Result<Config, ConfigError> {
    load_from(&get_config_path())
}

/// Save configuration to the default path
pub fn save(config: &Config) -> Result<(), ConfigError> {
    save_to(config, &get_config_path())
}

/// Load configuration from a file
///
/// A missing file yields the defaults. Older schema versions are migrated and
/// written back.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = serde_json::from_str(&contents)?;

    let original_version = config.version;
    let migrated = migrate_config(config)?;
    if migrated.version != original_version {
        save_to(&migrated, path)?;
    }

    migrated.validate()?;
    tracing::info!(
        "Config loaded from {} ({} bindings, min_score {})",
        path.display(),
        migrated.bindings.len(),
        migrated.engine.min_score
    );
    Ok(migrated)
}

/// Save configuration to a file as pretty JSON
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }

    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Config saved to {}", path.display());
    Ok(())
}

/// Migrate configuration from older schema versions
pub fn migrate_config(mut config: Config) -> Result<Config, ConfigError> {
    let original_version = config.version;

    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version > CURRENT_VERSION {
        return Err(ConfigError::UnknownVersion(config.version));
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, ConfigError> {
    match config.version {
        // Version 0 had no bindings section; an empty map means "use defaults"
        0 => {
            let mut migrated = config;
            if migrated.bindings.is_empty() {
                migrated.bindings = BindingTable::default().to_map();
            }
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(ConfigError::UnknownVersion(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_current_version() {
        let config = Config::default();
        assert_eq!(config.version, CURRENT_VERSION);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_config_defaults() {
        let engine = EngineConfig::default();
        assert!((engine.min_score - 0.60).abs() < f32::EPSILON);
        assert_eq!(engine.stable_frames, 3);
        assert_eq!(engine.cooldown_ms, 500);
        assert!(!engine.start_active);
    }

    #[test]
    fn test_default_bindings() {
        let config = Config::default();
        assert_eq!(config.bindings.get("Thumb_Up").map(String::as_str), Some("VOL_UP"));
        assert_eq!(
            config.bindings.get("ILoveYou").map(String::as_str),
            Some("OPEN_URL:YouTube")
        );
        assert_eq!(config.binding_table().len(), config.bindings.len());
    }

    #[test]
    fn test_partial_config_deserialisation() {
        // Config should use defaults for missing fields
        let json = r#"{"version": 1, "engine": {"cooldown_ms": 800}}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.engine.cooldown_ms, 800);
        assert_eq!(config.engine.stable_frames, 3); // Default
        assert_eq!(config.camera.width, 640); // Default
        assert_eq!(config.platform.wifi_service, "Wi-Fi"); // Default
    }

    #[test]
    fn test_explicit_bindings_replace_defaults() {
        let json = r#"{"version": 1, "bindings": {"Open_Palm": "MUTE_TOGGLE"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let table = config.binding_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Open_Palm").unwrap().as_str(), "MUTE_TOGGLE");
    }

    #[test]
    fn test_derived_durations() {
        let mut config = Config::default();
        config.engine.cooldown_ms = 250;
        config.notices.noop_ms = 100;

        assert_eq!(config.debounce_config().cooldown, Duration::from_millis(250));
        assert_eq!(config.debounce_config().stable_frames, 3);
        assert_eq!(config.notice_durations().noop, Duration::from_millis(100));
        assert_eq!(config.notice_durations().not_found, Duration::from_millis(1200));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let mut config = Config::default();
        config.engine.min_score = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_stable_frames() {
        let mut config = Config::default();
        config.engine.stable_frames = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_migration_from_version_0() {
        let old_config = Config {
            version: 0,
            bindings: BTreeMap::new(),
            ..Default::default()
        };

        let migrated = migrate_config(old_config).unwrap();
        assert_eq!(migrated.version, CURRENT_VERSION);
        assert!(!migrated.bindings.is_empty());
    }

    #[test]
    fn test_future_version_is_rejected() {
        let config = Config {
            version: CURRENT_VERSION + 1,
            ..Default::default()
        };
        assert!(matches!(
            migrate_config(config),
            Err(ConfigError::UnknownVersion(_))
        ));
    }

    #[test]
    fn test_model_path_default() {
        let config = Config::default();
        let path = config.model_path();
        assert!(path.to_string_lossy().contains(".gesture-ctrl"));
        assert!(path.ends_with("models/gesture_recognizer.task"));
    }

    #[test]
    fn test_config_path_format() {
        let path = get_config_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains(".gesture-ctrl"));
        assert!(path_str.ends_with("config.json"));
    }
}
