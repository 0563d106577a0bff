//! Configuration management for notify-dispatch-rs.
//!
//! Loads reloadable notification settings from YAML files in standard
//! locations. The manager re-reads the file at the top of every dispatch
//! call, so external edits take effect without a restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::request::{Level, VoiceOptions};

/// Daily wall-clock window during which visible/audible channels stay
/// silent. `start > end` wraps past midnight (e.g. 22:00-07:00).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuietHours {
    pub start: String,
    pub end: String,
}

impl QuietHours {
    /// A window that never matches.
    pub fn disabled() -> Self {
        Self {
            start: String::new(),
            end: String::new(),
        }
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start: "22:00".into(),
            end: "07:00".into(),
        }
    }
}

/// Per-level on/off switches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelToggles {
    pub info: bool,
    pub warning: bool,
    pub error: bool,
    pub reminder: bool,
}

impl LevelToggles {
    pub fn enabled(&self, level: Level) -> bool {
        match level {
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Error => self.error,
            Level::Reminder => self.reminder,
        }
    }
}

impl Default for LevelToggles {
    fn default() -> Self {
        Self {
            info: true,
            warning: true,
            error: true,
            reminder: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Desktop toast channel on/off.
    pub desktop: bool,
    /// Global voice channel on/off. Per-request `voice: true` still speaks.
    pub voice: bool,
    /// Serialize speech through the queue worker. When off, each request
    /// speaks on its own thread with no ordering guarantee.
    pub voice_queue: bool,
    pub quiet_hours: QuietHours,
    pub levels: LevelToggles,
    /// Sound pack name; resolves to `<pack_dir>/<pack>/<level>.wav`.
    pub sound_pack: Option<String>,
    pub pack_dir: PathBuf,
    /// Flat per-level asset map, used when no pack asset exists.
    pub sounds: HashMap<Level, PathBuf>,
    /// Defaults merged under caller-supplied voice options.
    pub voice_options: Option<VoiceOptions>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            voice: false,
            voice_queue: true,
            quiet_hours: QuietHours::default(),
            levels: LevelToggles::default(),
            sound_pack: None,
            pack_dir: PathBuf::from("assets/sounds/packs"),
            sounds: HashMap::new(),
            voice_options: None,
        }
    }
}

impl NotifyConfig {
    /// Search standard locations for notifications.yaml.
    ///
    /// 1. ./notifications.yaml
    /// 2. ~/.config/notify-dispatch/notifications.yaml
    /// 3. /etc/notify-dispatch/notifications.yaml
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir()
                    .ok()
                    .map(|d| d.join("notifications.yaml")),
                dirs::home_dir().map(|h| h.join(".config/notify-dispatch/notifications.yaml")),
                Some(PathBuf::from("/etc/notify-dispatch/notifications.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        })
    }

    /// Load configuration from a YAML file, falling back to defaults on any
    /// read or parse failure.
    pub fn load(path: &Path) -> Self {
        match Self::parse_file(path) {
            Ok(config) => {
                info!("Loaded notification config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Re-read the file over this configuration. A missing file resets to
    /// defaults; a malformed one keeps the previous values.
    pub fn reload(&mut self, path: &Path) {
        if !path.exists() {
            debug!("Config file {} gone; reverting to defaults", path.display());
            *self = Self::default();
            return;
        }
        match Self::parse_file(path) {
            Ok(config) => *self = config,
            Err(e) => warn!("{e}; keeping previous config"),
        }
    }

    fn parse_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        serde_yml::from_str(&contents)
            .map_err(|e| format!("Failed to parse {}: {e}", path.display()))
    }
}
