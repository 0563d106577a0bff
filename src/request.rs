//! Caller-facing notification request types.
//!
//! Requests deserialize from the same JSON payload shape external callers
//! already send: title, message, level, voice (bool or options map),
//! actions, and per-call override flags.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

/// Handler invoked when a follow-up action is executed.
pub type ActionHandler = Arc<dyn Fn() + Send + Sync>;

/// Severity/category tag, used for per-level enablement and to pick the
/// sound-pack asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Info,
    Warning,
    Error,
    Reminder,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Reminder => "reminder",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "reminder" => Ok(Self::Reminder),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Per-utterance speech options. Unset fields fall through to the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VoiceOptions {
    pub rate: Option<u32>,
    pub volume: Option<f32>,
    pub lang: Option<String>,
    pub prefer_online: Option<bool>,
}

impl VoiceOptions {
    /// Shallow merge: fields set here win over the defaults. The defaults
    /// are left untouched.
    pub fn merged_over(&self, defaults: &VoiceOptions) -> VoiceOptions {
        VoiceOptions {
            rate: self.rate.or(defaults.rate),
            volume: self.volume.or(defaults.volume),
            lang: self.lang.clone().or_else(|| defaults.lang.clone()),
            prefer_online: self.prefer_online.or(defaults.prefer_online),
        }
    }
}

/// What the caller asked for voice-wise: a plain on/off flag or a full
/// options map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VoiceRequest {
    Flag(bool),
    Options(VoiceOptions),
}

impl Default for VoiceRequest {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl VoiceRequest {
    /// Resolve the request against the configured defaults.
    ///
    /// `false`/absent yields no options (no speech). `true` yields the
    /// defaults verbatim, so without configured defaults there is nothing
    /// to speak with. An options map is merged over the defaults.
    pub fn normalize(&self, defaults: Option<&VoiceOptions>) -> Option<VoiceOptions> {
        match self {
            Self::Flag(false) => None,
            Self::Flag(true) => defaults.cloned(),
            Self::Options(options) => {
                let base = defaults.cloned().unwrap_or_default();
                Some(options.merged_over(&base))
            }
        }
    }
}

/// Either a handler supplied directly by an in-process caller, or a
/// symbolic name resolved against the action registry at execution time.
#[derive(Clone)]
pub enum ActionCallback {
    Direct(ActionHandler),
    Named(String),
}

impl fmt::Debug for ActionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Direct(<handler>)"),
            Self::Named(name) => write!(f, "Named({name:?})"),
        }
    }
}

// Only the symbolic form exists on the wire; direct handlers are attached
// in code.
impl<'de> Deserialize<'de> for ActionCallback {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::Named(String::deserialize(deserializer)?))
    }
}

/// A follow-up action offered by a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub callback: Option<ActionCallback>,
}

impl Action {
    pub fn named(
        id: impl Into<String>,
        label: impl Into<String>,
        callback_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            callback: Some(ActionCallback::Named(callback_name.into())),
        }
    }

    pub fn direct(id: impl Into<String>, label: impl Into<String>, handler: ActionHandler) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            callback: Some(ActionCallback::Direct(handler)),
        }
    }
}

/// One notification, immutable once submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
    pub level: Level,
    pub voice: VoiceRequest,
    pub persistent: bool,
    pub actions: Vec<Action>,
    pub bypass_quiet: bool,
    pub force_voice: bool,
    pub sound_file: Option<PathBuf>,
    pub play_sound: Option<bool>,
}

impl Default for NotificationRequest {
    fn default() -> Self {
        Self {
            title: "notify-dispatch".into(),
            message: String::new(),
            level: Level::Info,
            voice: VoiceRequest::default(),
            persistent: false,
            actions: Vec::new(),
            bypass_quiet: false,
            force_voice: false,
            sound_file: None,
            play_sound: None,
        }
    }
}

impl NotificationRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_voice(mut self, voice: VoiceRequest) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_sound_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sound_file = Some(path.into());
        self
    }

    pub fn bypass_quiet(mut self) -> Self {
        self.bypass_quiet = true;
        self
    }

    pub fn force_voice(mut self) -> Self {
        self.force_voice = true;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}
