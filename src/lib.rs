//! notify-dispatch-rs: notification dispatch for desktop, sound and voice.
//!
//! One [`NotificationManager`] instance receives requests from any thread,
//! applies content/level/quiet-hours suppression, fans out to the desktop
//! and sound channels, serializes speech through a single queue worker so
//! overlapping requests never talk over each other, and tracks
//! notifications with follow-up actions until one is executed.

pub mod actions;
pub mod config;
pub mod desktop;
pub mod manager;
pub mod request;
pub mod sound;
pub mod speech;
pub mod suppression;

pub use actions::{ActionRegistry, PendingStore, PendingSummary, RegistryError};
pub use config::{LevelToggles, NotifyConfig, QuietHours};
pub use desktop::{DbusToast, DesktopToast};
pub use manager::NotificationManager;
pub use request::{
    Action, ActionCallback, ActionHandler, Level, NotificationRequest, VoiceOptions, VoiceRequest,
};
pub use sound::{RodioPlayer, SoundPlayer};
pub use speech::{EspeakSink, SpeechError, SpeechQueue, SpeechSink};
