//! Dispatch orchestration: the `notify` entry point and the service state
//! it owns (configuration, channels, speech queue, pending actions).
//!
//! Any number of threads may call into one manager concurrently. Every
//! dispatch step is best-effort: a failing channel is logged and the
//! remaining steps still run, and `notify` never returns an error or
//! blocks on speech playback.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::actions::{ActionRegistry, PendingStore, PendingSummary, RegistryError};
use crate::config::NotifyConfig;
use crate::desktop::DesktopToast;
use crate::request::{ActionHandler, NotificationRequest, VoiceRequest};
use crate::sound::{resolve_sound_path, SoundPlayer};
use crate::speech::{SpeechQueue, SpeechSink};
use crate::suppression;

pub struct NotificationManager {
    config: RwLock<NotifyConfig>,
    config_path: Option<PathBuf>,
    desktop: Option<Arc<dyn DesktopToast>>,
    sound: Option<Arc<dyn SoundPlayer>>,
    speech: SpeechQueue,
    pending: PendingStore,
    registry: ActionRegistry,
}

impl NotificationManager {
    /// Manager over an in-memory configuration; dispatches skip the file
    /// reload.
    pub fn with_config(config: NotifyConfig) -> Self {
        Self {
            config: RwLock::new(config),
            config_path: None,
            desktop: None,
            sound: None,
            speech: SpeechQueue::new(),
            pending: PendingStore::default(),
            registry: ActionRegistry::default(),
        }
    }

    /// Manager backed by a config file, re-read at the top of every
    /// dispatch so external edits take effect without a restart.
    pub fn from_path(path: PathBuf) -> Self {
        let config = NotifyConfig::load(&path);
        let mut manager = Self::with_config(config);
        manager.config_path = Some(path);
        manager
    }

    pub fn with_desktop(mut self, desktop: Arc<dyn DesktopToast>) -> Self {
        self.desktop = Some(desktop);
        self
    }

    pub fn with_sound(mut self, sound: Arc<dyn SoundPlayer>) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Register or swap the speech sink; takes effect on the next
    /// utterance.
    pub fn set_speech_sink(&self, sink: Arc<dyn SpeechSink>) {
        self.speech.set_sink(sink);
    }

    pub fn speech(&self) -> &SpeechQueue {
        &self.speech
    }

    pub fn config_snapshot(&self) -> NotifyConfig {
        self.config.read().unwrap().clone()
    }

    /// Re-read the attached config file, if any.
    pub fn reload_config(&self) {
        if let Some(path) = &self.config_path {
            self.config.write().unwrap().reload(path);
        }
    }

    /// Dispatch one notification: log, apply the suppression policy, then
    /// fan out to desktop, sound, the pending-action store and speech.
    pub fn notify(&self, request: NotificationRequest) {
        self.reload_config();
        let config = self.config_snapshot();

        // The log channel is never gated.
        info!(
            "Notification ({}): {} - {}",
            request.level, request.title, request.message
        );

        if let Some(reason) = suppression::evaluate(
            &request.message,
            request.level,
            request.bypass_quiet,
            &config,
            Local::now().time(),
        ) {
            debug!("Notification suppressed ({reason}): {}", request.title);
            return;
        }

        if config.desktop {
            if let Some(desktop) = &self.desktop {
                if let Err(e) = desktop.show(&request.title, &request.message, request.persistent) {
                    warn!("Desktop notification failed: {e}");
                }
            }
        }

        self.dispatch_sound(&request, &config);

        if !request.actions.is_empty() {
            self.pending.insert(&request);
        }

        self.dispatch_voice(&request, &config);
    }

    fn dispatch_sound(&self, request: &NotificationRequest, config: &NotifyConfig) {
        let Some(player) = &self.sound else { return };
        let Some(path) = resolve_sound_path(request, config) else {
            return;
        };
        if !request.play_sound.unwrap_or(true) {
            return;
        }
        if let Err(e) = player.play(&path) {
            warn!("Failed to start sound playback: {e}");
        }
    }

    fn dispatch_voice(&self, request: &NotificationRequest, config: &NotifyConfig) {
        let Some(options) = request.voice.normalize(config.voice_options.as_ref()) else {
            return;
        };

        // A literal `voice: true` speaks even when the global switch is off.
        let should_speak = config.voice
            || request.force_voice
            || matches!(request.voice, VoiceRequest::Flag(true));
        if !should_speak {
            debug!(
                "Voice options provided but speaking not enabled for {}",
                request.title
            );
            return;
        }

        debug!(
            "Voice requested for notification {} (options: {options:?})",
            request.title
        );
        if config.voice_queue {
            self.speech.enqueue(request.message.clone(), Some(options));
        } else {
            self.speech
                .speak_detached(request.message.clone(), Some(options));
        }
    }

    /// Execute a follow-up action on a pending notification. `true` iff a
    /// matching action id was found on an existing entry; the entry is
    /// retired either way once matched.
    pub fn execute_action(&self, id: &str, action_id: &str) -> bool {
        self.pending.execute(id, action_id, &self.registry)
    }

    pub fn register_action(
        &self,
        name: impl Into<String>,
        handler: ActionHandler,
    ) -> Result<(), RegistryError> {
        self.registry.register(name, handler)
    }

    pub fn unregister_action(&self, name: &str) {
        self.registry.unregister(name);
    }

    /// Pending entries for an external presentation layer.
    pub fn pending_snapshot(&self) -> Vec<PendingSummary> {
        self.pending.snapshot()
    }
}
