//! notify-dispatch: send notifications through the dispatch manager.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notify_dispatch::{
    Action, DbusToast, EspeakSink, Level, NotificationManager, NotificationRequest, NotifyConfig,
    RodioPlayer, VoiceRequest,
};

#[derive(Parser, Debug)]
#[command(
    name = "notify-dispatch",
    about = "Dispatch desktop/sound/voice notifications"
)]
struct Args {
    /// Notification message text
    message: Option<String>,

    /// Path to notifications.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Notification title
    #[arg(short, long, default_value = "notify-dispatch")]
    title: String,

    /// Level: info, warning, error or reminder
    #[arg(short, long, default_value = "info")]
    level: String,

    /// Request speech: true, false, or a JSON options map
    #[arg(long)]
    voice: Option<String>,

    /// Speak even if voice is disabled in the config
    #[arg(long)]
    force_voice: bool,

    /// Ignore the quiet-hours window
    #[arg(long)]
    bypass_quiet: bool,

    /// Explicit sound file to play
    #[arg(long)]
    sound: Option<PathBuf>,

    /// Skip the notification sound
    #[arg(long)]
    no_sound: bool,

    /// Keep the desktop toast on screen until dismissed
    #[arg(long)]
    persistent: bool,

    /// Full request as a JSON payload (overrides the flags above)
    #[arg(long)]
    payload: Option<String>,

    /// Speech synthesizer command
    #[arg(long, default_value = "espeak-ng")]
    speech_cmd: String,

    /// Run the built-in demo scenarios instead of a single dispatch
    #[arg(long)]
    demo: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let manager = match NotifyConfig::resolve_path(args.config.as_deref()) {
        Some(path) => NotificationManager::from_path(path),
        None => {
            info!("No config file found, using defaults");
            NotificationManager::with_config(NotifyConfig::default())
        }
    };
    let manager = manager
        .with_desktop(Arc::new(DbusToast))
        .with_sound(Arc::new(RodioPlayer));
    manager.set_speech_sink(Arc::new(EspeakSink::new(&args.speech_cmd)));

    if args.demo {
        run_demo(&manager);
    } else {
        let request = build_request(&args)?;
        manager.notify(request);
    }

    // Let queued speech finish before the process exits.
    manager.speech().shutdown();
    Ok(())
}

fn build_request(args: &Args) -> Result<NotificationRequest, Box<dyn std::error::Error>> {
    if let Some(payload) = &args.payload {
        return Ok(serde_json::from_str(payload)?);
    }

    let Some(message) = args.message.clone() else {
        return Err("either a message argument or --payload is required".into());
    };
    let level: Level = args.level.parse()?;
    let voice = match args.voice.as_deref() {
        None | Some("false") => VoiceRequest::Flag(false),
        Some("true") => VoiceRequest::Flag(true),
        Some(json) => VoiceRequest::Options(serde_json::from_str(json)?),
    };

    let mut request = NotificationRequest::new(message)
        .with_title(&args.title)
        .with_level(level)
        .with_voice(voice);
    request.force_voice = args.force_voice;
    request.bypass_quiet = args.bypass_quiet;
    request.persistent = args.persistent;
    request.sound_file = args.sound.clone();
    if args.no_sound {
        request.play_sound = Some(false);
    }
    Ok(request)
}

/// Replay the scenario suite: plain info, a warning, the suppressed retry
/// prompt, error-text suppression, and an actionable notification
/// exercised end to end against the registry.
fn run_demo(manager: &NotificationManager) {
    manager.notify(NotificationRequest::new("این یک اعلان تستی است").with_title("SIM"));
    manager.notify(
        NotificationRequest::new("این یک اعلان اخطار است")
            .with_title("SIM")
            .with_level(Level::Warning),
    );
    manager.notify(
        NotificationRequest::new("متاسفم، متوجه نشدم. لطفا دوباره بگویید.")
            .with_voice(VoiceRequest::Flag(true)),
    );
    manager.notify(
        NotificationRequest::new("Traceback (most recent call last): boom")
            .with_level(Level::Error),
    );

    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    let _ = manager.register_action(
        "demo.snooze",
        Arc::new(move || {
            info!("demo.snooze fired");
            flag.store(true, Ordering::SeqCst);
        }),
    );

    manager.notify(
        NotificationRequest::new("Click to run the follow-up")
            .with_title("Demo action")
            .with_actions(vec![Action::named("snooze", "Snooze", "demo.snooze")]),
    );
    for entry in manager.pending_snapshot() {
        let executed = manager.execute_action(&entry.id, "snooze");
        info!("execute_action({}) -> {executed}", entry.id);
    }
    info!("Demo action fired: {}", fired.load(Ordering::SeqCst));
    manager.unregister_action("demo.snooze");
}
