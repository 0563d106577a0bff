//! Speech serialization queue.
//!
//! A single long-lived worker drains a FIFO of utterances and hands each
//! one to the registered speech sink, so overlapping notifications never
//! talk over each other. The worker starts lazily on first use and blocks
//! on the sink call until it returns; utterances are spoken strictly in
//! submission order with at most one sink invocation in flight.

use std::process::Command;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use thiserror::Error;
use tracing::{debug, warn};

use crate::request::VoiceOptions;

#[derive(Debug, Error)]
pub enum SpeechError {
    /// The sink only accepts bare text; the worker retries without options.
    #[error("sink does not accept voice options")]
    UnsupportedOptions,
    #[error("speech engine failed: {0}")]
    Engine(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The external capability that renders text as audio. The queue only
/// sequences calls into it; it is registered (and may be swapped) at
/// runtime and takes effect on the next dequeue.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Sinks that understand rate/volume/language overrides implement
    /// this; the default declines and the worker falls back to `speak`.
    fn speak_with_options(&self, text: &str, options: &VoiceOptions) -> Result<(), SpeechError> {
        let _ = (text, options);
        Err(SpeechError::UnsupportedOptions)
    }
}

enum WorkerMessage {
    Utter {
        text: String,
        options: Option<VoiceOptions>,
    },
    Stop,
}

type SharedSink = Arc<RwLock<Option<Arc<dyn SpeechSink>>>>;

#[derive(Default)]
pub struct SpeechQueue {
    sender: Mutex<Option<Sender<WorkerMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    sink: SharedSink,
}

impl SpeechQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or swap the sink; takes effect on the next dequeue.
    pub fn set_sink(&self, sink: Arc<dyn SpeechSink>) {
        *self.sink.write().unwrap() = Some(sink);
    }

    /// Append an utterance to the FIFO, starting the worker if needed.
    pub fn enqueue(&self, text: impl Into<String>, options: Option<VoiceOptions>) {
        let message = WorkerMessage::Utter {
            text: text.into(),
            options,
        };

        let mut guard = self.sender.lock().unwrap();
        if guard.is_none() {
            *guard = Some(self.spawn_worker());
        }
        if let Err(mpsc::SendError(message)) =
            guard.as_ref().expect("sender just set").send(message)
        {
            // Worker died; restart it once and requeue.
            warn!("Speech worker channel closed; restarting worker");
            let sender = self.spawn_worker();
            let _ = sender.send(message);
            *guard = Some(sender);
        }
    }

    /// Speak on an ad-hoc thread, bypassing the queue. Used when queueing
    /// is disabled: no ordering or mutual exclusion between concurrent
    /// calls.
    pub fn speak_detached(&self, text: impl Into<String>, options: Option<VoiceOptions>) {
        let sink = self.sink.clone();
        let text = text.into();
        std::thread::spawn(move || speak_one(&sink, &text, options.as_ref()));
    }

    /// Stop the worker once the queued utterances have drained. The queue
    /// restarts lazily on the next `enqueue`.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().unwrap().take();
        if let Some(sender) = sender {
            let _ = sender.send(WorkerMessage::Stop);
        }
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Speech worker panicked");
            }
        }
    }

    fn spawn_worker(&self) -> Sender<WorkerMessage> {
        let (tx, rx) = mpsc::channel::<WorkerMessage>();
        let sink = self.sink.clone();
        let handle = std::thread::spawn(move || {
            while let Ok(message) = rx.recv() {
                match message {
                    WorkerMessage::Utter { text, options } => {
                        speak_one(&sink, &text, options.as_ref());
                    }
                    WorkerMessage::Stop => break,
                }
            }
        });
        *self.worker.lock().unwrap() = Some(handle);
        tx
    }
}

fn speak_one(sink: &SharedSink, text: &str, options: Option<&VoiceOptions>) {
    let current = sink.read().unwrap().clone();
    let Some(sink) = current else {
        debug!("No speech sink registered; dropping utterance");
        return;
    };

    let result = match options {
        Some(options) => match sink.speak_with_options(text, options) {
            Err(SpeechError::UnsupportedOptions) => sink.speak(text),
            other => other,
        },
        None => sink.speak(text),
    };

    if let Err(e) = result {
        warn!("Speech sink failed: {e}");
    }
}

/// Speaks through the espeak-ng command-line synthesizer (or a compatible
/// replacement).
pub struct EspeakSink {
    program: String,
}

impl EspeakSink {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, text: &str, options: Option<&VoiceOptions>) -> Result<(), SpeechError> {
        let mut command = Command::new(&self.program);
        if let Some(options) = options {
            if let Some(rate) = options.rate {
                command.arg("-s").arg(rate.to_string());
            }
            if let Some(volume) = options.volume {
                // espeak amplitude is 0-200, default 100; volume is 0.0-1.0.
                let amplitude = ((volume * 100.0).round() as i64).clamp(0, 200);
                command.arg("-a").arg(amplitude.to_string());
            }
            if let Some(lang) = &options.lang {
                command.arg("-v").arg(lang);
            }
        }
        command.arg(text);

        let status = command.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Engine(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

impl Default for EspeakSink {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl SpeechSink for EspeakSink {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.run(text, None)
    }

    fn speak_with_options(&self, text: &str, options: &VoiceOptions) -> Result<(), SpeechError> {
        self.run(text, Some(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records every call, tracks overlapping invocations, and optionally
    /// slows each call down so overlap would be observable.
    #[derive(Default)]
    struct RecordingSink {
        spoken: Mutex<Vec<(String, Option<VoiceOptions>)>>,
        in_flight: AtomicUsize,
        overlapped: AtomicBool,
        delay_ms: u64,
        accepts_options: bool,
    }

    impl RecordingSink {
        fn serial(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                accepts_options: true,
                ..Self::default()
            }
        }

        fn record(&self, text: &str, options: Option<VoiceOptions>) {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            if self.delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.delay_ms));
            }
            self.spoken.lock().unwrap().push((text.to_string(), options));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        fn texts(&self) -> Vec<String> {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .map(|(text, _)| text.clone())
                .collect()
        }
    }

    impl SpeechSink for RecordingSink {
        fn speak(&self, text: &str) -> Result<(), SpeechError> {
            self.record(text, None);
            Ok(())
        }

        fn speak_with_options(
            &self,
            text: &str,
            options: &VoiceOptions,
        ) -> Result<(), SpeechError> {
            if !self.accepts_options {
                return Err(SpeechError::UnsupportedOptions);
            }
            self.record(text, Some(options.clone()));
            Ok(())
        }
    }

    #[test]
    fn utterances_are_spoken_in_fifo_order_without_overlap() {
        let queue = SpeechQueue::new();
        let sink = Arc::new(RecordingSink::serial(10));
        queue.set_sink(sink.clone());

        queue.enqueue("one", None);
        queue.enqueue("two", None);
        queue.enqueue("three", None);
        queue.shutdown();

        assert_eq!(sink.texts(), vec!["one", "two", "three"]);
        assert!(!sink.overlapped.load(Ordering::SeqCst));
    }

    #[test]
    fn options_are_passed_to_a_capable_sink() {
        let queue = SpeechQueue::new();
        let sink = Arc::new(RecordingSink::serial(0));
        queue.set_sink(sink.clone());

        let options = VoiceOptions {
            rate: Some(180),
            ..VoiceOptions::default()
        };
        queue.enqueue("hello", Some(options.clone()));
        queue.shutdown();

        let spoken = sink.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].1.as_ref(), Some(&options));
    }

    #[test]
    fn falls_back_to_bare_text_when_sink_declines_options() {
        let queue = SpeechQueue::new();
        let sink = Arc::new(RecordingSink::default()); // accepts_options = false
        queue.set_sink(sink.clone());

        queue.enqueue("hello", Some(VoiceOptions::default()));
        queue.shutdown();

        let spoken = sink.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].0, "hello");
        assert_eq!(spoken[0].1, None);
    }

    #[test]
    fn utterances_without_a_sink_are_dropped() {
        let queue = SpeechQueue::new();
        queue.enqueue("lost", None);
        queue.shutdown();

        // Registering afterwards does not resurrect dropped items.
        let sink = Arc::new(RecordingSink::serial(0));
        queue.set_sink(sink.clone());
        queue.shutdown();
        assert!(sink.texts().is_empty());
    }

    #[test]
    fn sink_swap_takes_effect_on_next_dequeue() {
        let queue = SpeechQueue::new();
        let first = Arc::new(RecordingSink::serial(0));
        let second = Arc::new(RecordingSink::serial(0));

        queue.set_sink(first.clone());
        queue.enqueue("for-first", None);
        queue.shutdown();

        queue.set_sink(second.clone());
        queue.enqueue("for-second", None);
        queue.shutdown();

        assert_eq!(first.texts(), vec!["for-first"]);
        assert_eq!(second.texts(), vec!["for-second"]);
    }

    #[test]
    fn queue_restarts_after_shutdown() {
        let queue = SpeechQueue::new();
        let sink = Arc::new(RecordingSink::serial(0));
        queue.set_sink(sink.clone());

        queue.enqueue("before", None);
        queue.shutdown();
        queue.enqueue("after", None);
        queue.shutdown();

        assert_eq!(sink.texts(), vec!["before", "after"]);
    }

    #[test]
    fn detached_speaking_still_reaches_the_sink() {
        let queue = SpeechQueue::new();
        let sink = Arc::new(RecordingSink::serial(0));
        queue.set_sink(sink.clone());

        queue.speak_detached("direct", None);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while sink.texts().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sink.texts(), vec!["direct"]);
    }

    #[test]
    fn failing_sink_does_not_stall_the_queue() {
        struct FailingSink;
        impl SpeechSink for FailingSink {
            fn speak(&self, _text: &str) -> Result<(), SpeechError> {
                Err(SpeechError::Engine("no audio device".into()))
            }
        }

        let queue = SpeechQueue::new();
        queue.set_sink(Arc::new(FailingSink));
        queue.enqueue("one", None);
        queue.shutdown(); // the failure is logged; the queue stays usable

        let sink = Arc::new(RecordingSink::serial(0));
        queue.set_sink(sink.clone());
        queue.enqueue("two", None);
        queue.shutdown();

        assert_eq!(sink.texts(), vec!["two"]);
    }
}
