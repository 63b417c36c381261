//! Voice command recognizer
//!
//! Owns the session's single transcription engine, turns finalized
//! transcripts into [`Intent`]s and keeps the engine alive while the user
//! wants to be heard.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::engine::{
    EngineError, EngineEvent, EngineEvents, RunEvent, TranscriptionEngine, VoiceCapability,
};
use super::intent::{Intent, classify};

/// Delay before restarting an engine that ended on its own
pub const RESTART_DELAY: Duration = Duration::from_millis(100);

/// Shown when the capability is missing
pub const UNSUPPORTED_MESSAGE: &str = "Speech Recognition not supported";

/// Shown when access to the microphone is refused
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Microphone access denied. Please allow microphone access for voice controls.";

/// Observable voice control state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceControlState {
    pub is_listening: bool,
    pub is_supported: bool,
    pub last_error: Option<String>,
}

/// Notices that need the user's attention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceNotice {
    PermissionDenied(String),
}

type SharedEngine = Arc<Mutex<Box<dyn TranscriptionEngine>>>;

/// Start `engine` under a fresh run number
///
/// With `expected` set, the start only happens while the current run is
/// still that one; a manual start in between wins and `Ok(false)` is
/// returned.
fn start_run(
    engine: &SharedEngine,
    run: &AtomicU64,
    tx: &mpsc::UnboundedSender<RunEvent>,
    expected: Option<u64>,
) -> crate::Result<bool> {
    let mut engine = engine
        .lock()
        .map_err(|_| crate::Error::Recognition("engine lock poisoned".to_string()))?;
    if expected.is_some_and(|expected| run.load(Ordering::SeqCst) != expected) {
        return Ok(false);
    }
    let next = run.fetch_add(1, Ordering::SeqCst) + 1;
    engine.start(EngineEvents::new(next, tx.clone()))?;
    Ok(true)
}

/// Recognizes voice commands from a transcription engine
pub struct VoiceRecognizer {
    engine: Option<SharedEngine>,
    events: mpsc::UnboundedSender<RunEvent>,
    run: Arc<AtomicU64>,
    should_listen: Arc<AtomicBool>,
    state: Arc<watch::Sender<VoiceControlState>>,
    task: JoinHandle<()>,
}

impl VoiceRecognizer {
    /// Create the recognizer and its event loop
    ///
    /// Intents go to `intents`; permission problems to `notices`. Must be
    /// called inside a tokio runtime.
    #[must_use]
    pub fn new(
        capability: VoiceCapability,
        intents: mpsc::UnboundedSender<Intent>,
        notices: mpsc::UnboundedSender<VoiceNotice>,
    ) -> Self {
        let supported = capability.is_supported();
        let engine = match capability {
            VoiceCapability::Supported(engine) => {
                tracing::info!("initializing speech recognition");
                Some(Arc::new(Mutex::new(engine)))
            }
            VoiceCapability::Unsupported => {
                tracing::warn!("speech recognition not supported");
                None
            }
        };

        let (state_tx, _) = watch::channel(VoiceControlState {
            is_listening: false,
            is_supported: supported,
            last_error: (!supported).then(|| UNSUPPORTED_MESSAGE.to_string()),
        });
        let state = Arc::new(state_tx);
        let should_listen = Arc::new(AtomicBool::new(false));
        let run = Arc::new(AtomicU64::new(0));
        let (events, rx) = mpsc::unbounded_channel();

        let event_loop = EventLoop {
            engine: engine.clone(),
            events: events.clone(),
            run: Arc::clone(&run),
            should_listen: Arc::clone(&should_listen),
            state: Arc::clone(&state),
            intents,
            notices,
        };
        let task = tokio::spawn(event_loop.run(rx));

        Self {
            engine,
            events,
            run,
            should_listen,
            state,
            task,
        }
    }

    /// Start listening; returns false if unsupported or the engine refuses
    pub fn start_listening(&self) -> bool {
        let Some(engine) = &self.engine else {
            tracing::warn!("cannot start listening: not supported");
            return false;
        };

        tracing::info!("starting voice recognition");
        self.should_listen.store(true, Ordering::SeqCst);
        match start_run(engine, &self.run, &self.events, None) {
            Ok(_) => {
                self.state.send_modify(|s| {
                    s.is_listening = true;
                    s.last_error = None;
                });
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to start voice recognition");
                self.should_listen.store(false, Ordering::SeqCst);
                self.state
                    .send_modify(|s| s.last_error = Some(format!("Start failed: {e}")));
                false
            }
        }
    }

    /// Stop listening; clears listening state and errors unconditionally
    pub fn stop_listening(&self) {
        tracing::info!("stopping voice recognition");
        self.should_listen.store(false, Ordering::SeqCst);
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                engine.stop();
            }
        }
        self.state.send_modify(|s| {
            s.is_listening = false;
            s.last_error = None;
        });
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state.borrow().is_listening
    }

    /// Latest voice state snapshot
    #[must_use]
    pub fn state(&self) -> VoiceControlState {
        self.state.borrow().clone()
    }

    /// Watch voice state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VoiceControlState> {
        self.state.subscribe()
    }
}

impl Drop for VoiceRecognizer {
    fn drop(&mut self) {
        tracing::debug!("cleaning up speech recognition");
        self.should_listen.store(false, Ordering::SeqCst);
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                engine.stop();
            }
        }
        self.task.abort();
    }
}

struct EventLoop {
    engine: Option<SharedEngine>,
    events: mpsc::UnboundedSender<RunEvent>,
    run: Arc<AtomicU64>,
    should_listen: Arc<AtomicBool>,
    state: Arc<watch::Sender<VoiceControlState>>,
    intents: mpsc::UnboundedSender<Intent>,
    notices: mpsc::UnboundedSender<VoiceNotice>,
}

impl EventLoop {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<RunEvent>) {
        while let Some((run, event)) = rx.recv().await {
            self.handle(run, event);
        }
    }

    fn handle(&self, run: u64, event: EngineEvent) {
        match event {
            EngineEvent::Started => {
                tracing::debug!("speech recognition started");
                self.state.send_if_modified(|s| s.last_error.take().is_some());
            }
            EngineEvent::Result {
                transcript,
                is_final,
            } => {
                if !is_final {
                    return;
                }
                tracing::info!(transcript = %transcript.trim(), "voice command heard");
                for intent in classify(&transcript) {
                    tracing::info!(%intent, "voice intent triggered");
                    let _ = self.intents.send(intent);
                }
            }
            EngineEvent::Error(error) => self.on_error(&error),
            EngineEvent::Ended => self.on_end(run),
        }
    }

    fn on_error(&self, error: &EngineError) {
        tracing::error!(error = %error, "speech recognition error");
        let message = format!("Recognition error: {error}");

        if *error == EngineError::NotAllowed {
            self.should_listen.store(false, Ordering::SeqCst);
            if let Some(engine) = &self.engine {
                if let Ok(mut engine) = engine.lock() {
                    engine.stop();
                }
            }
            self.state.send_modify(|s| {
                s.is_listening = false;
                s.last_error = Some(message);
            });
            let _ = self
                .notices
                .send(VoiceNotice::PermissionDenied(PERMISSION_DENIED_MESSAGE.to_string()));
        } else {
            self.state.send_modify(|s| s.last_error = Some(message));
        }
    }

    fn on_end(&self, ended: u64) {
        tracing::debug!(run = ended, "speech recognition ended");
        if ended != self.run.load(Ordering::SeqCst) {
            tracing::debug!(run = ended, "ignoring end of a previous run");
            return;
        }
        if !self.should_listen.load(Ordering::SeqCst) {
            return;
        }
        let Some(engine) = self.engine.clone() else {
            return;
        };

        tracing::debug!("restarting speech recognition");
        let should_listen = Arc::clone(&self.should_listen);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let run = Arc::clone(&self.run);

        tokio::spawn(async move {
            tokio::time::sleep(RESTART_DELAY).await;
            if !should_listen.load(Ordering::SeqCst) {
                return;
            }
            if let Err(e) = start_run(&engine, &run, &events, Some(ended)) {
                tracing::error!(error = %e, "recognition restart failed");
                state.send_modify(|s| s.last_error = Some(format!("Restart failed: {e}")));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    struct NullEngine;

    impl TranscriptionEngine for NullEngine {
        fn start(&mut self, _events: EngineEvents) -> Result<()> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    #[tokio::test]
    async fn test_unsupported_capability() {
        let (intents, _) = mpsc::unbounded_channel();
        let (notices, _) = mpsc::unbounded_channel();
        let recognizer = VoiceRecognizer::new(VoiceCapability::Unsupported, intents, notices);

        assert!(!recognizer.is_supported());
        assert!(!recognizer.start_listening());

        let state = recognizer.state();
        assert!(!state.is_supported);
        assert!(!state.is_listening);
        assert_eq!(state.last_error.as_deref(), Some(UNSUPPORTED_MESSAGE));
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let (intents, _) = mpsc::unbounded_channel();
        let (notices, _) = mpsc::unbounded_channel();
        let recognizer = VoiceRecognizer::new(
            VoiceCapability::Supported(Box::new(NullEngine)),
            intents,
            notices,
        );

        recognizer.stop_listening();
        let state = recognizer.state();
        assert!(state.is_supported);
        assert!(!state.is_listening);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_start_listening() {
        let (intents, _) = mpsc::unbounded_channel();
        let (notices, _) = mpsc::unbounded_channel();
        let recognizer = VoiceRecognizer::new(
            VoiceCapability::Supported(Box::new(NullEngine)),
            intents,
            notices,
        );

        assert!(recognizer.start_listening());
        assert!(recognizer.is_listening());

        recognizer.stop_listening();
        assert!(!recognizer.is_listening());
    }
}
