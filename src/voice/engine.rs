//! Streaming transcription engine abstraction

use std::fmt;

use tokio::sync::mpsc;

use crate::Result;

/// Error reported by a running engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Access to the microphone or transcription service was refused
    NotAllowed,
    /// Any other engine failure, carried verbatim
    Other(String),
}

impl EngineError {
    /// Short error code as surfaced to the user
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::NotAllowed => "not-allowed",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Events emitted by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine began streaming
    Started,
    /// A transcription result; only final results are acted on
    Result { transcript: String, is_final: bool },
    /// Engine error
    Error(EngineError),
    /// Stream ended, whether asked to or not
    Ended,
}

/// An event tagged with the run that produced it
pub type RunEvent = (u64, EngineEvent);

/// Where an engine delivers its events
///
/// Each `start` gets a sender stamped with a fresh run number, so the
/// receiver can tell a late event from a previous run apart from the
/// current one.
#[derive(Debug, Clone)]
pub struct EngineEvents {
    run: u64,
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl EngineEvents {
    #[must_use]
    pub const fn new(run: u64, tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self { run, tx }
    }

    /// Run number this sender was issued for
    #[must_use]
    pub const fn run(&self) -> u64 {
        self.run
    }

    /// Deliver `event` tagged with this sender's run
    ///
    /// # Errors
    ///
    /// Returns the event back if the receiver is gone
    pub fn send(&self, event: EngineEvent) -> std::result::Result<(), EngineEvent> {
        self.tx.send((self.run, event)).map_err(|e| e.0.1)
    }
}

/// A continuous speech transcription engine
///
/// An engine is created once per session and may be started and stopped
/// repeatedly. After `stop` (or on its own failure) it emits
/// [`EngineEvent::Ended`].
pub trait TranscriptionEngine: Send {
    /// Begin streaming into `events`
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot start
    fn start(&mut self, events: EngineEvents) -> Result<()>;

    /// Stop streaming; harmless when not started
    fn stop(&mut self);
}

/// Speech recognition capability, resolved once at startup
pub enum VoiceCapability {
    Supported(Box<dyn TranscriptionEngine>),
    Unsupported,
}

impl VoiceCapability {
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }
}

impl fmt::Debug for VoiceCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supported(_) => f.write_str("Supported"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}
