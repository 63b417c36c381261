//! Typed transcription engine
//!
//! Treats each line of text fed to it as a finalized transcript. Used on
//! machines without a microphone and for scripted play.

use std::sync::{Arc, Mutex};

use super::engine::{EngineEvent, EngineEvents, TranscriptionEngine};
use crate::Result;

type Sink = Arc<Mutex<Option<EngineEvents>>>;

/// Engine fed by a [`TranscriptFeed`]
pub struct TypedEngine {
    sink: Sink,
}

/// Sends typed text into a [`TypedEngine`]
#[derive(Clone)]
pub struct TranscriptFeed {
    sink: Sink,
}

impl TypedEngine {
    /// Create an engine and the feed that drives it
    #[must_use]
    pub fn new() -> (Self, TranscriptFeed) {
        let sink: Sink = Arc::new(Mutex::new(None));
        (
            Self {
                sink: Arc::clone(&sink),
            },
            TranscriptFeed { sink },
        )
    }
}

impl TranscriptionEngine for TypedEngine {
    fn start(&mut self, events: EngineEvents) -> Result<()> {
        let _ = events.send(EngineEvent::Started);
        if let Ok(mut sink) = self.sink.lock() {
            *sink = Some(events);
        }
        Ok(())
    }

    fn stop(&mut self) {
        let current = self.sink.lock().ok().and_then(|mut sink| sink.take());
        if let Some(events) = current {
            let _ = events.send(EngineEvent::Ended);
        }
    }
}

impl TranscriptFeed {
    /// Submit a line; returns false when the engine is not listening
    pub fn send(&self, text: &str) -> bool {
        let Ok(sink) = self.sink.lock() else {
            return false;
        };
        sink.as_ref().is_some_and(|events| {
            events
                .send(EngineEvent::Result {
                    transcript: text.to_string(),
                    is_final: true,
                })
                .is_ok()
        })
    }

    /// Whether the engine is currently started
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.sink.lock().is_ok_and(|sink| sink.is_some())
    }
}
