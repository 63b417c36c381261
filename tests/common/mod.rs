//! Shared test utilities
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use infinite_twister::announce::{Announcer, AudioOutput, SpeechSynthesizer};
use infinite_twister::voice::{EngineEvent, EngineEvents, TranscriptionEngine};
use infinite_twister::{Combination, Error, Result, Session};
use tokio::sync::watch;

/// Wait for a session snapshot matching `predicate`
pub async fn wait_for_session(
    rx: &mut watch::Receiver<Session>,
    predicate: impl FnMut(&Session) -> bool,
) -> Session {
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session")
        .expect("controller stopped")
        .clone()
}

/// Announcer that records every announced combination
#[derive(Clone, Default)]
pub struct RecordingAnnouncer {
    announced: Arc<Mutex<Vec<Combination>>>,
}

impl RecordingAnnouncer {
    pub fn announced(&self) -> Vec<Combination> {
        self.announced.lock().unwrap().clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, combination: Combination) {
        self.announced.lock().unwrap().push(combination);
    }
}

#[derive(Default)]
struct FakeEngineState {
    starts: usize,
    stops: usize,
    fail_start: bool,
    events: Option<EngineEvents>,
}

/// Transcription engine driven by the test
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeEngineState>>,
}

impl FakeEngine {
    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    /// Make every following `start` fail
    pub fn fail_next_starts(&self) {
        self.state.lock().unwrap().fail_start = true;
    }

    /// Sender handed to the most recent successful `start`
    pub fn sender(&self) -> Option<EngineEvents> {
        self.state.lock().unwrap().events.clone()
    }

    /// Emit an event on the current stream; false when not started
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.sender().is_some_and(|events| events.send(event).is_ok())
    }

    /// Emit a finalized transcript
    pub fn say(&self, text: &str) -> bool {
        self.emit(EngineEvent::Result {
            transcript: text.to_string(),
            is_final: true,
        })
    }
}

impl TranscriptionEngine for FakeEngine {
    fn start(&mut self, events: EngineEvents) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.starts += 1;
        if state.fail_start {
            return Err(Error::Recognition("engine busy".to_string()));
        }
        let _ = events.send(EngineEvent::Started);
        state.events = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        state.events = None;
    }
}

/// Audio output that records plays and optionally fails
#[derive(Clone, Default)]
pub struct FakeOutput {
    fail: bool,
    played: Arc<Mutex<Vec<(usize, f32)>>>,
}

impl FakeOutput {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(byte length, volume)` of each play
    pub fn played(&self) -> Vec<(usize, f32)> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn play_mp3(&self, data: Vec<u8>, volume: f32) -> Result<()> {
        self.played.lock().unwrap().push((data.len(), volume));
        if self.fail {
            Err(Error::Audio("playback blocked".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Speech synthesizer that records what it was asked to say
#[derive(Clone, Default)]
pub struct FakeSpeech {
    fail: bool,
    spoken: Arc<Mutex<Vec<(String, f32, f32)>>>,
}

impl FakeSpeech {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(text, rate, pitch)` of each utterance
    pub fn spoken(&self) -> Vec<(String, f32, f32)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn speak(&self, text: &str, rate: f32, pitch: f32) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), rate, pitch));
        if self.fail {
            Err(Error::Tts("no voices".to_string()))
        } else {
            Ok(())
        }
    }
}
