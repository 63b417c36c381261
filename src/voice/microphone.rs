//! Microphone transcription engine
//!
//! A capture thread segments the microphone stream into utterances; a tokio
//! task sends each one to Whisper and reports the text as a final result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::engine::{EngineError, EngineEvent, EngineEvents, TranscriptionEngine};
use super::segment::UtteranceSegmenter;
use super::stt::SpeechToText;
use crate::{Error, Result};

/// How often the capture thread drains the microphone buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Streams microphone speech through Whisper
pub struct MicrophoneEngine {
    stt: Arc<SpeechToText>,
    running: Option<Running>,
}

struct Running {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl MicrophoneEngine {
    #[must_use]
    pub fn new(stt: SpeechToText) -> Self {
        Self {
            stt: Arc::new(stt),
            running: None,
        }
    }
}

impl TranscriptionEngine for MicrophoneEngine {
    fn start(&mut self, events: EngineEvents) -> Result<()> {
        if let Some(running) = &self.running {
            if !running.thread.is_finished() {
                return Err(Error::Recognition("recognition already started".to_string()));
            }
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Recognition(e.to_string()))?;
        let stop = Arc::new(AtomicBool::new(false));
        let (utterances, rx) = mpsc::unbounded_channel();

        runtime.spawn(transcribe_loop(Arc::clone(&self.stt), rx, events.clone()));

        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name("twister-capture".to_string())
            .spawn(move || capture_loop(&thread_stop, &utterances, &events))?;

        self.running = Some(Running { stop, thread });
        Ok(())
    }

    /// Stop capture and wait for the capture thread to release the device
    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop.store(true, Ordering::SeqCst);
            if running.thread.join().is_err() {
                tracing::warn!("capture thread panicked");
            }
        }
    }
}

impl Drop for MicrophoneEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs on the capture thread until stopped or the device fails
fn capture_loop(
    stop: &AtomicBool,
    utterances: &mpsc::UnboundedSender<Vec<u8>>,
    events: &EngineEvents,
) {
    let mut capture = match AudioCapture::new().and_then(|mut c| c.start().map(|()| c)) {
        Ok(capture) => capture,
        Err(e) => {
            tracing::error!(error = %e, "microphone unavailable");
            let _ = events.send(EngineEvent::Error(EngineError::Other("audio-capture".to_string())));
            return;
        }
    };

    let _ = events.send(EngineEvent::Started);
    let mut segmenter = UtteranceSegmenter::new();

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);

        if capture.has_failed() {
            let _ = events.send(EngineEvent::Error(EngineError::Other("audio-capture".to_string())));
            break;
        }

        let samples = capture.take_buffer();
        if let Some(utterance) = segmenter.push(&samples) {
            match samples_to_wav(&utterance, SAMPLE_RATE) {
                Ok(wav) => {
                    let _ = utterances.send(wav);
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode utterance"),
            }
        }
    }

    capture.stop();
}

/// Transcribes utterances in order; reports the end once capture is done
async fn transcribe_loop(
    stt: Arc<SpeechToText>,
    mut utterances: mpsc::UnboundedReceiver<Vec<u8>>,
    events: EngineEvents,
) {
    while let Some(wav) = utterances.recv().await {
        match stt.transcribe(wav).await {
            Ok(text) if text.trim().is_empty() => {}
            Ok(transcript) => {
                let _ = events.send(EngineEvent::Result {
                    transcript,
                    is_final: true,
                });
            }
            Err(Error::PermissionDenied(reason)) => {
                tracing::error!(%reason, "transcription refused");
                let _ = events.send(EngineEvent::Error(EngineError::NotAllowed));
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                let _ = events.send(EngineEvent::Error(EngineError::Other("network".to_string())));
            }
        }
    }

    let _ = events.send(EngineEvent::Ended);
}
