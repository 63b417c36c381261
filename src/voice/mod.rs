//! Voice processing module
//!
//! Speech recognition for voice commands, plus the audio and speech
//! services used to announce results.

mod capture;
mod engine;
mod intent;
mod microphone;
mod playback;
mod recognizer;
mod segment;
mod stt;
mod tts;
mod typed;

pub use capture::{AudioCapture, SAMPLE_RATE, input_available, samples_to_wav};
pub use engine::{EngineError, EngineEvent, EngineEvents, RunEvent, TranscriptionEngine, VoiceCapability};
pub use intent::{Intent, START_WORDS, STOP_WORDS, classify};
pub use microphone::MicrophoneEngine;
pub use playback::{AudioPlayback, DecodedAudio, decode_mp3};
pub use recognizer::{
    PERMISSION_DENIED_MESSAGE, RESTART_DELAY, UNSUPPORTED_MESSAGE, VoiceControlState,
    VoiceNotice, VoiceRecognizer,
};
pub use segment::{SegmenterState, UtteranceSegmenter};
pub use stt::SpeechToText;
pub use tts::{SystemVoice, TextToSpeech};
pub use typed::{TranscriptFeed, TypedEngine};
