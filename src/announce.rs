//! Result announcements
//!
//! A result is announced by playing its pre-recorded clip. When the clip is
//! missing or cannot be played, the combination is spoken instead.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::combination::{COMBINATIONS, Combination};
use crate::voice::{AudioPlayback, SystemVoice, TextToSpeech};
use crate::{Error, Result};

/// Playback volume for pre-recorded clips
pub const ANNOUNCE_VOLUME: f32 = 0.8;

/// Speech rate for the spoken fallback
pub const SPEECH_RATE: f32 = 0.8;

/// Speech pitch for the spoken fallback
pub const SPEECH_PITCH: f32 = 1.2;

/// Receives final selections; must return without waiting on playback
pub trait Announcer: Send + Sync {
    fn announce(&self, combination: Combination);
}

/// Something that can play MP3 audio
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play MP3 bytes at `volume` (0.0 - 1.0) until finished
    ///
    /// # Errors
    ///
    /// Returns error if the audio cannot be decoded or played
    async fn play_mp3(&self, data: Vec<u8>, volume: f32) -> Result<()>;
}

/// Something that can speak text
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str, rate: f32, pitch: f32) -> Result<()>;
}

/// The default speaker
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeakerOutput;

#[async_trait]
impl AudioOutput for SpeakerOutput {
    async fn play_mp3(&self, data: Vec<u8>, volume: f32) -> Result<()> {
        tokio::task::spawn_blocking(move || AudioPlayback::play_mp3_blocking(&data, volume))
            .await
            .map_err(|e| Error::Audio(e.to_string()))?
    }
}

/// Speech through the `OpenAI` speech API, played on an [`AudioOutput`]
pub struct OpenAiSpeech {
    tts: TextToSpeech,
    output: Arc<dyn AudioOutput>,
}

impl OpenAiSpeech {
    #[must_use]
    pub fn new(tts: TextToSpeech, output: Arc<dyn AudioOutput>) -> Self {
        Self { tts, output }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn speak(&self, text: &str, rate: f32, pitch: f32) -> Result<()> {
        tracing::trace!(pitch, "pitch not supported by OpenAI speech");
        let audio = self.tts.synthesize(text, rate).await?;
        self.output.play_mp3(audio, 1.0).await
    }
}

#[async_trait]
impl SpeechSynthesizer for SystemVoice {
    async fn speak(&self, text: &str, rate: f32, pitch: f32) -> Result<()> {
        Self::speak(self, text, rate, pitch).await
    }
}

/// How an announcement ended up being delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    /// Pre-recorded clip played
    Played,
    /// Spoken by the fallback synthesizer
    Spoken,
    /// Nothing could be delivered
    Silent,
}

/// Plays clips with a spoken fallback
#[derive(Clone)]
pub struct AnnouncementService {
    assets_dir: PathBuf,
    output: Option<Arc<dyn AudioOutput>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl AnnouncementService {
    /// `output` or `speech` may be absent to disable that path
    #[must_use]
    pub fn new(
        assets_dir: impl Into<PathBuf>,
        output: Option<Arc<dyn AudioOutput>>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            output,
            speech,
        }
    }

    #[must_use]
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Where the clip for `combination` is expected
    #[must_use]
    pub fn asset_path(&self, combination: &Combination) -> PathBuf {
        self.assets_dir.join(combination.audio_filename())
    }

    /// Combinations whose clip is not present
    #[must_use]
    pub fn missing_assets(&self) -> Vec<Combination> {
        COMBINATIONS
            .iter()
            .filter(|c| !self.asset_path(c).is_file())
            .copied()
            .collect()
    }

    /// Announce and wait for the outcome
    pub async fn announce_now(&self, combination: Combination) -> Announcement {
        match self.play_clip(&combination).await {
            Ok(()) => {
                tracing::info!(file = %combination.audio_filename(), "played audio");
                Announcement::Played
            }
            Err(e) => {
                tracing::warn!(
                    file = %combination.audio_filename(),
                    error = %e,
                    "could not play audio file, falling back to speech"
                );
                self.speak(&combination).await
            }
        }
    }

    async fn play_clip(&self, combination: &Combination) -> Result<()> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| Error::Audio("audio output disabled".to_string()))?;

        let path = self.asset_path(combination);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::AssetNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        output.play_mp3(data, ANNOUNCE_VOLUME).await
    }

    async fn speak(&self, combination: &Combination) -> Announcement {
        let Some(speech) = &self.speech else {
            return Announcement::Silent;
        };

        match speech
            .speak(&combination.spoken_text(), SPEECH_RATE, SPEECH_PITCH)
            .await
        {
            Ok(()) => Announcement::Spoken,
            Err(e) => {
                tracing::warn!(error = %e, "speech fallback failed");
                Announcement::Silent
            }
        }
    }
}

impl Announcer for AnnouncementService {
    fn announce(&self, combination: Combination) {
        let service = self.clone();
        tokio::spawn(async move {
            service.announce_now(combination).await;
        });
    }
}
