//! Text-to-speech (TTS) synthesis

use std::process::Stdio;

use crate::{Error, Result};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Synthesizes speech through the `OpenAI` speech API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    model: String,
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            model,
        })
    }

    /// Synthesize text to MP3 bytes at the given speed multiplier
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, speed: f32) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            // API accepts 0.25 - 4.0
            speed: speed.clamp(0.25, 4.0),
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

/// Words per minute treated as a rate of 1.0
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Speaks through the platform speech command (`say` or `espeak`)
#[derive(Debug, Clone)]
pub struct SystemVoice {
    program: String,
}

impl Default for SystemVoice {
    fn default() -> Self {
        let program = if cfg!(target_os = "macos") { "say" } else { "espeak" };
        Self::new(program)
    }
}

impl SystemVoice {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for speaking `text`
    #[must_use]
    pub fn args(&self, text: &str, rate: f32, pitch: f32) -> Vec<String> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let wpm = (BASE_WORDS_PER_MINUTE * rate).round().max(1.0) as u32;

        if self.program == "say" {
            // `say` has no pitch flag
            vec!["-r".to_string(), wpm.to_string(), text.to_string()]
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pitch = (50.0 * pitch).round().clamp(0.0, 99.0) as u32;
            vec![
                "-s".to_string(),
                wpm.to_string(),
                "-p".to_string(),
                pitch.to_string(),
                text.to_string(),
            ]
        }
    }

    /// Speak `text`, waiting for the command to finish
    ///
    /// # Errors
    ///
    /// Returns error if the command cannot run or exits unsuccessfully
    pub async fn speak(&self, text: &str, rate: f32, pitch: f32) -> Result<()> {
        let status = tokio::process::Command::new(&self.program)
            .args(self.args(text, rate, pitch))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Tts(format!("{} exited with {status}", self.program)))
        }
    }
}
