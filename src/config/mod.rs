//! Configuration management for Infinite Twister

pub mod file;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ads::AdSlotConfig;
use crate::game::{DEFAULT_PAUSE_SECS, pause_from_secs};
use crate::{Error, Result};

use self::file::TwisterConfigFile;

/// Infinite Twister configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub game: GameConfig,

    /// Pre-recorded clip playback
    pub audio: AudioConfig,

    /// Spoken fallback for announcements
    pub speech: SpeechConfig,

    /// Voice command recognition
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Ad slot shown under the board
    pub ads: AdSlotConfig,
}

/// Game timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Seconds a revealed result stays on screen, always within 1-10
    pub pause_duration_secs: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pause_duration_secs: DEFAULT_PAUSE_SECS,
        }
    }
}

/// Announcement clip configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    /// Play clips through the speaker
    pub enabled: bool,

    /// Directory holding the sixteen `{side}-{type}-{color}.mp3` clips
    pub assets_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assets_dir: PathBuf::from("audio"),
        }
    }
}

/// Speech fallback provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpeechProvider {
    /// `OpenAI` speech API when a key is configured, system voice otherwise
    #[default]
    OpenAi,
    /// Local `say` / `espeak`
    System,
    /// No spoken fallback
    Off,
}

impl FromStr for SpeechProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "system" => Ok(Self::System),
            "off" | "none" => Ok(Self::Off),
            other => Err(Error::Config(format!("unknown speech provider: {other}"))),
        }
    }
}

/// Speech fallback configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechConfig {
    pub provider: SpeechProvider,

    /// TTS model for `OpenAI` (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProvider::default(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
        }
    }
}

/// Transcription engine backing voice commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceEngineKind {
    /// Microphone capture transcribed by Whisper
    #[default]
    Microphone,
    /// Lines typed with the `say` command
    Typed,
    /// Voice commands unavailable
    Off,
}

impl VoiceEngineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::Typed => "typed",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for VoiceEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceEngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "microphone" | "mic" => Ok(Self::Microphone),
            "typed" | "keyboard" => Ok(Self::Typed),
            "off" | "none" => Ok(Self::Off),
            other => Err(Error::Config(format!("unknown voice engine: {other}"))),
        }
    }
}

/// Voice command configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Start listening when a game session opens
    pub enabled: bool,

    pub engine: VoiceEngineKind,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// Recognition locale
    pub locale: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: VoiceEngineKind::default(),
            stt_model: "whisper-1".to_string(),
            locale: "en-US".to_string(),
        }
    }
}

/// API keys
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openai", &self.openai.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Command-line overrides, applied above every other source
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub pause_duration_secs: Option<i64>,
    pub assets_dir: Option<PathBuf>,
    pub voice_engine: Option<VoiceEngineKind>,

    /// Disable clip playback and spoken fallback
    pub mute: bool,
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is unusable
    pub fn load() -> Result<Self> {
        Self::load_with_options(&LoadOptions::default())
    }

    /// Load configuration with command-line overrides
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is unusable
    pub fn load_with_options(options: &LoadOptions) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), options)
    }

    /// Layer sources: options > env > file > default
    ///
    /// # Errors
    ///
    /// Returns error if the assets directory resolves to an empty path
    pub fn from_sources<F>(fc: TwisterConfigFile, env: F, options: &LoadOptions) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Pause duration (options > env > toml > default), clamped to 1-10
        let pause = options
            .pause_duration_secs
            .or_else(|| env("TWISTER_PAUSE").and_then(|s| parse_secs("TWISTER_PAUSE", &s)))
            .or(fc.game.pause_duration_secs)
            .unwrap_or_else(|| i64::from(defaults.game.pause_duration_secs));
        let game = GameConfig {
            pause_duration_secs: pause_from_secs(pause),
        };

        let assets_dir = options
            .assets_dir
            .clone()
            .or_else(|| env("TWISTER_AUDIO_DIR").map(PathBuf::from))
            .or_else(|| fc.audio.assets_dir.map(PathBuf::from))
            .unwrap_or(defaults.audio.assets_dir);
        if assets_dir.as_os_str().is_empty() {
            return Err(Error::Config("audio assets directory is empty".to_string()));
        }
        let audio = AudioConfig {
            enabled: !options.mute && fc.audio.enabled.unwrap_or(defaults.audio.enabled),
            assets_dir,
        };

        let provider = if options.mute {
            SpeechProvider::Off
        } else {
            fc.speech
                .provider
                .as_deref()
                .and_then(|s| parse_or_warn("speech.provider", s))
                .unwrap_or(defaults.speech.provider)
        };
        let speech = SpeechConfig {
            provider,
            tts_model: env("TWISTER_TTS_MODEL")
                .or(fc.speech.tts_model)
                .unwrap_or(defaults.speech.tts_model),
            tts_voice: env("TWISTER_TTS_VOICE")
                .or(fc.speech.tts_voice)
                .unwrap_or(defaults.speech.tts_voice),
        };

        let engine = options
            .voice_engine
            .or_else(|| env("TWISTER_VOICE_ENGINE").and_then(|s| parse_or_warn("TWISTER_VOICE_ENGINE", &s)))
            .or_else(|| {
                fc.voice
                    .engine
                    .as_deref()
                    .and_then(|s| parse_or_warn("voice.engine", s))
            })
            .unwrap_or(defaults.voice.engine);
        let voice = VoiceConfig {
            enabled: fc.voice.enabled.unwrap_or(defaults.voice.enabled),
            engine,
            stt_model: env("TWISTER_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.voice.stt_model),
            locale: fc.voice.locale.unwrap_or(defaults.voice.locale),
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|key| !key.trim().is_empty()),
        };

        let ads = AdSlotConfig {
            client: env("TWISTER_AD_CLIENT")
                .or(fc.ads.client)
                .unwrap_or(defaults.ads.client),
            slot: env("TWISTER_AD_SLOT")
                .or(fc.ads.slot)
                .unwrap_or(defaults.ads.slot),
            format: fc.ads.format.unwrap_or(defaults.ads.format),
            style: fc.ads.style.unwrap_or(defaults.ads.style),
            class: fc.ads.class.unwrap_or(defaults.ads.class),
        };

        if pause != i64::from(game.pause_duration_secs) {
            tracing::warn!(
                requested = pause,
                using = game.pause_duration_secs,
                "pause duration out of range"
            );
        }

        Ok(Self {
            game,
            audio,
            speech,
            voice,
            api_keys,
            ads,
        })
    }
}

fn parse_secs(source: &str, value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| tracing::warn!(source, error = %e, "ignoring invalid number of seconds"))
        .ok()
}

fn parse_or_warn<T: FromStr<Err = Error>>(source: &str, value: &str) -> Option<T> {
    value
        .parse()
        .map_err(|e: Error| tracing::warn!(source, error = %e, "ignoring invalid setting"))
        .ok()
}
