//! TOML configuration file loading
//!
//! Supports `~/.config/infinite-twister/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct TwisterConfigFile {
    #[serde(default)]
    pub game: GameFileConfig,

    #[serde(default)]
    pub audio: AudioFileConfig,

    #[serde(default)]
    pub speech: SpeechFileConfig,

    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Ad slot overrides
    #[serde(default)]
    pub ads: AdsFileConfig,
}

/// Game settings
#[derive(Debug, Default, Deserialize)]
pub struct GameFileConfig {
    /// Seconds a result stays on screen; clamped to 1-10 when loaded
    pub pause_duration_secs: Option<i64>,
}

/// Pre-recorded clip playback
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    pub enabled: Option<bool>,

    /// Directory holding `{side}-{type}-{color}.mp3` clips
    pub assets_dir: Option<String>,
}

/// Spoken fallback
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// "openai", "system" or "off"
    pub provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,
}

/// Voice commands
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    pub enabled: Option<bool>,

    /// "microphone", "typed" or "off"
    pub engine: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Recognition locale (e.g. "en-US")
    pub locale: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Ad slot configuration
#[derive(Debug, Default, Deserialize)]
pub struct AdsFileConfig {
    pub client: Option<String>,
    pub slot: Option<String>,
    pub format: Option<String>,
    pub style: Option<String>,
    pub class: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `TwisterConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> TwisterConfigFile {
    config_file_path().map_or_else(TwisterConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file from `path`, falling back to defaults
#[must_use]
pub fn load_config_from(path: &Path) -> TwisterConfigFile {
    if !path.exists() {
        return TwisterConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                TwisterConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            TwisterConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/infinite-twister/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("infinite-twister").join("config.toml"))
}
