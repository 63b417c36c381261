//! Error types for the Twister spinner

use thiserror::Error;

/// Result type alias for spinner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the spinner
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or decoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Audio asset missing from the assets directory
    #[error("audio asset not found: {0}")]
    AssetNotFound(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Access to a speech service was refused
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Speech recognition engine error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Ad queue error
    #[error("ad error: {0}")]
    Ad(String),

    /// Game controller is no longer running
    #[error("game controller stopped")]
    ControllerStopped,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
