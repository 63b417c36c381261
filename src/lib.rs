//! Infinite Twister - a voice-controlled party-game spinner
//!
//! This library provides the core functionality for the spinner:
//! - Combination table (4 colors x 4 body parts)
//! - Spin engine and game state machine, driven by a single scheduler task
//! - Voice commands (Whisper transcription or typed input, keyword intents)
//! - Result announcements (pre-recorded clips with a spoken fallback)
//! - Ad slot widget
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Terminal host                       │
//! │      Commands  │  Rendering  │  Voice toggle         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Game controller                      │
//! │   Scheduler  │  GameMachine  │  Spin cycle           │
//! └──────────┬─────────────────────────┬────────────────┘
//!            │ intents                 │ results
//! ┌──────────▼──────────┐   ┌──────────▼────────────────┐
//! │  Voice recognizer   │   │   Announcement service     │
//! │  Mic + STT │ Typed  │   │   Clip │ TTS │ espeak/say   │
//! └─────────────────────┘   └────────────────────────────┘
//! ```

pub mod ads;
pub mod announce;
pub mod app;
pub mod combination;
pub mod config;
pub mod error;
pub mod game;
pub mod voice;

pub use app::App;
pub use combination::{BodyPart, COMBINATIONS, Color, Combination};
pub use config::Config;
pub use error::{Error, Result};
pub use game::{GameController, GameHandle, Session};
