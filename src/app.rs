//! Terminal host
//!
//! Wires the configured media services into a game session, renders session
//! snapshots to stdout and turns typed lines into game and voice commands.

use std::io::Write;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::ads::{AdWidget, InMemoryAdQueue};
use crate::announce::{AnnouncementService, AudioOutput, OpenAiSpeech, SpeakerOutput, SpeechSynthesizer};
use crate::config::{Config, SpeechProvider, VoiceEngineKind};
use crate::game::{GameController, Session, pause_from_secs, view};
use crate::voice::{
    MicrophoneEngine, SpeechToText, SystemVoice, TextToSpeech, TranscriptFeed, TypedEngine,
    UNSUPPORTED_MESSAGE, VoiceCapability, VoiceControlState, VoiceNotice, VoiceRecognizer,
    input_available,
};
use crate::Result;

/// Help text for the command prompt
pub const HELP: &str = "\
Commands:
  start          start the game (restarts a stopped game)
  stop           stop the game
  restart        restart a stopped game (alias: again)
  pause <n>      seconds to show each result (1-10)
  voice on|off   toggle voice commands
  say <text>     speak a line to the typed voice engine
  help           show this help
  quit           exit";

/// A parsed terminal line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Start,
    Stop,
    Restart,
    Pause(u8),
    Voice(bool),
    Say(String),
    Help,
    Quit,
    /// Recognized command with bad arguments
    Invalid(String),
    Unknown(String),
}

/// Parse one input line; blank lines yield `None`
#[must_use]
pub fn parse_command(line: &str) -> Option<TerminalCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let command = match word.to_lowercase().as_str() {
        "start" => TerminalCommand::Start,
        "stop" => TerminalCommand::Stop,
        "restart" | "again" => TerminalCommand::Restart,
        "pause" => rest.parse::<i64>().map_or_else(
            |_| TerminalCommand::Invalid("pause expects a number of seconds (1-10)".to_string()),
            |secs| TerminalCommand::Pause(pause_from_secs(secs)),
        ),
        "voice" => match rest.to_lowercase().as_str() {
            "on" => TerminalCommand::Voice(true),
            "off" => TerminalCommand::Voice(false),
            _ => TerminalCommand::Invalid("voice expects on or off".to_string()),
        },
        "say" if rest.is_empty() => TerminalCommand::Invalid("say expects some text".to_string()),
        "say" => TerminalCommand::Say(rest.to_string()),
        "help" | "?" => TerminalCommand::Help,
        "quit" | "exit" => TerminalCommand::Quit,
        _ => TerminalCommand::Unknown(line.to_string()),
    };
    Some(command)
}

/// Resolve the voice capability once at startup
///
/// The typed engine also returns the feed that drives it.
#[must_use]
pub fn build_capability(config: &Config) -> (VoiceCapability, Option<TranscriptFeed>) {
    match config.voice.engine {
        VoiceEngineKind::Off => (VoiceCapability::Unsupported, None),
        VoiceEngineKind::Typed => {
            let (engine, feed) = TypedEngine::new();
            (VoiceCapability::Supported(Box::new(engine)), Some(feed))
        }
        VoiceEngineKind::Microphone => {
            let Some(key) = &config.api_keys.openai else {
                tracing::warn!("no OpenAI API key, microphone voice commands unavailable");
                return (VoiceCapability::Unsupported, None);
            };
            if !input_available() {
                tracing::warn!("no audio input device found");
                return (VoiceCapability::Unsupported, None);
            }
            match SpeechToText::new_whisper(
                key.clone(),
                config.voice.stt_model.clone(),
                &config.voice.locale,
            ) {
                Ok(stt) => (
                    VoiceCapability::Supported(Box::new(MicrophoneEngine::new(stt))),
                    None,
                ),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to create speech-to-text client");
                    (VoiceCapability::Unsupported, None)
                }
            }
        }
    }
}

/// Build the announcement service for the configured outputs
#[must_use]
pub fn build_announcer(config: &Config) -> AnnouncementService {
    let output: Option<Arc<dyn AudioOutput>> = if config.audio.enabled {
        Some(Arc::new(SpeakerOutput))
    } else {
        None
    };

    let speech: Option<Arc<dyn SpeechSynthesizer>> = match config.speech.provider {
        SpeechProvider::Off => None,
        SpeechProvider::System => Some(Arc::new(SystemVoice::default())),
        SpeechProvider::OpenAi => openai_speech(config).or_else(|| {
            tracing::info!("using system voice for spoken announcements");
            let fallback: Arc<dyn SpeechSynthesizer> = Arc::new(SystemVoice::default());
            Some(fallback)
        }),
    };

    AnnouncementService::new(config.audio.assets_dir.clone(), output, speech)
}

fn openai_speech(config: &Config) -> Option<Arc<dyn SpeechSynthesizer>> {
    let key = config.api_keys.openai.clone()?;
    match TextToSpeech::new_openai(
        key,
        config.speech.tts_voice.clone(),
        config.speech.tts_model.clone(),
    ) {
        Ok(tts) => Some(Arc::new(OpenAiSpeech::new(tts, Arc::new(SpeakerOutput)))),
        Err(e) => {
            tracing::warn!(error = %e, "failed to create TTS client");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(Option<String>),
    Session,
    Voice,
    Notice(VoiceNotice),
    Shutdown,
}

/// Running terminal session
pub struct App {
    config: Config,
    controller: GameController,
    recognizer: VoiceRecognizer,
    feed: Option<TranscriptFeed>,
    notices: mpsc::UnboundedReceiver<VoiceNotice>,
    ad: AdWidget,
    ad_queue: InMemoryAdQueue,
    screen: Screen,
}

impl App {
    /// Create the session; must be called inside a tokio runtime
    #[must_use]
    pub fn new(config: Config) -> Self {
        let (capability, feed) = build_capability(&config);
        let announcer = Arc::new(build_announcer(&config));

        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices) = mpsc::unbounded_channel();

        let controller = GameController::spawn(
            config.game.pause_duration_secs,
            StdRng::from_entropy(),
            announcer,
            Some(intents_rx),
        );
        let recognizer = VoiceRecognizer::new(capability, intents_tx, notices_tx);
        let ad = AdWidget::new(config.ads.clone());

        Self {
            config,
            controller,
            recognizer,
            feed,
            notices,
            ad,
            ad_queue: InMemoryAdQueue::new(true),
            screen: Screen::default(),
        }
    }

    /// Mount the ad slot against the in-process queue
    ///
    /// The terminal has no ad network, so requests are only recorded.
    fn mount_ad(&mut self) -> String {
        let element_id = self.ad.element_id();
        if self.ad.mount(&self.ad_queue) {
            format!("ad slot {element_id} requested")
        } else {
            format!("ad slot {element_id} ready")
        }
    }

    /// Run until `quit`, end of input or ctrl-c
    ///
    /// # Errors
    ///
    /// Returns error if stdin or stdout fail
    pub async fn run(mut self) -> Result<()> {
        let mut session = self.controller.subscribe();
        let mut voice = self.recognizer.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.screen.message("Infinite Twister")?;
        self.screen.message(HELP)?;
        let ad = self.mount_ad();
        self.screen.message(&ad)?;

        if self.config.voice.enabled {
            self.set_voice(true)?;
        }
        let last_voice = voice.borrow_and_update().clone();
        self.screen.message(&voice_line(&last_voice))?;
        self.screen.render(&session.borrow_and_update())?;

        loop {
            let input = tokio::select! {
                line = lines.next_line() => Input::Line(line?),
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Input::Session
                }
                changed = voice.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Input::Voice
                }
                Some(notice) = self.notices.recv() => Input::Notice(notice),
                _ = shutdown_rx.recv() => Input::Shutdown,
            };

            match input {
                Input::Line(None) => {
                    tracing::debug!("input closed");
                    break;
                }
                Input::Line(Some(line)) => {
                    if self.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                }
                Input::Session => {
                    let snapshot = session.borrow_and_update().clone();
                    self.screen.render(&snapshot)?;
                }
                Input::Voice => {
                    let state = voice.borrow_and_update().clone();
                    self.screen.message(&voice_line(&state))?;
                }
                Input::Notice(VoiceNotice::PermissionDenied(message)) => {
                    self.screen.message(&message)?;
                }
                Input::Shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        self.recognizer.stop_listening();
        self.controller.shutdown().await;
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let Some(command) = parse_command(line) else {
            return Ok(Flow::Continue);
        };
        tracing::debug!(?command, "terminal command");

        match command {
            TerminalCommand::Start => {
                if self.controller.snapshot().game_started {
                    self.controller.restart_game()?;
                } else {
                    self.controller.start_game()?;
                }
            }
            TerminalCommand::Stop => self.controller.stop_game()?,
            TerminalCommand::Restart => self.controller.restart_game()?,
            TerminalCommand::Pause(secs) => {
                self.controller.set_pause_duration(secs)?;
                self.screen
                    .message(&format!("results shown for {secs}s"))?;
            }
            TerminalCommand::Voice(on) => self.set_voice(on)?,
            TerminalCommand::Say(text) => match &self.feed {
                Some(feed) if feed.send(&text) => {}
                Some(_) => self.screen.message("voice commands are off (try: voice on)")?,
                None => self
                    .screen
                    .message("say needs the typed voice engine (--voice typed)")?,
            },
            TerminalCommand::Help => self.screen.message(HELP)?,
            TerminalCommand::Quit => return Ok(Flow::Quit),
            TerminalCommand::Invalid(message) => self.screen.message(&message)?,
            TerminalCommand::Unknown(text) => self
                .screen
                .message(&format!("unknown command: {text} (type help)"))?,
        }
        Ok(Flow::Continue)
    }

    fn set_voice(&mut self, on: bool) -> Result<()> {
        if !on {
            self.recognizer.stop_listening();
            return Ok(());
        }
        if !self.recognizer.start_listening() {
            let state = self.recognizer.state();
            let reason = state.last_error.as_deref().unwrap_or(UNSUPPORTED_MESSAGE);
            self.screen.message(reason)?;
        }
        Ok(())
    }
}

fn voice_line(state: &VoiceControlState) -> String {
    let status = if !state.is_supported {
        "unavailable"
    } else if state.is_listening {
        "listening"
    } else {
        "off"
    };
    state.last_error.as_ref().map_or_else(
        || format!("voice: {status}"),
        |e| format!("voice: {status} ({e})"),
    )
}

/// Stdout renderer; spinning frames overwrite each other on one line
#[derive(Debug, Default)]
struct Screen {
    last: String,
    inline: bool,
}

impl Screen {
    fn render(&mut self, session: &Session) -> std::io::Result<()> {
        let line = view::status_line(session);
        if line == self.last {
            return Ok(());
        }

        let mut out = std::io::stdout().lock();
        if session.is_spinning {
            write!(out, "\r\x1b[2K{line}")?;
            self.inline = true;
        } else {
            if self.inline {
                write!(out, "\r\x1b[2K")?;
            }
            writeln!(out, "{line}")?;
            self.inline = false;
        }
        out.flush()?;
        self.last = line;
        Ok(())
    }

    fn message(&mut self, text: &str) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if self.inline {
            writeln!(out)?;
            self.inline = false;
            self.last.clear();
        }
        writeln!(out, "{text}")?;
        out.flush()
    }
}
