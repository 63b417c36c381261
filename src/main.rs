use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use infinite_twister::ads::AdWidget;
use infinite_twister::announce::SPEECH_RATE;
use infinite_twister::app::build_announcer;
use infinite_twister::config::{LoadOptions, VoiceEngineKind};
use infinite_twister::voice::{AudioCapture, AudioPlayback, SAMPLE_RATE, SystemVoice, TextToSpeech};
use infinite_twister::{App, COMBINATIONS, Config};

/// Infinite Twister - a voice-controlled party-game spinner
#[derive(Parser)]
#[command(name = "twister", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Seconds each result stays on screen (1-10)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pause: Option<i64>,

    /// Directory holding the announcement clips
    #[arg(long, global = true)]
    audio_dir: Option<PathBuf>,

    /// Voice command engine: microphone, typed or off
    #[arg(long, global = true)]
    voice: Option<VoiceEngineKind>,

    /// Disable clip playback and spoken announcements
    #[arg(long, global = true)]
    mute: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play the game (default)
    Play,
    /// List every combination and its audio file
    List,
    /// Report missing announcement clips
    CheckAssets,
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "red Left Hand")]
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Print the ad slot markup
    AdMarkup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,infinite_twister=info",
        1 => "info,infinite_twister=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = LoadOptions {
        pause_duration_secs: cli.pause,
        assets_dir: cli.audio_dir,
        voice_engine: cli.voice,
        mute: cli.mute,
    };
    let config = Config::load_with_options(&options)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => {
            tracing::info!(
                pause = config.game.pause_duration_secs,
                voice = %config.voice.engine,
                assets = %config.audio.assets_dir.display(),
                "starting infinite twister"
            );
            App::new(config).run().await?;
            Ok(())
        }
        Command::List => {
            list_combinations();
            Ok(())
        }
        Command::CheckAssets => check_assets(&config),
        Command::TestSpeaker => test_speaker().await,
        Command::TestTts { text } => test_tts(&config, &text).await,
        Command::TestMic { duration } => test_mic(duration).await,
        Command::AdMarkup => {
            let widget = AdWidget::new(config.ads);
            println!("{}", widget.render_html());
            println!("{}", widget.push_script()?);
            Ok(())
        }
    }
}

fn list_combinations() {
    for (i, combination) in COMBINATIONS.iter().enumerate() {
        println!(
            "{:2}. {:<6} {:<10} {}",
            i + 1,
            combination.color.name(),
            combination.body_part.name(),
            combination.audio_filename()
        );
    }
}

fn check_assets(config: &Config) -> anyhow::Result<()> {
    let service = build_announcer(config);
    let missing = service.missing_assets();

    println!("Assets directory: {}", service.assets_dir().display());
    if missing.is_empty() {
        println!("All {} clips present.", COMBINATIONS.len());
        return Ok(());
    }

    println!("Missing {} of {} clips:", missing.len(), COMBINATIONS.len());
    for combination in &missing {
        println!("  {}", combination.audio_filename());
    }
    println!("\nMissing clips are announced with speech instead.");
    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    // Generate 2 seconds of 440Hz sine wave at 24kHz sample rate
    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    tokio::task::spawn_blocking(move || {
        AudioPlayback::new(sample_rate)?.play_blocking(samples, 1.0)
    })
    .await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output through OpenAI, or the system voice without a key
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let Some(key) = config.api_keys.openai.clone() else {
        let voice = SystemVoice::default();
        println!("No OpenAI API key, speaking with {}...", voice.program());
        voice.speak(text, SPEECH_RATE, 1.0).await?;
        return Ok(());
    };

    let tts = TextToSpeech::new_openai(
        key,
        config.speech.tts_voice.clone(),
        config.speech.tts_model.clone(),
    )?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text, 1.0).await?;
    println!("Received {} bytes of audio", mp3_data.len());

    println!("Playing audio...");
    tokio::task::spawn_blocking(move || AudioPlayback::play_mp3_blocking(&mp3_data, 1.0)).await??;

    println!("\nTTS test complete!");
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {SAMPLE_RATE} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, voice commands can hear you.");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
