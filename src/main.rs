use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use parley::audio::{AudioPlayback, Recorder, SAMPLE_RATE};
use parley::engine::{Command, Engine};
use parley::notice::TerminalSink;
use parley::speech::TextToSpeech;
use parley::Config;

/// Parley - push-to-talk voice assistant
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
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
    let config = Config::from_env();

    if let Some(cmd) = cli.command {
        return match cmd {
            Cmd::TestMic { duration } => test_mic(duration).await,
            Cmd::TestSpeaker => test_speaker(),
            Cmd::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    println!("parley ready");
    println!("  Enter  start/stop recording");
    println!("  r      regenerate response");
    println!("  p      replay speech");
    println!("  b      back to idle");
    println!("  q      quit");

    let commands = spawn_stdin_reader();
    let engine = Engine::new(&config, Arc::new(TerminalSink));
    engine.run(commands).await?;

    Ok(())
}

/// Translate terminal lines into engine commands on a blocking thread
fn spawn_stdin_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(8);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };

            let cmd = match line.trim() {
                "" => Command::Toggle,
                "r" => Command::Regenerate,
                "p" => Command::Replay,
                "b" => Command::Reset,
                "q" => return,
                other => {
                    eprintln!("unknown command {other:?} (Enter, r, p, b, q)");
                    continue;
                }
            };

            if tx.blocking_send(cmd).is_err() {
                break;
            }
        }
    });

    rx
}

/// Record for a few seconds and report the artifact
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    if !Recorder::request_permission() {
        anyhow::bail!("no input device available");
    }

    let mut recorder = Recorder::new();
    recorder.start()?;
    println!("recording for {duration}s...");
    tokio::time::sleep(Duration::from_secs(duration)).await;

    let artifact = recorder.stop()?;
    println!(
        "captured {} bytes of WAV at {} ({}Hz)",
        artifact.wav_bytes().len(),
        artifact.path().display(),
        SAMPLE_RATE
    );

    Ok(())
}

/// Play a short sine tone
fn test_speaker() -> anyhow::Result<()> {
    let playback = AudioPlayback::new()?;

    let samples: Vec<f32> = (0..24_000)
        .map(|i| {
            let t = i as f32 / 24_000.0;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();

    println!("playing test tone...");
    playback.play_samples(samples)?;
    Ok(())
}

/// Synthesize and speak a line of text
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let key = config.require_api_key()?;
    let tts = TextToSpeech::new(&config.api_base, key, &config.tts);

    println!("synthesizing...");
    let mp3 = tts.synthesize(text).await?;

    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3)?;
    Ok(())
}
