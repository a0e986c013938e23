#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lector_core::{AudioEncoding, FixedSettings, SpeechSettings, Utterance};
use lector_speaker::{DeviceSinkFactory, Speaker, SpeakerEvent};
use lector_synth::{HttpUsageReporter, TtsClient};
use tokio::sync::mpsc;
use url::Url;

/// Command-line interface for the lector speech pipeline.
#[derive(Parser)]
#[command(name = "lector")]
#[command(about = "Read text aloud through a remote speech synthesizer")]
#[command(version)]
struct Cli {
    /// API key for the synthesis service
    #[arg(long, global = true, env = "LECTOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the synthesis endpoint
    #[arg(long, global = true, env = "LECTOR_ENDPOINT")]
    endpoint: Option<Url>,

    /// Report usage analytics to this endpoint
    #[arg(long, global = true, env = "LECTOR_USAGE_ENDPOINT")]
    usage_endpoint: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Speak an utterance through the default audio output
    Speak(SpeechArgs),

    /// Synthesize an utterance into an audio file without playing it
    Download {
        #[command(flatten)]
        args: SpeechArgs,

        /// Output file; defaults to speech.<ext> for the chosen encoding
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// What to say and how it should sound.
#[derive(Args)]
struct SpeechArgs {
    /// Text to read; omit to read from --file or stdin
    text: Option<String>,

    /// Read the utterance from a file instead
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Voice name, e.g. "en-GB-Standard-B"
    #[arg(long)]
    voice: Option<String>,

    /// BCP-47 language tag, e.g. "en-GB"
    #[arg(long)]
    language: Option<String>,

    /// Audio encoding: mp3, ogg-opus or linear16
    #[arg(long, default_value = "mp3")]
    encoding: AudioEncoding,

    /// Speaking rate multiplier
    #[arg(long, allow_negative_numbers = true)]
    rate: Option<f64>,

    /// Pitch offset in semitones
    #[arg(long, allow_negative_numbers = true)]
    pitch: Option<f64>,

    /// Volume gain in dB
    #[arg(long, allow_negative_numbers = true)]
    gain: Option<f64>,

    /// Server-side audio effects profile; repeat for several
    #[arg(long = "effects-profile")]
    effects_profile: Vec<String>,
}

impl SpeechArgs {
    /// Overlay these arguments onto the built-in defaults.
    fn settings(&self, api_key: Option<&str>) -> anyhow::Result<SpeechSettings> {
        let defaults = SpeechSettings::default();
        let settings = SpeechSettings {
            credential: api_key.map(str::to_owned),
            voice: self.voice.clone().unwrap_or(defaults.voice),
            language: self.language.clone().unwrap_or(defaults.language),
            encoding: self.encoding,
            pitch: self.pitch.unwrap_or(defaults.pitch),
            rate: self.rate.unwrap_or(defaults.rate),
            gain: self.gain.unwrap_or(defaults.gain),
            effects_profile: self.effects_profile.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Utterance text from the positional argument, the file, or stdin.
    fn read_text(&self) -> anyhow::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()));
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("cannot read stdin")?;
        Ok(text)
    }
}

/// Wire the synthesis client, settings and audio device into a speaker.
fn build_speaker(
    cli: &Cli,
    args: &SpeechArgs,
) -> anyhow::Result<(Speaker, mpsc::UnboundedReceiver<SpeakerEvent>)> {
    let settings = args.settings(cli.api_key.as_deref())?;

    let mut client = TtsClient::new();
    if let Some(endpoint) = &cli.endpoint {
        client = client.endpoint(endpoint.clone());
    }
    if let Some(usage) = &cli.usage_endpoint {
        client = client.reporter(Arc::new(HttpUsageReporter::new(usage.clone())));
    }

    Ok(Speaker::new(
        Arc::new(client),
        Arc::new(FixedSettings::new(settings)),
        Arc::new(DeviceSinkFactory),
    ))
}

/// Forward speaker events to the terminal until the channel closes.
fn spawn_event_printer(
    mut events: mpsc::UnboundedReceiver<SpeakerEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SpeakerEvent::StateChanged { playing } => {
                    tracing::info!(playing, "playback state changed");
                }
                SpeakerEvent::Trouble { title, detail } => {
                    eprintln!("{title}: {detail}");
                }
            }
        }
    })
}

async fn run_speak(cli: &Cli, args: &SpeechArgs) -> anyhow::Result<()> {
    let text = args.read_text()?;
    let (speaker, events) = build_speaker(cli, args)?;
    let printer = spawn_event_printer(events);

    let outcome = {
        let speech = speaker.speak(Utterance::new(text, args.encoding));
        tokio::pin!(speech);
        tokio::select! {
            outcome = &mut speech => outcome,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, stopping playback");
                speaker.stop().await;
                speech.await
            }
        }
    };

    // Dropping the speaker closes the event channel; the printer drains and exits.
    drop(speaker);
    let _ = printer.await;
    Ok(outcome?)
}

async fn run_download(cli: &Cli, args: &SpeechArgs, out: Option<&Path>) -> anyhow::Result<()> {
    let text = args.read_text()?;
    let (speaker, events) = build_speaker(cli, args)?;
    let printer = spawn_event_printer(events);

    let downloaded = speaker.download(Utterance::new(text, args.encoding)).await;
    drop(speaker);
    let _ = printer.await;
    let clip = downloaded?;

    let path = match out {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(format!("speech.{}", args.encoding.extension())),
    };
    tokio::fs::write(&path, &clip.bytes)
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote {} bytes to {}", clip.len(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Speak(args) => run_speak(&cli, args).await,
        Commands::Download { args, out } => run_download(&cli, args, out.as_deref()).await,
    }
}
