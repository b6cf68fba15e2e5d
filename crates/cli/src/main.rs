//! read-along entry point

mod control;
mod render;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use read_along_config::{load_settings, Settings};
use read_along_core::{PlaybackMode, SpeechEngine};
use read_along_persistence::{JsonProfileStore, ProfileStore, VoiceProfile};
use read_along_pipeline::playback::{PlaybackController, RodioBackend};
use read_along_pipeline::synthesis::{RateSpec, SpeechSynthesizer};
use read_along_pipeline::timing;

#[derive(Debug, Parser)]
#[command(name = "read-along", version)]
#[command(about = "Read text aloud with word-level karaoke highlighting")]
struct Cli {
    /// Text to read; stdin is read when neither TEXT nor --file is given
    text: Option<String>,

    /// Read the text from a file
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Voice identifier, e.g. en-US-AriaNeural (defaults to the saved profile)
    #[arg(long)]
    voice: Option<String>,

    /// Rate spec, a signed percentage like +0% (defaults to the saved profile)
    #[arg(long)]
    rate: Option<String>,

    /// Presentation mode to start in
    #[arg(long, value_enum, default_value = "karaoke")]
    mode: ModeArg,

    /// Voice profile file
    #[arg(long, default_value = "user_profile.json")]
    profile: PathBuf,

    /// Configuration environment name (loads config/{name}.toml)
    #[arg(long)]
    env: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Plain,
    Karaoke,
}

impl From<ModeArg> for PlaybackMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plain => PlaybackMode::Plain,
            ModeArg::Karaoke => PlaybackMode::Karaoke,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.env.as_deref()).context("loading configuration")?;
    init_tracing(&settings);
    tracing::info!("read-along v{}", env!("CARGO_PKG_VERSION"));

    let text = read_input_text(&cli).await?;

    let store = JsonProfileStore::new(&cli.profile);
    let profile = store.load().await;

    let voice = cli
        .voice
        .clone()
        .unwrap_or_else(|| profile.voice.clone());
    let rate_str = cli.rate.clone().unwrap_or_else(|| profile.rate.clone());
    let rate = RateSpec::from_str(&rate_str).context("invalid --rate")?;

    let synthesizer = SpeechSynthesizer::from_settings(&settings);
    let outcome = synthesizer
        .synthesize(&text, &voice, rate)
        .await
        .context("speech synthesis failed")?;

    println!(
        "Synthesized {:.1}s of audio via the {} engine.",
        outcome.track.duration_secs, outcome.track.engine
    );
    if outcome.track.engine == SpeechEngine::Espeak && rate_str != "+0%" {
        println!("Note: the fallback engine speaks at a fixed rate; the requested rate was not applied.");
    }

    let table = match &outcome.word_marks {
        Some(marks) => timing::from_word_marks(marks, outcome.track.duration_secs),
        None => timing::estimate(&text, outcome.track.duration_secs),
    };

    let backend = Arc::new(RodioBackend::new().context("opening audio output device")?);
    let controller = Arc::new(PlaybackController::new(
        outcome.track,
        table,
        backend,
        &settings.playback,
    ));

    control::run(controller, &settings, cli.mode.into()).await?;

    store
        .save(&VoiceProfile::new(voice, rate_str))
        .await
        .context("saving voice profile")?;

    Ok(())
}

async fn read_input_text(cli: &Cli) -> anyhow::Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    if let Some(path) = &cli.file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()));
    }

    use tokio::io::AsyncReadExt;
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("reading stdin")?;
    Ok(text)
}

/// Initialize tracing with env-filter and optional JSON output
///
/// Logs go to stderr so they do not tear the karaoke line on stdout.
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("read_along={}", settings.observability.log_level).into());

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
