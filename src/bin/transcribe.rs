use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use narvik::application::ports::{AudioNormalizer, RecognitionClient};
use narvik::domain::{AudioBlob, LanguageTag, PcmSpec, RecognitionConfig, SpeakerDiarization};
use narvik::infrastructure::audio::SymphoniaNormalizer;
use narvik::infrastructure::observability::{TracingConfig, init_tracing};
use narvik::infrastructure::speech::{Credentials, GoogleSpeechClient};
use narvik::presentation::{Environment, Settings};

#[derive(Parser)]
#[command(name = "transcribe", about = "One-shot speech transcription for a local audio file")]
struct Cli {
    /// Path to the audio file to transcribe
    file: PathBuf,

    /// Recognition language tag, e.g. ru-RU
    #[arg(short, long)]
    language: Option<String>,

    /// Recognition model
    #[arg(short, long)]
    model: Option<String>,

    /// Disable automatic punctuation
    #[arg(long)]
    no_punctuation: bool,

    /// Mask profanity in the transcript
    #[arg(long)]
    profanity_filter: bool,

    /// Include per-word time offsets
    #[arg(long)]
    word_time_offsets: bool,

    /// Label speakers; expects the expected number of speakers (at least 2)
    #[arg(long, value_name = "COUNT")]
    speakers: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let settings = Settings::load(environment)?;

    init_tracing(TracingConfig {
        environment: environment.to_string(),
        json_format: settings.logging.json,
        level: settings.logging.level.clone(),
    });

    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let filename = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .context("input path has no usable file name")?
        .to_string();
    let blob = AudioBlob::new(filename, bytes);
    let format = blob
        .format()
        .with_context(|| format!("unrecognized audio extension: {}", cli.file.display()))?;

    let language_raw = cli
        .language
        .unwrap_or_else(|| settings.transcription.default_language.clone());
    let language = LanguageTag::parse(&language_raw)
        .with_context(|| format!("invalid language tag: {language_raw}"))?;

    let diarization = match cli.speakers {
        Some(count) if count >= 2 => Some(SpeakerDiarization {
            speaker_count: count,
        }),
        Some(_) => anyhow::bail!("--speakers must be at least 2"),
        None => None,
    };
    let config = RecognitionConfig {
        language,
        punctuation: !cli.no_punctuation,
        profanity_filter: cli.profanity_filter,
        word_time_offsets: cli.word_time_offsets,
        model: cli
            .model
            .unwrap_or_else(|| settings.transcription.default_model.clone()),
        diarization,
    };

    let google_credentials = settings
        .provider
        .google_credentials
        .clone()
        .or_else(|| std::env::var("GOOGLE_APPLICATION_CREDENTIALS").ok());
    let credentials = Credentials::resolve(
        google_credentials.as_deref(),
        settings.provider.api_key.as_deref(),
    )?;
    let client = GoogleSpeechClient::new(
        credentials,
        settings.provider.endpoint.clone(),
        Duration::from_secs(settings.provider.timeout_secs),
    )?;

    let target = PcmSpec::new(settings.audio.sample_rate_hz, settings.audio.channels);
    tracing::info!(file = %cli.file.display(), %format, "Normalizing audio");
    let normalizer = SymphoniaNormalizer::new();
    let normalized = normalizer.normalize(&blob, target)?;
    tracing::info!(seconds = normalized.duration_seconds(), "Audio normalized");

    let result = client.recognize(&normalized, &config).await?;

    let output_path = cli.file.with_extension("json");
    let payload = serde_json::to_string_pretty(&result)?;
    std::fs::write(&output_path, payload)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    let transcript = result.best_transcript();
    if transcript.is_empty() {
        println!("(no speech recognized)");
    } else {
        println!("{transcript}");
    }
    println!(
        "{} segment(s) written to {}",
        result.segments.len(),
        output_path.display()
    );

    Ok(())
}
