use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use whisper_minutes::config::Config;
use whisper_minutes::document::{self, Summary};
use whisper_minutes::telemetry;
use whisper_minutes::transcription::{ModelProvisioner, Segment, Transcriber};

const USAGE: &str = "usage: whisper-minutes <audio> <summary.json> [output.md]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    telemetry::init(&config.telemetry, config.transcription.verbosity)?;

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(audio_path), Some(summary_path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let output_path = args
        .next()
        .unwrap_or_else(|| audio_path.with_extension("md"));

    tracing::info!(
        audio = %audio_path.display(),
        model = %config.model.name,
        "whisper-minutes starting"
    );

    let segments = transcribe(&config, audio_path.clone()).await?;

    let mut summary = Summary::from_json_file(&summary_path)?;
    fill_summary_defaults(&mut summary, &audio_path, &segments);

    let contents = document::render(&summary, &segments, &config.document);
    document::write_document(&output_path, &contents)?;

    tracing::info!(path = %output_path.display(), segments = segments.len(), "done");
    Ok(())
}

/// Runs provisioning and transcription off the async runtime; Ctrl+C kills the recognizer
async fn transcribe(config: &Config, audio_path: PathBuf) -> Result<Vec<Segment>> {
    let model = config.model.name;
    // The blocking HTTP client must be created and dropped off the runtime
    let model_path = tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let provisioner = ModelProvisioner::new()?;
        Ok(provisioner.ensure(model)?)
    })
    .await
    .context("model download task failed")??;

    let transcriber = Transcriber::new(
        config.model.executable.clone(),
        model_path,
        config.transcription.verbosity,
    );
    let handle = transcriber.termination_handle();
    let mut job = tokio::task::spawn_blocking(move || transcriber.transcribe(&audio_path));

    let result = tokio::select! {
        result = &mut job => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            handle.terminate();
            // Wait for cleanup of the output file and reader thread
            job.await
        }
    };

    Ok(result.context("transcription task failed")??)
}

/// Fills fields the summary producer left empty from the transcript itself
fn fill_summary_defaults(summary: &mut Summary, audio_path: &Path, segments: &[Segment]) {
    if summary.title.trim().is_empty() {
        summary.title = document::default_title(audio_path);
    }
    if summary.confidence.trim().is_empty() {
        summary.confidence = document::confidence_rating(segments);
    }
    if summary.duration.trim().is_empty() {
        let end = segments.iter().map(|s| s.end).fold(0.0, f64::max);
        summary.duration = document::format_timestamp(end);
    }
}
