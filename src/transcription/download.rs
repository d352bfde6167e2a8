use super::error::TranscriptionError;
use super::model::Model;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches the raw bytes of a model (enables testing via mocking)
#[cfg_attr(test, mockall::automock)]
pub trait ModelSource {
    /// Download the full model binary
    ///
    /// # Errors
    /// Returns `DownloadFailed` on transport errors or non-success status
    fn fetch(&self, model: Model) -> Result<Vec<u8>, TranscriptionError>;
}

/// Downloads models over HTTPS from the whisper.cpp Hugging Face repository
pub struct HttpModelSource {
    client: reqwest::blocking::Client,
}

impl HttpModelSource {
    /// Creates a source with no request timeout (large models take minutes)
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl ModelSource for HttpModelSource {
    fn fetch(&self, model: Model) -> Result<Vec<u8>, TranscriptionError> {
        let url = model.url();
        let failed = |message: String| TranscriptionError::DownloadFailed {
            model: model.id().to_owned(),
            message,
        };

        tracing::info!(url = %url, "downloading model");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| failed(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(failed(format!(
                "download failed with status {}: {url}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| failed(format!("failed to read response body: {e}")))?;

        Ok(bytes.into())
    }
}

/// Ensures model files exist in the local cache, downloading them on demand
///
/// A download is buffered fully in memory before it is written, so peak
/// memory grows with model size (roughly 3 GB for `large-v3`). In exchange a
/// failed or cancelled transfer never leaves a file at the cache path.
///
/// Not safe for concurrent calls with the same model; callers serialize.
pub struct ModelProvisioner<S = HttpModelSource> {
    cache_dir: PathBuf,
    source: S,
}

impl ModelProvisioner<HttpModelSource> {
    /// Provisioner over `~/.cache/whisper` downloading from Hugging Face
    ///
    /// # Errors
    /// Returns error if HOME is unset or the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        Ok(Self::with_source(default_cache_dir()?, HttpModelSource::new()?))
    }
}

impl<S: ModelSource> ModelProvisioner<S> {
    /// Provisioner over an explicit cache directory and model source
    pub const fn with_source(cache_dir: PathBuf, source: S) -> Self {
        Self { cache_dir, source }
    }

    /// Directory holding the model files
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Deterministic location of a model in the cache
    #[must_use]
    pub fn model_path(&self, model: Model) -> PathBuf {
        self.cache_dir.join(model.filename())
    }

    /// Whether the model file is already present
    #[must_use]
    pub fn is_installed(&self, model: Model) -> bool {
        self.model_path(model).exists()
    }

    /// Known models present in the cache
    #[must_use]
    pub fn installed_models(&self) -> Vec<Model> {
        Model::all().filter(|model| self.is_installed(*model)).collect()
    }

    /// Ensures the model is present, returning its path
    ///
    /// Presence alone is sufficient; an existing file is never re-validated.
    ///
    /// # Errors
    /// Returns `DownloadFailed` if the transfer or the write fails
    pub fn ensure(&self, model: Model) -> Result<PathBuf, TranscriptionError> {
        let model_path = self.model_path(model);

        if model_path.exists() {
            tracing::info!(
                path = %model_path.display(),
                "model already exists, skipping download"
            );
            return Ok(model_path);
        }

        tracing::info!(
            model = model.id(),
            path = %model_path.display(),
            size_mb = model.size_mb(),
            "model not found, starting download"
        );
        announce_download(model);

        let bytes = self.source.fetch(model)?;
        write_model(model, &model_path, &bytes)?;

        tracing::info!(
            path = %model_path.display(),
            size = bytes.len(),
            "model downloaded successfully"
        );

        Ok(model_path)
    }
}

/// `~/.cache/whisper`
///
/// # Errors
/// Returns error if HOME is unset
pub fn default_cache_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".cache").join("whisper"))
}

#[allow(clippy::print_stderr)] // User-facing status line
fn announce_download(model: Model) {
    eprintln!(
        "Downloading whisper model '{}' (~{} MB), this may take a while...",
        model,
        model.size_mb()
    );
}

fn write_model(model: Model, model_path: &Path, bytes: &[u8]) -> Result<(), TranscriptionError> {
    let failed = |message: String| TranscriptionError::DownloadFailed {
        model: model.id().to_owned(),
        message,
    };

    if let Some(parent) = model_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            failed(format!(
                "failed to create model directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    // Write next to the target and rename so the cache never holds a partial model
    let temp_path = model_path.with_extension("part");

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.flush()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(failed(format!(
            "failed to write model to {}: {e}",
            temp_path.display()
        )));
    }

    fs::rename(&temp_path, model_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        failed(format!(
            "failed to rename {} to {}: {e}",
            temp_path.display(),
            model_path.display()
        ))
    })
}
