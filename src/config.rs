use crate::document::DocumentOptions;
use crate::transcription::{engine::DEFAULT_EXECUTABLE, Model, Verbosity};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings loaded from `~/.whisper-minutes.toml`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Recognizer model and executable
    pub model: ModelConfig,
    /// Recognizer output handling
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    /// Document rendering
    #[serde(default)]
    pub document: DocumentOptions,
    /// Log output
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Which model to provision and which recognizer to run
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Model variant, e.g. `small` or `base.en`
    pub name: Model,
    /// Recognizer executable name or path
    #[serde(default = "default_executable")]
    pub executable: String,
}

/// Recognizer output handling
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionConfig {
    /// How much recognizer output to show
    #[serde(default)]
    pub verbosity: Verbosity,
}

/// Log output settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Append logs to `log_path` instead of stderr
    pub enabled: bool,
    /// Log file, `~/` expanded
    pub log_path: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: "~/.whisper-minutes/whisper-minutes.log".to_owned(),
        }
    }
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_owned()
}

const DEFAULT_CONFIG: &str = r#"[model]
name = "small"
executable = "whisper-cli"

[transcription]
# normal | verbose | trace
verbosity = "normal"

[document]
confidence_threshold = 0.8
include_timestamps = true
include_low_confidence = true

[telemetry]
enabled = false
log_path = "~/.whisper-minutes/whisper-minutes.log"
"#;

impl Config {
    /// Load config from ~/.whisper-minutes.toml
    ///
    /// # Errors
    /// Returns error if HOME is unset or the file cannot be created, read or parsed
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default(&config_path).context("failed to create default config")?;
        }

        let contents = fs::read_to_string(&config_path).context("failed to read config file")?;

        Self::from_toml_str(&contents)
    }

    /// Parse config from TOML text
    ///
    /// # Errors
    /// Returns error if the TOML is invalid or names an unknown model
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config TOML")
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".whisper-minutes.toml"))
    }

    fn create_default(path: &Path) -> Result<()> {
        fs::write(path, DEFAULT_CONFIG).context("failed to write default config")?;
        tracing::info!(path = %path.display(), "wrote default config");
        Ok(())
    }

    /// Expand ~ in paths to home directory
    ///
    /// # Errors
    /// Returns error if the path starts with `~/` and HOME is unset
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if let Some(stripped) = path.strip_prefix("~/") {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            Ok(PathBuf::from(home).join(stripped))
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml_str(DEFAULT_CONFIG).unwrap();

        assert_eq!(config.model.name, Model::Small);
        assert_eq!(config.model.executable, "whisper-cli");
        assert_eq!(config.transcription.verbosity, Verbosity::Normal);
        assert_eq!(config.document, DocumentOptions::default());
        assert_eq!(config.telemetry, TelemetryConfig::default());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str("[model]\nname = \"base.en\"\n").unwrap();

        assert_eq!(config.model.name, Model::BaseEn);
        assert_eq!(config.model.executable, DEFAULT_EXECUTABLE);
        assert!(config.document.include_timestamps);
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_document_overrides() {
        let config = Config::from_toml_str(
            "[model]\nname = \"tiny\"\n\n[document]\nconfidence_threshold = 0.6\ninclude_low_confidence = false\n",
        )
        .unwrap();

        assert!((config.document.confidence_threshold - 0.6).abs() < f64::EPSILON);
        assert!(!config.document.include_low_confidence);
        assert!(config.document.include_timestamps);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = Config::from_toml_str("[model]\nname = \"gigantic\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("gigantic"));
    }

    #[test]
    fn test_unknown_verbosity_is_rejected() {
        let result = Config::from_toml_str(
            "[model]\nname = \"tiny\"\n\n[transcription]\nverbosity = \"loud\"\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let home = std::env::var("HOME").unwrap();
        assert_eq!(
            Config::expand_path("~/notes/out.md").unwrap(),
            PathBuf::from(home).join("notes/out.md")
        );
    }

    #[test]
    fn test_expand_path_without_tilde() {
        assert_eq!(
            Config::expand_path("/var/log/app.log").unwrap(),
            PathBuf::from("/var/log/app.log")
        );
    }
}
