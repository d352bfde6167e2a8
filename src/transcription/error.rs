use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning a model or running the recognizer
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// Recognizer executable could not be resolved on `PATH`
    #[error("recognizer executable `{executable}` not found on PATH")]
    EngineNotFound {
        /// Executable name or path that was looked up
        executable: String,
    },

    /// Model file is missing at the resolved path
    #[error("model not found at {}", path.display())]
    ModelNotFound {
        /// Expected model location
        path: PathBuf,
    },

    /// Model download failed (transport, status or filesystem)
    #[error("failed to download model {model}: {message}")]
    DownloadFailed {
        /// Model identifier
        model: String,
        /// Diagnostic message
        message: String,
    },

    /// Recognizer exited unsuccessfully
    #[error("transcription failed: {diagnostics}")]
    TranscriptionFailed {
        /// Captured diagnostic output, verbatim
        diagnostics: String,
    },

    /// Recognizer output could not be read or decoded
    #[error("failed to parse recognizer output {}: {failure}", path.display())]
    Parse {
        /// Output file that was expected
        path: PathBuf,
        /// Which expectation failed
        failure: ParseFailure,
    },
}

/// Reason a recognizer output file could not be turned into segments
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// File missing or unreadable
    #[error("output file unreadable: {0}")]
    Unreadable(#[source] std::io::Error),

    /// File present but JSON does not match the expected schema
    #[error("schema mismatch: {0}")]
    Schema(String),
}
