//! Whisper Minutes - meeting recordings to structured markdown
//!
//! Drives the whisper.cpp CLI to transcribe an audio file, then renders the
//! transcript together with an externally produced summary.

/// Configuration management
pub mod config;
/// Markdown document assembly
pub mod document;
/// Logging setup
pub mod telemetry;
/// Model provisioning and recognizer subprocess
pub mod transcription;
