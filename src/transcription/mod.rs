/// Model download and caching
pub mod download;
/// Recognizer subprocess adapter
pub mod engine;
/// Transcription error types
pub mod error;
/// Supported whisper models
pub mod model;
/// Transcribed segments and recognizer output parsing
pub mod segment;

pub use download::{HttpModelSource, ModelProvisioner, ModelSource};
pub use engine::{TerminationHandle, Transcriber, Verbosity};
pub use error::{ParseFailure, TranscriptionError};
pub use model::Model;
pub use segment::Segment;
