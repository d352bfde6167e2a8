use super::error::{ParseFailure, TranscriptionError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single transcribed segment with timing and confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognized text, trimmed
    pub text: String,
    /// Speaker label from a diarization pass, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Confidence in `[0, 1]`
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

const fn default_confidence() -> f64 {
    1.0
}

impl Segment {
    /// Segment without speaker label
    pub fn new(start: f64, end: f64, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            speaker: None,
            confidence,
        }
    }

    /// Segment duration in seconds
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// JSON document written by the recognizer with `-oj`
#[derive(Debug, Deserialize)]
struct RecognizerOutput {
    #[serde(alias = "segments")]
    transcription: Vec<RecognizerRecord>,
}

/// One record; times are integer centiseconds
#[derive(Debug, Deserialize)]
struct RecognizerRecord {
    t0: u32,
    t1: u32,
    text: String,
    #[serde(default)]
    p: Option<f64>,
}

impl RecognizerRecord {
    fn into_segment(self) -> Segment {
        Segment::new(
            centiseconds_to_seconds(self.t0),
            centiseconds_to_seconds(self.t1),
            self.text.trim(),
            self.p.unwrap_or_else(default_confidence),
        )
    }
}

fn centiseconds_to_seconds(value: u32) -> f64 {
    f64::from(value) / 100.0
}

/// Reads and decodes a recognizer JSON output file
///
/// # Errors
/// Returns `Parse` with `Unreadable` if the file cannot be read, or `Schema`
/// if required fields are missing, mistyped, or a record ends before it starts
pub fn read_segments(path: &Path) -> Result<Vec<Segment>, TranscriptionError> {
    let contents = fs::read_to_string(path).map_err(|e| TranscriptionError::Parse {
        path: path.to_path_buf(),
        failure: ParseFailure::Unreadable(e),
    })?;

    parse_segments(&contents).map_err(|failure| TranscriptionError::Parse {
        path: path.to_path_buf(),
        failure,
    })
}

/// Decodes recognizer JSON into segments, preserving engine order
///
/// # Errors
/// Returns `ParseFailure::Schema` on any schema mismatch
pub fn parse_segments(json: &str) -> Result<Vec<Segment>, ParseFailure> {
    let output: RecognizerOutput =
        serde_json::from_str(json).map_err(|e| ParseFailure::Schema(e.to_string()))?;

    output
        .transcription
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            if record.t1 < record.t0 {
                return Err(ParseFailure::Schema(format!(
                    "record {index} ends ({}) before it starts ({})",
                    record.t1, record.t0
                )));
            }
            Ok(record.into_segment())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_converts_centiseconds_and_trims() {
        let segments =
            parse_segments(r#"{"transcription":[{"t0":150,"t1":320,"text":" hello ","p":null}]}"#)
                .unwrap();

        assert_eq!(segments, vec![Segment::new(1.5, 3.2, "hello", 1.0)]);
        assert!(segments[0].speaker.is_none());
    }

    #[test]
    fn test_missing_probability_defaults_to_one() {
        let segments =
            parse_segments(r#"{"transcription":[{"t0":0,"t1":100,"text":"hi"}]}"#).unwrap();
        assert!((segments[0].confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probability_is_kept() {
        let segments =
            parse_segments(r#"{"transcription":[{"t0":0,"t1":100,"text":"hi","p":0.42}]}"#)
                .unwrap();
        assert!((segments[0].confidence - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engine_order_is_preserved() {
        let json = r#"{"transcription":[
            {"t0":500,"t1":700,"text":"second"},
            {"t0":0,"t1":400,"text":"first"}
        ]}"#;
        let texts: Vec<String> = parse_segments(json)
            .unwrap()
            .into_iter()
            .map(|segment| segment.text)
            .collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn test_segments_alias_is_accepted() {
        let segments =
            parse_segments(r#"{"segments":[{"t0":0,"t1":100,"text":"hi"}]}"#).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_empty_transcription() {
        assert!(parse_segments(r#"{"transcription":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_missing_list_is_schema_error() {
        let err = parse_segments(r#"{"result":{"language":"en"}}"#).unwrap_err();
        assert!(matches!(err, ParseFailure::Schema(ref msg) if msg.contains("transcription")));
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let err =
            parse_segments(r#"{"transcription":[{"t0":"0","t1":100,"text":"hi"}]}"#).unwrap_err();
        assert!(matches!(err, ParseFailure::Schema(_)));
    }

    #[test]
    fn test_missing_text_is_schema_error() {
        let err = parse_segments(r#"{"transcription":[{"t0":0,"t1":100}]}"#).unwrap_err();
        assert!(matches!(err, ParseFailure::Schema(ref msg) if msg.contains("text")));
    }

    #[test]
    fn test_reversed_times_are_rejected() {
        let err =
            parse_segments(r#"{"transcription":[{"t0":300,"t1":100,"text":"hi"}]}"#).unwrap_err();
        assert!(matches!(err, ParseFailure::Schema(ref msg) if msg.contains("record 0")));
    }

    #[test]
    fn test_read_missing_file_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let err = read_segments(&path).unwrap_err();
        assert!(matches!(
            err,
            TranscriptionError::Parse { failure: ParseFailure::Unreadable(_), .. }
        ));
        assert!(err.to_string().contains("unreadable"));
    }

    #[test]
    fn test_read_malformed_file_is_schema_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_segments(&path).unwrap_err();
        assert!(err.to_string().contains("schema mismatch"));
    }

    #[test]
    fn test_duration() {
        let segment = Segment::new(1.5, 4.0, "x", 1.0);
        assert!((segment.duration() - 2.5).abs() < f64::EPSILON);
    }
}
