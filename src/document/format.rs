use crate::transcription::Segment;
use std::path::Path;

/// `H:MM:SS` from one hour up, `M:SS` below
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Segment offset, truncated to whole seconds
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_timestamp(seconds: f64) -> String {
    format_duration(seconds.max(0.0).floor() as u64)
}

/// Average segment confidence as `"{pct}% ({bucket})"`, or `N/A` when empty
#[must_use]
pub fn confidence_rating(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "N/A".to_owned();
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = segments.iter().map(|s| s.confidence).sum::<f64>() / segments.len() as f64;
    let percentage = confidence_percentage(mean);
    format!("{percentage}% ({})", confidence_bucket(percentage))
}

/// Absorbs summation noise so a mean of exactly 0.76 is not shown as 75%
const PERCENT_EPSILON: f64 = 1e-9;

#[allow(clippy::cast_possible_truncation)]
fn confidence_percentage(mean: f64) -> i64 {
    (mean * 100.0 + PERCENT_EPSILON).floor() as i64
}

const fn confidence_bucket(percentage: i64) -> &'static str {
    match percentage {
        95.. => "Excellent",
        85..=94 => "Good",
        70..=84 => "Fair",
        _ => "Poor",
    }
}

/// Title from a file name: `weekly_team-sync.wav` becomes `Weekly Team Sync`
#[must_use]
pub fn default_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default();

    stem.split(' ').map(title_case_word).collect::<Vec<_>>().join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}
