//! Integration tests for document assembly: summary JSON in, markdown file out

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use whisper_minutes::document::{
    self, confidence_rating, default_title, format_duration, DocumentOptions, Summary,
};
use whisper_minutes::transcription::Segment;

const SUMMARY_JSON: &str = r#"{
    "title": "Weekly Team Sync",
    "date": "2026-10-19",
    "duration": "1:02:05",
    "participants": ["Ana", "Sam", "Lee"],
    "confidence": "82% (Fair)",
    "agenda": "Release readiness and hiring.",
    "key_points": {
        "decisions": ["Release 2.4 ships Friday", "Freeze merges Thursday"],
        "discussions": ["Flaky integration suite"],
        "unresolved_questions": []
    },
    "themes_and_tone": "Pragmatic and upbeat.",
    "actions": [
        {"description": "Fix flaky suite", "assignee": "Sam", "due_date": "Thursday"},
        {"description": "Draft release notes"}
    ],
    "conclusion": "Team is on track."
}"#;

fn segments() -> Vec<Segment> {
    vec![
        Segment::new(0.0, 4.2, "Morning, everyone.", 0.97),
        Segment::new(4.2, 9.8, "uh the the suite", 0.41),
        Segment::new(3725.0, 3731.5, "Let's wrap up.", 0.9),
    ]
}

fn summary() -> Summary {
    serde_json::from_str(SUMMARY_JSON).unwrap()
}

const EXPECTED: &str = concat!(
    "# Weekly Team Sync\n\n",
    "**Date:** 2026-10-19  \n",
    "**Duration:** 1:02:05  \n",
    "**Participants:** Ana, Sam, Lee  \n",
    "**Confidence:** 82% (Fair)  \n\n",
    "## Summary\n\n",
    "### Agenda\n\n",
    "Release readiness and hiring.\n\n",
    "### Key Points\n\n",
    "#### Decisions\n\n",
    "- Release 2.4 ships Friday\n",
    "- Freeze merges Thursday\n\n",
    "#### Discussions\n\n",
    "- Flaky integration suite\n\n",
    "### Themes and Tone\n\n",
    "Pragmatic and upbeat.\n\n",
    "### Action Items\n\n",
    "| Action | Assignee | Due Date |\n",
    "|--------|----------|----------|\n",
    "| Fix flaky suite | Sam | Thursday |\n",
    "| Draft release notes | - | - |\n\n",
    "### Conclusion\n\n",
    "Team is on track.\n\n",
    "## Transcript\n\n",
    "[0:00] Morning, everyone.  \n",
    "⚠️ [0:04] uh the the suite  \n",
    "[1:02:05] Let's wrap up.  \n",
);

#[test]
fn test_full_document_layout() {
    let doc = document::render(&summary(), &segments(), &DocumentOptions::default());
    assert_eq!(doc, EXPECTED);
}

#[test]
fn test_low_confidence_excluded_without_timestamps() {
    let options = DocumentOptions {
        confidence_threshold: 0.8,
        include_timestamps: false,
        include_low_confidence: false,
    };

    let doc = document::render(&summary(), &segments(), &options);
    let transcript = doc.split("## Transcript\n\n").nth(1).unwrap();

    assert_eq!(transcript, "Morning, everyone.  \nLet's wrap up.  \n");
}

#[test]
fn test_empty_actions_and_transcript() {
    let mut summary = summary();
    summary.actions.clear();

    let doc = document::render(&summary, &[], &DocumentOptions::default());

    assert!(doc.contains("### Action Items\n\n_No action items._\n"));
    assert!(!doc.contains("| Action | Assignee | Due Date |"));
    assert!(doc.ends_with("## Transcript\n\n"));
}

#[test]
fn test_summary_file_rendered_to_disk() {
    let temp_dir = TempDir::new().unwrap();
    let summary_path = temp_dir.path().join("summary.json");
    fs::write(&summary_path, SUMMARY_JSON).unwrap();
    let output_path = temp_dir.path().join("out").join("weekly_team-sync.md");

    let summary = Summary::from_json_file(&summary_path).unwrap();
    let doc = document::render(&summary, &segments(), &DocumentOptions::default());
    document::write_document(&output_path, &doc).unwrap();

    assert_eq!(fs::read_to_string(&output_path).unwrap(), EXPECTED);
}

#[test]
fn test_metadata_helpers_for_a_recording() {
    let segments = segments();

    assert_eq!(
        default_title(Path::new("/recordings/weekly_team-sync.wav")),
        "Weekly Team Sync"
    );
    // (0.97 + 0.41 + 0.9) / 3 = 0.76
    assert_eq!(confidence_rating(&segments), "76% (Fair)");
    assert_eq!(format_duration(3731), "1:02:11");
}
