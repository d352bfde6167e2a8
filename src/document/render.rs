use super::format::format_timestamp;
use super::summary::{ActionItem, Summary};
use crate::transcription::Segment;
use serde::Deserialize;

/// Prefix marking a segment below the confidence threshold
pub const LOW_CONFIDENCE_MARKER: &str = "⚠️ ";

/// Notice rendered in place of an empty action table
pub const NO_ACTION_ITEMS: &str = "_No action items._";

/// Markdown line break
const LINE_BREAK: &str = "  \n";

/// Transcript rendering options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Segments below this confidence are marked or dropped
    pub confidence_threshold: f64,
    /// Prefix each transcript line with its start time
    pub include_timestamps: bool,
    /// Keep low-confidence segments (marked) instead of dropping them
    pub include_low_confidence: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            include_timestamps: true,
            include_low_confidence: true,
        }
    }
}

/// Renders the summary and transcript as one markdown document
#[must_use]
pub fn render(summary: &Summary, segments: &[Segment], options: &DocumentOptions) -> String {
    let mut doc = String::new();
    render_header(&mut doc, summary);
    render_summary(&mut doc, summary);
    render_transcript(&mut doc, segments, options);
    doc
}

fn render_header(doc: &mut String, summary: &Summary) {
    doc.push_str(&format!("# {}\n\n", summary.title));

    if let Some(date) = summary.date.as_deref().filter(|d| !d.trim().is_empty()) {
        doc.push_str(&format!("**Date:** {date}{LINE_BREAK}"));
    }
    doc.push_str(&format!("**Duration:** {}{LINE_BREAK}", summary.duration));
    if !summary.participants.is_empty() {
        let participants = summary.participants.join(", ");
        doc.push_str(&format!("**Participants:** {participants}{LINE_BREAK}"));
    }
    doc.push_str(&format!("**Confidence:** {}{LINE_BREAK}", summary.confidence));
    doc.push('\n');
}

fn render_summary(doc: &mut String, summary: &Summary) {
    doc.push_str("## Summary\n\n");

    if let Some(agenda) = summary.agenda.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        doc.push_str(&format!("### Agenda\n\n{agenda}\n\n"));
    }

    doc.push_str("### Key Points\n\n");
    let key_points = &summary.key_points;
    render_bullets(doc, "Decisions", &key_points.decisions);
    render_bullets(doc, "Discussions", &key_points.discussions);
    render_bullets(doc, "Unresolved Questions", &key_points.unresolved_questions);

    doc.push_str(&format!("### Themes and Tone\n\n{}\n\n", summary.themes_and_tone.trim()));

    doc.push_str("### Action Items\n\n");
    render_actions(doc, &summary.actions);

    doc.push_str(&format!("### Conclusion\n\n{}\n\n", summary.conclusion.trim()));
}

fn render_bullets(doc: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    doc.push_str(&format!("#### {heading}\n\n"));
    for item in items {
        doc.push_str(&format!("- {item}\n"));
    }
    doc.push('\n');
}

fn render_actions(doc: &mut String, actions: &[ActionItem]) {
    if actions.is_empty() {
        doc.push_str(&format!("{NO_ACTION_ITEMS}\n\n"));
        return;
    }

    doc.push_str("| Action | Assignee | Due Date |\n");
    doc.push_str("|--------|----------|----------|\n");
    for action in actions {
        doc.push_str(&format!(
            "| {} | {} | {} |\n",
            table_cell(Some(action.description.as_str())),
            table_cell(action.assignee.as_deref()),
            table_cell(action.due_date.as_deref()),
        ));
    }
    doc.push('\n');
}

/// Escapes pipes; missing or blank values become `-`
fn table_cell(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.replace('|', "\\|").replace('\n', " "),
        _ => "-".to_owned(),
    }
}

fn render_transcript(doc: &mut String, segments: &[Segment], options: &DocumentOptions) {
    doc.push_str("## Transcript\n\n");
    for segment in segments {
        if let Some(line) = transcript_line(segment, options) {
            doc.push_str(&line);
        }
    }
}

/// One transcript line, or `None` when the segment is filtered out
#[must_use]
pub fn transcript_line(segment: &Segment, options: &DocumentOptions) -> Option<String> {
    let low_confidence = segment.confidence < options.confidence_threshold;
    if low_confidence && !options.include_low_confidence {
        return None;
    }

    let mut line = String::new();
    if low_confidence {
        line.push_str(LOW_CONFIDENCE_MARKER);
    }
    if options.include_timestamps {
        line.push_str(&format!("[{}] ", format_timestamp(segment.start)));
    }
    if let Some(speaker) = &segment.speaker {
        line.push_str(&format!("**{speaker}:** "));
    }
    line.push_str(&segment.text);
    line.push_str(LINE_BREAK);
    Some(line)
}
