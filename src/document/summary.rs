use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Meeting summary produced outside this crate (e.g. by an LLM)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Summary {
    /// Document title
    pub title: String,
    /// Meeting date, free-form
    pub date: Option<String>,
    /// Pre-formatted duration
    pub duration: String,
    /// Participants in display order
    pub participants: Vec<String>,
    /// Confidence rating string, e.g. `92% (Good)`
    pub confidence: String,
    /// Agenda narrative
    pub agenda: Option<String>,
    /// Decisions, discussions and open questions
    pub key_points: KeyPoints,
    /// Themes and tone narrative
    pub themes_and_tone: String,
    /// Action items in order
    pub actions: Vec<ActionItem>,
    /// Closing narrative
    pub conclusion: String,
}

/// Key points, each rendered only when non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyPoints {
    /// Decisions made
    pub decisions: Vec<String>,
    /// Topics discussed
    pub discussions: Vec<String>,
    /// Questions left open
    pub unresolved_questions: Vec<String>,
}

/// A follow-up task
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionItem {
    /// What needs doing
    pub description: String,
    /// Who owns it
    pub assignee: Option<String>,
    /// When it is due
    pub due_date: Option<String>,
}

impl Summary {
    /// Reads a summary from a JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid summary
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read summary {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse summary {}", path.display()))?;
        // Derived structs also accept positional arrays
        if !value.is_object() {
            bail!("summary {} must be a JSON object", path.display());
        }
        serde_json::from_value(value)
            .with_context(|| format!("failed to parse summary {}", path.display()))
    }
}
