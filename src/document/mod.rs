/// Duration, timestamp, confidence and title formatting
pub mod format;
/// Markdown rendering
pub mod render;
/// Externally produced meeting summary
pub mod summary;

pub use format::{confidence_rating, default_title, format_duration, format_timestamp};
pub use render::{render, DocumentOptions};
pub use summary::{ActionItem, KeyPoints, Summary};

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes the document so readers never observe a partial file
///
/// Content goes to a hidden sibling first and is renamed into place.
///
/// # Errors
/// Returns error if the directory cannot be created or the write fails
pub fn write_document(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("invalid document path {}", path.display()))?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("failed to write {}", temp_path.display()));
    }

    fs::rename(&temp_path, path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("failed to rename {} to {}", temp_path.display(), path.display())
    })?;

    tracing::info!(path = %path.display(), bytes = contents.len(), "document written");
    Ok(())
}
