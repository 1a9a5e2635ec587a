//! Shared utilities for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pt_core::SessionResult;

/// Renders a session summary as pretty-printed JSON.
pub fn summary_json(result: &SessionResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize session summary")
}

/// Writes a session summary file.
pub fn write_summary(path: &Path, result: &SessionResult) -> Result<()> {
    let mut json = summary_json(result)?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote session summary");
    Ok(())
}

/// Removes a file, adding the path to any error.
pub fn remove_input(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("failed to delete {}", path.display()))
}
