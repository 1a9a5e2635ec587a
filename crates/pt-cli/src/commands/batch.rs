//! Batch command for summarizing every session archive in a data directory.
//!
//! Each `<key>.zip` holds a `<key>.json` record and a `<key>.log` recipe log.
//! Archives are handled one at a time; a failing session is logged and
//! counted, never fatal to the batch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pt_core::{SessionKey, summarize_session};

use crate::Config;
use crate::archive;
use crate::commands::util::{remove_input, write_summary};

/// Why an archive produced no summary without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Participant id too short: a legacy feasibility-study file.
    LegacyParticipant,
    /// A summary for this session already exists.
    AlreadySummarized,
    /// The archive did not contain the session record.
    MissingRecord,
    /// The archive did not contain the session log.
    MissingLog,
}

/// Result of handling one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Written(PathBuf),
    Skipped(SkipReason),
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Lists `*.zip` files directly inside `data_dir`, sorted by name.
fn list_archives(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("failed to read {}", data_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

/// Extracts, summarizes and cleans up one session archive.
pub fn process_archive(
    data_dir: &Path,
    archive_path: &Path,
    config: &Config,
    delete_inputs: bool,
) -> Result<ArchiveOutcome> {
    let key = SessionKey::from_archive(archive_path)?;
    let participant = key.participant()?;

    if participant.char_len() < config.min_participant_id_len {
        tracing::info!(session = %key, "file skipped (old file from feasibility study)");
        return Ok(ArchiveOutcome::Skipped(SkipReason::LegacyParticipant));
    }

    let output = data_dir.join(key.file_name(&config.output_suffix));
    if output.is_file() {
        tracing::info!(session = %key, "summary already available");
        return Ok(ArchiveOutcome::Skipped(SkipReason::AlreadySummarized));
    }

    archive::extract(archive_path, data_dir)?;
    tracing::debug!(session = %key, "archive extracted");

    let record = data_dir.join(key.file_name(".json"));
    let log = data_dir.join(key.file_name(".log"));

    if !record.is_file() {
        tracing::info!(session = %key, path = %record.display(), "record does not exist");
        return Ok(ArchiveOutcome::Skipped(SkipReason::MissingRecord));
    }

    if !log.is_file() {
        tracing::info!(session = %key, path = %log.display(), "log does not exist");
        remove_input(&record)?;
        return Ok(ArchiveOutcome::Skipped(SkipReason::MissingLog));
    }

    let reconciliation = summarize_session(&record, &log, &config.session_options())
        .with_context(|| format!("failed to summarize session {key}"))?;
    write_summary(&output, &reconciliation.result)?;

    if delete_inputs {
        remove_input(&record)?;
        remove_input(&log)?;
    }

    Ok(ArchiveOutcome::Written(output))
}

/// Runs the batch command over `data_dir`.
pub fn run<W: Write>(
    writer: &mut W,
    data_dir: &Path,
    config: &Config,
    keep_inputs: bool,
) -> Result<BatchSummary> {
    if !data_dir.is_dir() {
        anyhow::bail!("data folder not found: {}", data_dir.display());
    }
    tracing::info!(path = %data_dir.display(), "data path");

    let delete_inputs = config.delete_inputs && !keep_inputs;
    let mut summary = BatchSummary::default();

    for archive_path in list_archives(data_dir)? {
        tracing::info!(archive = %archive_path.display(), "parsing archive");
        match process_archive(data_dir, &archive_path, config, delete_inputs) {
            Ok(ArchiveOutcome::Written(_)) => summary.processed += 1,
            Ok(ArchiveOutcome::Skipped(reason)) => {
                tracing::debug!(?reason, archive = %archive_path.display(), "archive skipped");
                summary.skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    archive = %archive_path.display(),
                    error = %format!("{e:#}"),
                    "session failed"
                );
                summary.failed += 1;
            }
        }
    }

    writeln!(
        writer,
        "Processed {} session(s), skipped {}, failed {}.",
        summary.processed, summary.skipped, summary.failed
    )?;

    Ok(summary)
}
