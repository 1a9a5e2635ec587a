//! Recipe log scanning.
//!
//! The companion log is free text. Each line starts with a parenthesized
//! timestamp ahead of the first comma, and recipe lifecycle lines carry an
//! event marker such as `Recipe (Id:7)`. A single pass collects the first and
//! last timestamps and tallies recipe outcomes.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Marker identifying recipe lifecycle lines.
pub const DEFAULT_EVENT_MARKER: &str = "Recipe (Id:";

/// Value written for every log-derived field when the log file is missing.
pub const LOG_UNAVAILABLE: &str = "logfile not available";

/// Buffer size for `BufReader` (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("log file has no non-empty lines")]
    Empty,
    #[error("no parenthesized timestamp on line {line_number}")]
    MissingTimestamp { line_number: usize },
}

/// Outcome of one recipe lifecycle line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Started,
    Succeeded,
    Failed,
    Errored,
}

impl Outcome {
    /// Keywords in priority order; the first one found in a line wins.
    const KEYWORDS: [(&'static str, Self); 5] = [
        ("started", Self::Started),
        ("Success", Self::Succeeded),
        ("Fail", Self::Failed),
        ("Exit", Self::Errored),
        ("Error", Self::Errored),
    ];

    /// Classifies a line by its outcome keyword, if any.
    pub fn from_line(line: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| line.contains(keyword))
            .map(|&(_, outcome)| outcome)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single log line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// No event marker; ignored by the tally.
    NotEvent,
    /// A recipe line with a recognized outcome.
    Event(Outcome),
    /// A recipe line with no recognized outcome.
    Malformed,
}

/// Classifies a log line against the event marker.
pub fn classify_line(line: &str, marker: &str) -> LineClass {
    if !line.contains(marker) {
        return LineClass::NotEvent;
    }
    Outcome::from_line(line).map_or(LineClass::Malformed, LineClass::Event)
}

/// Extracts the recipe id that follows the marker, e.g. `7` in `Recipe (Id:7)`.
pub fn recipe_id<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let (_, after) = line.split_once(marker)?;
    let (id, _) = after.split_once(')')?;
    Some(id.trim())
}

/// Extracts the timestamp between the first `(` and the next `)` that
/// precede the first comma of a line.
pub fn extract_timestamp(line: &str) -> Option<&str> {
    let head = line.split_once(',').map_or(line, |(head, _)| head);
    let (_, after_open) = head.split_once('(')?;
    let (timestamp, _) = after_open.split_once(')')?;
    Some(timestamp)
}

/// Recipe outcome counts for one log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogTally {
    pub started: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub errored: u32,
}

impl LogTally {
    fn record(&mut self, outcome: Outcome) {
        let bucket = match outcome {
            Outcome::Started => &mut self.started,
            Outcome::Succeeded => &mut self.succeeded,
            Outcome::Failed => &mut self.failed,
            Outcome::Errored => &mut self.errored,
        };
        *bucket = bucket.saturating_add(1);
    }

    /// Sum of all buckets.
    pub const fn total(&self) -> u32 {
        self.started
            .saturating_add(self.succeeded)
            .saturating_add(self.failed)
            .saturating_add(self.errored)
    }
}

/// Timestamps from the first and last non-empty log lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSpan {
    pub first_timestamp: String,
    pub last_timestamp: String,
}

/// Everything a log scan produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogScan {
    pub span: LogSpan,
    pub tally: LogTally,
    /// Recipe lines skipped because no outcome keyword matched.
    pub malformed_lines: u32,
}

/// Log-derived evidence for a session, or the fact that there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvidence {
    Available(LogScan),
    Unavailable,
}

impl LogEvidence {
    pub const fn tally(&self) -> Option<&LogTally> {
        match self {
            Self::Available(scan) => Some(&scan.tally),
            Self::Unavailable => None,
        }
    }

    pub const fn span(&self) -> Option<&LogSpan> {
        match self {
            Self::Available(scan) => Some(&scan.span),
            Self::Unavailable => None,
        }
    }
}

impl Serialize for LogEvidence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("LogEvidence", 6)?;
        match self {
            Self::Available(scan) => {
                state.serialize_field("firstTimestamp", &scan.span.first_timestamp)?;
                state.serialize_field("lastTimestamp", &scan.span.last_timestamp)?;
                state.serialize_field("started", &scan.tally.started)?;
                state.serialize_field("succeeded", &scan.tally.succeeded)?;
                state.serialize_field("failed", &scan.tally.failed)?;
                state.serialize_field("errored", &scan.tally.errored)?;
            }
            Self::Unavailable => {
                for field in [
                    "firstTimestamp",
                    "lastTimestamp",
                    "started",
                    "succeeded",
                    "failed",
                    "errored",
                ] {
                    state.serialize_field(field, LOG_UNAVAILABLE)?;
                }
            }
        }
        state.end()
    }
}

fn boundary_timestamp(line_number: usize, line: &str) -> Result<String, LogError> {
    extract_timestamp(line)
        .map(str::to_string)
        .ok_or(LogError::MissingTimestamp { line_number })
}

/// Scans a log in one pass.
pub fn scan_log<R: BufRead>(reader: R, marker: &str) -> Result<LogScan, LogError> {
    let mut tally = LogTally::default();
    let mut malformed_lines = 0u32;
    let mut first: Option<(usize, String)> = None;
    let mut last: Option<(usize, String)> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = idx + 1;

        if line.trim().is_empty() {
            continue;
        }

        match classify_line(&line, marker) {
            LineClass::Event(outcome) => tally.record(outcome),
            LineClass::Malformed => {
                malformed_lines = malformed_lines.saturating_add(1);
                tracing::warn!(
                    line_number,
                    recipe_id = recipe_id(&line, marker).unwrap_or("?"),
                    line = %line,
                    "invalid recipe state"
                );
            }
            LineClass::NotEvent => {}
        }

        if first.is_none() {
            first = Some((line_number, line.clone()));
        }
        last = Some((line_number, line));
    }

    let ((first_number, first_line), (last_number, last_line)) =
        first.zip(last).ok_or(LogError::Empty)?;

    let span = LogSpan {
        first_timestamp: boundary_timestamp(first_number, &first_line)?,
        last_timestamp: boundary_timestamp(last_number, &last_line)?,
    };

    tracing::debug!(
        started = tally.started,
        succeeded = tally.succeeded,
        failed = tally.failed,
        errored = tally.errored,
        malformed_lines,
        "scanned recipe log"
    );

    Ok(LogScan {
        span,
        tally,
        malformed_lines,
    })
}

/// Scans the log at `path`, or reports it unavailable when the file is missing.
pub fn scan_log_file(path: &Path, marker: &str) -> Result<LogEvidence, LogError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "logfile does not exist");
            return Ok(LogEvidence::Unavailable);
        }
        Err(e) => return Err(e.into()),
    };

    let reader = BufReader::with_capacity(BUFFER_SIZE, file);
    scan_log(reader, marker).map(LogEvidence::Available)
}
