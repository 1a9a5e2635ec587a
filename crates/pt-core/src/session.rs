//! One-session summarization: load a record and its log, then reconcile.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::frames::reduce_frames;
use crate::log_scan::{DEFAULT_EVENT_MARKER, LogError, scan_log_file};
use crate::reconcile::{ClockUnit, ReconcileError, Reconciliation, SessionInputs, reconcile};
use crate::record::{RecordError, SessionRecord};

/// Why a session could not be summarized.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing input: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record: {0}")]
    MalformedRecord(#[from] RecordError),

    #[error("malformed log: {0}")]
    MalformedLog(#[from] LogError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Knobs for summarizing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Substring identifying recipe lifecycle lines in the log.
    pub event_marker: String,
    /// Unit of the frame system clock.
    pub system_clock_unit: ClockUnit,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            event_marker: DEFAULT_EVENT_MARKER.to_string(),
            system_clock_unit: ClockUnit::default(),
        }
    }
}

fn read_record(path: &Path) -> Result<SessionRecord, SessionError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            SessionError::MissingInput {
                path: path.to_path_buf(),
            }
        } else {
            SessionError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(SessionRecord::from_reader(BufReader::new(file))?)
}

/// Summarizes the session stored in `record_path` and `log_path`.
///
/// A missing log degrades the log-derived fields to the unavailable
/// sentinel; a missing record is [`SessionError::MissingInput`].
pub fn summarize_session(
    record_path: &Path,
    log_path: &Path,
    options: &SessionOptions,
) -> Result<Reconciliation, SessionError> {
    let record = read_record(record_path)?;

    let inputs = SessionInputs {
        login_ticks: record.login_ticks()?,
        logout_ticks: record.logout_ticks()?,
        potions_declared: record.potions_declared()?,
        bounds: reduce_frames(&record.frame_data).map_err(RecordError::from)?,
        log: scan_log_file(log_path, &options.event_marker)?,
    };

    let reconciliation = reconcile(inputs, options.system_clock_unit)?;

    for advisory in &reconciliation.advisories {
        tracing::info!(
            record = %record_path.display(),
            code = advisory.code(),
            "{advisory}"
        );
    }

    Ok(reconciliation)
}
