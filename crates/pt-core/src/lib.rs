//! Core domain logic for play-session telemetry.
//!
//! This crate contains the fundamental types and logic for:
//! - Tick clocks: converting 100ns FILETIME ticks to calendar time
//! - Frame bounds: clock readings of the first and last recorded frame
//! - Log scanning: recipe outcome tallies from the companion log
//! - Reconciliation: merging all of the above into one session summary

pub mod frames;
pub mod log_scan;
pub mod reconcile;
pub mod record;
pub mod session;
pub mod ticks;
pub mod types;

pub use frames::{Frame, FrameBounds, FrameError, LabelError, TimeSnapshot, reduce_frames};
pub use log_scan::{
    DEFAULT_EVENT_MARKER, LOG_UNAVAILABLE, LogError, LogEvidence, LogScan, LogSpan, LogTally,
    Outcome, scan_log, scan_log_file,
};
pub use reconcile::{
    Advisory, ClockElapsed, ClockUnit, ReconcileError, Reconciliation, SessionInputs,
    SessionResult, reconcile,
};
pub use record::{RecordError, SessionRecord};
pub use session::{SessionError, SessionOptions, summarize_session};
pub use types::{ParticipantId, SessionKey, ValidationError};
