//! Frame bounds and their embedded clock readings.
//!
//! Every frame in a session record carries a semicolon-delimited label
//! string. Only the frames with the smallest and largest `frameDataId` matter
//! for play-time, so the reducer makes a single pass to find them and then
//! parses just those two label strings.

use std::num::ParseFloatError;

use serde::Deserialize;
use thiserror::Error;

/// Minimum number of `;`-separated fields in a label string.
pub const LABEL_FIELD_COUNT: usize = 7;

const TIME_ZONE_FIELD: usize = 3;
const KINECT_FIELD: usize = 4;
const SYSTEM_FIELD: usize = 5;
const UNITY_FIELD: usize = 6;

/// One sampled frame from the session record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub frame_data_id: i64,
    pub labels: String,
}

/// Errors parsing a frame's label string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("expected at least {expected} label fields, found {found}")]
    TooFewFields { found: usize, expected: usize },

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("{field} is not a finite number: {value:?}")]
    NonFinite { field: &'static str, value: String },
}

/// Errors reducing a frame list to its bounds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame list is empty")]
    Empty,

    #[error("invalid labels on frame {frame_id}")]
    Labels {
        frame_id: i64,
        #[source]
        source: LabelError,
    },
}

/// Named view over the positional label fields.
#[derive(Debug)]
struct FrameLabels<'a> {
    time_zone: &'a str,
    kinect: &'a str,
    system: &'a str,
    unity: &'a str,
}

impl<'a> FrameLabels<'a> {
    fn parse(labels: &'a str) -> Result<Self, LabelError> {
        let fields: Vec<&str> = labels.split(';').collect();
        if fields.len() < LABEL_FIELD_COUNT {
            return Err(LabelError::TooFewFields {
                found: fields.len(),
                expected: LABEL_FIELD_COUNT,
            });
        }

        Ok(Self {
            time_zone: fields[TIME_ZONE_FIELD],
            kinect: fields[KINECT_FIELD],
            system: fields[SYSTEM_FIELD],
            unity: fields[UNITY_FIELD],
        })
    }
}

fn parse_clock(field: &'static str, value: &str) -> Result<f64, LabelError> {
    let reading: f64 = value
        .trim()
        .parse()
        .map_err(|source| LabelError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })?;
    if !reading.is_finite() {
        return Err(LabelError::NonFinite {
            field,
            value: value.to_string(),
        });
    }
    Ok(reading)
}

/// Parallel clock readings captured from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSnapshot {
    pub time_zone: String,
    pub kinect_ticks: f64,
    pub system_ticks: f64,
    pub unity_ticks: f64,
}

impl TimeSnapshot {
    /// Parses a snapshot from a frame's label string.
    pub fn from_labels(labels: &str) -> Result<Self, LabelError> {
        let fields = FrameLabels::parse(labels)?;
        Ok(Self {
            time_zone: fields.time_zone.to_string(),
            kinect_ticks: parse_clock("kinectTicks", fields.kinect)?,
            system_ticks: parse_clock("systemTicks", fields.system)?,
            unity_ticks: parse_clock("unityTicks", fields.unity)?,
        })
    }
}

/// Snapshots of the lowest- and highest-numbered frames in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBounds {
    pub first_id: i64,
    pub last_id: i64,
    pub first: TimeSnapshot,
    pub last: TimeSnapshot,
}

fn snapshot(frame: &Frame) -> Result<TimeSnapshot, FrameError> {
    TimeSnapshot::from_labels(&frame.labels).map_err(|source| FrameError::Labels {
        frame_id: frame.frame_data_id,
        source,
    })
}

/// Finds the min- and max-id frames and captures their clock readings.
///
/// Duplicate identifiers resolve to the first frame seen with that id, for
/// both bounds. A single-frame list yields identical snapshots.
pub fn reduce_frames(frames: &[Frame]) -> Result<FrameBounds, FrameError> {
    let (head, rest) = frames.split_first().ok_or(FrameError::Empty)?;

    let mut min = head;
    let mut max = head;
    for frame in rest {
        if frame.frame_data_id < min.frame_data_id {
            min = frame;
        }
        if frame.frame_data_id > max.frame_data_id {
            max = frame;
        }
    }

    tracing::debug!(
        frames = frames.len(),
        first_id = min.frame_data_id,
        last_id = max.frame_data_id,
        "reduced frame bounds"
    );

    Ok(FrameBounds {
        first_id: min.frame_data_id,
        last_id: max.frame_data_id,
        first: snapshot(min)?,
        last: snapshot(max)?,
    })
}
