//! Structured session records.
//!
//! The recording app is loose about scalar types: tick counts and the potion
//! count appear either as JSON numbers or as strings, and an unset tick count
//! is written as `""`.

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

use crate::frames::{Frame, FrameError};

/// Errors that make a session record unusable.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("loginTime is empty")]
    MissingLogin,

    #[error("{field} is not an integer tick count: {value:?}")]
    InvalidTicks { field: &'static str, value: String },

    #[error("potionsPrepared is not a non-negative integer: {value:?}")]
    InvalidCount { value: String },

    #[error(transparent)]
    Frames(#[from] FrameError),
}

/// A JSON scalar written either as an integer or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Text(String),
}

impl Scalar {
    fn parse_ticks(&self, field: &'static str) -> Result<Option<i64>, RecordError> {
        match self {
            Self::Integer(ticks) => Ok(Some(*ticks)),
            Self::Text(text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => {
                text.trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| RecordError::InvalidTicks {
                        field,
                        value: text.clone(),
                    })
            }
        }
    }
}

/// One session as written by the recording app.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub login_time: Scalar,
    pub logout_time: Scalar,
    pub potions_prepared: Scalar,
    pub frame_data: Vec<Frame>,
}

impl SessionRecord {
    /// Parses a record from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecordError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Login ticks; required.
    pub fn login_ticks(&self) -> Result<i64, RecordError> {
        self.login_time
            .parse_ticks("loginTime")?
            .ok_or(RecordError::MissingLogin)
    }

    /// Logout ticks; `None` when the app left the field empty.
    pub fn logout_ticks(&self) -> Result<Option<i64>, RecordError> {
        self.logout_time.parse_ticks("logoutTime")
    }

    /// Number of potions the app claims were prepared.
    pub fn potions_declared(&self) -> Result<u32, RecordError> {
        let invalid = |value: String| RecordError::InvalidCount { value };
        match &self.potions_prepared {
            Scalar::Integer(n) => u32::try_from(*n).map_err(|_| invalid(n.to_string())),
            Scalar::Text(text) => text.trim().parse().map_err(|_| invalid(text.clone())),
        }
    }
}
