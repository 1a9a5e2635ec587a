//! Validated identifiers for session archives.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Validation errors for identifier types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The path has no usable UTF-8 file stem.
    #[error("no file stem in {path}")]
    NoStem { path: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Stem shared by a session's archive, record, log and summary files.
    ///
    /// For `abc_20240101.zip` the key is `abc_20240101`, and the session
    /// files are `abc_20240101.json` and `abc_20240101.log`.
    SessionKey, "session key"
);

define_string_id!(
    /// Participant identifier, the session key up to the first `_`.
    ParticipantId, "participant ID"
);

impl SessionKey {
    /// Derives the key from an archive path's file stem.
    pub fn from_archive(path: &Path) -> Result<Self, ValidationError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ValidationError::NoStem {
                path: path.display().to_string(),
            })?;
        Self::new(stem)
    }

    /// The participant this session belongs to.
    pub fn participant(&self) -> Result<ParticipantId, ValidationError> {
        let prefix = self.0.split_once('_').map_or(self.as_str(), |(p, _)| p);
        ParticipantId::new(prefix)
    }

    /// Sibling file name `<key><suffix>`, e.g. `<key>.json`.
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }
}

impl ParticipantId {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}
