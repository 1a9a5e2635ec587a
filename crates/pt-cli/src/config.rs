//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pt_core::{ClockUnit, DEFAULT_EVENT_MARKER, SessionOptions};
use serde::{Deserialize, Serialize};

/// Participant ids shorter than this come from the feasibility study and are skipped.
const DEFAULT_MIN_PARTICIPANT_ID_LEN: usize = 28;

/// Suffix appended to the session key for summary files.
const DEFAULT_OUTPUT_SUFFIX: &str = "_info_v1.json";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Substring identifying recipe lifecycle lines in session logs.
    pub event_marker: String,
    /// Unit of the frame system clock (`seconds` or `ticks`).
    pub system_clock_unit: ClockUnit,
    /// Archives whose participant id is shorter than this are skipped.
    pub min_participant_id_len: usize,
    /// Summary file name suffix.
    pub output_suffix: String,
    /// Remove the extracted record and log once a summary is written.
    pub delete_inputs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_marker: DEFAULT_EVENT_MARKER.to_string(),
            system_clock_unit: ClockUnit::default(),
            min_participant_id_len: DEFAULT_MIN_PARTICIPANT_ID_LEN,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            delete_inputs: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PT_*)
        figment = figment.merge(Env::prefixed("PT_"));

        figment.extract()
    }

    /// Options handed to the core for each session.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            event_marker: self.event_marker.clone(),
            system_clock_unit: self.system_clock_unit,
        }
    }
}

/// Returns the platform-specific config directory for pt.
///
/// On Linux: `~/.config/pt`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pt"))
}
