//! Session reconciliation.
//!
//! Merges tick-based login/logout times, the frame bounds and the recipe log
//! evidence into one [`SessionResult`]. This module performs no I/O and never
//! logs: advisories come back as values for the caller to report.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::frames::{FrameBounds, TimeSnapshot};
use crate::log_scan::LogEvidence;
use crate::ticks::{self, TICKS_PER_SECOND, TickError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("timestamp conversion failed: {0}")]
    Timestamp(#[from] TickError),

    #[error("{clock} elapsed time overflows to {value}")]
    ElapsedOverflow { clock: &'static str, value: f64 },
}

/// Unit of the frame system clock, used when reconstructing logout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockUnit {
    /// Elapsed readings are already seconds.
    #[default]
    Seconds,
    /// Elapsed readings are 100ns ticks.
    Ticks,
}

impl ClockUnit {
    /// Converts an elapsed reading in this unit to seconds.
    #[expect(
        clippy::cast_precision_loss,
        reason = "TICKS_PER_SECOND is exactly representable"
    )]
    pub fn to_seconds(self, elapsed: f64) -> f64 {
        match self {
            Self::Seconds => elapsed,
            Self::Ticks => elapsed / TICKS_PER_SECOND as f64,
        }
    }
}

/// Elapsed play time per clock, in each clock's own unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockElapsed {
    pub system: f64,
    pub kinect: f64,
    pub unity: f64,
}

impl ClockElapsed {
    /// Differences between the last and first readings of each clock.
    ///
    /// Readings are finite, but the difference of two extreme readings can
    /// still overflow; that is an error rather than an infinite play time.
    pub fn between(first: &TimeSnapshot, last: &TimeSnapshot) -> Result<Self, ReconcileError> {
        let diff = |clock: &'static str, from: f64, to: f64| {
            let value = to - from;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ReconcileError::ElapsedOverflow { clock, value })
            }
        };
        Ok(Self {
            system: diff("system", first.system_ticks, last.system_ticks)?,
            kinect: diff("kinect", first.kinect_ticks, last.kinect_ticks)?,
            unity: diff("unity", first.unity_ticks, last.unity_ticks)?,
        })
    }
}

/// A non-fatal observation about a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// The record's potion count disagrees with the log's success count.
    PotionsMismatch { declared: u32, succeeded: u32 },
    /// The log shows no successful recipe.
    NoPotionsSucceeded,
    /// No log file was available; log-derived checks were not run.
    LogUnavailable,
}

impl Advisory {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PotionsMismatch { .. } => "potions_mismatch",
            Self::NoPotionsSucceeded => "no_potions_succeeded",
            Self::LogUnavailable => "log_unavailable",
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PotionsMismatch {
                declared,
                succeeded,
            } => write!(
                f,
                "potions prepared mismatch: record declares {declared}, log shows {succeeded} succeeded"
            ),
            Self::NoPotionsSucceeded => f.write_str("no potion completed in this session"),
            Self::LogUnavailable => f.write_str("logfile not available"),
        }
    }
}

/// Everything the reconciler needs for one session.
#[derive(Debug, Clone)]
pub struct SessionInputs {
    pub login_ticks: i64,
    pub logout_ticks: Option<i64>,
    pub potions_declared: u32,
    pub bounds: FrameBounds,
    pub log: LogEvidence,
}

/// The enriched per-session summary.
///
/// Absent values serialize as `""` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub login_ticks: i64,
    #[serde(serialize_with = "empty_if_none")]
    pub logout_ticks: Option<i64>,
    pub potions_declared: u32,
    pub login_readable: String,
    pub logout_readable: String,
    #[serde(rename = "playedSeconds_system")]
    pub played_seconds_system: f64,
    #[serde(rename = "playedSeconds_kinect")]
    pub played_seconds_kinect: f64,
    #[serde(rename = "playedSeconds_unity")]
    pub played_seconds_unity: f64,
    pub logout_computed_from_duration: String,
    #[serde(flatten)]
    pub log: LogEvidence,
    pub potions_mismatch: bool,
    pub no_potions_succeeded: bool,
}

fn empty_if_none<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ticks) => serializer.serialize_i64(*ticks),
        None => serializer.serialize_str(""),
    }
}

/// A session result together with the advisories raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub result: SessionResult,
    pub advisories: Vec<Advisory>,
}

fn check_potions(declared: u32, log: &LogEvidence, advisories: &mut Vec<Advisory>) -> (bool, bool) {
    let Some(tally) = log.tally() else {
        advisories.push(Advisory::LogUnavailable);
        return (false, false);
    };

    let mismatch = declared != tally.succeeded;
    if mismatch {
        advisories.push(Advisory::PotionsMismatch {
            declared,
            succeeded: tally.succeeded,
        });
    }

    let none_succeeded = tally.succeeded == 0;
    if none_succeeded {
        advisories.push(Advisory::NoPotionsSucceeded);
    }

    (mismatch, none_succeeded)
}

/// Reconciles one session's inputs into a [`SessionResult`].
///
/// `system_clock` says how the system-clock elapsed time maps to seconds when
/// reconstructing logout from login plus play time.
pub fn reconcile(
    inputs: SessionInputs,
    system_clock: ClockUnit,
) -> Result<Reconciliation, ReconcileError> {
    let SessionInputs {
        login_ticks,
        logout_ticks,
        potions_declared,
        bounds,
        log,
    } = inputs;

    let login_readable = ticks::format_ticks(login_ticks)?;
    let logout_readable = logout_ticks
        .map(ticks::format_ticks)
        .transpose()?
        .unwrap_or_default();

    let elapsed = ClockElapsed::between(&bounds.first, &bounds.last)?;
    let computed_logout =
        ticks::computed_logout(login_ticks, system_clock.to_seconds(elapsed.system))?;

    let mut advisories = Vec::new();
    let (potions_mismatch, no_potions_succeeded) =
        check_potions(potions_declared, &log, &mut advisories);

    Ok(Reconciliation {
        result: SessionResult {
            login_ticks,
            logout_ticks,
            potions_declared,
            login_readable,
            logout_readable,
            played_seconds_system: elapsed.system,
            played_seconds_kinect: elapsed.kinect,
            played_seconds_unity: elapsed.unity,
            logout_computed_from_duration: ticks::format_timestamp(computed_logout),
            log,
            potions_mismatch,
            no_potions_succeeded,
        },
        advisories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::log_scan::{LogScan, LogSpan, LogTally};

    fn snapshot(kinect: f64, system: f64, unity: f64) -> TimeSnapshot {
        TimeSnapshot {
            time_zone: "+01:00".to_string(),
            kinect_ticks: kinect,
            system_ticks: system,
            unity_ticks: unity,
        }
    }

    fn evidence(started: u32, succeeded: u32) -> LogEvidence {
        LogEvidence::Available(LogScan {
            span: LogSpan {
                first_timestamp: "Id:7".to_string(),
                last_timestamp: "Id:7".to_string(),
            },
            tally: LogTally {
                started,
                succeeded,
                failed: 0,
                errored: 0,
            },
            malformed_lines: 0,
        })
    }

    fn example_inputs(log: LogEvidence) -> SessionInputs {
        SessionInputs {
            login_ticks: 0,
            logout_ticks: None,
            potions_declared: 1,
            bounds: FrameBounds {
                first_id: 1,
                last_id: 2,
                first: snapshot(50.0, 100.0, 5.0),
                last: snapshot(200.0, 400.0, 20.0),
            },
            log,
        }
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for integral clock differences"
    )]
    fn test_example_session_reconciles() {
        let outcome = reconcile(example_inputs(evidence(1, 1)), ClockUnit::Seconds).unwrap();
        let result = &outcome.result;

        assert_eq!(result.played_seconds_system, 300.0);
        assert_eq!(result.played_seconds_unity, 15.0);
        assert_eq!(result.played_seconds_kinect, 150.0);
        assert_eq!(result.login_readable, "1601-01-01 00:00:00");
        assert_eq!(result.logout_readable, "");
        assert_eq!(result.logout_computed_from_duration, "1601-01-01 00:05:00");
        assert!(!result.potions_mismatch);
        assert!(!result.no_potions_succeeded);
        assert!(outcome.advisories.is_empty());
    }

    #[test]
    fn test_example_session_serializes_flat() {
        let outcome = reconcile(example_inputs(evidence(1, 1)), ClockUnit::Seconds).unwrap();
        let json = serde_json::to_string_pretty(&outcome.result).unwrap();
        assert_snapshot!(json, @r#"
        {
          "loginTicks": 0,
          "logoutTicks": "",
          "potionsDeclared": 1,
          "loginReadable": "1601-01-01 00:00:00",
          "logoutReadable": "",
          "playedSeconds_system": 300.0,
          "playedSeconds_kinect": 150.0,
          "playedSeconds_unity": 15.0,
          "logoutComputedFromDuration": "1601-01-01 00:05:00",
          "firstTimestamp": "Id:7",
          "lastTimestamp": "Id:7",
          "started": 1,
          "succeeded": 1,
          "failed": 0,
          "errored": 0,
          "potionsMismatch": false,
          "noPotionsSucceeded": false
        }
        "#);
    }

    #[test]
    fn test_logout_ticks_are_formatted_when_present() {
        let mut inputs = example_inputs(evidence(1, 1));
        inputs.login_ticks = 133_485_408_000_000_000;
        inputs.logout_ticks = Some(133_485_408_000_000_000 + 3_600 * TICKS_PER_SECOND);

        let result = reconcile(inputs, ClockUnit::Seconds).unwrap().result;
        assert_eq!(result.login_readable, "2024-01-01 00:00:00");
        assert_eq!(result.logout_readable, "2024-01-01 01:00:00");
        assert_eq!(result.logout_computed_from_duration, "2024-01-01 00:05:00");
        assert_eq!(
            serde_json::to_value(&result).unwrap()["logoutTicks"],
            serde_json::json!(133_485_444_000_000_000_i64)
        );
    }

    #[test]
    fn test_tick_clock_unit_scales_logout_reconstruction() {
        let mut inputs = example_inputs(evidence(1, 1));
        inputs.bounds.last.system_ticks = 100.0 + 90.0 * 10_000_000.0;

        let result = reconcile(inputs, ClockUnit::Ticks).unwrap().result;
        assert_eq!(result.logout_computed_from_duration, "1601-01-01 00:01:30");
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for zero differences"
    )]
    fn test_single_frame_session_has_zero_elapsed() {
        let mut inputs = example_inputs(evidence(1, 1));
        inputs.bounds.last = inputs.bounds.first.clone();

        let result = reconcile(inputs, ClockUnit::Seconds).unwrap().result;
        assert_eq!(result.played_seconds_system, 0.0);
        assert_eq!(result.played_seconds_kinect, 0.0);
        assert_eq!(result.played_seconds_unity, 0.0);
        assert_eq!(result.logout_computed_from_duration, result.login_readable);
    }

    #[test]
    fn test_mismatch_and_zero_success_are_advisories() {
        let outcome = reconcile(example_inputs(evidence(2, 0)), ClockUnit::Seconds).unwrap();
        assert!(outcome.result.potions_mismatch);
        assert!(outcome.result.no_potions_succeeded);
        assert_eq!(
            outcome.advisories,
            vec![
                Advisory::PotionsMismatch {
                    declared: 1,
                    succeeded: 0
                },
                Advisory::NoPotionsSucceeded,
            ]
        );
    }

    #[test]
    fn test_unavailable_log_keeps_frame_fields() {
        let outcome = reconcile(example_inputs(LogEvidence::Unavailable), ClockUnit::Seconds)
            .unwrap();
        assert_eq!(outcome.advisories, vec![Advisory::LogUnavailable]);
        assert!(!outcome.result.potions_mismatch);

        let json = serde_json::to_value(&outcome.result).unwrap();
        assert_eq!(json["playedSeconds_system"], 300.0);
        assert_eq!(json["succeeded"], "logfile not available");
        assert_eq!(json["firstTimestamp"], "logfile not available");
    }

    #[test]
    fn test_out_of_range_login_fails() {
        let mut inputs = example_inputs(evidence(1, 1));
        inputs.login_ticks = i64::MAX;
        assert!(matches!(
            reconcile(inputs, ClockUnit::Seconds),
            Err(ReconcileError::Timestamp(TickError::OutOfRange(_)))
        ));
    }

    #[test]
    fn test_overflowing_elapsed_fails() {
        let mut inputs = example_inputs(evidence(1, 1));
        inputs.bounds.first.unity_ticks = -f64::MAX;
        inputs.bounds.last.unity_ticks = f64::MAX;
        assert!(matches!(
            reconcile(inputs, ClockUnit::Seconds),
            Err(ReconcileError::ElapsedOverflow { clock: "unity", .. })
        ));
    }

    #[test]
    fn test_overflowing_kinect_elapsed_fails() {
        let mut inputs = example_inputs(evidence(1, 1));
        inputs.bounds.first.kinect_ticks = f64::MAX;
        inputs.bounds.last.kinect_ticks = -f64::MAX;
        assert!(matches!(
            reconcile(inputs, ClockUnit::Seconds),
            Err(ReconcileError::ElapsedOverflow { clock: "kinect", .. })
        ));
    }

    #[test]
    fn test_advisory_codes_and_messages() {
        let advisory = Advisory::PotionsMismatch {
            declared: 3,
            succeeded: 1,
        };
        assert_eq!(advisory.code(), "potions_mismatch");
        assert_eq!(
            advisory.to_string(),
            "potions prepared mismatch: record declares 3, log shows 1 succeeded"
        );
        assert_eq!(Advisory::LogUnavailable.code(), "log_unavailable");
    }

    #[test]
    fn test_clock_unit_parses_from_config_strings() {
        let unit: ClockUnit = serde_json::from_str("\"ticks\"").unwrap();
        assert_eq!(unit, ClockUnit::Ticks);
        assert_eq!(ClockUnit::default(), ClockUnit::Seconds);
    }
}
