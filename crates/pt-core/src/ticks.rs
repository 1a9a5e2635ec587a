//! FILETIME tick clock conversions.
//!
//! Session records stamp login and logout as 100-nanosecond ticks counted from
//! 1601-01-01 00:00:00. Every calendar timestamp in a session summary is
//! derived through [`ticks_to_datetime`] or [`computed_logout`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use thiserror::Error;

/// Number of ticks in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Nanoseconds represented by a single tick.
const NANOS_PER_TICK: i64 = 100;

/// Output format for calendar timestamps (second precision, no zone).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest elapsed duration, in microseconds, accepted for logout
/// reconstruction. Stays well inside `i64` after rounding.
const MAX_ELAPSED_MICROS: f64 = 9.0e18;

/// Errors converting tick values to calendar time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TickError {
    /// The tick value lands outside chrono's calendar range.
    #[error("tick value {0} is outside the representable calendar range")]
    OutOfRange(i64),

    /// The elapsed time fed into logout reconstruction was NaN or infinite.
    #[error("elapsed time {0} is not a finite number of seconds")]
    NonFiniteElapsed(f64),

    /// Login plus elapsed time lands outside chrono's calendar range.
    #[error("computed logout ({login_ticks} ticks + {elapsed_seconds}s) is out of range")]
    ComputedOutOfRange {
        login_ticks: i64,
        elapsed_seconds: f64,
    },
}

/// Returns the tick epoch, 1601-01-01 00:00:00.
pub fn filetime_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1601, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Converts a tick count to a naive calendar datetime.
///
/// Uses exact integer arithmetic; negative tick counts land before the epoch.
pub fn ticks_to_datetime(ticks: i64) -> Result<NaiveDateTime, TickError> {
    let seconds = ticks.div_euclid(TICKS_PER_SECOND);
    let sub_second_nanos = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;

    let delta = TimeDelta::try_seconds(seconds)
        .ok_or(TickError::OutOfRange(ticks))?
        .checked_add(&TimeDelta::nanoseconds(sub_second_nanos))
        .ok_or(TickError::OutOfRange(ticks))?;

    filetime_epoch()
        .checked_add_signed(delta)
        .ok_or(TickError::OutOfRange(ticks))
}

/// Formats a datetime with [`TIMESTAMP_FORMAT`], dropping sub-second precision.
pub fn format_timestamp(datetime: NaiveDateTime) -> String {
    datetime.format(TIMESTAMP_FORMAT).to_string()
}

/// Converts a tick count straight to its `YYYY-MM-DD HH:MM:SS` form.
pub fn format_ticks(ticks: i64) -> Result<String, TickError> {
    ticks_to_datetime(ticks).map(format_timestamp)
}

/// Reconstructs a logout time as login plus an elapsed duration in seconds.
///
/// The elapsed duration is rounded to whole microseconds before it is added.
pub fn computed_logout(login_ticks: i64, elapsed_seconds: f64) -> Result<NaiveDateTime, TickError> {
    if !elapsed_seconds.is_finite() {
        return Err(TickError::NonFiniteElapsed(elapsed_seconds));
    }

    let out_of_range = || TickError::ComputedOutOfRange {
        login_ticks,
        elapsed_seconds,
    };

    let micros = (elapsed_seconds * 1_000_000.0).round();
    if micros.abs() > MAX_ELAPSED_MICROS {
        return Err(out_of_range());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "bounded by MAX_ELAPSED_MICROS above"
    )]
    let elapsed = TimeDelta::microseconds(micros as i64);

    ticks_to_datetime(login_ticks)?
        .checked_add_signed(elapsed)
        .ok_or_else(out_of_range)
}
