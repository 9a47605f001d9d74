// crates/tinly-rules-core/src/core/time.rs
// ============================================================================
// Module: Tinly Rules Time Model
// Description: Canonical timestamp representation for schedules and matches.
// Purpose: Provide deterministic, replayable time values across rule evaluation.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Rule evaluation uses explicit time values supplied by callers to keep
//! replays and dry runs deterministic. The core engine never reads wall-clock
//! time directly; hosts pass the request instant into the resolver, and the
//! same instant gates schedules, stamps match counters, and appears in
//! resolution records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced when converting timestamps to or from RFC 3339 text.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The input string is not a valid RFC 3339 timestamp.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// The timestamp cannot be rendered as RFC 3339 text.
    #[error("timestamp formatting failed: {0}")]
    Format(String),
    /// The value is outside the representable unix-millisecond range.
    #[error("timestamp outside representable range")]
    OutOfRange,
}

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in schedules, match counters, and resolutions.
///
/// # Invariants
/// - Values are unix epoch milliseconds, explicitly provided by callers; the
///   core never reads wall-clock time.
/// - Ordering is the natural millisecond ordering, so schedule windows and
///   recency tie-breaks compare directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Parses an RFC 3339 timestamp string into unix milliseconds.
    ///
    /// # Errors
    /// Returns [`TimeError::Parse`] when the input is not valid RFC 3339 and
    /// [`TimeError::OutOfRange`] when the instant exceeds the i64 millisecond
    /// range.
    pub fn from_rfc3339(value: &str) -> Result<Self, TimeError> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimeError::Parse(err.to_string()))?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        let millis = i64::try_from(millis).map_err(|_| TimeError::OutOfRange)?;
        Ok(Self(millis))
    }

    /// Renders the timestamp as an RFC 3339 string in UTC.
    ///
    /// # Errors
    /// Returns [`TimeError::OutOfRange`] when the instant cannot be expressed
    /// as a calendar date and [`TimeError::Format`] when rendering fails.
    pub fn to_rfc3339(self) -> Result<String, TimeError> {
        let nanos = i128::from(self.0)
            .checked_mul(1_000_000)
            .ok_or(TimeError::OutOfRange)?;
        let instant =
            OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| TimeError::OutOfRange)?;
        instant
            .format(&Rfc3339)
            .map_err(|err| TimeError::Format(err.to_string()))
    }
}
