// crates/tinly-rules-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tinly Rules Interfaces
// Description: Backend-agnostic interfaces for rule storage and telemetry.
// Purpose: Define the contract surfaces the resolver uses per request.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine integrates with the surrounding service
//! without embedding backend-specific details. The resolver fetches rule
//! candidates through [`RuleStore`], records wins through [`MatchRecorder`],
//! and surfaces evaluation faults through [`EngineTelemetry`].
//!
//! Implementations must be deterministic for a given store state and must
//! fail closed: a fetch error yields a no-match resolution, never a thrown
//! error on the redirect path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::outcome::CandidateSource;
use crate::core::rule::EvaluationScope;
use crate::core::rule::RedirectRule;
use crate::core::rule::RuleGroup;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Rule Store
// ============================================================================

/// Rule store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or read.
    #[error("rule store unavailable: {0}")]
    Unavailable(String),
    /// The store returned data the engine cannot interpret.
    #[error("rule store returned invalid data: {0}")]
    Invalid(String),
}

/// Backend-agnostic source of rule candidates.
///
/// Implementations return only candidates whose target covers the scope;
/// ordering is not required, the resolver sorts.
pub trait RuleStore: Send + Sync {
    /// Fetches the active single rules applicable to the scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when candidates cannot be fetched.
    fn rules_for(&self, scope: &EvaluationScope) -> Result<Vec<RedirectRule>, StoreError>;

    /// Fetches the active rule groups applicable to the scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when candidates cannot be fetched.
    fn groups_for(&self, scope: &EvaluationScope) -> Result<Vec<RuleGroup>, StoreError>;
}

// ============================================================================
// SECTION: Match Recorder
// ============================================================================

/// Match recording errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The recorder could not persist the match.
    #[error("match recorder error: {0}")]
    Recorder(String),
    /// The recorder does not know the candidate being recorded.
    #[error("unknown candidate: {0}")]
    UnknownCandidate(String),
}

/// Sink for per-candidate match counters.
///
/// Live resolutions call this once per winning candidate; dry runs never do.
/// Increments must be atomic per candidate so concurrent resolutions do not
/// lose counts.
pub trait MatchRecorder: Send + Sync {
    /// Records one win for the candidate at the given instant.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the match cannot be persisted. The
    /// resolver treats this as telemetry, never as a resolution failure.
    fn record_match(&self, source: CandidateSource, matched_at: Timestamp)
    -> Result<(), RecordError>;
}

/// Match recorder that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl MatchRecorder for NoopRecorder {
    fn record_match(
        &self,
        _source: CandidateSource,
        _matched_at: Timestamp,
    ) -> Result<(), RecordError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Engine Telemetry
// ============================================================================

/// Why a candidate or resolution step degraded instead of evaluating cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// A regex condition carried an uncompilable pattern.
    InvalidRegex,
    /// A condition value could not be coerced into its value class.
    MalformedConditionValue,
    /// A between range was not a two-element `[min, max]` list.
    MalformedRange,
    /// An operator was applied to a value class it does not support.
    OperatorClassMismatch,
    /// A matched candidate carried an action that could not resolve.
    InvalidActionPayload,
    /// The rule store failed; the resolution fell through to no-match.
    StoreUnavailable,
    /// The match recorder failed after a candidate fired.
    RecorderFailed,
    /// The candidate pool exceeded the configured cap and was truncated.
    CandidateOverflow,
}

impl DegradedReason {
    /// Returns the canonical wire name of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRegex => "invalid_regex",
            Self::MalformedConditionValue => "malformed_condition_value",
            Self::MalformedRange => "malformed_range",
            Self::OperatorClassMismatch => "operator_class_mismatch",
            Self::InvalidActionPayload => "invalid_action_payload",
            Self::StoreUnavailable => "store_unavailable",
            Self::RecorderFailed => "recorder_failed",
            Self::CandidateOverflow => "candidate_overflow",
        }
    }
}

/// One degraded-evaluation event emitted during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedEvent {
    /// Candidate the fault belongs to, when attributable.
    pub source: Option<CandidateSource>,
    /// Classification of the fault.
    pub reason: DegradedReason,
    /// Human-readable detail for logs and dashboards.
    pub detail: String,
}

/// Sink for degraded-evaluation events.
///
/// The engine never logs directly; hosts plug their logging or metrics stack
/// in here. Implementations must not panic and should be cheap, they run on
/// the redirect path.
pub trait EngineTelemetry: Send + Sync {
    /// Observes one degraded-evaluation event.
    fn on_degraded(&self, event: DegradedEvent);
}

/// Telemetry sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl EngineTelemetry for NoopTelemetry {
    fn on_degraded(&self, _event: DegradedEvent) {}
}
