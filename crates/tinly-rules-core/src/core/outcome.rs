// crates/tinly-rules-core/src/core/outcome.rs
// ============================================================================
// Module: Tinly Rules Resolution Outcomes
// Description: Resolution results, matched-rule summaries, and trace records.
// Purpose: Define the records handed back to redirect handlers and dry runs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A resolution reports which candidate fired (if any), the effect to apply,
//! and a per-candidate trace explaining every decision taken along the way.
//! Live resolutions and dashboard dry runs share this shape; the only
//! difference is whether match counters were touched.
//!
//! No-match is a first-class outcome, not an error. The trace exists so a
//! user staring at "why did my rule not fire" can read the answer off the
//! check records instead of re-deriving it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::action::ActionEffect;
use crate::core::action::ActionType;
use crate::core::condition::ConditionType;
use crate::core::condition::RuleOperator;
use crate::core::context::VisitorContext;
use crate::core::identifiers::RuleGroupId;
use crate::core::identifiers::RuleId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Candidate Identity
// ============================================================================

/// Identity of an evaluation candidate: a single rule or a rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CandidateSource {
    /// The candidate is a single redirect rule.
    Rule(RuleId),
    /// The candidate is a rule group.
    Group(RuleGroupId),
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(id) => write!(f, "rule {id}"),
            Self::Group(id) => write!(f, "group {id}"),
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Summary of the candidate that won a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    /// Identity of the winning candidate.
    pub source: CandidateSource,
    /// Candidate name as authored in the dashboard.
    pub name: String,
    /// Kind of action the candidate carries.
    pub action_type: ActionType,
}

/// Final outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// A candidate fired; apply the effect.
    Matched {
        /// Summary of the winning candidate.
        rule: MatchedRule,
        /// Fully materialized effect to apply.
        effect: ActionEffect,
    },
    /// No candidate fired; fall through to the default destination.
    NoMatch,
}

// ============================================================================
// SECTION: Trace Records
// ============================================================================

/// Terminal state of one candidate during a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// The candidate's conditions held and its action resolved.
    Matched,
    /// At least one required condition failed.
    Unmatched,
    /// The candidate's schedule window does not cover the request instant.
    OutOfSchedule,
    /// The candidate matched but carried an action that could not resolve.
    Degraded,
}

/// Record of one condition evaluation inside a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionCheck {
    /// Visitor dimension that was tested.
    pub condition_type: ConditionType,
    /// Operator that was applied.
    pub operator: RuleOperator,
    /// Lookup key, for query parameter conditions.
    pub key: Option<String>,
    /// Whether the condition held.
    pub matched: bool,
    /// Concrete visitor value the test saw, `null` when the field was absent.
    pub context_value: Option<Value>,
    /// Comparison value authored with the condition.
    pub condition_value: Value,
}

/// Per-candidate trace entry in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrace {
    /// Identity of the candidate.
    pub source: CandidateSource,
    /// Candidate name as authored in the dashboard.
    pub name: String,
    /// Priority the candidate was ranked with.
    pub priority: i32,
    /// Terminal state of the candidate.
    pub status: CandidateStatus,
    /// Condition checks performed before the candidate settled.
    ///
    /// Short-circuiting means this holds only the checks that actually ran.
    pub checks: Vec<ConditionCheck>,
}

// ============================================================================
// SECTION: Resolutions
// ============================================================================

/// Complete result of resolving one request against a resource's rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// What the host should do.
    pub outcome: ResolutionOutcome,
    /// Per-candidate evaluation trace, in the order candidates were tried.
    pub trace: Vec<CandidateTrace>,
    /// Echo of the visitor context the engine evaluated against.
    pub context_used: VisitorContext,
    /// Request instant supplied by the caller.
    pub resolved_at: Timestamp,
}

impl Resolution {
    /// Returns whether any candidate fired.
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self.outcome, ResolutionOutcome::Matched { .. })
    }

    /// Returns the resolved effect when a candidate fired.
    #[must_use]
    pub fn effect(&self) -> Option<&ActionEffect> {
        match &self.outcome {
            ResolutionOutcome::Matched { effect, .. } => Some(effect),
            ResolutionOutcome::NoMatch => None,
        }
    }
}
