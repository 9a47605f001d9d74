// crates/tinly-rules-core/src/runtime/resolver.rs
// ============================================================================
// Module: Tinly Rules Resolver
// Description: Candidate collection, ranking, and first-match resolution.
// Purpose: Execute the full per-request evaluation pipeline.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The resolver is the single canonical evaluation path. Redirect handlers
//! and dashboard dry runs both call into it; the only difference between
//! [`RuleResolver::resolve`] and [`RuleResolver::test`] is whether the
//! winning candidate's match counter is recorded.
//!
//! Per request: fetch applicable candidates, rank them (priority, then
//! recency, then identifier, all descending), gate each by schedule, and
//! return the first candidate whose conditions hold and whose action
//! resolves. Exactly one candidate wins or none does; nothing on this path
//! returns an error to the caller. Store failures, malformed rules, and
//! unresolvable actions degrade to skips or a no-match resolution and are
//! reported through telemetry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::RuleAction;
use crate::core::condition::ConditionNode;
use crate::core::context::VisitorContext;
use crate::core::outcome::CandidateSource;
use crate::core::outcome::CandidateStatus;
use crate::core::outcome::CandidateTrace;
use crate::core::outcome::MatchedRule;
use crate::core::outcome::Resolution;
use crate::core::outcome::ResolutionOutcome;
use crate::core::rule::EvaluationScope;
use crate::core::rule::RedirectRule;
use crate::core::rule::RuleGroup;
use crate::core::rule::Schedule;
use crate::core::time::Timestamp;
use crate::interfaces::DegradedEvent;
use crate::interfaces::DegradedReason;
use crate::interfaces::EngineTelemetry;
use crate::interfaces::MatchRecorder;
use crate::interfaces::RuleStore;
use crate::interfaces::StoreError;
use crate::runtime::action::resolve_action;
use crate::runtime::matcher::AbsentFieldPolicy;
use crate::runtime::matcher::match_node;

// ============================================================================
// SECTION: Resolver Configuration
// ============================================================================

/// Default cap on the number of candidates evaluated per request.
pub const DEFAULT_MAX_CANDIDATES: usize = 256;

/// Configuration for the rule resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How conditions treat absent visitor fields.
    pub absent_policy: AbsentFieldPolicy,
    /// Cap on candidates evaluated per request; the lowest-ranked overflow
    /// is dropped and reported through telemetry.
    pub max_candidates: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            absent_policy: AbsentFieldPolicy::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

// ============================================================================
// SECTION: Candidates
// ============================================================================

/// A ranked evaluation candidate compiled from a rule or rule group.
struct Candidate {
    /// Identity carried into traces and match records.
    source: CandidateSource,
    /// Name carried into traces.
    name: String,
    /// Ranking priority, higher first.
    priority: i32,
    /// Creation instant, used as the recency tie-break.
    created_at: Timestamp,
    /// Activation window, when any.
    schedule: Option<Schedule>,
    /// Compiled condition tree.
    node: ConditionNode,
    /// Action taken when the candidate wins.
    action: RuleAction,
}

impl Candidate {
    /// Compiles a single rule into a candidate.
    fn from_rule(rule: RedirectRule) -> Self {
        Self {
            source: CandidateSource::Rule(rule.id),
            name: rule.name,
            priority: rule.priority,
            created_at: rule.created_at,
            schedule: rule.schedule,
            node: ConditionNode::atomic(rule.condition),
            action: rule.action,
        }
    }

    /// Compiles a rule group into a candidate.
    fn from_group(group: RuleGroup) -> Self {
        Self {
            source: CandidateSource::Group(group.id),
            name: group.name,
            priority: group.priority,
            created_at: group.created_at,
            schedule: group.schedule,
            node: ConditionNode::from_group(group.logic, group.conditions),
            action: group.action,
        }
    }

    /// Returns the identifier tie-break key; rules outrank groups on a full
    /// tie so ordering is total.
    const fn sort_id(&self) -> (u64, u8) {
        match self.source {
            CandidateSource::Rule(id) => (id.get(), 1),
            CandidateSource::Group(id) => (id.get(), 0),
        }
    }
}

// ============================================================================
// SECTION: Rule Resolver
// ============================================================================

/// First-match rule resolver over pluggable storage and telemetry.
pub struct RuleResolver<S, R, T> {
    /// Source of rule candidates.
    store: S,
    /// Sink for match counters.
    recorder: R,
    /// Sink for degraded-evaluation events.
    telemetry: T,
    /// Evaluation configuration.
    config: ResolverConfig,
}

impl<S, R, T> RuleResolver<S, R, T>
where
    S: RuleStore,
    R: MatchRecorder,
    T: EngineTelemetry,
{
    /// Creates a resolver over the given store, recorder, and telemetry.
    pub const fn new(store: S, recorder: R, telemetry: T, config: ResolverConfig) -> Self {
        Self {
            store,
            recorder,
            telemetry,
            config,
        }
    }

    /// Resolves a live request: the winning candidate's match is recorded.
    ///
    /// Never fails; store errors and malformed rules degrade to a no-match
    /// resolution or a skipped candidate, reported through telemetry.
    #[must_use]
    pub fn resolve(
        &self,
        scope: &EvaluationScope,
        context: &VisitorContext,
        now: Timestamp,
    ) -> Resolution {
        self.run(scope, context, now, true)
    }

    /// Resolves a dashboard dry run: identical semantics to [`Self::resolve`]
    /// but no counters move, so repeated calls with the same inputs return
    /// the same resolution.
    #[must_use]
    pub fn test(
        &self,
        scope: &EvaluationScope,
        context: &VisitorContext,
        now: Timestamp,
    ) -> Resolution {
        self.run(scope, context, now, false)
    }

    /// Shared evaluation pipeline for live and dry-run resolutions.
    fn run(
        &self,
        scope: &EvaluationScope,
        context: &VisitorContext,
        now: Timestamp,
        record: bool,
    ) -> Resolution {
        let mut trace = Vec::new();

        let mut candidates = match self.collect_candidates(scope) {
            Ok(candidates) => candidates,
            Err(err) => {
                self.telemetry.on_degraded(DegradedEvent {
                    source: None,
                    reason: DegradedReason::StoreUnavailable,
                    detail: err.to_string(),
                });
                return no_match(trace, context, now);
            }
        };

        candidates.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.sort_id().cmp(&a.sort_id()))
        });

        if candidates.len() > self.config.max_candidates {
            let dropped = candidates.len() - self.config.max_candidates;
            candidates.truncate(self.config.max_candidates);
            self.telemetry.on_degraded(DegradedEvent {
                source: None,
                reason: DegradedReason::CandidateOverflow,
                detail: format!(
                    "dropped {dropped} candidates over the cap of {}",
                    self.config.max_candidates
                ),
            });
        }

        for candidate in candidates {
            if let Some(schedule) = candidate.schedule
                && !schedule.contains(now)
            {
                trace.push(CandidateTrace {
                    source: candidate.source,
                    name: candidate.name,
                    priority: candidate.priority,
                    status: CandidateStatus::OutOfSchedule,
                    checks: Vec::new(),
                });
                continue;
            }

            let outcome = match_node(&candidate.node, context, self.config.absent_policy);
            for fault in outcome.faults {
                self.telemetry.on_degraded(DegradedEvent {
                    source: Some(candidate.source),
                    reason: fault.reason,
                    detail: fault.detail,
                });
            }

            if !outcome.matched {
                trace.push(CandidateTrace {
                    source: candidate.source,
                    name: candidate.name,
                    priority: candidate.priority,
                    status: CandidateStatus::Unmatched,
                    checks: outcome.checks,
                });
                continue;
            }

            match resolve_action(&candidate.action, scope.destination.as_deref()) {
                Ok(effect) => {
                    let matched = MatchedRule {
                        source: candidate.source,
                        name: candidate.name.clone(),
                        action_type: candidate.action.action_type(),
                    };
                    trace.push(CandidateTrace {
                        source: candidate.source,
                        name: candidate.name,
                        priority: candidate.priority,
                        status: CandidateStatus::Matched,
                        checks: outcome.checks,
                    });
                    if record
                        && let Err(err) = self.recorder.record_match(candidate.source, now)
                    {
                        self.telemetry.on_degraded(DegradedEvent {
                            source: Some(candidate.source),
                            reason: DegradedReason::RecorderFailed,
                            detail: err.to_string(),
                        });
                    }
                    return Resolution {
                        outcome: ResolutionOutcome::Matched {
                            rule: matched,
                            effect,
                        },
                        trace,
                        context_used: context.clone(),
                        resolved_at: now,
                    };
                }
                Err(fault) => {
                    self.telemetry.on_degraded(DegradedEvent {
                        source: Some(candidate.source),
                        reason: fault.reason,
                        detail: fault.detail,
                    });
                    trace.push(CandidateTrace {
                        source: candidate.source,
                        name: candidate.name,
                        priority: candidate.priority,
                        status: CandidateStatus::Degraded,
                        checks: outcome.checks,
                    });
                }
            }
        }

        no_match(trace, context, now)
    }

    /// Fetches and compiles the applicable candidates for a scope.
    ///
    /// Inactive or out-of-scope entries returned by the store are dropped
    /// here; the resolver does not trust the store to have filtered.
    fn collect_candidates(&self, scope: &EvaluationScope) -> Result<Vec<Candidate>, StoreError> {
        let rules = self.store.rules_for(scope)?;
        let groups = self.store.groups_for(scope)?;
        let mut candidates = Vec::with_capacity(rules.len() + groups.len());
        for rule in rules {
            if rule.is_active && rule.target.applies_to(scope) {
                candidates.push(Candidate::from_rule(rule));
            }
        }
        for group in groups {
            if group.is_active && group.target.applies_to(scope) {
                candidates.push(Candidate::from_group(group));
            }
        }
        Ok(candidates)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the no-match resolution shared by fall-through and store failure.
fn no_match(trace: Vec<CandidateTrace>, context: &VisitorContext, now: Timestamp) -> Resolution {
    Resolution {
        outcome: ResolutionOutcome::NoMatch,
        trace,
        context_used: context.clone(),
        resolved_at: now,
    }
}
