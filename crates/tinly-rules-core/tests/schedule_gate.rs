// crates/tinly-rules-core/tests/schedule_gate.rs
// ============================================================================
// Module: Schedule Gate Tests
// Description: Activation window semantics and out-of-schedule resolution.
// Purpose: Pin inclusive bounds, open windows, and the trace a gated rule leaves.
// Dependencies: tinly-rules-core
// ============================================================================

//! Schedule window tests for rule activation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use tinly_rules_core::CandidateStatus;
use tinly_rules_core::ConditionType;
use tinly_rules_core::EvaluationScope;
use tinly_rules_core::InMemoryRuleStore;
use tinly_rules_core::LinkId;
use tinly_rules_core::MatchStats;
use tinly_rules_core::NoopRecorder;
use tinly_rules_core::NoopTelemetry;
use tinly_rules_core::RedirectRule;
use tinly_rules_core::ResolverConfig;
use tinly_rules_core::RuleAction;
use tinly_rules_core::RuleCondition;
use tinly_rules_core::RuleId;
use tinly_rules_core::RuleOperator;
use tinly_rules_core::RuleResolver;
use tinly_rules_core::RuleTarget;
use tinly_rules_core::Schedule;
use tinly_rules_core::Timestamp;
use tinly_rules_core::VisitorContext;

fn at(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

fn window(start: Option<i64>, end: Option<i64>) -> Schedule {
    Schedule {
        start: start.map(at),
        end: end.map(at),
    }
}

fn scheduled_rule(schedule: Schedule) -> RedirectRule {
    RedirectRule {
        id: RuleId::from_raw(1).expect("non-zero id"),
        name: "flash sale".to_owned(),
        target: RuleTarget::Link(LinkId::from_raw(7).expect("non-zero id")),
        priority: 10,
        condition: RuleCondition::new(ConditionType::Country, RuleOperator::Eq, "DE"),
        action: RuleAction::Redirect {
            url: "https://example.de/sale".to_owned(),
        },
        is_active: true,
        schedule: Some(schedule),
        stats: MatchStats::default(),
        created_at: at(1_000),
    }
}

#[test]
fn bounded_window_includes_both_endpoints() {
    let schedule = window(Some(10_000), Some(20_000));
    assert!(schedule.contains(at(10_000)), "the start instant is active");
    assert!(schedule.contains(at(20_000)), "the end instant is active");
    assert!(schedule.contains(at(15_000)), "interior instants are active");
    assert!(!schedule.contains(at(9_999)), "instants before the start are inactive");
    assert!(!schedule.contains(at(20_001)), "instants after the end are inactive");
}

#[test]
fn single_instant_window_is_active_for_exactly_that_instant() {
    let schedule = window(Some(10_000), Some(10_000));
    assert!(schedule.contains(at(10_000)), "start == end covers that one instant");
    assert!(!schedule.contains(at(9_999)), "nothing before");
    assert!(!schedule.contains(at(10_001)), "nothing after");
}

#[test]
fn missing_bounds_leave_that_side_open() {
    let no_start = window(None, Some(20_000));
    assert!(no_start.contains(at(i64::MIN)), "an open start reaches back forever");
    assert!(!no_start.contains(at(20_001)), "the end still gates");

    let no_end = window(Some(10_000), None);
    assert!(no_end.contains(at(i64::MAX)), "an open end reaches forward forever");
    assert!(!no_end.contains(at(9_999)), "the start still gates");

    let unbounded = window(None, None);
    assert!(unbounded.contains(at(0)), "a fully open window is always active");
}

#[test]
fn expired_rule_is_gated_and_leaves_an_out_of_schedule_trace() {
    let store = InMemoryRuleStore::new();
    store
        .insert_rule(scheduled_rule(window(Some(10_000), Some(20_000))))
        .expect("insert should succeed");

    let resolver = RuleResolver::new(
        store,
        NoopRecorder,
        NoopTelemetry,
        ResolverConfig::default(),
    );
    let scope = EvaluationScope::link(LinkId::from_raw(7).expect("non-zero id"));
    let context = VisitorContext {
        country_code: Some("DE".to_owned()),
        ..VisitorContext::default()
    };

    let resolution = resolver.test(&scope, &context, at(30_000));
    assert!(
        !resolution.is_match(),
        "a matching visitor cannot fire an expired rule"
    );
    assert_eq!(resolution.trace.len(), 1, "the gated rule should still appear in the trace");
    assert_eq!(
        resolution.trace[0].status,
        CandidateStatus::OutOfSchedule,
        "the trace should name the schedule gate as the reason"
    );
    assert!(
        resolution.trace[0].checks.is_empty(),
        "conditions are never evaluated for a gated rule"
    );

    let live = resolver.resolve(&scope, &context, at(15_000));
    assert!(
        live.is_match(),
        "the same rule fires once the request instant falls inside the window"
    );
}
