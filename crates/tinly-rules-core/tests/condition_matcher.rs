// crates/tinly-rules-core/tests/condition_matcher.rs
// ============================================================================
// Module: Condition Matcher Tests
// Description: Field resolution, absence policies, and composite node logic.
// Purpose: Pin which visitor field each condition reads and how trees combine.
// Dependencies: tinly-rules-core, serde_json
// ============================================================================

//! Condition matching tests over visitor contexts.

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

use std::collections::BTreeMap;

use serde_json::json;
use tinly_rules_core::AbsentFieldPolicy;
use tinly_rules_core::ConditionNode;
use tinly_rules_core::ConditionType;
use tinly_rules_core::ConditionValue;
use tinly_rules_core::DegradedReason;
use tinly_rules_core::DeviceType;
use tinly_rules_core::RuleCondition;
use tinly_rules_core::RuleOperator;
use tinly_rules_core::VisitorContext;
use tinly_rules_core::runtime::match_condition;
use tinly_rules_core::runtime::match_node;
use tinly_rules_core::runtime::referrer_host;
use tinly_rules_core::runtime::resolve_context_field;

fn german_mobile_context() -> VisitorContext {
    VisitorContext {
        country_code: Some("DE".to_owned()),
        city: Some("Berlin".to_owned()),
        device_type: Some(DeviceType::Mobile),
        language: Some("de-DE".to_owned()),
        referrer: Some("https://www.google.com/search?q=tinlylink".to_owned()),
        query_params: BTreeMap::from([("promo".to_owned(), "SUMMER".to_owned())]),
        local_hour: Some(18),
        day_of_week: Some(6),
        scan_count: 4,
        is_first_scan: false,
        ..VisitorContext::default()
    }
}

fn country_is(value: &str) -> RuleCondition {
    RuleCondition::new(ConditionType::Country, RuleOperator::Eq, value)
}

#[test]
fn country_condition_matches_visitor_geo() {
    let result = match_condition(
        &country_is("de"),
        &german_mobile_context(),
        AbsentFieldPolicy::default(),
    );
    assert!(result.check.matched, "country eq should fold case against the context");
    assert_eq!(
        result.check.context_value,
        Some(json!("DE")),
        "the trace should echo the raw context value"
    );
    assert_eq!(
        result.check.condition_value,
        json!("de"),
        "the trace should echo the authored comparison value"
    );
    assert!(result.fault.is_none(), "clean evaluations carry no fault");
}

#[test]
fn query_param_lookup_is_key_sensitive_and_value_folded() {
    let context = german_mobile_context();
    let matched = match_condition(
        &RuleCondition::new(ConditionType::QueryParam, RuleOperator::Eq, "summer")
            .with_key("promo"),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(
        matched.check.matched,
        "query parameter values should compare case-insensitively"
    );
    assert_eq!(matched.check.key.as_deref(), Some("promo"), "the trace keeps the lookup key");

    let wrong_key = match_condition(
        &RuleCondition::new(ConditionType::QueryParam, RuleOperator::Eq, "summer")
            .with_key("PROMO"),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(
        !wrong_key.check.matched,
        "parameter names are looked up case-sensitively"
    );
    assert_eq!(
        wrong_key.check.context_value, None,
        "a missing parameter resolves as an absent field"
    );
}

#[test]
fn query_param_condition_without_key_is_absent() {
    let condition = RuleCondition::new(ConditionType::QueryParam, RuleOperator::Eq, "summer");
    assert_eq!(
        resolve_context_field(&condition, &german_mobile_context()),
        None,
        "a query_param condition without a key resolves nothing"
    );
}

#[test]
fn absent_fields_follow_the_configured_policy() {
    let context = VisitorContext::default();
    let negative = RuleCondition::new(ConditionType::Referrer, RuleOperator::Neq, "google.com");
    let positive = RuleCondition::new(ConditionType::Referrer, RuleOperator::Eq, "google.com");

    let lenient = match_condition(&negative, &context, AbsentFieldPolicy::NegativeOperatorsMatch);
    assert!(
        lenient.check.matched,
        "a negative operator holds on an absent field under the default policy"
    );
    assert_eq!(lenient.check.context_value, None, "absent fields trace as null");

    let strict = match_condition(&negative, &context, AbsentFieldPolicy::NeverMatch);
    assert!(
        !strict.check.matched,
        "the strict policy refuses to match absent fields at all"
    );

    for policy in [AbsentFieldPolicy::NegativeOperatorsMatch, AbsentFieldPolicy::NeverMatch] {
        let result = match_condition(&positive, &context, policy);
        assert!(
            !result.check.matched,
            "positive operators never match absent fields"
        );
        assert!(result.fault.is_none(), "absence is not a fault");
    }
}

#[test]
fn device_matches_as_select_token() {
    let context = german_mobile_context();
    let eq = match_condition(
        &RuleCondition::new(ConditionType::Device, RuleOperator::Eq, "MOBILE"),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(eq.check.matched, "device tokens should fold case");

    let membership = match_condition(
        &RuleCondition::new(
            ConditionType::Device,
            RuleOperator::In,
            ConditionValue::list(["mobile", "tablet"]),
        ),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(membership.check.matched, "device membership should accept the visitor token");
}

#[test]
fn weekday_tokens_match_numeric_authoring() {
    let context = german_mobile_context();
    let membership = match_condition(
        &RuleCondition::new(
            ConditionType::DayOfWeek,
            RuleOperator::In,
            ConditionValue::list([0_i64, 6_i64]),
        ),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(
        membership.check.matched,
        "numeric weekday literals should coerce to select tokens"
    );

    let eq = match_condition(
        &RuleCondition::new(ConditionType::DayOfWeek, RuleOperator::Eq, 6_i64),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(eq.check.matched, "weekday equality should hold for the same day");
}

#[test]
fn local_hour_compares_numerically() {
    let context = german_mobile_context();
    let after_nine = match_condition(
        &RuleCondition::new(ConditionType::Time, RuleOperator::Gte, 9_i64),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(after_nine.check.matched, "hour 18 is at or after 9");

    let office_hours = match_condition(
        &RuleCondition::new(
            ConditionType::Time,
            RuleOperator::Between,
            ConditionValue::list([9_i64, 17_i64]),
        ),
        &context,
        AbsentFieldPolicy::default(),
    );
    assert!(!office_hours.check.matched, "hour 18 falls outside a 9 to 17 window");
}

#[test]
fn scan_counters_are_always_present() {
    let context = VisitorContext::default();
    let low_count = match_condition(
        &RuleCondition::new(ConditionType::ScanCount, RuleOperator::Lt, 5_i64),
        &context,
        AbsentFieldPolicy::NeverMatch,
    );
    assert!(
        low_count.check.matched,
        "a fresh context counts zero scans even under the strict policy"
    );
    assert_eq!(
        low_count.check.context_value,
        Some(json!(0)),
        "the zero counter should trace as a number"
    );

    let first_scan = match_condition(
        &RuleCondition::new(ConditionType::IsFirstScan, RuleOperator::Eq, true),
        &context,
        AbsentFieldPolicy::NeverMatch,
    );
    assert!(first_scan.check.matched, "a fresh context is a first scan");
}

#[test]
fn referrer_conditions_match_on_host() {
    let contains = match_condition(
        &RuleCondition::new(ConditionType::Referrer, RuleOperator::Contains, "google.com"),
        &german_mobile_context(),
        AbsentFieldPolicy::default(),
    );
    assert!(contains.check.matched, "the matcher should test the referrer host");
    assert_eq!(
        contains.check.context_value,
        Some(json!("www.google.com")),
        "the trace should carry the extracted host, not the full URL"
    );
}

#[test]
fn referrer_host_extraction_degrades_gracefully() {
    assert_eq!(
        referrer_host("https://www.google.com/search?q=x"),
        "www.google.com",
        "full URLs should yield their host"
    );
    assert_eq!(
        referrer_host("  t.co/abc  "),
        "t.co",
        "scheme-less referrers should parse after an https prefix"
    );
    assert_eq!(
        referrer_host("not a url at all"),
        "not a url at all",
        "unparseable referrers fall back to the trimmed raw value"
    );
}

#[test]
fn malformed_condition_surfaces_fault_and_fails_closed() {
    let condition = RuleCondition::new(ConditionType::Country, RuleOperator::Regex, "(unclosed");
    let result =
        match_condition(&condition, &german_mobile_context(), AbsentFieldPolicy::default());
    assert!(!result.check.matched, "faulted conditions must not match");
    let fault = result.fault.expect("the fault should surface for telemetry");
    assert_eq!(fault.reason, DegradedReason::InvalidRegex, "regex faults keep their class");

    let node = match_node(
        &ConditionNode::atomic(condition),
        &german_mobile_context(),
        AbsentFieldPolicy::default(),
    );
    assert_eq!(node.faults.len(), 1, "node evaluation should forward leaf faults");
    assert!(!node.matched, "a faulted leaf fails its node");
}

#[test]
fn conjunctions_short_circuit_on_first_failure() {
    let context = german_mobile_context();
    let node = ConditionNode::all([country_is("us"), country_is("de")]);
    let result = match_node(&node, &context, AbsentFieldPolicy::default());
    assert!(!result.matched, "one failing child fails the conjunction");
    assert_eq!(
        result.checks.len(),
        1,
        "evaluation should stop at the first failing child"
    );

    let both = ConditionNode::all([country_is("de"), country_is("DE")]);
    let result = match_node(&both, &context, AbsentFieldPolicy::default());
    assert!(result.matched, "all passing children satisfy the conjunction");
    assert_eq!(result.checks.len(), 2, "every child should appear in the trace");
}

#[test]
fn disjunctions_short_circuit_on_first_success() {
    let context = german_mobile_context();
    let node = ConditionNode::any([country_is("de"), country_is("us")]);
    let result = match_node(&node, &context, AbsentFieldPolicy::default());
    assert!(result.matched, "one passing child satisfies the disjunction");
    assert_eq!(
        result.checks.len(),
        1,
        "evaluation should stop at the first passing child"
    );
}

#[test]
fn empty_composites_never_match() {
    let context = german_mobile_context();
    for node in [ConditionNode::all([]), ConditionNode::any([])] {
        let result = match_node(&node, &context, AbsentFieldPolicy::default());
        assert!(!result.matched, "an empty bundle is misconfigured, not always-on");
        assert!(result.checks.is_empty(), "nothing ran, nothing traces");
    }
}
