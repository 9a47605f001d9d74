// crates/tinly-rules-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and bounded file loading.
// Purpose: Ensure CLI inputs are parsed strictly and fail closed on bad data.
// Dependencies: tinly-rules-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Validates the request-assembly helpers behind the `test` subcommand and
//! the size-capped loaders behind both subcommands.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tinly_rules_core::AbsentFieldPolicy;
use tinly_rules_core::DEFAULT_MAX_CANDIDATES;
use tinly_rules_core::DeviceType;
use tinly_rules_core::RequestResource;
use tinly_rules_core::Timestamp;

use super::DeviceArg;
use super::TestCommand;
use super::context_from_args;
use super::load_config;
use super::load_rule_file;
use super::parse_query_pair;
use super::read_bounded;
use super::resolution_instant;
use super::scope_from_args;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn base_test_args() -> TestCommand {
    TestCommand {
        rules: PathBuf::from("rules.json"),
        config: None,
        link: Some(1),
        qr_code: None,
        campaign: None,
        serial_batch: None,
        destination: None,
        at: None,
        country: None,
        city: None,
        region: None,
        device: None,
        os: None,
        browser: None,
        language: None,
        referrer: None,
        date: None,
        query: Vec::new(),
        hour: None,
        weekday: None,
        scan_count: 0,
        first_scan: false,
    }
}

// ============================================================================
// SECTION: Query Pair Tests
// ============================================================================

#[test]
fn parse_query_pair_splits_on_first_equals() {
    let (key, value) = parse_query_pair("utm_source=news=letter").expect("pair parses");
    assert_eq!(key, "utm_source");
    assert_eq!(value, "news=letter");
}

#[test]
fn parse_query_pair_rejects_missing_separator() {
    let err = parse_query_pair("utm_source").expect_err("missing separator fails");
    assert!(err.to_string().contains("expected KEY=VALUE"), "got: {err}");
}

#[test]
fn parse_query_pair_rejects_empty_key() {
    let err = parse_query_pair("=value").expect_err("empty key fails");
    assert!(err.to_string().contains("key is empty"), "got: {err}");
}

// ============================================================================
// SECTION: Scope Tests
// ============================================================================

#[test]
fn scope_from_args_builds_link_scope_with_memberships() {
    let mut args = base_test_args();
    args.link = Some(7);
    args.campaign = Some(3);
    args.serial_batch = Some(9);
    args.destination = Some("https://example.com/product".to_string());

    let scope = scope_from_args(&args).expect("scope builds");
    assert!(matches!(scope.resource, RequestResource::Link(id) if id.get() == 7));
    assert_eq!(scope.campaign.map(|id| id.get()), Some(3));
    assert_eq!(scope.serial_batch.map(|id| id.get()), Some(9));
    assert_eq!(scope.destination.as_deref(), Some("https://example.com/product"));
}

#[test]
fn scope_from_args_requires_exactly_one_target() {
    let mut args = base_test_args();
    args.link = None;
    args.qr_code = None;
    let err = scope_from_args(&args).expect_err("no target fails");
    assert!(err.to_string().contains("exactly one"), "got: {err}");

    let mut args = base_test_args();
    args.link = Some(1);
    args.qr_code = Some(2);
    let err = scope_from_args(&args).expect_err("two targets fail");
    assert!(err.to_string().contains("exactly one"), "got: {err}");
}

#[test]
fn scope_from_args_rejects_zero_identifiers() {
    let mut args = base_test_args();
    args.link = Some(0);
    let err = scope_from_args(&args).expect_err("zero link id fails");
    assert!(err.to_string().contains("--link"), "got: {err}");
}

// ============================================================================
// SECTION: Context Tests
// ============================================================================

#[test]
fn context_from_args_maps_fields_and_query_pairs() {
    let mut args = base_test_args();
    args.country = Some("DE".to_string());
    args.device = Some(DeviceArg::Mobile);
    args.query = vec!["utm_source=newsletter".to_string(), "ref=qr".to_string()];
    args.hour = Some(23);
    args.weekday = Some(6);

    let context = context_from_args(&args).expect("context builds");
    assert_eq!(context.country_code.as_deref(), Some("DE"));
    assert_eq!(context.device_type, Some(DeviceType::Mobile));
    assert_eq!(context.query_params.get("utm_source").map(String::as_str), Some("newsletter"));
    assert_eq!(context.query_params.get("ref").map(String::as_str), Some("qr"));
    assert_eq!(context.local_hour, Some(23));
    assert_eq!(context.day_of_week, Some(6));
}

#[test]
fn context_from_args_derives_first_scan() {
    let args = base_test_args();
    let context = context_from_args(&args).expect("context builds");
    assert!(context.is_first_scan, "zero prior scans imply a first scan");

    let mut args = base_test_args();
    args.scan_count = 3;
    let context = context_from_args(&args).expect("context builds");
    assert!(!context.is_first_scan, "prior scans clear the first-scan flag");

    let mut args = base_test_args();
    args.scan_count = 3;
    args.first_scan = true;
    let context = context_from_args(&args).expect("context builds");
    assert!(context.is_first_scan, "explicit flag wins over the counter");
}

#[test]
fn context_from_args_rejects_out_of_range_clock_fields() {
    let mut args = base_test_args();
    args.hour = Some(24);
    let err = context_from_args(&args).expect_err("hour 24 fails");
    assert!(err.to_string().contains("--hour"), "got: {err}");

    let mut args = base_test_args();
    args.weekday = Some(7);
    let err = context_from_args(&args).expect_err("weekday 7 fails");
    assert!(err.to_string().contains("--weekday"), "got: {err}");
}

// ============================================================================
// SECTION: Instant Tests
// ============================================================================

#[test]
fn resolution_instant_parses_rfc3339() {
    let instant = resolution_instant(Some("1970-01-01T00:00:01Z")).expect("timestamp parses");
    assert_eq!(instant, Timestamp::from_unix_millis(1_000));
}

#[test]
fn resolution_instant_rejects_malformed_timestamps() {
    let err = resolution_instant(Some("yesterday")).expect_err("malformed timestamp fails");
    assert!(err.to_string().contains("--at"), "got: {err}");
}

#[test]
fn resolution_instant_defaults_to_a_positive_clock() {
    let instant = resolution_instant(None).expect("system clock reads");
    assert!(instant.unix_millis() > 0, "system clock is after the epoch");
}

// ============================================================================
// SECTION: File Loading Tests
// ============================================================================

#[test]
fn read_bounded_rejects_oversized_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rules.json");
    fs::write(&path, vec![b'x'; 9]).unwrap();

    let err = read_bounded(&path, 8).expect_err("oversized file fails");
    assert!(err.to_string().contains("byte limit"), "got: {err}");
}

#[test]
fn load_rule_file_parses_rules_and_groups() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rules.json");
    let payload = r#"
    {
        "rules": [
            {
                "id": 1,
                "name": "Germany geo",
                "target": {"kind": "link", "id": 7},
                "priority": 10,
                "condition": {"type": "country", "operator": "eq", "value": "DE"},
                "action": {"type": "redirect", "value": {"url": "https://example.de/"}},
                "is_active": true,
                "created_at": 1700000000000
            }
        ],
        "groups": [
            {
                "id": 2,
                "name": "Weekend mobile",
                "target": {"kind": "link", "id": 7},
                "priority": 5,
                "logic": "and",
                "conditions": [
                    {"type": "device", "operator": "eq", "value": "mobile"},
                    {"type": "day_of_week", "operator": "in", "value": [5, 6]}
                ],
                "action": {"type": "block", "value": {}},
                "is_active": true,
                "created_at": 1700000000000
            }
        ]
    }
    "#;
    fs::write(&path, payload).unwrap();

    let file = load_rule_file(&path).expect("rule file parses");
    assert_eq!(file.rules.len(), 1);
    assert_eq!(file.groups.len(), 1);
    assert_eq!(file.rules[0].name, "Germany geo");
    assert_eq!(file.groups[0].conditions.len(), 2);
}

#[test]
fn load_rule_file_rejects_malformed_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rules.json");
    fs::write(&path, "{not json").unwrap();

    let err = load_rule_file(&path).expect_err("malformed JSON fails");
    assert!(err.to_string().contains("failed to parse"), "got: {err}");
}

#[test]
fn load_config_reads_resolver_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tinly-rules.toml");
    let payload = "[resolver]\nabsent_policy = \"never_match\"\nmax_candidates = 16\n";
    fs::write(&path, payload).unwrap();

    let config = load_config(&path).expect("config parses");
    assert_eq!(config.resolver.absent_policy, AbsentFieldPolicy::NeverMatch);
    assert_eq!(config.resolver.max_candidates, 16);
}

#[test]
fn load_config_defaults_missing_sections() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tinly-rules.toml");
    fs::write(&path, "").unwrap();

    let config = load_config(&path).expect("empty config parses");
    assert_eq!(config.resolver.absent_policy, AbsentFieldPolicy::default());
    assert_eq!(config.resolver.max_candidates, DEFAULT_MAX_CANDIDATES);
}
