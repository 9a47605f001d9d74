// crates/tinly-rules-core/tests/actions.rs
// ============================================================================
// Module: Action Resolution Tests
// Description: Materializing actions into effects against request state.
// Purpose: Pin UTM rewriting, block defaults, and fail-closed payload faults.
// Dependencies: tinly-rules-core, serde_json
// ============================================================================

//! Action resolution tests.

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
use tinly_rules_core::ActionEffect;
use tinly_rules_core::DEFAULT_BLOCK_MESSAGE;
use tinly_rules_core::DEFAULT_BLOCK_STATUS;
use tinly_rules_core::DegradedReason;
use tinly_rules_core::RuleAction;
use tinly_rules_core::runtime::resolve_action;

fn utm_action(
    source: Option<&str>,
    medium: Option<&str>,
    campaign: Option<&str>,
) -> RuleAction {
    RuleAction::AddUtm {
        utm_source: source.map(str::to_owned),
        utm_medium: medium.map(str::to_owned),
        utm_campaign: campaign.map(str::to_owned),
        utm_term: None,
        utm_content: None,
    }
}

#[test]
fn redirect_trims_surrounding_whitespace() {
    let action = RuleAction::Redirect {
        url: "  https://example.de/sale  ".to_owned(),
    };
    let effect = resolve_action(&action, None).expect("a padded url should still resolve");
    assert_eq!(
        effect,
        ActionEffect::Redirect {
            url: "https://example.de/sale".to_owned(),
        },
        "the effect should carry the trimmed destination"
    );
}

#[test]
fn redirect_rejects_blank_urls() {
    let action = RuleAction::Redirect {
        url: "   ".to_owned(),
    };
    let fault = resolve_action(&action, None).expect_err("a blank url cannot resolve");
    assert_eq!(
        fault.reason,
        DegradedReason::InvalidActionPayload,
        "blank redirects classify as invalid payloads"
    );
}

#[test]
fn add_utm_overwrites_its_own_params_and_preserves_the_rest() {
    let action = utm_action(Some("newsletter"), None, Some("summer"));
    let effect = resolve_action(
        &action,
        Some("https://example.com/p?ref=qr&utm_source=old"),
    )
    .expect("a parseable destination should rewrite");
    assert_eq!(
        effect,
        ActionEffect::Redirect {
            url: "https://example.com/p?ref=qr&utm_source=newsletter&utm_campaign=summer"
                .to_owned(),
        },
        "foreign params survive, stale attribution is replaced, new params append"
    );
}

#[test]
fn add_utm_writes_params_onto_a_bare_destination() {
    let action = utm_action(Some("qr"), Some("print"), None);
    let effect = resolve_action(&action, Some("https://example.com/menu"))
        .expect("a destination without a query should rewrite");
    assert_eq!(
        effect,
        ActionEffect::Redirect {
            url: "https://example.com/menu?utm_source=qr&utm_medium=print".to_owned(),
        },
        "parameters are written in their canonical order"
    );
}

#[test]
fn add_utm_requires_at_least_one_parameter() {
    let fault = resolve_action(&utm_action(None, None, None), Some("https://example.com/"))
        .expect_err("an attribution action with nothing to write cannot resolve");
    assert_eq!(fault.reason, DegradedReason::InvalidActionPayload, "fault class");
}

#[test]
fn add_utm_requires_a_default_destination() {
    let fault = resolve_action(&utm_action(Some("qr"), None, None), None)
        .expect_err("there is no url to rewrite");
    assert_eq!(fault.reason, DegradedReason::InvalidActionPayload, "fault class");
}

#[test]
fn add_utm_rejects_unparseable_destinations() {
    let fault = resolve_action(&utm_action(Some("qr"), None, None), Some("not a url"))
        .expect_err("an unparseable destination cannot rewrite");
    assert_eq!(fault.reason, DegradedReason::InvalidActionPayload, "fault class");
}

#[test]
fn block_fills_status_and_message_defaults() {
    let bare = RuleAction::Block {
        status_code: None,
        message: None,
    };
    let effect = resolve_action(&bare, None).expect("a bare block should resolve");
    assert_eq!(
        effect,
        ActionEffect::Block {
            status_code: DEFAULT_BLOCK_STATUS,
            message: DEFAULT_BLOCK_MESSAGE.to_owned(),
        },
        "missing fields fall back to the documented defaults"
    );

    let explicit = RuleAction::Block {
        status_code: Some(451),
        message: Some("Unavailable here.".to_owned()),
    };
    let effect = resolve_action(&explicit, None).expect("an explicit block should resolve");
    assert_eq!(
        effect,
        ActionEffect::Block {
            status_code: 451,
            message: "Unavailable here.".to_owned(),
        },
        "explicit fields pass through untouched"
    );
}

#[test]
fn show_content_passes_the_payload_through() {
    let payload = json!({
        "title": "Scan verified",
        "blocks": [{"kind": "text", "body": "This bottle is genuine."}],
    });
    let action = RuleAction::ShowContent {
        payload: payload.clone(),
    };
    let effect = resolve_action(&action, None).expect("content payloads always resolve");
    assert_eq!(
        effect,
        ActionEffect::Content { payload },
        "the payload is opaque to the engine"
    );
}

#[test]
fn set_header_passes_headers_through() {
    let headers = BTreeMap::from([
        ("X-Robots-Tag".to_owned(), "noindex".to_owned()),
        ("Cache-Control".to_owned(), "no-store".to_owned()),
    ]);
    let action = RuleAction::SetHeader {
        headers: headers.clone(),
    };
    let effect = resolve_action(&action, None).expect("header actions always resolve");
    assert_eq!(
        effect,
        ActionEffect::Header { headers },
        "headers reach the host exactly as authored"
    );
}
