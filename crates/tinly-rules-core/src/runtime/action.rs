// crates/tinly-rules-core/src/runtime/action.rs
// ============================================================================
// Module: Tinly Rules Action Resolution
// Description: Materialize rule actions into host-facing effects.
// Purpose: Turn the winning action plus request state into an ActionEffect.
// Dependencies: url, crate::core, crate::runtime::operator
// ============================================================================

//! ## Overview
//! Action resolution runs after a candidate's conditions hold. It fills in
//! block defaults, rewrites the destination URL for UTM actions, and rejects
//! payloads that cannot produce a usable effect. Resolution is fail-closed:
//! a fault here means the candidate is skipped and evaluation continues with
//! the next one, so a rule with a blank redirect URL can never send a
//! visitor to an empty destination.

// ============================================================================
// SECTION: Imports
// ============================================================================

use url::Url;

use crate::core::action::ActionEffect;
use crate::core::action::DEFAULT_BLOCK_MESSAGE;
use crate::core::action::DEFAULT_BLOCK_STATUS;
use crate::core::action::RuleAction;
use crate::interfaces::DegradedReason;
use crate::runtime::operator::EvalFault;

// ============================================================================
// SECTION: Action Resolution
// ============================================================================

/// Resolves an action into the effect the host should apply.
///
/// `destination` is the resource's default destination URL; only UTM actions
/// consult it.
///
/// # Errors
/// Returns [`EvalFault`] with [`DegradedReason::InvalidActionPayload`] when
/// the action cannot produce a usable effect: a blank redirect URL, a UTM
/// action with no parameters set, or a destination that does not parse.
pub fn resolve_action(
    action: &RuleAction,
    destination: Option<&str>,
) -> Result<ActionEffect, EvalFault> {
    match action {
        RuleAction::Redirect { url } => {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                return Err(payload_fault("redirect action carries an empty url"));
            }
            Ok(ActionEffect::Redirect {
                url: trimmed.to_owned(),
            })
        }
        RuleAction::AddUtm {
            utm_source,
            utm_medium,
            utm_campaign,
            utm_term,
            utm_content,
        } => {
            let written: Vec<(&str, &str)> = [
                ("utm_source", utm_source),
                ("utm_medium", utm_medium),
                ("utm_campaign", utm_campaign),
                ("utm_term", utm_term),
                ("utm_content", utm_content),
            ]
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
            .collect();
            if written.is_empty() {
                return Err(payload_fault("add_utm action sets no utm parameters"));
            }
            let destination = destination
                .ok_or_else(|| payload_fault("add_utm action needs a default destination url"))?;
            let rewritten = rewrite_destination(destination, &written)?;
            Ok(ActionEffect::Redirect { url: rewritten })
        }
        RuleAction::Block {
            status_code,
            message,
        } => Ok(ActionEffect::Block {
            status_code: status_code.unwrap_or(DEFAULT_BLOCK_STATUS),
            message: message
                .clone()
                .unwrap_or_else(|| DEFAULT_BLOCK_MESSAGE.to_owned()),
        }),
        RuleAction::ShowContent { payload } => Ok(ActionEffect::Content {
            payload: payload.clone(),
        }),
        RuleAction::SetHeader { headers } => Ok(ActionEffect::Header {
            headers: headers.clone(),
        }),
    }
}

// ============================================================================
// SECTION: Destination Rewriting
// ============================================================================

/// Rewrites the destination URL with the given UTM parameters.
///
/// Existing query parameters survive except those being written, which are
/// overwritten in place; the rule's attribution wins over whatever the
/// destination already carried.
fn rewrite_destination(destination: &str, written: &[(&str, &str)]) -> Result<String, EvalFault> {
    let mut url = Url::parse(destination).map_err(|err| {
        payload_fault(format!("destination url does not parse: {err}"))
    })?;
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !written.iter().any(|(name, _)| key.as_ref() == *name))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    {
        let mut editor = url.query_pairs_mut();
        editor.clear();
        for (key, value) in &retained {
            editor.append_pair(key, value);
        }
        for (name, value) in written {
            editor.append_pair(name, value);
        }
    }
    Ok(String::from(url))
}

/// Builds an invalid-payload fault with the given detail.
fn payload_fault(detail: impl Into<String>) -> EvalFault {
    EvalFault::new(DegradedReason::InvalidActionPayload, detail)
}
