// crates/tinly-rules-core/src/runtime/matcher.rs
// ============================================================================
// Module: Tinly Rules Condition Matcher
// Description: Field resolution and condition tree evaluation.
// Purpose: Decide whether a visitor context satisfies a condition node.
// Dependencies: bigdecimal, serde, url, crate::core, crate::runtime
// ============================================================================

//! ## Overview
//! The matcher binds conditions to the visitor context: it resolves the
//! context field a condition tests (extracting the referrer host and looking
//! up query parameters along the way), applies absent-field semantics when
//! the field is missing, and otherwise hands the coerced pair to the
//! operator evaluator. Composite nodes recurse with short-circuiting.
//!
//! Every leaf evaluation produces a [`ConditionCheck`] trace record; faults
//! are collected alongside so the resolver can report them without the
//! matcher knowing about telemetry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::core::condition::ConditionNode;
use crate::core::condition::ConditionType;
use crate::core::condition::RuleCondition;
use crate::core::context::VisitorContext;
use crate::core::outcome::ConditionCheck;
use crate::runtime::coercion::ContextValue;
use crate::runtime::operator::EvalFault;
use crate::runtime::operator::evaluate_operator;

// ============================================================================
// SECTION: Absent Field Policy
// ============================================================================

/// How conditions behave when the visitor field they test is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentFieldPolicy {
    /// Negative operators (`neq`, `not_contains`, `not_in`) match on absent
    /// fields; all other operators do not. A visitor with no referrer is
    /// genuinely "not from google".
    #[default]
    NegativeOperatorsMatch,
    /// No operator matches an absent field.
    NeverMatch,
}

// ============================================================================
// SECTION: Condition Matching
// ============================================================================

/// Result of evaluating one leaf condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionMatch {
    /// Trace record of the evaluation.
    pub check: ConditionCheck,
    /// Fault raised when the condition could not evaluate as written.
    pub fault: Option<EvalFault>,
}

/// Evaluates one condition against the visitor context.
///
/// Absent fields short-circuit through the policy without touching the
/// operator evaluator; malformed conditions fail closed and surface their
/// fault.
#[must_use]
pub fn match_condition(
    condition: &RuleCondition,
    context: &VisitorContext,
    policy: AbsentFieldPolicy,
) -> ConditionMatch {
    let field = resolve_context_field(condition, context);
    let (matched, context_value, fault) = match field {
        Some(value) => match evaluate_operator(
            condition.operator,
            condition.condition_type.value_class(),
            &value,
            &condition.value,
        ) {
            Ok(matched) => (matched, Some(value.to_json()), None),
            Err(fault) => (false, Some(value.to_json()), Some(fault)),
        },
        None => {
            let matched = match policy {
                AbsentFieldPolicy::NegativeOperatorsMatch => condition.operator.is_negative(),
                AbsentFieldPolicy::NeverMatch => false,
            };
            (matched, None, None)
        }
    };

    ConditionMatch {
        check: ConditionCheck {
            condition_type: condition.condition_type,
            operator: condition.operator,
            key: condition.key.clone(),
            matched,
            context_value,
            condition_value: condition.value.to_json(),
        },
        fault,
    }
}

// ============================================================================
// SECTION: Node Matching
// ============================================================================

/// Result of evaluating a condition node tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMatch {
    /// Whether the tree as a whole matched.
    pub matched: bool,
    /// Leaf checks in evaluation order; short-circuited leaves are absent.
    pub checks: Vec<ConditionCheck>,
    /// Faults raised by leaves that could not evaluate as written.
    pub faults: Vec<EvalFault>,
}

/// Evaluates a condition node tree against the visitor context.
///
/// `All` short-circuits on the first failing child and `Any` on the first
/// matching child. Empty composites never match.
#[must_use]
pub fn match_node(
    node: &ConditionNode,
    context: &VisitorContext,
    policy: AbsentFieldPolicy,
) -> NodeMatch {
    match node {
        ConditionNode::Atomic(condition) => {
            let result = match_condition(condition, context, policy);
            NodeMatch {
                matched: result.check.matched,
                checks: vec![result.check],
                faults: result.fault.into_iter().collect(),
            }
        }
        ConditionNode::All(children) => {
            let mut checks = Vec::new();
            let mut faults = Vec::new();
            for child in children {
                let result = match_node(child, context, policy);
                checks.extend(result.checks);
                faults.extend(result.faults);
                if !result.matched {
                    return NodeMatch {
                        matched: false,
                        checks,
                        faults,
                    };
                }
            }
            NodeMatch {
                matched: !children.is_empty(),
                checks,
                faults,
            }
        }
        ConditionNode::Any(children) => {
            let mut checks = Vec::new();
            let mut faults = Vec::new();
            for child in children {
                let result = match_node(child, context, policy);
                checks.extend(result.checks);
                faults.extend(result.faults);
                if result.matched {
                    return NodeMatch {
                        matched: true,
                        checks,
                        faults,
                    };
                }
            }
            NodeMatch {
                matched: false,
                checks,
                faults,
            }
        }
    }
}

// ============================================================================
// SECTION: Field Resolution
// ============================================================================

/// Resolves the context field a condition tests, coerced to its class.
///
/// Returns `None` when the field is absent from this request: the upstream
/// extraction produced nothing, the query parameter is missing, or a
/// `query_param` condition carries no key. Scan counters are always present.
#[must_use]
pub fn resolve_context_field(
    condition: &RuleCondition,
    context: &VisitorContext,
) -> Option<ContextValue> {
    match condition.condition_type {
        ConditionType::Country => context.country_code.clone().map(ContextValue::Text),
        ConditionType::City => context.city.clone().map(ContextValue::Text),
        ConditionType::Region => context.region.clone().map(ContextValue::Text),
        ConditionType::Device => context
            .device_type
            .map(|device| ContextValue::Text(device.as_str().to_owned())),
        ConditionType::Os => context.os.clone().map(ContextValue::Text),
        ConditionType::Browser => context.browser.clone().map(ContextValue::Text),
        ConditionType::Language => context.language.clone().map(ContextValue::Text),
        ConditionType::Referrer => context
            .referrer
            .as_deref()
            .map(|referrer| ContextValue::Text(referrer_host(referrer))),
        ConditionType::Time => context
            .local_hour
            .map(|hour| ContextValue::Number(BigDecimal::from(u64::from(hour)))),
        ConditionType::DayOfWeek => context
            .day_of_week
            .map(|day| ContextValue::Text(day.to_string())),
        ConditionType::Date => context.date.clone().map(ContextValue::Text),
        ConditionType::ScanCount => Some(ContextValue::Number(BigDecimal::from(
            context.scan_count,
        ))),
        ConditionType::IsFirstScan => Some(ContextValue::Bool(context.is_first_scan)),
        ConditionType::QueryParam => {
            let key = condition.key.as_deref()?;
            context
                .query_params
                .get(key)
                .map(|value| ContextValue::Text(value.clone()))
        }
    }
}

/// Extracts the host from a raw referrer header value.
///
/// Scheme-less referrers are retried with an `https://` prefix; values that
/// still do not parse fall back to the trimmed raw string so substring
/// conditions keep something to match against.
#[must_use]
pub fn referrer_host(referrer: &str) -> String {
    let trimmed = referrer.trim();
    if let Ok(url) = Url::parse(trimmed)
        && let Some(host) = url.host_str()
    {
        return host.to_owned();
    }
    let with_scheme = format!("https://{trimmed}");
    if let Ok(url) = Url::parse(&with_scheme)
        && let Some(host) = url.host_str()
    {
        return host.to_owned();
    }
    trimmed.to_owned()
}
