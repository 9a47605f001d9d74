// crates/tinly-rules-core/src/validate.rs
// ============================================================================
// Module: Tinly Rules Validation
// Description: Write-time validation for rules, groups, and actions.
// Purpose: Reject malformed definitions before they reach the store.
// Dependencies: regex, thiserror, url, crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Validation runs when rules are created or edited, not on the redirect
//! path. It enforces the same class and shape discipline the evaluator
//! applies at match time, so a definition that validates cleanly cannot
//! degrade later for structural reasons. The evaluator still fails closed on
//! its own; stores migrated from older schemas may hold rules that never
//! passed through here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::core::action::RuleAction;
use crate::core::condition::ConditionType;
use crate::core::condition::ConditionValue;
use crate::core::condition::RuleCondition;
use crate::core::condition::RuleOperator;
use crate::core::condition::ValueClass;
use crate::core::context::DeviceType;
use crate::core::rule::PRIORITY_MAX;
use crate::core::rule::PRIORITY_MIN;
use crate::core::rule::RedirectRule;
use crate::core::rule::RuleGroup;
use crate::core::rule::Schedule;
use crate::runtime::coercion::bool_from_condition;
use crate::runtime::coercion::decimal_from_condition;
use crate::runtime::coercion::text_from_condition;
use crate::runtime::coercion::token_from_condition;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failures for rule and group definitions.
///
/// # Invariants
/// - Variants are stable for programmatic handling; the dashboard maps them
///   to field-level feedback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The operator is outside the condition type's value class table.
    #[error("operator `{operator}` is not defined for {class} conditions (`{condition_type}`)")]
    OperatorClassMismatch {
        /// Dimension the condition tests.
        condition_type: ConditionType,
        /// Offending operator.
        operator: RuleOperator,
        /// Value class of the dimension.
        class: ValueClass,
    },
    /// The comparison value does not coerce into the condition's class.
    #[error("`{condition_type}` conditions require {expected}, got {got}")]
    ValueShape {
        /// Dimension the condition tests.
        condition_type: ConditionType,
        /// Shape the class requires.
        expected: &'static str,
        /// Shape that was authored.
        got: &'static str,
    },
    /// A `between` range is not a two-element `[min, max]` list of numbers.
    #[error("`between` requires a [min, max] list of two numbers with min <= max")]
    InvalidRange,
    /// A membership operator was given a non-list value.
    #[error("`{operator}` requires a list value, got {got}")]
    ExpectedList {
        /// Offending operator.
        operator: RuleOperator,
        /// Shape that was authored.
        got: &'static str,
    },
    /// A regex condition carries an uncompilable pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(String),
    /// A `query_param` condition has no lookup key.
    #[error("`query_param` conditions require a non-empty key")]
    MissingQueryKey,
    /// A device condition names an unknown device token.
    #[error("`{0}` is not a known device type")]
    UnknownDevice(String),
    /// A day-of-week condition is outside the weekday range.
    #[error("day_of_week values must be integers in 0..=6 (0 = Monday)")]
    InvalidWeekday,
    /// The priority is outside the allowed band.
    #[error("priority {0} is outside {PRIORITY_MIN}..={PRIORITY_MAX}")]
    PriorityOutOfRange(i32),
    /// The schedule window ends before it starts.
    #[error("schedule start is after schedule end")]
    ScheduleInverted,
    /// The rule or group has no name.
    #[error("rules require a non-empty name")]
    EmptyName,
    /// A redirect action's URL is blank or not an absolute http(s) URL.
    #[error("redirect actions require an absolute http(s) url")]
    InvalidRedirectUrl,
    /// A UTM action sets no parameters.
    #[error("add_utm actions must set at least one utm parameter")]
    EmptyUtm,
    /// A block action's status code is outside the HTTP range.
    #[error("block status code {0} is outside 100..=599")]
    InvalidStatusCode(u16),
    /// A header action carries no headers.
    #[error("set_header actions require at least one header")]
    EmptyHeaders,
    /// A header action carries a blank or malformed header name.
    #[error("`{0}` is not a valid header name")]
    InvalidHeaderName(String),
    /// A rule group has no conditions.
    #[error("rule groups require at least one condition")]
    EmptyGroup,
}

// ============================================================================
// SECTION: Rule Validation
// ============================================================================

/// Validates a single rule definition end to end.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found in the rule's name, priority,
/// schedule, condition, or action.
pub fn validate_rule(rule: &RedirectRule) -> Result<(), ValidationError> {
    validate_name(&rule.name)?;
    validate_priority(rule.priority)?;
    validate_schedule(rule.schedule.as_ref())?;
    validate_condition(&rule.condition)?;
    validate_action(&rule.action)
}

/// Validates a rule group definition end to end.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found in the group's name,
/// priority, schedule, conditions, or action.
pub fn validate_group(group: &RuleGroup) -> Result<(), ValidationError> {
    validate_name(&group.name)?;
    validate_priority(group.priority)?;
    validate_schedule(group.schedule.as_ref())?;
    if group.conditions.is_empty() {
        return Err(ValidationError::EmptyGroup);
    }
    for condition in &group.conditions {
        validate_condition(condition)?;
    }
    validate_action(&group.action)
}

/// Rejects empty or whitespace-only names.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Rejects priorities outside the allowed band.
fn validate_priority(priority: i32) -> Result<(), ValidationError> {
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        return Err(ValidationError::PriorityOutOfRange(priority));
    }
    Ok(())
}

/// Rejects schedule windows that end before they start.
fn validate_schedule(schedule: Option<&Schedule>) -> Result<(), ValidationError> {
    if let Some(schedule) = schedule
        && let (Some(start), Some(end)) = (schedule.start, schedule.end)
        && start > end
    {
        return Err(ValidationError::ScheduleInverted);
    }
    Ok(())
}

// ============================================================================
// SECTION: Condition Validation
// ============================================================================

/// Validates one condition against the class and shape tables.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the operator falls outside the class
/// table, the key is missing, or the comparison value has the wrong shape.
pub fn validate_condition(condition: &RuleCondition) -> Result<(), ValidationError> {
    let class = condition.condition_type.value_class();
    if !condition.operator.supports(class) {
        return Err(ValidationError::OperatorClassMismatch {
            condition_type: condition.condition_type,
            operator: condition.operator,
            class,
        });
    }
    if condition.condition_type.requires_key() {
        let key = condition.key.as_deref().map(str::trim).unwrap_or_default();
        if key.is_empty() {
            return Err(ValidationError::MissingQueryKey);
        }
    }
    match condition.operator {
        RuleOperator::In | RuleOperator::NotIn => {
            let elements = condition.value.as_list().ok_or(ValidationError::ExpectedList {
                operator: condition.operator,
                got: condition.value.shape(),
            })?;
            for element in elements {
                validate_scalar(class, element, condition.condition_type)?;
            }
            Ok(())
        }
        RuleOperator::Between => validate_range(&condition.value),
        RuleOperator::Regex => validate_regex(&condition.value, condition.condition_type),
        _ => validate_scalar(class, &condition.value, condition.condition_type),
    }
}

/// Validates a scalar comparison value against its class.
fn validate_scalar(
    class: ValueClass,
    value: &ConditionValue,
    condition_type: ConditionType,
) -> Result<(), ValidationError> {
    match class {
        ValueClass::Text => {
            if text_from_condition(value).is_none() {
                return Err(shape_error(condition_type, "a string", value));
            }
            Ok(())
        }
        ValueClass::Number => {
            if decimal_from_condition(value).is_none() {
                return Err(shape_error(condition_type, "a number", value));
            }
            Ok(())
        }
        ValueClass::Boolean => {
            if bool_from_condition(value).is_none() {
                return Err(shape_error(condition_type, "a boolean", value));
            }
            Ok(())
        }
        ValueClass::Select => {
            let token = token_from_condition(value)
                .ok_or_else(|| shape_error(condition_type, "a select token", value))?;
            validate_select_token(condition_type, &token)
        }
    }
}

/// Validates a select token against its dimension's vocabulary.
fn validate_select_token(
    condition_type: ConditionType,
    token: &str,
) -> Result<(), ValidationError> {
    match condition_type {
        ConditionType::Device => {
            if DeviceType::from_keyword(token).is_none() {
                return Err(ValidationError::UnknownDevice(token.to_owned()));
            }
            Ok(())
        }
        ConditionType::DayOfWeek => match token.parse::<u8>() {
            Ok(day) if day <= 6 => Ok(()),
            _ => Err(ValidationError::InvalidWeekday),
        },
        _ => Ok(()),
    }
}

/// Validates a `between` range value.
fn validate_range(value: &ConditionValue) -> Result<(), ValidationError> {
    let elements = value.as_list().ok_or(ValidationError::InvalidRange)?;
    if elements.len() != 2 {
        return Err(ValidationError::InvalidRange);
    }
    let min = elements.first().and_then(decimal_from_condition);
    let max = elements.get(1).and_then(decimal_from_condition);
    match (min, max) {
        (Some(min), Some(max)) if min <= max => Ok(()),
        _ => Err(ValidationError::InvalidRange),
    }
}

/// Validates a regex pattern value by compiling it.
fn validate_regex(
    value: &ConditionValue,
    condition_type: ConditionType,
) -> Result<(), ValidationError> {
    let pattern = value
        .as_text()
        .ok_or_else(|| shape_error(condition_type, "a string pattern", value))?;
    Regex::new(pattern).map_err(|err| ValidationError::InvalidRegex(err.to_string()))?;
    Ok(())
}

/// Builds the shape error for a value outside its class.
fn shape_error(
    condition_type: ConditionType,
    expected: &'static str,
    value: &ConditionValue,
) -> ValidationError {
    ValidationError::ValueShape {
        condition_type,
        expected,
        got: value.shape(),
    }
}

// ============================================================================
// SECTION: Action Validation
// ============================================================================

/// Validates an action payload.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the payload cannot produce a usable
/// effect at match time.
pub fn validate_action(action: &RuleAction) -> Result<(), ValidationError> {
    match action {
        RuleAction::Redirect { url } => {
            let parsed = Url::parse(url.trim()).map_err(|_| ValidationError::InvalidRedirectUrl)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::InvalidRedirectUrl);
            }
            Ok(())
        }
        RuleAction::AddUtm {
            utm_source,
            utm_medium,
            utm_campaign,
            utm_term,
            utm_content,
        } => {
            let any_set = [utm_source, utm_medium, utm_campaign, utm_term, utm_content]
                .into_iter()
                .any(|value| value.as_deref().is_some_and(|value| !value.trim().is_empty()));
            if !any_set {
                return Err(ValidationError::EmptyUtm);
            }
            Ok(())
        }
        RuleAction::Block { status_code, .. } => {
            if let Some(code) = status_code
                && !(100..=599).contains(code)
            {
                return Err(ValidationError::InvalidStatusCode(*code));
            }
            Ok(())
        }
        RuleAction::ShowContent { .. } => Ok(()),
        RuleAction::SetHeader { headers } => {
            if headers.is_empty() {
                return Err(ValidationError::EmptyHeaders);
            }
            for name in headers.keys() {
                let trimmed = name.trim();
                if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
                    return Err(ValidationError::InvalidHeaderName(name.clone()));
                }
            }
            Ok(())
        }
    }
}
