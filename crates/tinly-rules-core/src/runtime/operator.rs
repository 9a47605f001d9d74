// crates/tinly-rules-core/src/runtime/operator.rs
// ============================================================================
// Module: Tinly Rules Operator Evaluation
// Description: Operator evaluation inside a single value class.
// Purpose: Decide whether one visitor field satisfies one condition.
// Dependencies: bigdecimal, regex, crate::core, crate::runtime::coercion
// ============================================================================

//! ## Overview
//! Operator evaluation is the innermost step of matching: given an operator,
//! the condition's value class, a coerced visitor field, and the authored
//! comparison value, decide pass or fail. Evaluation is fail-closed; any
//! fault (unsupported operator for the class, uncoercible comparison value,
//! malformed range, uncompilable regex) is reported as an [`EvalFault`] and
//! must be treated as no-match by callers.
//!
//! Text and select comparisons are case-insensitive except `regex`, which
//! runs against the raw field text. Numeric comparisons are decimal-aware
//! and deterministic.
//!
//! Security posture: condition values and visitor fields are untrusted;
//! nothing here panics on malformed input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use regex::Regex;

use crate::core::condition::ConditionValue;
use crate::core::condition::RuleOperator;
use crate::core::condition::ValueClass;
use crate::interfaces::DegradedReason;
use crate::runtime::coercion::ContextValue;
use crate::runtime::coercion::bool_from_condition;
use crate::runtime::coercion::decimal_from_condition;
use crate::runtime::coercion::text_from_condition;
use crate::runtime::coercion::token_from_condition;

// ============================================================================
// SECTION: Evaluation Faults
// ============================================================================

/// A condition that cannot evaluate as written.
///
/// Faults classify authoring errors, not visitor states; an absent visitor
/// field is handled by the matcher before evaluation starts. Callers must
/// treat a fault as no-match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFault {
    /// Classification of the fault for telemetry.
    pub reason: DegradedReason,
    /// Human-readable detail naming the offending input.
    pub detail: String,
}

impl EvalFault {
    /// Creates a fault with the given classification and detail.
    #[must_use]
    pub fn new(reason: DegradedReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Operator Evaluation
// ============================================================================

/// Evaluates one operator inside the given value class.
///
/// The context value must already be coerced to the class (the matcher
/// guarantees this for fields it extracts); a context value outside the
/// class yields `Ok(false)` rather than a fault.
///
/// # Errors
/// Returns [`EvalFault`] when the condition cannot evaluate as written:
/// the operator is outside the class table, the comparison value does not
/// coerce, a range is malformed, or a regex does not compile.
pub fn evaluate_operator(
    operator: RuleOperator,
    class: ValueClass,
    context: &ContextValue,
    condition: &ConditionValue,
) -> Result<bool, EvalFault> {
    if !operator.supports(class) {
        return Err(EvalFault::new(
            DegradedReason::OperatorClassMismatch,
            format!("operator `{operator}` is not defined for {class} conditions"),
        ));
    }

    match class {
        ValueClass::Text => match context.as_text() {
            Some(text) => eval_text(operator, text, condition),
            None => Ok(false),
        },
        ValueClass::Number => match context.as_decimal() {
            Some(decimal) => eval_number(operator, decimal, condition),
            None => Ok(false),
        },
        ValueClass::Boolean => match context.as_bool() {
            Some(flag) => eval_boolean(operator, flag, condition),
            None => Ok(false),
        },
        ValueClass::Select => match context.as_text() {
            Some(token) => eval_select(operator, token, condition),
            None => Ok(false),
        },
    }
}

/// Fail-closed convenience wrapper over [`evaluate_operator`].
///
/// Faults collapse to `false`. Use the fallible form when fault telemetry
/// matters; the matcher does.
#[must_use]
pub fn operator_matches(
    operator: RuleOperator,
    class: ValueClass,
    context: &ContextValue,
    condition: &ConditionValue,
) -> bool {
    evaluate_operator(operator, class, context, condition).unwrap_or(false)
}

// ============================================================================
// SECTION: Text Evaluation
// ============================================================================

/// Evaluates text-class operators with case-insensitive semantics.
fn eval_text(
    operator: RuleOperator,
    context: &str,
    condition: &ConditionValue,
) -> Result<bool, EvalFault> {
    let folded = context.to_lowercase();
    match operator {
        RuleOperator::Eq => Ok(folded == text_needle(condition)?.to_lowercase()),
        RuleOperator::Neq => Ok(folded != text_needle(condition)?.to_lowercase()),
        RuleOperator::Contains => Ok(folded.contains(&text_needle(condition)?.to_lowercase())),
        RuleOperator::NotContains => Ok(!folded.contains(&text_needle(condition)?.to_lowercase())),
        RuleOperator::StartsWith => Ok(folded.starts_with(&text_needle(condition)?.to_lowercase())),
        RuleOperator::EndsWith => Ok(folded.ends_with(&text_needle(condition)?.to_lowercase())),
        RuleOperator::In => Ok(text_list_contains(condition, &folded)?),
        RuleOperator::NotIn => Ok(!text_list_contains(condition, &folded)?),
        RuleOperator::Regex => {
            let pattern = text_needle(condition)?;
            let compiled = Regex::new(&pattern).map_err(|err| {
                EvalFault::new(DegradedReason::InvalidRegex, err.to_string())
            })?;
            Ok(compiled.is_match(context))
        }
        RuleOperator::Gt
        | RuleOperator::Gte
        | RuleOperator::Lt
        | RuleOperator::Lte
        | RuleOperator::Between => Err(class_mismatch(operator, ValueClass::Text)),
    }
}

/// Extracts the text comparison value or faults.
fn text_needle(condition: &ConditionValue) -> Result<String, EvalFault> {
    text_from_condition(condition).ok_or_else(|| {
        EvalFault::new(
            DegradedReason::MalformedConditionValue,
            format!("expected a string, got {}", condition.shape()),
        )
    })
}

/// Tests case-insensitive membership of a folded field in a text list.
///
/// Elements that do not coerce to text are skipped rather than faulting so
/// one stray entry does not disable the whole list.
fn text_list_contains(condition: &ConditionValue, folded: &str) -> Result<bool, EvalFault> {
    let elements = list_elements(condition)?;
    Ok(elements.iter().any(|element| {
        text_from_condition(element).is_some_and(|text| text.to_lowercase() == folded)
    }))
}

// ============================================================================
// SECTION: Number Evaluation
// ============================================================================

/// Evaluates number-class operators with decimal-aware semantics.
fn eval_number(
    operator: RuleOperator,
    context: &BigDecimal,
    condition: &ConditionValue,
) -> Result<bool, EvalFault> {
    match operator {
        RuleOperator::Eq => Ok(context == &number_needle(condition)?),
        RuleOperator::Neq => Ok(context != &number_needle(condition)?),
        RuleOperator::Gt => Ok(number_ordering(context, condition)?.is_gt()),
        RuleOperator::Gte => Ok(number_ordering(context, condition)?.is_ge()),
        RuleOperator::Lt => Ok(number_ordering(context, condition)?.is_lt()),
        RuleOperator::Lte => Ok(number_ordering(context, condition)?.is_le()),
        RuleOperator::Between => {
            let (min, max) = range_bounds(condition)?;
            Ok(context >= &min && context <= &max)
        }
        RuleOperator::In => Ok(number_list_contains(condition, context)?),
        RuleOperator::NotIn => Ok(!number_list_contains(condition, context)?),
        RuleOperator::Contains
        | RuleOperator::NotContains
        | RuleOperator::StartsWith
        | RuleOperator::EndsWith
        | RuleOperator::Regex => Err(class_mismatch(operator, ValueClass::Number)),
    }
}

/// Extracts the decimal comparison value or faults.
fn number_needle(condition: &ConditionValue) -> Result<BigDecimal, EvalFault> {
    decimal_from_condition(condition).ok_or_else(|| {
        EvalFault::new(
            DegradedReason::MalformedConditionValue,
            format!("expected a number, got {}", condition.shape()),
        )
    })
}

/// Orders the context decimal against the comparison value.
fn number_ordering(
    context: &BigDecimal,
    condition: &ConditionValue,
) -> Result<Ordering, EvalFault> {
    let needle = number_needle(condition)?;
    Ok(context.cmp(&needle))
}

/// Extracts an inclusive `[min, max]` range or faults.
///
/// The range must be a two-element list of coercible numbers with
/// `min <= max`; anything else is a malformed range.
fn range_bounds(condition: &ConditionValue) -> Result<(BigDecimal, BigDecimal), EvalFault> {
    let elements = condition.as_list().ok_or_else(|| {
        EvalFault::new(
            DegradedReason::MalformedRange,
            format!("expected a [min, max] list, got {}", condition.shape()),
        )
    })?;
    if elements.len() != 2 {
        return Err(EvalFault::new(
            DegradedReason::MalformedRange,
            format!("expected exactly two bounds, got {}", elements.len()),
        ));
    }
    let min = elements.first().and_then(decimal_from_condition);
    let max = elements.get(1).and_then(decimal_from_condition);
    let (Some(min), Some(max)) = (min, max) else {
        return Err(EvalFault::new(
            DegradedReason::MalformedRange,
            "range bounds must be numbers".to_owned(),
        ));
    };
    if min > max {
        return Err(EvalFault::new(
            DegradedReason::MalformedRange,
            "range minimum exceeds maximum".to_owned(),
        ));
    }
    Ok((min, max))
}

/// Tests membership of the context decimal in a numeric list.
///
/// Elements that do not coerce to numbers are skipped.
fn number_list_contains(
    condition: &ConditionValue,
    context: &BigDecimal,
) -> Result<bool, EvalFault> {
    let elements = list_elements(condition)?;
    Ok(elements
        .iter()
        .any(|element| decimal_from_condition(element).is_some_and(|value| &value == context)))
}

// ============================================================================
// SECTION: Boolean Evaluation
// ============================================================================

/// Evaluates boolean-class operators.
fn eval_boolean(
    operator: RuleOperator,
    context: bool,
    condition: &ConditionValue,
) -> Result<bool, EvalFault> {
    match operator {
        RuleOperator::Eq => Ok(context == boolean_needle(condition)?),
        RuleOperator::Neq => Ok(context != boolean_needle(condition)?),
        RuleOperator::In => Ok(boolean_list_contains(condition, context)?),
        RuleOperator::NotIn => Ok(!boolean_list_contains(condition, context)?),
        RuleOperator::Contains
        | RuleOperator::NotContains
        | RuleOperator::StartsWith
        | RuleOperator::EndsWith
        | RuleOperator::Gt
        | RuleOperator::Gte
        | RuleOperator::Lt
        | RuleOperator::Lte
        | RuleOperator::Between
        | RuleOperator::Regex => Err(class_mismatch(operator, ValueClass::Boolean)),
    }
}

/// Extracts the boolean comparison value or faults.
fn boolean_needle(condition: &ConditionValue) -> Result<bool, EvalFault> {
    bool_from_condition(condition).ok_or_else(|| {
        EvalFault::new(
            DegradedReason::MalformedConditionValue,
            format!("expected a boolean, got {}", condition.shape()),
        )
    })
}

/// Tests membership of the context flag in a boolean list.
fn boolean_list_contains(condition: &ConditionValue, context: bool) -> Result<bool, EvalFault> {
    let elements = list_elements(condition)?;
    Ok(elements
        .iter()
        .any(|element| bool_from_condition(element) == Some(context)))
}

// ============================================================================
// SECTION: Select Evaluation
// ============================================================================

/// Evaluates select-class operators over canonical lowercase tokens.
fn eval_select(
    operator: RuleOperator,
    context: &str,
    condition: &ConditionValue,
) -> Result<bool, EvalFault> {
    match operator {
        RuleOperator::Eq => Ok(context == select_needle(condition)?),
        RuleOperator::Neq => Ok(context != select_needle(condition)?),
        RuleOperator::In => Ok(select_list_contains(condition, context)?),
        RuleOperator::NotIn => Ok(!select_list_contains(condition, context)?),
        RuleOperator::Contains
        | RuleOperator::NotContains
        | RuleOperator::StartsWith
        | RuleOperator::EndsWith
        | RuleOperator::Gt
        | RuleOperator::Gte
        | RuleOperator::Lt
        | RuleOperator::Lte
        | RuleOperator::Between
        | RuleOperator::Regex => Err(class_mismatch(operator, ValueClass::Select)),
    }
}

/// Extracts the select token comparison value or faults.
fn select_needle(condition: &ConditionValue) -> Result<String, EvalFault> {
    token_from_condition(condition).ok_or_else(|| {
        EvalFault::new(
            DegradedReason::MalformedConditionValue,
            format!("expected a select token, got {}", condition.shape()),
        )
    })
}

/// Tests membership of the context token in a token list.
fn select_list_contains(condition: &ConditionValue, context: &str) -> Result<bool, EvalFault> {
    let elements = list_elements(condition)?;
    Ok(elements
        .iter()
        .any(|element| token_from_condition(element).is_some_and(|token| token == context)))
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Extracts list elements for membership operators or faults.
fn list_elements(condition: &ConditionValue) -> Result<&[ConditionValue], EvalFault> {
    condition.as_list().ok_or_else(|| {
        EvalFault::new(
            DegradedReason::MalformedConditionValue,
            format!("expected a list of values, got {}", condition.shape()),
        )
    })
}

/// Builds the class-mismatch fault for an operator outside its table.
fn class_mismatch(operator: RuleOperator, class: ValueClass) -> EvalFault {
    EvalFault::new(
        DegradedReason::OperatorClassMismatch,
        format!("operator `{operator}` is not defined for {class} conditions"),
    )
}
