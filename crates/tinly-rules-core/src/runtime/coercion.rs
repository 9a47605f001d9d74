// crates/tinly-rules-core/src/runtime/coercion.rs
// ============================================================================
// Module: Tinly Rules Value Coercion
// Description: Class-directed coercion of context and condition values.
// Purpose: Normalize loosely typed rule values into comparison domains.
// Dependencies: bigdecimal, serde_json
// ============================================================================

//! ## Overview
//! Condition values arrive as loosely typed JSON; visitor fields arrive as
//! typed context data. Before an operator runs, both sides are coerced into
//! the condition's value class: decimals for numbers, lowercase tokens for
//! selects, booleans, or raw text. Coercion is total for context values the
//! engine builds itself and partial for authored condition values; a `None`
//! here means the condition can never match as written.
//!
//! Numeric coercion goes through [`BigDecimal`] string parsing so `3`,
//! `3.0`, and `"3"` all compare equal without float drift.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Value;

use crate::core::condition::ConditionValue;

// ============================================================================
// SECTION: Context Values
// ============================================================================

/// A visitor field after extraction, typed by its value class.
///
/// The matcher builds these from [`crate::core::VisitorContext`] fields:
/// text dimensions carry the raw string, select dimensions carry their
/// canonical lowercase token, numeric dimensions carry a decimal, and
/// boolean dimensions carry the flag.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// Raw text or a canonical select token.
    Text(String),
    /// Decimal rendering of a numeric field.
    Number(BigDecimal),
    /// Boolean flag.
    Bool(bool),
}

impl ContextValue {
    /// Returns the text payload when this value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the decimal payload when this value is numeric.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Self::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the boolean payload when this value is a flag.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Renders the value as plain JSON for trace records.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(value) => Value::String(value.clone()),
            Self::Number(value) => {
                let rendered = value.to_string();
                serde_json::from_str(&rendered).unwrap_or(Value::String(rendered))
            }
            Self::Bool(value) => Value::Bool(*value),
        }
    }
}

// ============================================================================
// SECTION: Condition Value Coercers
// ============================================================================

/// Coerces a condition value into a decimal for number-class comparisons.
///
/// Accepts JSON numbers and numeric strings; both go through decimal string
/// parsing so precision survives. Returns `None` for anything else.
#[must_use]
pub fn decimal_from_condition(value: &ConditionValue) -> Option<BigDecimal> {
    match value {
        ConditionValue::Number(number) => decimal_from_number(number),
        ConditionValue::Text(text) => BigDecimal::from_str(text.trim()).ok(),
        ConditionValue::Bool(_) | ConditionValue::List(_) => None,
    }
}

/// Coerces a condition value into owned text for text-class comparisons.
///
/// Numbers render to their canonical decimal string so a query parameter
/// condition authored as `5` still matches `?v=5`. Booleans and lists never
/// coerce.
#[must_use]
pub fn text_from_condition(value: &ConditionValue) -> Option<String> {
    match value {
        ConditionValue::Text(text) => Some(text.clone()),
        ConditionValue::Number(number) => Some(number.to_string()),
        ConditionValue::Bool(_) | ConditionValue::List(_) => None,
    }
}

/// Coerces a condition value into a boolean for boolean-class comparisons.
///
/// Accepts JSON booleans plus the strings `"true"` and `"false"` in any
/// case, since older dashboards serialized toggles as text.
#[must_use]
pub fn bool_from_condition(value: &ConditionValue) -> Option<bool> {
    match value {
        ConditionValue::Bool(flag) => Some(*flag),
        ConditionValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        ConditionValue::Number(_) | ConditionValue::List(_) => None,
    }
}

/// Coerces a condition value into a lowercase token for select-class
/// comparisons.
///
/// Text lowercases and trims; numbers render to their decimal string so a
/// weekday authored as `3` matches the context token `"3"`.
#[must_use]
pub fn token_from_condition(value: &ConditionValue) -> Option<String> {
    match value {
        ConditionValue::Text(text) => Some(text.trim().to_lowercase()),
        ConditionValue::Number(number) => Some(number.to_string()),
        ConditionValue::Bool(_) | ConditionValue::List(_) => None,
    }
}

// ============================================================================
// SECTION: Decimal Helpers
// ============================================================================

/// Converts a JSON number into a decimal via its canonical rendering.
#[must_use]
pub fn decimal_from_number(number: &serde_json::Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}
