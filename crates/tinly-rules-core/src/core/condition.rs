// crates/tinly-rules-core/src/core/condition.rs
// ============================================================================
// Module: Tinly Rules Condition Model
// Description: Condition types, operators, comparison values, and node trees.
// Purpose: Define the typed vocabulary rules use to describe visitor tests.
// Dependencies: serde, serde_json, smallvec
// ============================================================================

//! ## Overview
//! This module defines the condition vocabulary shared by single rules and
//! rule groups. Every condition names a visitor dimension (country, device,
//! scan count, ...), an operator, and a comparison value authored in the
//! dashboard. Dimensions are partitioned into value classes so each operator
//! evaluates against exactly one comparison domain; combinations outside the
//! class table never match.
//!
//! Rule definitions are untrusted input. Nothing in this module validates or
//! evaluates; see the validation and runtime modules for those boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

// ============================================================================
// SECTION: Condition Types
// ============================================================================

/// Visitor dimension a condition tests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// ISO 3166-1 alpha-2 country code from geo lookup.
    Country,
    /// City name from geo lookup.
    City,
    /// Region or state name from geo lookup.
    Region,
    /// Device category parsed from the user agent.
    Device,
    /// Operating system name parsed from the user agent.
    Os,
    /// Browser name parsed from the user agent.
    Browser,
    /// Primary language tag from `Accept-Language`.
    Language,
    /// Referrer host extracted from the `Referer` header.
    Referrer,
    /// Hour of day (0-23) in the visitor's local time.
    Time,
    /// Day of week (0 = Monday .. 6 = Sunday) in the visitor's local time.
    DayOfWeek,
    /// Calendar date in ISO `YYYY-MM-DD` form.
    Date,
    /// Total scans or clicks recorded for the resource so far.
    ScanCount,
    /// Whether this request is the visitor's first scan of the resource.
    IsFirstScan,
    /// A single query parameter, selected by the condition key.
    QueryParam,
}

impl ConditionType {
    /// Returns the value class this dimension belongs to.
    ///
    /// The class decides which operators apply and which comparison domain
    /// (decimal, boolean, token, or text) the evaluator uses.
    #[must_use]
    pub const fn value_class(self) -> ValueClass {
        match self {
            Self::ScanCount | Self::Time => ValueClass::Number,
            Self::IsFirstScan => ValueClass::Boolean,
            Self::Device | Self::DayOfWeek => ValueClass::Select,
            Self::Country
            | Self::City
            | Self::Region
            | Self::Os
            | Self::Browser
            | Self::Language
            | Self::Referrer
            | Self::Date
            | Self::QueryParam => ValueClass::Text,
        }
    }

    /// Returns whether this dimension requires a condition key.
    #[must_use]
    pub const fn requires_key(self) -> bool {
        matches!(self, Self::QueryParam)
    }

    /// Returns the canonical wire name of the dimension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::City => "city",
            Self::Region => "region",
            Self::Device => "device",
            Self::Os => "os",
            Self::Browser => "browser",
            Self::Language => "language",
            Self::Referrer => "referrer",
            Self::Time => "time",
            Self::DayOfWeek => "day_of_week",
            Self::Date => "date",
            Self::ScanCount => "scan_count",
            Self::IsFirstScan => "is_first_scan",
            Self::QueryParam => "query_param",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Value Classes
// ============================================================================

/// Comparison domain a condition type evaluates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    /// Case-insensitive string comparisons.
    Text,
    /// Decimal numeric comparisons.
    Number,
    /// Boolean comparisons.
    Boolean,
    /// Closed token vocabularies (device categories, weekday indexes).
    Select,
}

impl ValueClass {
    /// Returns the canonical wire name of the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Comparison operator applied between a visitor field and a condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    /// Equality (case-insensitive for text and select classes).
    Eq,
    /// Negated equality.
    Neq,
    /// Substring containment.
    Contains,
    /// Negated substring containment.
    NotContains,
    /// Prefix test.
    StartsWith,
    /// Suffix test.
    EndsWith,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Inclusive `[min, max]` range test.
    Between,
    /// Membership in a list of values.
    In,
    /// Negated membership in a list of values.
    NotIn,
    /// Regular expression match against the raw field text.
    Regex,
}

impl RuleOperator {
    /// Returns whether this operator is defined for the given value class.
    ///
    /// Combinations outside this table never match; the evaluator treats them
    /// as authoring faults rather than guessing a coercion.
    #[must_use]
    pub const fn supports(self, class: ValueClass) -> bool {
        match self {
            Self::Eq | Self::Neq | Self::In | Self::NotIn => true,
            Self::Contains | Self::NotContains | Self::StartsWith | Self::EndsWith | Self::Regex => {
                matches!(class, ValueClass::Text)
            }
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Between => {
                matches!(class, ValueClass::Number)
            }
        }
    }

    /// Returns whether this operator asserts the absence of a match.
    ///
    /// Negative operators may be configured to match when the visitor field
    /// itself is absent; see the matcher's absent-field policy.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Neq | Self::NotContains | Self::NotIn)
    }

    /// Returns the canonical wire name of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Condition Values
// ============================================================================

/// Comparison value authored alongside a condition.
///
/// Values arrive as loosely typed JSON from the dashboard; the evaluator
/// coerces them into the condition's value class at match time and treats
/// uncoercible values as non-matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// A boolean literal.
    Bool(bool),
    /// A JSON number literal.
    Number(serde_json::Number),
    /// A string literal.
    Text(String),
    /// A list of values, used by membership and range operators.
    List(Vec<ConditionValue>),
}

impl ConditionValue {
    /// Builds a list value from anything convertible into condition values.
    #[must_use]
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Returns the boolean literal when this value is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the number literal when this value is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<&serde_json::Number> {
        match self {
            Self::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the string literal when this value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the element slice when this value is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Returns a short name of the value's JSON shape for diagnostics.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "list",
        }
    }

    /// Renders the value as plain JSON for traces and diagnostics.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(value) => Value::Bool(*value),
            Self::Number(value) => Value::Number(value.clone()),
            Self::Text(value) => Value::String(value.clone()),
            Self::List(values) => Value::Array(values.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Number(serde_json::Number::from(value))
    }
}

impl From<u64> for ConditionValue {
    fn from(value: u64) -> Self {
        Self::Number(serde_json::Number::from(value))
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// A single visitor test: dimension, operator, comparison value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Visitor dimension under test.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Comparison operator.
    pub operator: RuleOperator,
    /// Comparison value authored with the rule.
    pub value: ConditionValue,
    /// Lookup key, meaningful only for [`ConditionType::QueryParam`].
    pub key: Option<String>,
}

impl RuleCondition {
    /// Creates a condition without a lookup key.
    #[must_use]
    pub fn new(
        condition_type: ConditionType,
        operator: RuleOperator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            condition_type,
            operator,
            value: value.into(),
            key: None,
        }
    }

    /// Attaches a lookup key to the condition.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

// ============================================================================
// SECTION: Group Logic
// ============================================================================

/// Combinator applied across a rule group's conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLogic {
    /// All conditions must match.
    And,
    /// At least one condition must match.
    Or,
}

impl GroupLogic {
    /// Returns the canonical wire name of the combinator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for GroupLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Condition Nodes
// ============================================================================

/// Composite condition tree evaluated by the matcher.
///
/// Single rules compile to an [`ConditionNode::Atomic`] leaf and rule groups
/// compile to one `All` or `Any` layer, so the matcher walks a single
/// recursive structure regardless of where a candidate came from. The tree
/// admits deeper nesting than today's dashboard produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// A single leaf condition.
    Atomic(RuleCondition),
    /// Conjunction: every child must match.
    ///
    /// Evaluation short-circuits on the first failure. An empty `All` never
    /// matches (empty bundles are treated as misconfigured, not always-on).
    All(SmallVec<[Box<Self>; 4]>),
    /// Disjunction: at least one child must match.
    ///
    /// Evaluation short-circuits on the first success. An empty `Any` never
    /// matches.
    Any(SmallVec<[Box<Self>; 4]>),
}

impl ConditionNode {
    /// Wraps a single condition as a leaf node.
    #[must_use]
    pub const fn atomic(condition: RuleCondition) -> Self {
        Self::Atomic(condition)
    }

    /// Builds a conjunction over the given conditions.
    #[must_use]
    pub fn all<I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = RuleCondition>,
    {
        Self::All(
            conditions
                .into_iter()
                .map(|condition| Box::new(Self::Atomic(condition)))
                .collect(),
        )
    }

    /// Builds a disjunction over the given conditions.
    #[must_use]
    pub fn any<I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = RuleCondition>,
    {
        Self::Any(
            conditions
                .into_iter()
                .map(|condition| Box::new(Self::Atomic(condition)))
                .collect(),
        )
    }

    /// Compiles a group's conditions under its combinator.
    #[must_use]
    pub fn from_group<I>(logic: GroupLogic, conditions: I) -> Self
    where
        I: IntoIterator<Item = RuleCondition>,
    {
        match logic {
            GroupLogic::And => Self::all(conditions),
            GroupLogic::Or => Self::any(conditions),
        }
    }
}
