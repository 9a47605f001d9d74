// crates/tinly-rules-core/tests/proptest_operator.rs
// ============================================================================
// Module: Operator Property-Based Tests
// Description: Property tests for operator correctness and stability.
// Purpose: Detect panics and invariants across wide input ranges.
// ============================================================================

//! Property-based tests for operator evaluation invariants.

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

use bigdecimal::BigDecimal;
use proptest::prelude::*;
use tinly_rules_core::ConditionValue;
use tinly_rules_core::RuleOperator;
use tinly_rules_core::ValueClass;
use tinly_rules_core::runtime::ContextValue;
use tinly_rules_core::runtime::evaluate_operator;
use tinly_rules_core::runtime::operator_matches;

fn decimal(value: i64) -> ContextValue {
    ContextValue::Number(BigDecimal::from(value))
}

fn condition_value_strategy(max_depth: u32) -> impl Strategy<Value = ConditionValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(ConditionValue::Bool),
        any::<i64>().prop_map(|v| ConditionValue::Number(v.into())),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(|v| {
                serde_json::Number::from_f64(v)
                    .map_or(ConditionValue::Bool(false), ConditionValue::Number)
            }),
        ".*".prop_map(ConditionValue::Text),
    ];

    leaf.prop_recursive(max_depth, 32, 8, |inner| {
        prop::collection::vec(inner, 0 .. 4).prop_map(ConditionValue::List)
    })
}

fn context_value_strategy() -> impl Strategy<Value = ContextValue> {
    prop_oneof![
        ".*".prop_map(ContextValue::Text),
        any::<i64>().prop_map(|v| ContextValue::Number(BigDecimal::from(v))),
        any::<bool>().prop_map(ContextValue::Bool),
    ]
}

proptest! {
    #[test]
    fn operator_numeric_equality_matches_integer_equality(a in any::<i64>(), b in any::<i64>()) {
        let context = decimal(a);
        let condition = ConditionValue::from(b);
        let eq = evaluate_operator(RuleOperator::Eq, ValueClass::Number, &context, &condition);
        let neq = evaluate_operator(RuleOperator::Neq, ValueClass::Number, &context, &condition);
        prop_assert_eq!(eq, Ok(a == b));
        prop_assert_eq!(neq, Ok(a != b));
    }

    #[test]
    fn operator_numeric_ordering_matches_integer_ordering(a in any::<i64>(), b in any::<i64>()) {
        let context = decimal(a);
        let condition = ConditionValue::from(b);
        let gt = evaluate_operator(RuleOperator::Gt, ValueClass::Number, &context, &condition);
        let gte = evaluate_operator(RuleOperator::Gte, ValueClass::Number, &context, &condition);
        let lt = evaluate_operator(RuleOperator::Lt, ValueClass::Number, &context, &condition);
        let lte = evaluate_operator(RuleOperator::Lte, ValueClass::Number, &context, &condition);
        prop_assert_eq!(gt, Ok(a > b));
        prop_assert_eq!(gte, Ok(a >= b));
        prop_assert_eq!(lt, Ok(a < b));
        prop_assert_eq!(lte, Ok(a <= b));
    }

    #[test]
    fn numeric_strings_compare_by_value(a in any::<i64>()) {
        let rendered = ConditionValue::Text(a.to_string());
        let result =
            evaluate_operator(RuleOperator::Eq, ValueClass::Number, &decimal(a), &rendered);
        prop_assert_eq!(result, Ok(true));
    }

    #[test]
    fn between_matches_the_inclusive_window(
        value in any::<i64>(),
        x in any::<i64>(),
        y in any::<i64>(),
    ) {
        let (min, max) = if x <= y { (x, y) } else { (y, x) };
        let range = ConditionValue::list([min, max]);
        let result =
            evaluate_operator(RuleOperator::Between, ValueClass::Number, &decimal(value), &range);
        prop_assert_eq!(result, Ok(value >= min && value <= max));
    }

    #[test]
    fn membership_and_its_negation_are_complements(
        value in any::<i64>(),
        elements in prop::collection::vec(any::<i64>(), 0 .. 8),
    ) {
        let expected = elements.contains(&value);
        let list = ConditionValue::list(elements);
        let inside =
            evaluate_operator(RuleOperator::In, ValueClass::Number, &decimal(value), &list);
        let outside =
            evaluate_operator(RuleOperator::NotIn, ValueClass::Number, &decimal(value), &list);
        prop_assert_eq!(inside, Ok(expected));
        prop_assert_eq!(outside, Ok(!expected));
    }

    #[test]
    fn text_equality_folds_ascii_case(value in "[a-zA-Z0-9]{0,16}") {
        let context = ContextValue::Text(value.to_lowercase());
        let condition = ConditionValue::Text(value.to_uppercase());
        let result = evaluate_operator(RuleOperator::Eq, ValueClass::Text, &context, &condition);
        prop_assert_eq!(result, Ok(true));
    }

    #[test]
    fn operator_evaluation_never_panics_on_random_input(
        context in context_value_strategy(),
        condition in condition_value_strategy(2),
    ) {
        let operators = vec![
            RuleOperator::Eq,
            RuleOperator::Neq,
            RuleOperator::Contains,
            RuleOperator::NotContains,
            RuleOperator::StartsWith,
            RuleOperator::EndsWith,
            RuleOperator::Gt,
            RuleOperator::Gte,
            RuleOperator::Lt,
            RuleOperator::Lte,
            RuleOperator::Between,
            RuleOperator::In,
            RuleOperator::NotIn,
            RuleOperator::Regex,
        ];
        let classes = [
            ValueClass::Text,
            ValueClass::Number,
            ValueClass::Boolean,
            ValueClass::Select,
        ];

        for operator in operators {
            for class in classes {
                let _ = evaluate_operator(operator, class, &context, &condition);
                let _ = operator_matches(operator, class, &context, &condition);
            }
        }
    }
}
