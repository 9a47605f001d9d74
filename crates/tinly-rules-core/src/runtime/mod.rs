// crates/tinly-rules-core/src/runtime/mod.rs
// ============================================================================
// Module: Tinly Rules Runtime
// Description: Coercion, operator evaluation, matching, and resolution.
// Purpose: Execute rule evaluation against visitor contexts.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the per-request evaluation pipeline. All entry
//! points (redirect handlers, dashboard dry runs, the CLI) must call into
//! the same resolver so live and test behavior cannot drift.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod action;
pub mod coercion;
pub mod matcher;
pub mod memory;
pub mod operator;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::action::resolve_action;
pub use self::coercion::ContextValue;
pub use self::matcher::AbsentFieldPolicy;
pub use self::matcher::ConditionMatch;
pub use self::matcher::NodeMatch;
pub use self::matcher::match_condition;
pub use self::matcher::match_node;
pub use self::matcher::referrer_host;
pub use self::matcher::resolve_context_field;
pub use self::memory::InMemoryRuleStore;
pub use self::operator::EvalFault;
pub use self::operator::evaluate_operator;
pub use self::operator::operator_matches;
pub use self::resolver::DEFAULT_MAX_CANDIDATES;
pub use self::resolver::ResolverConfig;
pub use self::resolver::RuleResolver;
