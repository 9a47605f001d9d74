// crates/tinly-rules-core/src/core/mod.rs
// ============================================================================
// Module: Tinly Rules Core Types
// Description: Canonical data model for rules, contexts, and resolutions.
// Purpose: Re-export the stable type vocabulary used across the engine.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core module holds the pure data model: identifiers, condition and
//! action vocabularies, rule shapes, visitor contexts, timestamps, and
//! resolution records. Nothing here evaluates or validates; behavior lives in
//! the runtime and validation modules.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod action;
pub mod condition;
pub mod context;
pub mod identifiers;
pub mod outcome;
pub mod rule;
pub mod time;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use self::action::ActionEffect;
pub use self::action::ActionType;
pub use self::action::DEFAULT_BLOCK_MESSAGE;
pub use self::action::DEFAULT_BLOCK_STATUS;
pub use self::action::RuleAction;
pub use self::condition::ConditionNode;
pub use self::condition::ConditionType;
pub use self::condition::ConditionValue;
pub use self::condition::GroupLogic;
pub use self::condition::RuleCondition;
pub use self::condition::RuleOperator;
pub use self::condition::ValueClass;
pub use self::context::DeviceType;
pub use self::context::VisitorContext;
pub use self::identifiers::CampaignId;
pub use self::identifiers::LinkId;
pub use self::identifiers::QrCodeId;
pub use self::identifiers::RuleGroupId;
pub use self::identifiers::RuleId;
pub use self::identifiers::SerialBatchId;
pub use self::outcome::CandidateSource;
pub use self::outcome::CandidateStatus;
pub use self::outcome::CandidateTrace;
pub use self::outcome::ConditionCheck;
pub use self::outcome::MatchedRule;
pub use self::outcome::Resolution;
pub use self::outcome::ResolutionOutcome;
pub use self::rule::EvaluationScope;
pub use self::rule::MatchStats;
pub use self::rule::PRIORITY_MAX;
pub use self::rule::PRIORITY_MIN;
pub use self::rule::RedirectRule;
pub use self::rule::RequestResource;
pub use self::rule::RuleGroup;
pub use self::rule::RuleTarget;
pub use self::rule::Schedule;
pub use self::time::TimeError;
pub use self::time::Timestamp;
