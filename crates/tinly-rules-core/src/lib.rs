// crates/tinly-rules-core/src/lib.rs
// ============================================================================
// Module: Tinly Rules Core Library
// Description: Public API surface for the rule engine core.
// Purpose: Expose core types, interfaces, runtime, and validation helpers.
// Dependencies: crate::{core, interfaces, runtime, validate}
// ============================================================================

//! ## Overview
//! Tinly Rules core decides, for one visitor request against one shortened
//! link or QR code, which conditional rule fires and what effect results:
//! redirect, UTM rewrite, block, inline content, or response headers.
//! Evaluation is deterministic for a given store state and request instant,
//! never reads wall-clock time, and never fails on the redirect path; bad
//! rules degrade to skips reported through telemetry.
//!
//! The engine is backend-agnostic and integrates through explicit interfaces
//! rather than embedding into the serving stack.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;
pub mod validate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::ActionEffect;
pub use self::core::ActionType;
pub use self::core::CampaignId;
pub use self::core::CandidateSource;
pub use self::core::CandidateStatus;
pub use self::core::CandidateTrace;
pub use self::core::ConditionCheck;
pub use self::core::ConditionNode;
pub use self::core::ConditionType;
pub use self::core::ConditionValue;
pub use self::core::DEFAULT_BLOCK_MESSAGE;
pub use self::core::DEFAULT_BLOCK_STATUS;
pub use self::core::DeviceType;
pub use self::core::EvaluationScope;
pub use self::core::GroupLogic;
pub use self::core::LinkId;
pub use self::core::MatchStats;
pub use self::core::MatchedRule;
pub use self::core::PRIORITY_MAX;
pub use self::core::PRIORITY_MIN;
pub use self::core::QrCodeId;
pub use self::core::RedirectRule;
pub use self::core::RequestResource;
pub use self::core::Resolution;
pub use self::core::ResolutionOutcome;
pub use self::core::RuleAction;
pub use self::core::RuleCondition;
pub use self::core::RuleGroup;
pub use self::core::RuleGroupId;
pub use self::core::RuleId;
pub use self::core::RuleOperator;
pub use self::core::RuleTarget;
pub use self::core::Schedule;
pub use self::core::SerialBatchId;
pub use self::core::TimeError;
pub use self::core::Timestamp;
pub use self::core::ValueClass;
pub use self::core::VisitorContext;
pub use self::interfaces::DegradedEvent;
pub use self::interfaces::DegradedReason;
pub use self::interfaces::EngineTelemetry;
pub use self::interfaces::MatchRecorder;
pub use self::interfaces::NoopRecorder;
pub use self::interfaces::NoopTelemetry;
pub use self::interfaces::RecordError;
pub use self::interfaces::RuleStore;
pub use self::interfaces::StoreError;
pub use self::runtime::AbsentFieldPolicy;
pub use self::runtime::ContextValue;
pub use self::runtime::DEFAULT_MAX_CANDIDATES;
pub use self::runtime::EvalFault;
pub use self::runtime::InMemoryRuleStore;
pub use self::runtime::ResolverConfig;
pub use self::runtime::RuleResolver;
pub use self::validate::ValidationError;
pub use self::validate::validate_action;
pub use self::validate::validate_condition;
pub use self::validate::validate_group;
pub use self::validate::validate_rule;
