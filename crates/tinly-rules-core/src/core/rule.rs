// crates/tinly-rules-core/src/core/rule.rs
// ============================================================================
// Module: Tinly Rules Rule Model
// Description: Redirect rules, rule groups, targets, schedules, and stats.
// Purpose: Define the stored rule shapes the resolver evaluates per request.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A redirect rule binds one condition and one action to a target resource
//! with a priority and an optional activation window. A rule group carries a
//! bundle of conditions under an `and`/`or` combinator but is otherwise the
//! same shape; both enter the resolver's candidate pool on equal footing.
//!
//! Targets may be direct (a link or QR code) or transitive (a campaign or
//! serial batch the resource belongs to). The evaluation scope describes the
//! request side of that relationship.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::RuleAction;
use crate::core::condition::GroupLogic;
use crate::core::condition::RuleCondition;
use crate::core::identifiers::CampaignId;
use crate::core::identifiers::LinkId;
use crate::core::identifiers::QrCodeId;
use crate::core::identifiers::RuleGroupId;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::SerialBatchId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Priority Bounds
// ============================================================================

/// Lowest priority a rule may carry.
pub const PRIORITY_MIN: i32 = -1000;

/// Highest priority a rule may carry.
pub const PRIORITY_MAX: i32 = 1000;

// ============================================================================
// SECTION: Targets and Scope
// ============================================================================

/// Resource a rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RuleTarget {
    /// A single shortened link.
    Link(LinkId),
    /// A single QR code.
    QrCode(QrCodeId),
    /// Every link and QR code inside a campaign.
    Campaign(CampaignId),
    /// Every unit code inside a serialized QR batch.
    SerialBatch(SerialBatchId),
}

impl RuleTarget {
    /// Returns whether this target covers the given evaluation scope.
    ///
    /// Direct targets must name the scoped resource itself; campaign and
    /// serial batch targets cover the scope through its declared memberships.
    #[must_use]
    pub fn applies_to(&self, scope: &EvaluationScope) -> bool {
        match self {
            Self::Link(id) => matches!(scope.resource, RequestResource::Link(link) if link == *id),
            Self::QrCode(id) => {
                matches!(scope.resource, RequestResource::QrCode(code) if code == *id)
            }
            Self::Campaign(id) => scope.campaign == Some(*id),
            Self::SerialBatch(id) => scope.serial_batch == Some(*id),
        }
    }
}

/// Resource a visitor request actually landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RequestResource {
    /// The request hit a shortened link.
    Link(LinkId),
    /// The request hit a QR code.
    QrCode(QrCodeId),
}

/// Request-side description of the resource under evaluation.
///
/// The scope names the concrete resource plus the campaign and serial batch
/// memberships through which transitive rules reach it. The default
/// destination is the resource's configured URL, used when an action rewrites
/// rather than replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationScope {
    /// Resource the visitor hit.
    pub resource: RequestResource,
    /// Campaign the resource belongs to, when any.
    pub campaign: Option<CampaignId>,
    /// Serial batch the resource belongs to, when any.
    pub serial_batch: Option<SerialBatchId>,
    /// The resource's default destination URL, when known.
    pub destination: Option<String>,
}

impl EvaluationScope {
    /// Creates a scope for a link request with no memberships.
    #[must_use]
    pub const fn link(id: LinkId) -> Self {
        Self {
            resource: RequestResource::Link(id),
            campaign: None,
            serial_batch: None,
            destination: None,
        }
    }

    /// Creates a scope for a QR code request with no memberships.
    #[must_use]
    pub const fn qr_code(id: QrCodeId) -> Self {
        Self {
            resource: RequestResource::QrCode(id),
            campaign: None,
            serial_batch: None,
            destination: None,
        }
    }

    /// Declares the campaign the resource belongs to.
    #[must_use]
    pub fn with_campaign(mut self, id: CampaignId) -> Self {
        self.campaign = Some(id);
        self
    }

    /// Declares the serial batch the resource belongs to.
    #[must_use]
    pub fn with_serial_batch(mut self, id: SerialBatchId) -> Self {
        self.serial_batch = Some(id);
        self
    }

    /// Declares the resource's default destination URL.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

// ============================================================================
// SECTION: Schedules
// ============================================================================

/// Optional activation window for a rule.
///
/// # Invariants
/// - Both bounds are inclusive; a window with `start == end` is active for
///   exactly that instant.
/// - A missing bound leaves that side of the window open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Earliest instant the rule is active, when bounded.
    pub start: Option<Timestamp>,
    /// Latest instant the rule is active, when bounded.
    pub end: Option<Timestamp>,
}

impl Schedule {
    /// Returns whether the window covers the given instant.
    #[must_use]
    pub fn contains(&self, now: Timestamp) -> bool {
        if let Some(start) = self.start
            && now < start
        {
            return false;
        }
        if let Some(end) = self.end
            && now > end
        {
            return false;
        }
        true
    }
}

// ============================================================================
// SECTION: Match Statistics
// ============================================================================

/// Per-rule match counters maintained by the storage layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStats {
    /// Number of live resolutions this rule has won.
    pub times_matched: u64,
    /// Instant of the most recent live match, when any.
    pub last_matched_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// A single conditional redirect rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectRule {
    /// Stable rule identifier.
    pub id: RuleId,
    /// Human-readable rule name shown in traces and the dashboard.
    pub name: String,
    /// Resource the rule is attached to.
    pub target: RuleTarget,
    /// Evaluation priority; higher values are considered first.
    pub priority: i32,
    /// The visitor test that must pass for the rule to fire.
    pub condition: RuleCondition,
    /// Action taken when the rule fires.
    pub action: RuleAction,
    /// Whether the rule participates in evaluation at all.
    pub is_active: bool,
    /// Optional activation window gating the rule by request time.
    pub schedule: Option<Schedule>,
    /// Match counters maintained by the storage layer.
    #[serde(default)]
    pub stats: MatchStats,
    /// Creation instant, used as a recency tie-break between equal priorities.
    pub created_at: Timestamp,
}

/// A bundle of conditions sharing one action and one priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    /// Stable group identifier.
    pub id: RuleGroupId,
    /// Human-readable group name shown in traces and the dashboard.
    pub name: String,
    /// Resource the group is attached to.
    pub target: RuleTarget,
    /// Evaluation priority; higher values are considered first.
    pub priority: i32,
    /// Combinator applied across the group's conditions.
    pub logic: GroupLogic,
    /// The visitor tests combined under [`Self::logic`].
    pub conditions: Vec<RuleCondition>,
    /// Action taken when the group fires.
    pub action: RuleAction,
    /// Whether the group participates in evaluation at all.
    pub is_active: bool,
    /// Optional activation window gating the group by request time.
    pub schedule: Option<Schedule>,
    /// Match counters maintained by the storage layer.
    #[serde(default)]
    pub stats: MatchStats,
    /// Creation instant, used as a recency tie-break between equal priorities.
    pub created_at: Timestamp,
}
