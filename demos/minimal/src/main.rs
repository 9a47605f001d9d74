// demos/minimal/src/main.rs
// ============================================================================
// Module: Tinly Rules Minimal Demo
// Description: Minimal end-to-end resolution using the in-memory store.
// Purpose: Demonstrate rule setup, live resolution, and dry-run tracing.
// Dependencies: tinly-rules-core
// ============================================================================

//! ## Overview
//! Resolves one mobile German visitor against a geo redirect rule and a
//! weekend UTM group attached to the same link. Suitable for quick
//! verification without any backing service.

use std::io::Write;
use std::num::NonZeroU64;

use tinly_rules_core::ActionEffect;
use tinly_rules_core::ConditionType;
use tinly_rules_core::ConditionValue;
use tinly_rules_core::DeviceType;
use tinly_rules_core::EvaluationScope;
use tinly_rules_core::GroupLogic;
use tinly_rules_core::InMemoryRuleStore;
use tinly_rules_core::LinkId;
use tinly_rules_core::MatchStats;
use tinly_rules_core::NoopTelemetry;
use tinly_rules_core::RedirectRule;
use tinly_rules_core::ResolutionOutcome;
use tinly_rules_core::ResolverConfig;
use tinly_rules_core::RuleAction;
use tinly_rules_core::RuleCondition;
use tinly_rules_core::RuleGroup;
use tinly_rules_core::RuleGroupId;
use tinly_rules_core::RuleId;
use tinly_rules_core::RuleOperator;
use tinly_rules_core::RuleResolver;
use tinly_rules_core::RuleTarget;
use tinly_rules_core::Timestamp;
use tinly_rules_core::VisitorContext;

/// Builds the demo link identifier.
fn link_id() -> Option<LinkId> {
    NonZeroU64::new(1).map(LinkId::new)
}

/// Builds the geo redirect rule for German visitors.
fn geo_rule(link: LinkId) -> Option<RedirectRule> {
    Some(RedirectRule {
        id: RuleId::new(NonZeroU64::new(1)?),
        name: "german visitors".to_string(),
        target: RuleTarget::Link(link),
        priority: 10,
        condition: RuleCondition::new(ConditionType::Country, RuleOperator::Eq, "DE"),
        action: RuleAction::Redirect {
            url: "https://example.de/landing".to_string(),
        },
        is_active: true,
        schedule: None,
        stats: MatchStats::default(),
        created_at: Timestamp::from_unix_millis(1_700_000_000_000),
    })
}

/// Builds the weekend mobile UTM group.
fn weekend_group(link: LinkId) -> Option<RuleGroup> {
    Some(RuleGroup {
        id: RuleGroupId::new(NonZeroU64::new(1)?),
        name: "weekend mobile attribution".to_string(),
        target: RuleTarget::Link(link),
        priority: 5,
        logic: GroupLogic::And,
        conditions: vec![
            RuleCondition::new(
                ConditionType::Device,
                RuleOperator::Eq,
                DeviceType::Mobile.as_str(),
            ),
            RuleCondition::new(
                ConditionType::DayOfWeek,
                RuleOperator::In,
                ConditionValue::list([5_i64, 6_i64]),
            ),
        ],
        action: RuleAction::AddUtm {
            utm_source: Some("qr".to_string()),
            utm_medium: Some("weekend".to_string()),
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
        },
        is_active: true,
        schedule: None,
        stats: MatchStats::default(),
        created_at: Timestamp::from_unix_millis(1_700_000_000_000),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let link = link_id().ok_or("link id")?;
    let store = InMemoryRuleStore::new();
    store.insert_rule(geo_rule(link).ok_or("rule id")?)?;
    store.insert_group(weekend_group(link).ok_or("group id")?)?;

    let resolver = RuleResolver::new(
        store.clone(),
        store.clone(),
        NoopTelemetry,
        ResolverConfig::default(),
    );

    let scope = EvaluationScope::link(link).with_destination("https://example.com/product");
    let context = VisitorContext {
        country_code: Some("de".to_string()),
        device_type: Some(DeviceType::Mobile),
        day_of_week: Some(5),
        ..VisitorContext::default()
    };
    let now = Timestamp::from_unix_millis(1_720_000_000_000);

    let resolution = resolver.resolve(&scope, &context, now);
    match &resolution.outcome {
        ResolutionOutcome::Matched { rule, effect } => {
            write_line("Matched", &rule.name)?;
            if let ActionEffect::Redirect { url } = effect {
                write_line("Redirect", url)?;
            }
        }
        ResolutionOutcome::NoMatch => write_line("Matched", "none")?,
    }

    let dry_run = resolver.test(&scope, &context, now);
    for entry in &dry_run.trace {
        write_line(&entry.name, entry_status(entry.status))?;
    }

    Ok(())
}

/// Returns a stable label for a trace status.
const fn entry_status(status: tinly_rules_core::CandidateStatus) -> &'static str {
    match status {
        tinly_rules_core::CandidateStatus::Matched => "matched",
        tinly_rules_core::CandidateStatus::Unmatched => "unmatched",
        tinly_rules_core::CandidateStatus::OutOfSchedule => "out_of_schedule",
        tinly_rules_core::CandidateStatus::Degraded => "degraded",
    }
}

/// Writes a labeled line to stdout.
fn write_line(label: &str, value: &str) -> Result<(), std::io::Error> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{label}: {value}")
}
